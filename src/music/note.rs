// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch representation and MIDI conversion.
//!
//! A [`Note`] is a spelled pitch (letter, accidental, octave) plus the
//! duration and velocity it will be played with. The MIDI number is always
//! derived from the spelling, so two notes with different spellings can be
//! enharmonically equal.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MusicError, Result};

/// MIDI note number type (0-127)
pub type MidiNote = u8;

/// Semitone offset type
pub type Semitones = i32;

/// Velocity given to notes when none is specified
pub const DEFAULT_VELOCITY: u8 = 64;

/// Duration in beats given to notes when none is specified
pub const DEFAULT_DURATION: f64 = 1.0;

/// Lowest octave a note may be spelled in (C-1 = MIDI 0)
pub const MIN_OCTAVE: i8 = -1;

/// Highest octave a note may be spelled in (G9 = MIDI 127)
pub const MAX_OCTAVE: i8 = 9;

const NOTE_NAME_PATTERN: &str = r"^([A-Ga-g])(##|bb|#|b|x)?$";
const FULL_NAME_PATTERN: &str = r"^([A-Ga-g])(##|bb|#|b|x)?(-?\d)$";

static NOTE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();
static FULL_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn note_name_regex() -> &'static Regex {
    NOTE_NAME_REGEX.get_or_init(|| Regex::new(NOTE_NAME_PATTERN).expect("invalid regex pattern"))
}

fn full_name_regex() -> &'static Regex {
    FULL_NAME_REGEX.get_or_init(|| Regex::new(FULL_NAME_PATTERN).expect("invalid regex pattern"))
}

/// Pitch classes, spelled with sharps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl PitchClass {
    /// All pitch classes in chromatic order
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Semitones above C (0-11)
    pub fn semitone(self) -> u8 {
        self as u8
    }

    /// Pitch class for any semitone count, wrapping by octave
    pub fn from_semitone(semitone: i32) -> Self {
        PitchClass::ALL[semitone.rem_euclid(12) as usize]
    }

    /// Transpose by semitones
    pub fn transpose(self, semitones: Semitones) -> Self {
        PitchClass::from_semitone(self.semitone() as i32 + semitones)
    }

    /// Ascending interval in semitones to another pitch class
    pub fn interval_to(self, other: PitchClass) -> u8 {
        (other.semitone() as i32 - self.semitone() as i32).rem_euclid(12) as u8
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", NoteName::from_pitch_class(*self, false))
    }
}

/// Natural note letters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Semitones above C for the natural note
    pub fn semitone(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    /// Position in the C-based letter cycle (C = 0)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Letter a number of steps above this one, wrapping G -> A -> B -> C
    pub fn step(self, steps: i32) -> Letter {
        Letter::ALL[(self.index() as i32 + steps).rem_euclid(7) as usize]
    }

    fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
            Letter::A => 'A',
            Letter::B => 'B',
        };
        write!(f, "{}", c)
    }
}

/// Accidentals, up to double sharp/flat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accidental {
    DoubleFlat,
    Flat,
    #[default]
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Semitone adjustment applied to the natural letter
    pub fn offset(self) -> i32 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }

    /// Accidental for an offset in -2..=2
    pub fn from_offset(offset: i32) -> Option<Accidental> {
        match offset {
            -2 => Some(Accidental::DoubleFlat),
            -1 => Some(Accidental::Flat),
            0 => Some(Accidental::Natural),
            1 => Some(Accidental::Sharp),
            2 => Some(Accidental::DoubleSharp),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "bb",
            Accidental::Flat => "b",
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::DoubleSharp => "##",
        }
    }

    /// Whether this accidental lowers the pitch
    pub fn is_flat(self) -> bool {
        self.offset() < 0
    }

    fn from_symbol(s: &str) -> Option<Accidental> {
        match s {
            "" => Some(Accidental::Natural),
            "#" => Some(Accidental::Sharp),
            "##" | "x" => Some(Accidental::DoubleSharp),
            "b" => Some(Accidental::Flat),
            "bb" => Some(Accidental::DoubleFlat),
            _ => None,
        }
    }
}

/// A spelled note name without octave (e.g. "F#", "Bb")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteName {
    pub letter: Letter,
    pub accidental: Accidental,
}

impl NoteName {
    pub fn new(letter: Letter, accidental: Accidental) -> Self {
        Self { letter, accidental }
    }

    /// Natural note name for a letter
    pub fn natural(letter: Letter) -> Self {
        Self::new(letter, Accidental::Natural)
    }

    /// Semitones above C of the same octave; may fall outside 0-11 for
    /// spellings like Cb or B#
    pub fn semitone_offset(self) -> i32 {
        self.letter.semitone() + self.accidental.offset()
    }

    pub fn pitch_class(self) -> PitchClass {
        PitchClass::from_semitone(self.semitone_offset())
    }

    /// Spell a pitch class with a single accidental
    pub fn from_pitch_class(pc: PitchClass, prefer_flats: bool) -> Self {
        use Accidental::{Flat, Natural, Sharp};
        let (letter, accidental) = match (pc, prefer_flats) {
            (PitchClass::C, _) => (Letter::C, Natural),
            (PitchClass::Cs, false) => (Letter::C, Sharp),
            (PitchClass::Cs, true) => (Letter::D, Flat),
            (PitchClass::D, _) => (Letter::D, Natural),
            (PitchClass::Ds, false) => (Letter::D, Sharp),
            (PitchClass::Ds, true) => (Letter::E, Flat),
            (PitchClass::E, _) => (Letter::E, Natural),
            (PitchClass::F, _) => (Letter::F, Natural),
            (PitchClass::Fs, false) => (Letter::F, Sharp),
            (PitchClass::Fs, true) => (Letter::G, Flat),
            (PitchClass::G, _) => (Letter::G, Natural),
            (PitchClass::Gs, false) => (Letter::G, Sharp),
            (PitchClass::Gs, true) => (Letter::A, Flat),
            (PitchClass::A, _) => (Letter::A, Natural),
            (PitchClass::As, false) => (Letter::A, Sharp),
            (PitchClass::As, true) => (Letter::B, Flat),
            (PitchClass::B, _) => (Letter::B, Natural),
        };
        Self::new(letter, accidental)
    }

    /// Spell a pitch class on a given letter, if it needs at most a double
    /// accidental
    pub fn spell_on(letter: Letter, pc: PitchClass) -> Option<Self> {
        let diff = (pc.semitone() as i32 - letter.semitone()).rem_euclid(12);
        let offset = if diff > 6 { diff - 12 } else { diff };
        Accidental::from_offset(offset).map(|acc| Self::new(letter, acc))
    }
}

impl FromStr for NoteName {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = note_name_regex()
            .captures(s.trim())
            .ok_or_else(|| MusicError::parse("note name", s))?;
        parse_name_captures(&caps).ok_or_else(|| MusicError::parse("note name", s))
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.accidental.symbol())
    }
}

fn parse_name_captures(caps: &regex::Captures<'_>) -> Option<NoteName> {
    let letter = caps.get(1)?.as_str().chars().next().and_then(Letter::from_char)?;
    let accidental = Accidental::from_symbol(caps.get(2).map_or("", |m| m.as_str()))?;
    Some(NoteName::new(letter, accidental))
}

/// A spelled pitch with playback attributes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "NoteRecord", into = "NoteRecord")]
pub struct Note {
    name: NoteName,
    octave: i8,
    duration: f64,
    velocity: u8,
}

impl Note {
    /// Create a note from a parsed name, validating every attribute
    pub fn new(name: NoteName, octave: i8, duration: f64, velocity: u8) -> Result<Self> {
        if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) {
            return Err(MusicError::Validation(format!(
                "octave {} outside {}..={}",
                octave, MIN_OCTAVE, MAX_OCTAVE
            )));
        }
        validate_duration(duration)?;
        validate_velocity(velocity)?;

        let midi = midi_for(name, octave);
        if !(0..=127).contains(&midi) {
            return Err(MusicError::Range(format!(
                "{}{} resolves to MIDI {} (valid 0-127)",
                name, octave, midi
            )));
        }

        Ok(Self {
            name,
            octave,
            duration,
            velocity,
        })
    }

    /// Create a note from a name string such as "C#" or "Bb"
    pub fn from_name_octave(name: &str, octave: i8, duration: f64, velocity: u8) -> Result<Self> {
        let parsed: NoteName = name
            .parse()
            .map_err(|_| MusicError::Validation(format!("invalid note name '{}'", name)))?;
        Self::new(parsed, octave, duration, velocity)
    }

    /// Parse a combined name and octave such as "C#4" or "Bb3"
    pub fn from_full_name(full_name: &str) -> Result<Self> {
        let trimmed = full_name.trim();
        let caps = full_name_regex()
            .captures(trimmed)
            .ok_or_else(|| MusicError::parse("note", full_name))?;
        let name = parse_name_captures(&caps).ok_or_else(|| MusicError::parse("note", full_name))?;
        let octave: i8 = caps[3]
            .parse()
            .map_err(|_| MusicError::parse("note", full_name))?;
        Self::new(name, octave, DEFAULT_DURATION, DEFAULT_VELOCITY)
    }

    /// Create a note from a MIDI number, spelled with sharps
    pub fn from_midi(midi: i32, duration: f64, velocity: u8) -> Result<Self> {
        Self::from_midi_spelled(midi, false, duration, velocity)
    }

    /// Create a note from a MIDI number with the given accidental preference
    pub fn from_midi_spelled(midi: i32, prefer_flats: bool, duration: f64, velocity: u8) -> Result<Self> {
        if !(0..=127).contains(&midi) {
            return Err(MusicError::Range(format!("MIDI number {} outside 0-127", midi)));
        }
        let name = NoteName::from_pitch_class(PitchClass::from_semitone(midi), prefer_flats);
        let octave = (midi.div_euclid(12) - 1) as i8;
        Self::new(name, octave, duration, velocity)
    }

    pub fn name(&self) -> NoteName {
        self.name
    }

    pub fn letter(&self) -> Letter {
        self.name.letter
    }

    pub fn accidental(&self) -> Accidental {
        self.name.accidental
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// MIDI number derived from spelling and octave
    pub fn midi_number(&self) -> MidiNote {
        // Range-checked at construction
        midi_for(self.name, self.octave) as MidiNote
    }

    pub fn pitch_class(&self) -> PitchClass {
        self.name.pitch_class()
    }

    /// Name with octave, e.g. "C#4"
    pub fn full_name(&self) -> String {
        format!("{}{}", self.name, self.octave)
    }

    /// Shift by semitones, keeping the current sharp/flat preference
    pub fn transpose(&self, semitones: Semitones) -> Result<Self> {
        let target = self.midi_number() as i32 + semitones;
        if !(0..=127).contains(&target) {
            return Err(MusicError::Range(format!(
                "transposing {} by {} semitones gives MIDI {} (valid 0-127)",
                self.full_name(),
                semitones,
                target
            )));
        }
        Self::from_midi_spelled(target, self.accidental().is_flat(), self.duration, self.velocity)
    }

    /// Same note with a different duration
    pub fn with_duration(&self, duration: f64) -> Result<Self> {
        validate_duration(duration)?;
        Ok(Self { duration, ..*self })
    }

    /// Same note with a different velocity
    pub fn with_velocity(&self, velocity: u8) -> Result<Self> {
        validate_velocity(velocity)?;
        Ok(Self { velocity, ..*self })
    }

    /// Same note, respelled with a single accidental
    pub fn respell(&self, prefer_flats: bool) -> Self {
        let midi = self.midi_number() as i32;
        Self {
            name: NoteName::from_pitch_class(PitchClass::from_semitone(midi), prefer_flats),
            octave: (midi.div_euclid(12) - 1) as i8,
            ..*self
        }
    }

    /// Whether two notes sound at the same pitch
    pub fn is_enharmonic(&self, other: &Note) -> bool {
        self.midi_number() == other.midi_number()
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.midi_number() == other.midi_number()
            && self.duration == other.duration
            && self.velocity == other.velocity
    }
}

/// Orders by MIDI number; notes at the same pitch are then ordered by
/// duration and then velocity, matching `PartialEq`.
impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.midi_number().cmp(&other.midi_number()) {
            Ordering::Equal => {}
            ord => return Some(ord),
        }
        match self.duration.partial_cmp(&other.duration)? {
            Ordering::Equal => Some(self.velocity.cmp(&other.velocity)),
            ord => Some(ord),
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

impl FromStr for Note {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        Note::from_full_name(s)
    }
}

fn midi_for(name: NoteName, octave: i8) -> i32 {
    name.semitone_offset() + (octave as i32 + 1) * 12
}

fn validate_duration(duration: f64) -> Result<()> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(MusicError::Validation(format!(
            "duration must be positive, got {}",
            duration
        )));
    }
    Ok(())
}

fn validate_velocity(velocity: u8) -> Result<()> {
    if velocity > 127 {
        return Err(MusicError::Validation(format!(
            "velocity {} outside 0-127",
            velocity
        )));
    }
    Ok(())
}

fn default_duration() -> f64 {
    DEFAULT_DURATION
}

fn default_velocity() -> u8 {
    DEFAULT_VELOCITY
}

/// Serialized form of a note
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NoteRecord {
    name: String,
    octave: i8,
    #[serde(default = "default_duration")]
    duration: f64,
    #[serde(default = "default_velocity")]
    velocity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    midi_number: Option<MidiNote>,
}

impl TryFrom<NoteRecord> for Note {
    type Error = MusicError;

    fn try_from(record: NoteRecord) -> Result<Self> {
        let note = Note::from_name_octave(&record.name, record.octave, record.duration, record.velocity)?;
        if let Some(midi) = record.midi_number {
            if midi != note.midi_number() {
                return Err(MusicError::Validation(format!(
                    "midi_number {} does not match {} ({})",
                    midi,
                    note.full_name(),
                    note.midi_number()
                )));
            }
        }
        Ok(note)
    }
}

impl From<Note> for NoteRecord {
    fn from(note: Note) -> Self {
        NoteRecord {
            name: note.name.to_string(),
            octave: note.octave,
            duration: note.duration,
            velocity: note.velocity,
            midi_number: Some(note.midi_number()),
        }
    }
}
