// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord qualities and chord construction.
//!
//! Quality tokens are resolved through a single alias table which also
//! provides the canonical name used when a quality is written back out.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{MusicError, Result};
use crate::music::note::{MidiNote, Note, NoteName, PitchClass, Semitones, DEFAULT_DURATION, DEFAULT_VELOCITY};

/// Chord qualities with a fixed interval structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChordQualityType {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
    HalfDiminished7,
    Diminished7,
    Augmented7,
    Sus2,
    Sus4,
    Dominant9,
    Major9,
    Minor9,
    Dominant11,
    Major11,
    Minor11,
}

/// Accepted quality tokens. The first entry for each quality is its
/// canonical name.
const QUALITY_ALIASES: &[(&str, ChordQualityType)] = &[
    ("major", ChordQualityType::Major),
    ("maj", ChordQualityType::Major),
    ("M", ChordQualityType::Major),
    ("", ChordQualityType::Major),
    ("minor", ChordQualityType::Minor),
    ("min", ChordQualityType::Minor),
    ("m", ChordQualityType::Minor),
    ("-", ChordQualityType::Minor),
    ("diminished", ChordQualityType::Diminished),
    ("dim", ChordQualityType::Diminished),
    ("°", ChordQualityType::Diminished),
    ("o", ChordQualityType::Diminished),
    ("augmented", ChordQualityType::Augmented),
    ("aug", ChordQualityType::Augmented),
    ("+", ChordQualityType::Augmented),
    ("dominant7", ChordQualityType::Dominant7),
    ("7", ChordQualityType::Dominant7),
    ("dominant", ChordQualityType::Dominant7),
    ("dom7", ChordQualityType::Dominant7),
    ("dom", ChordQualityType::Dominant7),
    ("dominant_seventh", ChordQualityType::Dominant7),
    ("major7", ChordQualityType::Major7),
    ("maj7", ChordQualityType::Major7),
    ("M7", ChordQualityType::Major7),
    ("Δ7", ChordQualityType::Major7),
    ("major_seventh", ChordQualityType::Major7),
    ("minor7", ChordQualityType::Minor7),
    ("m7", ChordQualityType::Minor7),
    ("min7", ChordQualityType::Minor7),
    ("-7", ChordQualityType::Minor7),
    ("minor_seventh", ChordQualityType::Minor7),
    ("half_diminished7", ChordQualityType::HalfDiminished7),
    ("m7b5", ChordQualityType::HalfDiminished7),
    ("min7b5", ChordQualityType::HalfDiminished7),
    ("ø7", ChordQualityType::HalfDiminished7),
    ("ø", ChordQualityType::HalfDiminished7),
    ("half_diminished", ChordQualityType::HalfDiminished7),
    ("half_diminished_seventh", ChordQualityType::HalfDiminished7),
    ("diminished7", ChordQualityType::Diminished7),
    ("dim7", ChordQualityType::Diminished7),
    ("°7", ChordQualityType::Diminished7),
    ("o7", ChordQualityType::Diminished7),
    ("diminished_seventh", ChordQualityType::Diminished7),
    ("augmented7", ChordQualityType::Augmented7),
    ("aug7", ChordQualityType::Augmented7),
    ("+7", ChordQualityType::Augmented7),
    ("7#5", ChordQualityType::Augmented7),
    ("augmented_seventh", ChordQualityType::Augmented7),
    ("sus2", ChordQualityType::Sus2),
    ("suspended_second", ChordQualityType::Sus2),
    ("sus4", ChordQualityType::Sus4),
    ("sus", ChordQualityType::Sus4),
    ("suspended_fourth", ChordQualityType::Sus4),
    ("dominant9", ChordQualityType::Dominant9),
    ("9", ChordQualityType::Dominant9),
    ("dom9", ChordQualityType::Dominant9),
    ("dominant_ninth", ChordQualityType::Dominant9),
    ("major9", ChordQualityType::Major9),
    ("maj9", ChordQualityType::Major9),
    ("M9", ChordQualityType::Major9),
    ("major_ninth", ChordQualityType::Major9),
    ("minor9", ChordQualityType::Minor9),
    ("m9", ChordQualityType::Minor9),
    ("min9", ChordQualityType::Minor9),
    ("minor_ninth", ChordQualityType::Minor9),
    ("dominant11", ChordQualityType::Dominant11),
    ("11", ChordQualityType::Dominant11),
    ("dom11", ChordQualityType::Dominant11),
    ("dominant_eleventh", ChordQualityType::Dominant11),
    ("major11", ChordQualityType::Major11),
    ("maj11", ChordQualityType::Major11),
    ("M11", ChordQualityType::Major11),
    ("major_eleventh", ChordQualityType::Major11),
    ("minor11", ChordQualityType::Minor11),
    ("m11", ChordQualityType::Minor11),
    ("min11", ChordQualityType::Minor11),
    ("minor_eleventh", ChordQualityType::Minor11),
];

fn normalize_token(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl ChordQualityType {
    pub const ALL: [ChordQualityType; 18] = [
        ChordQualityType::Major,
        ChordQualityType::Minor,
        ChordQualityType::Diminished,
        ChordQualityType::Augmented,
        ChordQualityType::Dominant7,
        ChordQualityType::Major7,
        ChordQualityType::Minor7,
        ChordQualityType::HalfDiminished7,
        ChordQualityType::Diminished7,
        ChordQualityType::Augmented7,
        ChordQualityType::Sus2,
        ChordQualityType::Sus4,
        ChordQualityType::Dominant9,
        ChordQualityType::Major9,
        ChordQualityType::Minor9,
        ChordQualityType::Dominant11,
        ChordQualityType::Major11,
        ChordQualityType::Minor11,
    ];

    /// Resolve a quality token.
    ///
    /// Exact matches win, so "M" is major and "m" is minor. Otherwise the
    /// token is compared case-insensitively, ignoring spaces and underscores,
    /// against the lowercase aliases.
    pub fn from_string(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Some((_, quality)) = QUALITY_ALIASES.iter().find(|(alias, _)| *alias == trimmed) {
            return Ok(*quality);
        }

        let wanted = normalize_token(trimmed);
        let found = QUALITY_ALIASES
            .iter()
            .filter(|(alias, _)| alias.chars().all(|c| !c.is_uppercase()))
            .find(|(alias, _)| normalize_token(alias) == wanted);
        match found {
            Some((_, quality)) => Ok(*quality),
            None => {
                let checked: Vec<&str> = QUALITY_ALIASES.iter().map(|(alias, _)| *alias).collect();
                warn!(input = s, aliases = ?checked, "unknown chord quality");
                Err(MusicError::UnknownQuality(s.to_string()))
            }
        }
    }

    /// Canonical token written for this quality
    pub fn canonical_name(self) -> &'static str {
        QUALITY_ALIASES
            .iter()
            .find(|(_, quality)| *quality == self)
            .map(|(alias, _)| *alias)
            .unwrap_or("major")
    }

    /// Semitone offsets from the root
    pub fn get_intervals(self) -> &'static [u8] {
        match self {
            ChordQualityType::Major => &[0, 4, 7],
            ChordQualityType::Minor => &[0, 3, 7],
            ChordQualityType::Diminished => &[0, 3, 6],
            ChordQualityType::Augmented => &[0, 4, 8],
            ChordQualityType::Dominant7 => &[0, 4, 7, 10],
            ChordQualityType::Major7 => &[0, 4, 7, 11],
            ChordQualityType::Minor7 => &[0, 3, 7, 10],
            ChordQualityType::HalfDiminished7 => &[0, 3, 6, 10],
            ChordQualityType::Diminished7 => &[0, 3, 6, 9],
            ChordQualityType::Augmented7 => &[0, 4, 8, 10],
            ChordQualityType::Sus2 => &[0, 2, 7],
            ChordQualityType::Sus4 => &[0, 5, 7],
            ChordQualityType::Dominant9 => &[0, 4, 7, 10, 14],
            ChordQualityType::Major9 => &[0, 4, 7, 11, 14],
            ChordQualityType::Minor9 => &[0, 3, 7, 10, 14],
            ChordQualityType::Dominant11 => &[0, 4, 7, 10, 14, 17],
            ChordQualityType::Major11 => &[0, 4, 7, 11, 14, 17],
            ChordQualityType::Minor11 => &[0, 3, 7, 10, 14, 17],
        }
    }

    /// Upper-case family in Roman numeral notation
    pub fn is_major_family(self) -> bool {
        !matches!(
            self,
            ChordQualityType::Minor
                | ChordQualityType::Diminished
                | ChordQualityType::Minor7
                | ChordQualityType::HalfDiminished7
                | ChordQualityType::Diminished7
                | ChordQualityType::Minor9
                | ChordQualityType::Minor11
        )
    }

    /// Dominant, diminished and augmented sonorities
    pub fn is_tension(self) -> bool {
        matches!(
            self,
            ChordQualityType::Diminished
                | ChordQualityType::Augmented
                | ChordQualityType::Dominant7
                | ChordQualityType::HalfDiminished7
                | ChordQualityType::Diminished7
                | ChordQualityType::Augmented7
                | ChordQualityType::Dominant9
                | ChordQualityType::Dominant11
        )
    }

    pub fn is_triad(self) -> bool {
        self.get_intervals().len() == 3
    }

    pub fn is_seventh(self) -> bool {
        self.get_intervals().len() == 4
    }

    /// Ninth and eleventh chords
    pub fn is_extended(self) -> bool {
        self.get_intervals().len() > 4
    }

    /// Seventh chord built on this triad; `dominant` picks a minor seventh
    /// over a major triad
    pub fn with_seventh(self, dominant: bool) -> Self {
        match self {
            ChordQualityType::Major if dominant => ChordQualityType::Dominant7,
            ChordQualityType::Major => ChordQualityType::Major7,
            ChordQualityType::Minor => ChordQualityType::Minor7,
            ChordQualityType::Diminished => ChordQualityType::HalfDiminished7,
            ChordQualityType::Augmented => ChordQualityType::Augmented7,
            other => other,
        }
    }

    /// Suffix used in chord symbols such as "Cm7"
    pub fn symbol_suffix(self) -> &'static str {
        match self {
            ChordQualityType::Major => "",
            ChordQualityType::Minor => "m",
            ChordQualityType::Diminished => "dim",
            ChordQualityType::Augmented => "aug",
            ChordQualityType::Dominant7 => "7",
            ChordQualityType::Major7 => "maj7",
            ChordQualityType::Minor7 => "m7",
            ChordQualityType::HalfDiminished7 => "m7b5",
            ChordQualityType::Diminished7 => "dim7",
            ChordQualityType::Augmented7 => "aug7",
            ChordQualityType::Sus2 => "sus2",
            ChordQualityType::Sus4 => "sus4",
            ChordQualityType::Dominant9 => "9",
            ChordQualityType::Major9 => "maj9",
            ChordQualityType::Minor9 => "m9",
            ChordQualityType::Dominant11 => "11",
            ChordQualityType::Major11 => "maj11",
            ChordQualityType::Minor11 => "m11",
        }
    }
}

impl FromStr for ChordQualityType {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        ChordQualityType::from_string(s)
    }
}

impl TryFrom<String> for ChordQualityType {
    type Error = MusicError;

    fn try_from(s: String) -> Result<Self> {
        ChordQualityType::from_string(&s)
    }
}

impl From<ChordQualityType> for String {
    fn from(quality: ChordQualityType) -> Self {
        quality.canonical_name().to_string()
    }
}

impl fmt::Display for ChordQualityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

const CHORD_SYMBOL_PATTERN: &str = r"^([A-G])(##|bb|#|b|x)?([^/]*)(?:/([A-G](?:##|bb|#|b|x)?))?$";

static CHORD_SYMBOL_REGEX: OnceLock<Regex> = OnceLock::new();

fn chord_symbol_regex() -> &'static Regex {
    CHORD_SYMBOL_REGEX.get_or_init(|| Regex::new(CHORD_SYMBOL_PATTERN).expect("invalid regex pattern"))
}

/// A chord built from a root and quality, optionally inverted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ChordRecord", into = "ChordRecord")]
pub struct Chord {
    root: Note,
    quality: ChordQualityType,
    inversion: u8,
    notes: Vec<Note>,
}

impl Chord {
    /// Root-position chord
    pub fn new(root: Note, quality: ChordQualityType) -> Result<Self> {
        Self::with_inversion(root, quality, 0)
    }

    /// Chord with the given inversion (0 = root position).
    ///
    /// The tone list is rotated so the inverted tone comes first, then that
    /// bass drops by octaves until it is the lowest pitch. The upper tones
    /// keep their root-position octaves.
    pub fn with_inversion(root: Note, quality: ChordQualityType, inversion: u8) -> Result<Self> {
        let mut notes = quality
            .get_intervals()
            .iter()
            .map(|&i| root.transpose(i as Semitones))
            .collect::<Result<Vec<Note>>>()?;

        if inversion as usize >= notes.len() {
            return Err(MusicError::Range(format!(
                "inversion {} invalid for {}-note {} chord",
                inversion,
                notes.len(),
                quality
            )));
        }

        if inversion > 0 {
            notes.rotate_left(inversion as usize);
            while notes[1..].iter().any(|n| n.midi_number() <= notes[0].midi_number()) {
                notes[0] = notes[0].transpose(-12)?;
            }
        }

        Ok(Self {
            root,
            quality,
            inversion,
            notes,
        })
    }

    /// Parse a chord symbol such as "Cmaj7", "F#m7b5" or "C/E"
    pub fn from_symbol(symbol: &str, octave: i8) -> Result<Self> {
        let trimmed = symbol.trim();
        let caps = chord_symbol_regex()
            .captures(trimmed)
            .ok_or_else(|| MusicError::parse("chord symbol", symbol))?;

        let root_name: NoteName = format!("{}{}", &caps[1], caps.get(2).map_or("", |m| m.as_str())).parse()?;
        let root = Note::new(root_name, octave, DEFAULT_DURATION, DEFAULT_VELOCITY)?;
        let quality = ChordQualityType::from_string(&caps[3])?;
        let chord = Chord::new(root, quality)?;

        match caps.get(4) {
            None => Ok(chord),
            Some(bass) => {
                let bass: NoteName = bass.as_str().parse()?;
                let inversion = chord
                    .notes
                    .iter()
                    .position(|n| n.pitch_class() == bass.pitch_class())
                    .ok_or_else(|| {
                        MusicError::Validation(format!("bass {} is not a tone of {}", bass, chord.symbol()))
                    })?;
                chord.invert(inversion as u8)
            }
        }
    }

    pub fn root(&self) -> Note {
        self.root
    }

    pub fn quality(&self) -> ChordQualityType {
        self.quality
    }

    pub fn inversion(&self) -> u8 {
        self.inversion
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Lowest sounding note
    pub fn bass(&self) -> Note {
        self.notes[0]
    }

    pub fn midi_numbers(&self) -> Vec<MidiNote> {
        self.notes.iter().map(Note::midi_number).collect()
    }

    pub fn contains_pitch_class(&self, pc: PitchClass) -> bool {
        self.notes.iter().any(|n| n.pitch_class() == pc)
    }

    /// Same chord, transposed; inversion is kept
    pub fn transpose(&self, semitones: Semitones) -> Result<Self> {
        Chord::with_inversion(self.root.transpose(semitones)?, self.quality, self.inversion)
    }

    /// Same root and quality in another inversion
    pub fn invert(&self, inversion: u8) -> Result<Self> {
        Chord::with_inversion(self.root, self.quality, inversion)
    }

    /// Symbol like "Am7" or "C/E"
    pub fn symbol(&self) -> String {
        let mut symbol = format!("{}{}", self.root.name(), self.quality.symbol_suffix());
        if self.inversion > 0 {
            symbol.push('/');
            symbol.push_str(&self.bass().name().to_string());
        }
        symbol
    }

    fn midi_numbers_ascending(&self) -> Vec<MidiNote> {
        let mut midi: Vec<MidiNote> = self.notes.iter().map(Note::midi_number).collect();
        midi.sort_unstable();
        midi
    }

    /// Inversion of this chord closest to `previous`
    pub fn voice_led_from(&self, previous: &Chord) -> Result<Self> {
        let mut best = self.invert(0)?;
        let mut best_movement = movement(previous, &best);
        for inversion in 1..self.len() as u8 {
            let Ok(candidate) = self.invert(inversion) else {
                continue;
            };
            let m = movement(previous, &candidate);
            if m < best_movement {
                best_movement = m;
                best = candidate;
            }
        }
        Ok(best)
    }
}

/// Total semitone distance between voices, matched low to high
pub fn movement(from: &Chord, to: &Chord) -> u32 {
    let from = from.midi_numbers_ascending();
    let to = to.midi_numbers_ascending();
    from.iter()
        .zip(to.iter())
        .map(|(&a, &b)| (a as i32 - b as i32).unsigned_abs())
        .sum()
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChordRecord {
    root: Note,
    quality: ChordQualityType,
    #[serde(default)]
    inversion: u8,
    #[serde(default, skip_deserializing)]
    notes: Vec<Note>,
}

impl TryFrom<ChordRecord> for Chord {
    type Error = MusicError;

    fn try_from(record: ChordRecord) -> Result<Self> {
        Chord::with_inversion(record.root, record.quality, record.inversion)
    }
}

impl From<Chord> for ChordRecord {
    fn from(chord: Chord) -> Self {
        ChordRecord {
            root: chord.root,
            quality: chord.quality,
            inversion: chord.inversion,
            notes: chord.notes,
        }
    }
}
