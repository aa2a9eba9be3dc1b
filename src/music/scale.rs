// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scale system: interval tables, materialized scales and key context.
//!
//! A [`Scale`] is computed once from a root note and a [`ScaleType`].
//! [`ScaleInfo`] carries just the root and type and knows which chord
//! quality each degree takes by default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MusicError, Result};
use crate::music::chord::ChordQualityType;
use crate::music::note::{
    Letter, MidiNote, Note, NoteName, PitchClass, Semitones, DEFAULT_DURATION, DEFAULT_VELOCITY,
};

/// Scale types supported by the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    // Major scale and modes
    Major,        // Ionian
    Dorian,       // Minor with raised 6th
    Phrygian,     // Minor with lowered 2nd
    Lydian,       // Major with raised 4th
    Mixolydian,   // Major with lowered 7th
    NaturalMinor, // Aeolian
    Locrian,

    // Other minor scales
    HarmonicMinor,
    MelodicMinor, // Ascending form

    // Pentatonic scales
    MajorPentatonic,
    MinorPentatonic,

    // Blues
    Blues,
    MajorBlues,

    // Symmetric scales
    WholeTone,
    Diminished,          // Half-whole
    DiminishedWholeHalf, // Whole-half
    Chromatic,
}

impl ScaleType {
    pub const ALL: [ScaleType; 17] = [
        ScaleType::Major,
        ScaleType::Dorian,
        ScaleType::Phrygian,
        ScaleType::Lydian,
        ScaleType::Mixolydian,
        ScaleType::NaturalMinor,
        ScaleType::Locrian,
        ScaleType::HarmonicMinor,
        ScaleType::MelodicMinor,
        ScaleType::MajorPentatonic,
        ScaleType::MinorPentatonic,
        ScaleType::Blues,
        ScaleType::MajorBlues,
        ScaleType::WholeTone,
        ScaleType::Diminished,
        ScaleType::DiminishedWholeHalf,
        ScaleType::Chromatic,
    ];

    /// Semitone offsets from the root, one octave, ascending
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleType::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleType::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleType::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleType::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleType::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleType::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleType::Locrian => &[0, 1, 3, 5, 6, 8, 10],

            ScaleType::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleType::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],

            ScaleType::MajorPentatonic => &[0, 2, 4, 7, 9],
            ScaleType::MinorPentatonic => &[0, 3, 5, 7, 10],

            ScaleType::Blues => &[0, 3, 5, 6, 7, 10],
            ScaleType::MajorBlues => &[0, 2, 3, 4, 7, 9],

            ScaleType::WholeTone => &[0, 2, 4, 6, 8, 10],
            ScaleType::Diminished => &[0, 1, 3, 4, 6, 7, 9, 10],
            ScaleType::DiminishedWholeHalf => &[0, 2, 3, 5, 6, 8, 9, 11],
            ScaleType::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }

    /// Seven-note scales, spelled one letter per degree
    pub fn is_diatonic(self) -> bool {
        self.intervals().len() == 7
    }

    /// Scales built on a minor third
    pub fn is_minor(self) -> bool {
        matches!(
            self,
            ScaleType::Dorian
                | ScaleType::Phrygian
                | ScaleType::NaturalMinor
                | ScaleType::Locrian
                | ScaleType::HarmonicMinor
                | ScaleType::MelodicMinor
                | ScaleType::MinorPentatonic
                | ScaleType::Blues
        )
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            ScaleType::Major => "Major",
            ScaleType::Dorian => "Dorian",
            ScaleType::Phrygian => "Phrygian",
            ScaleType::Lydian => "Lydian",
            ScaleType::Mixolydian => "Mixolydian",
            ScaleType::NaturalMinor => "Natural Minor",
            ScaleType::Locrian => "Locrian",
            ScaleType::HarmonicMinor => "Harmonic Minor",
            ScaleType::MelodicMinor => "Melodic Minor",
            ScaleType::MajorPentatonic => "Major Pentatonic",
            ScaleType::MinorPentatonic => "Minor Pentatonic",
            ScaleType::Blues => "Blues",
            ScaleType::MajorBlues => "Major Blues",
            ScaleType::WholeTone => "Whole Tone",
            ScaleType::Diminished => "Diminished",
            ScaleType::DiminishedWholeHalf => "Diminished (W-H)",
            ScaleType::Chromatic => "Chromatic",
        }
    }

    /// The parallel minor/major scale type
    pub fn parallel(self) -> Option<Self> {
        match self {
            ScaleType::Major => Some(ScaleType::NaturalMinor),
            ScaleType::NaturalMinor => Some(ScaleType::Major),
            ScaleType::MajorPentatonic => Some(ScaleType::MinorPentatonic),
            ScaleType::MinorPentatonic => Some(ScaleType::MajorPentatonic),
            _ => None,
        }
    }
}

impl FromStr for ScaleType {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase().replace([' ', '-', '_'], "");
        match key.as_str() {
            "major" | "ionian" => Ok(ScaleType::Major),
            "dorian" => Ok(ScaleType::Dorian),
            "phrygian" => Ok(ScaleType::Phrygian),
            "lydian" => Ok(ScaleType::Lydian),
            "mixolydian" => Ok(ScaleType::Mixolydian),
            "minor" | "naturalminor" | "aeolian" => Ok(ScaleType::NaturalMinor),
            "locrian" => Ok(ScaleType::Locrian),
            "harmonicminor" => Ok(ScaleType::HarmonicMinor),
            "melodicminor" => Ok(ScaleType::MelodicMinor),
            "majorpentatonic" | "pentatonicmajor" | "pentatonic" => Ok(ScaleType::MajorPentatonic),
            "minorpentatonic" | "pentatonicminor" => Ok(ScaleType::MinorPentatonic),
            "blues" | "minorblues" => Ok(ScaleType::Blues),
            "majorblues" => Ok(ScaleType::MajorBlues),
            "wholetone" => Ok(ScaleType::WholeTone),
            "diminished" | "octatonic" | "halfwhole" => Ok(ScaleType::Diminished),
            "diminishedwholehalf" | "diminishedwh" | "wholehalf" => Ok(ScaleType::DiminishedWholeHalf),
            "chromatic" => Ok(ScaleType::Chromatic),
            _ => Err(MusicError::UnknownScaleType(s.to_string())),
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A 1-based position in a scale together with the note it resolves to.
///
/// `value` may exceed the scale length for compound degrees (9, 11, 13).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleDegree {
    pub value: u8,
    pub note: Note,
}

impl ScaleDegree {
    pub fn new(value: u8, note: Note) -> Result<Self> {
        if value == 0 {
            return Err(MusicError::Range("scale degrees start at 1".to_string()));
        }
        Ok(Self { value, note })
    }

    /// Degree folded into a single octave of a scale with `len` notes
    pub fn simple(&self, len: usize) -> usize {
        (self.value as usize).saturating_sub(1) % len.max(1) + 1
    }
}

/// A materialized scale with its member notes
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    root: Note,
    scale_type: ScaleType,
    octaves: u8,
    notes: Vec<Note>,
}

impl Scale {
    /// Build one octave of a scale from its root
    pub fn new(root: Note, scale_type: ScaleType) -> Result<Self> {
        Self::with_octaves(root, scale_type, 1)
    }

    /// Build several stacked octaves of a scale
    pub fn with_octaves(root: Note, scale_type: ScaleType, octaves: u8) -> Result<Self> {
        if !(1..=10).contains(&octaves) {
            return Err(MusicError::Validation(format!(
                "scale octave count {} outside 1..=10",
                octaves
            )));
        }

        let intervals = scale_type.intervals();
        let mut notes = Vec::with_capacity(intervals.len() * octaves as usize);
        for octave in 0..octaves as i32 {
            for (index, &interval) in intervals.iter().enumerate() {
                let midi = root.midi_number() as i32 + octave * 12 + interval as i32;
                let letter = scale_type.is_diatonic().then(|| root.letter().step(index as i32));
                notes.push(spell(midi, letter, &root)?);
            }
        }

        Ok(Self {
            root,
            scale_type,
            octaves,
            notes,
        })
    }

    /// Parse a scale from strings (e.g., "C4", "major")
    pub fn parse(root: &str, scale_type: &str) -> Result<Self> {
        Scale::new(root.parse()?, scale_type.parse()?)
    }

    pub fn root(&self) -> Note {
        self.root
    }

    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    pub fn octaves(&self) -> u8 {
        self.octaves
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

    /// Number of distinct degrees per octave
    pub fn degrees_per_octave(&self) -> usize {
        self.scale_type.intervals().len()
    }

    /// Semitone offsets of this scale's type
    pub fn calculate_intervals(&self) -> Vec<u8> {
        self.scale_type.intervals().to_vec()
    }

    /// Note at a 1-based degree
    pub fn get_note_at_degree(&self, degree: usize) -> Result<Note> {
        if degree == 0 || degree > self.len() {
            return Err(MusicError::Range(format!(
                "degree {} outside 1..={} for {}",
                degree,
                self.len(),
                self
            )));
        }
        Ok(self.notes[degree - 1])
    }

    pub fn get_scale_degree(&self, degree: usize) -> Result<ScaleDegree> {
        let note = self.get_note_at_degree(degree)?;
        ScaleDegree::new(degree as u8, note)
    }

    /// Degree that may run past the generated notes (9, 11, 13), resolved by
    /// stepping up from the root
    pub fn get_compound_degree(&self, degree: u8) -> Result<ScaleDegree> {
        if degree == 0 {
            return Err(MusicError::Range("scale degrees start at 1".to_string()));
        }
        let note = self.step(&self.root, degree as i32 - 1)?;
        ScaleDegree::new(degree, note)
    }

    /// Root, third and fifth stacked on a degree.
    ///
    /// Triads only wrap into the next octave if it was generated.
    pub fn get_triad(&self, degree: usize) -> Result<[Note; 3]> {
        let first = self.get_note_at_degree(degree)?;
        let top = degree + 4;
        if top > self.len() {
            return Err(MusicError::Range(format!(
                "triad on degree {} needs degree {} but {} has {} notes",
                degree,
                top,
                self,
                self.len()
            )));
        }
        Ok([first, self.notes[degree + 1], self.notes[degree + 3]])
    }

    /// 1-based degree of a member note, matched by pitch
    pub fn get_degree_of_note(&self, note: &Note) -> Result<usize> {
        self.notes
            .iter()
            .position(|n| n.is_enharmonic(note))
            .map(|i| i + 1)
            .ok_or_else(|| MusicError::NotInScale {
                note: note.full_name(),
                scale: self.to_string(),
            })
    }

    /// Same scale type on a transposed root
    pub fn transpose(&self, semitones: Semitones) -> Result<Self> {
        Scale::with_octaves(self.root.transpose(semitones)?, self.scale_type, self.octaves)
    }

    pub fn contains(&self, note: &Note) -> bool {
        self.notes.iter().any(|n| n.is_enharmonic(note))
    }

    pub fn contains_pitch_class(&self, pc: PitchClass) -> bool {
        self.degree_of_pitch_class(pc).is_some()
    }

    /// 1-based degree (within one octave) holding a pitch class
    pub fn degree_of_pitch_class(&self, pc: PitchClass) -> Option<usize> {
        let offset = self.root.pitch_class().interval_to(pc);
        self.scale_type
            .intervals()
            .iter()
            .position(|&i| i == offset)
            .map(|i| i + 1)
    }

    /// Snap a MIDI note to the nearest member pitch; ties go down
    pub fn quantize(&self, midi: MidiNote) -> MidiNote {
        for distance in 0..=6i32 {
            for candidate in [midi as i32 - distance, midi as i32 + distance] {
                if (0..=127).contains(&candidate) && self.contains_pitch_class(PitchClass::from_semitone(candidate)) {
                    return candidate as MidiNote;
                }
            }
        }
        midi
    }

    /// Move a note by scale steps (positive = up, negative = down).
    ///
    /// Notes outside the scale start from the nearest member below.
    pub fn step(&self, note: &Note, steps: i32) -> Result<Note> {
        let intervals = self.scale_type.intervals();
        let len = intervals.len() as i32;
        let midi = self.quantize_down(note.midi_number()) as i32;
        let offset = self.root.pitch_class().interval_to(PitchClass::from_semitone(midi));
        let index = intervals.iter().position(|&i| i == offset).unwrap_or(0) as i32;
        let base = midi - offset as i32;

        let target = index + steps;
        let degree = target.rem_euclid(len) as usize;
        let target_midi = base + target.div_euclid(len) * 12 + intervals[degree] as i32;
        if !(0..=127).contains(&target_midi) {
            return Err(MusicError::Range(format!(
                "stepping {} by {} in {} gives MIDI {}",
                note.full_name(),
                steps,
                self,
                target_midi
            )));
        }

        let template = self.notes[degree].with_duration(note.duration())?.with_velocity(note.velocity())?;
        spell(target_midi, Some(self.notes[degree].letter()), &template)
    }

    fn quantize_down(&self, midi: MidiNote) -> MidiNote {
        (0..=11u8)
            .filter_map(|d| midi.checked_sub(d))
            .find(|&m| self.contains_pitch_class(PitchClass::from_semitone(m as i32)))
            .unwrap_or(midi)
    }

    /// The parallel scale (major <-> minor)
    pub fn parallel(&self) -> Option<Result<Scale>> {
        self.scale_type
            .parallel()
            .map(|st| Scale::with_octaves(self.root, st, self.octaves))
    }

    /// The relative scale (C major <-> A minor)
    pub fn relative(&self) -> Option<Result<Scale>> {
        let (semitones, st) = match self.scale_type {
            ScaleType::Major => (-3, ScaleType::NaturalMinor),
            ScaleType::NaturalMinor => (3, ScaleType::Major),
            _ => return None,
        };
        Some(
            self.root
                .transpose(semitones)
                .and_then(|root| Scale::with_octaves(root, st, self.octaves)),
        )
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root.name(), self.scale_type)
    }
}

/// Spell a MIDI number on a preferred letter, falling back to the
/// template's sharp/flat preference
fn spell(midi: i32, letter: Option<Letter>, template: &Note) -> Result<Note> {
    let pc = PitchClass::from_semitone(midi);
    if let Some(name) = letter.and_then(|l| NoteName::spell_on(l, pc)) {
        let octave = (midi - name.semitone_offset()).div_euclid(12) - 1;
        if let Ok(octave) = i8::try_from(octave) {
            if let Ok(note) = Note::new(name, octave, template.duration(), template.velocity()) {
                return Ok(note);
            }
        }
    }
    Note::from_midi_spelled(
        midi,
        template.accidental().is_flat(),
        template.duration(),
        template.velocity(),
    )
}

/// Default triad qualities for degrees 1-7 of a major key
pub const MAJOR_DEGREE_QUALITIES: [ChordQualityType; 7] = [
    ChordQualityType::Major,
    ChordQualityType::Minor,
    ChordQualityType::Minor,
    ChordQualityType::Major,
    ChordQualityType::Major,
    ChordQualityType::Minor,
    ChordQualityType::Diminished,
];

/// Default triad qualities for degrees 1-7 of a minor key
pub const MINOR_DEGREE_QUALITIES: [ChordQualityType; 7] = [
    ChordQualityType::Minor,
    ChordQualityType::Diminished,
    ChordQualityType::Major,
    ChordQualityType::Minor,
    ChordQualityType::Minor,
    ChordQualityType::Major,
    ChordQualityType::Major,
];

/// Key context: a root and scale type without materialized notes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleInfo {
    pub root: Note,
    pub scale_type: ScaleType,
}

impl ScaleInfo {
    pub fn new(root: Note, scale_type: ScaleType) -> Self {
        Self { root, scale_type }
    }

    /// Build from a key name ("C", "F#", "Bb4") and a scale-type label.
    ///
    /// Keys without an octave are placed in octave 4.
    pub fn from_key(key: &str, scale_type: &str) -> Result<Self> {
        let key = key.trim();
        let root = match key.parse::<NoteName>() {
            Ok(name) => Note::new(name, 4, DEFAULT_DURATION, DEFAULT_VELOCITY)?,
            Err(_) => Note::from_full_name(key)?,
        };
        Ok(Self::new(root, scale_type.parse()?))
    }

    /// Materialize the scale
    pub fn scale(&self) -> Result<Scale> {
        Scale::new(self.root, self.scale_type)
    }

    /// Key name without octave
    pub fn key_name(&self) -> String {
        self.root.name().to_string()
    }

    pub fn is_minor(&self) -> bool {
        self.scale_type.is_minor()
    }

    /// Degree-to-quality map for this key's context
    pub fn degree_qualities(&self) -> &'static [ChordQualityType; 7] {
        if self.is_minor() {
            &MINOR_DEGREE_QUALITIES
        } else {
            &MAJOR_DEGREE_QUALITIES
        }
    }

    /// Quality a chord on `degree` takes when none is given
    pub fn default_quality(&self, degree: u8) -> Result<ChordQualityType> {
        if !(1..=7).contains(&degree) {
            return Err(MusicError::Range(format!("degree {} outside 1..=7", degree)));
        }
        Ok(self.degree_qualities()[degree as usize - 1])
    }

    /// Note on a degree of this key
    pub fn get_note_for_degree(&self, degree: u8) -> Result<Note> {
        self.scale()?.get_note_at_degree(degree as usize)
    }

    /// Degree a chord root sits on, with its chromatic alteration (-1, 0, +1)
    pub fn get_scale_degree_for_root(&self, note: &Note) -> Result<(u8, i8)> {
        let scale = self.scale()?;
        let pc = note.pitch_class();
        if let Some(d) = scale.degree_of_pitch_class(pc) {
            return Ok((d as u8, 0));
        }
        // Prefer reading the root as a lowered degree (bVII, bIII)
        if let Some(d) = scale.degree_of_pitch_class(pc.transpose(1)) {
            return Ok((d as u8, -1));
        }
        if let Some(d) = scale.degree_of_pitch_class(pc.transpose(-1)) {
            return Ok((d as u8, 1));
        }
        Err(MusicError::NotInScale {
            note: note.full_name(),
            scale: scale.to_string(),
        })
    }

    /// Same root, other mode (major <-> minor)
    pub fn parallel(&self) -> Option<ScaleInfo> {
        self.scale_type.parallel().map(|st| ScaleInfo::new(self.root, st))
    }

    /// Relative key sharing the same pitch collection
    pub fn relative(&self) -> Option<Result<ScaleInfo>> {
        let (semitones, st) = match self.scale_type {
            ScaleType::Major => (-3, ScaleType::NaturalMinor),
            ScaleType::NaturalMinor => (3, ScaleType::Major),
            _ => return None,
        };
        Some(self.root.transpose(semitones).map(|root| ScaleInfo::new(root, st)))
    }

    /// Key a fifth above
    pub fn dominant(&self) -> Result<ScaleInfo> {
        Ok(ScaleInfo::new(self.root.transpose(7)?, self.scale_type))
    }

    /// Key a fourth above
    pub fn subdominant(&self) -> Result<ScaleInfo> {
        Ok(ScaleInfo::new(self.root.transpose(5)?, self.scale_type))
    }

    pub fn transpose(&self, semitones: Semitones) -> Result<ScaleInfo> {
        Ok(ScaleInfo::new(self.root.transpose(semitones)?, self.scale_type))
    }
}

impl fmt::Display for ScaleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root.name(), self.scale_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(s: &str) -> Note {
        Note::from_full_name(s).unwrap()
    }

    fn names(scale: &Scale) -> Vec<String> {
        scale.notes().iter().map(|n| n.full_name()).collect()
    }

    #[test]
    fn test_scale_type_intervals() {
        assert_eq!(ScaleType::Major.intervals(), &[0, 2, 4, 5, 7, 9, 11]);
        assert_eq!(ScaleType::NaturalMinor.intervals(), &[0, 2, 3, 5, 7, 8, 10]);
        assert_eq!(ScaleType::MinorPentatonic.intervals(), &[0, 3, 5, 7, 10]);
        assert_eq!(ScaleType::Chromatic.intervals().len(), 12);
    }

    #[test]
    fn test_scale_type_from_str() {
        assert_eq!("major".parse::<ScaleType>().unwrap(), ScaleType::Major);
        assert_eq!("Minor".parse::<ScaleType>().unwrap(), ScaleType::NaturalMinor);
        assert_eq!("harmonic_minor".parse::<ScaleType>().unwrap(), ScaleType::HarmonicMinor);
        assert_eq!("Whole Tone".parse::<ScaleType>().unwrap(), ScaleType::WholeTone);
        let err = "bebop".parse::<ScaleType>().unwrap_err();
        assert_eq!(err, MusicError::UnknownScaleType("bebop".to_string()));
    }

    #[test]
    fn test_scale_type_serde_names() {
        let yaml = serde_yaml::to_string(&ScaleType::HarmonicMinor).unwrap();
        assert_eq!(yaml.trim(), "harmonic_minor");
        let st: ScaleType = serde_yaml::from_str("natural_minor").unwrap();
        assert_eq!(st, ScaleType::NaturalMinor);
    }

    #[test]
    fn test_c_major_notes() {
        let c_major = Scale::new(note("C4"), ScaleType::Major).unwrap();
        assert_eq!(names(&c_major), ["C4", "D4", "E4", "F4", "G4", "A4", "B4"]);
    }

    #[test]
    fn test_diatonic_spelling() {
        let f_major = Scale::new(note("F4"), ScaleType::Major).unwrap();
        assert_eq!(names(&f_major), ["F4", "G4", "A4", "Bb4", "C5", "D5", "E5"]);

        let d_harmonic = Scale::new(note("D4"), ScaleType::HarmonicMinor).unwrap();
        assert_eq!(d_harmonic.notes()[6].full_name(), "C#5");

        let gs_harmonic = Scale::new(note("G#3"), ScaleType::HarmonicMinor).unwrap();
        assert_eq!(gs_harmonic.notes()[6].full_name(), "F##4");
        assert_eq!(gs_harmonic.notes()[6].midi_number(), 67);
    }

    #[test]
    fn test_member_counts() {
        for st in ScaleType::ALL {
            let scale = Scale::new(note("C4"), st).unwrap();
            assert_eq!(scale.len(), st.intervals().len());
            assert!(scale.notes()[0].is_enharmonic(&note("C4")));
        }
    }

    #[test]
    fn test_scale_is_deterministic() {
        let a = Scale::new(note("Eb3"), ScaleType::Dorian).unwrap();
        let b = Scale::new(note("Eb3"), ScaleType::Dorian).unwrap();
        assert_eq!(a, b);
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn test_degree_bounds() {
        let scale = Scale::new(note("C4"), ScaleType::Major).unwrap();
        assert_eq!(scale.get_note_at_degree(1).unwrap().full_name(), "C4");
        assert_eq!(scale.get_note_at_degree(7).unwrap().full_name(), "B4");
        assert_eq!(scale.get_note_at_degree(0).unwrap_err().code(), "range_error");
        assert_eq!(scale.get_note_at_degree(8).unwrap_err().code(), "range_error");
        assert_eq!(scale.get_scale_degree(5).unwrap().value, 5);
    }

    #[test]
    fn test_degree_round_trip() {
        for st in ScaleType::ALL {
            let scale = Scale::new(note("A3"), st).unwrap();
            for degree in 1..=scale.len() {
                let n = scale.get_note_at_degree(degree).unwrap();
                assert_eq!(scale.get_degree_of_note(&n).unwrap(), degree);
            }
        }
    }

    #[test]
    fn test_not_in_scale() {
        let scale = Scale::new(note("C4"), ScaleType::Major).unwrap();
        let err = scale.get_degree_of_note(&note("F#4")).unwrap_err();
        assert_eq!(err.code(), "not_in_scale");
        // Different octave is a different member
        assert!(scale.get_degree_of_note(&note("C5")).is_err());
    }

    #[test]
    fn test_triads() {
        let scale = Scale::new(note("C4"), ScaleType::Major).unwrap();
        let triad = scale.get_triad(1).unwrap();
        assert_eq!(triad.map(|n| n.full_name()), ["C4", "E4", "G4"]);
        assert_eq!(scale.get_triad(3).unwrap().map(|n| n.full_name()), ["E4", "G4", "B4"]);
        assert_eq!(scale.get_triad(4).unwrap_err().code(), "range_error");

        let two = Scale::with_octaves(note("C4"), ScaleType::Major, 2).unwrap();
        assert_eq!(two.len(), 14);
        assert_eq!(two.get_triad(5).unwrap().map(|n| n.full_name()), ["G4", "B4", "D5"]);
    }

    #[test]
    fn test_transpose() {
        let scale = Scale::new(note("C4"), ScaleType::Major).unwrap();
        let d = scale.transpose(2).unwrap();
        assert_eq!(names(&d), ["D4", "E4", "F#4", "G4", "A4", "B4", "C#5"]);
        assert_eq!(scale.transpose(80).unwrap_err().code(), "range_error");
    }

    #[test]
    fn test_construction_out_of_range() {
        assert_eq!(Scale::new(note("F9"), ScaleType::Major).unwrap_err().code(), "range_error");
        assert_eq!(
            Scale::with_octaves(note("C4"), ScaleType::Major, 0).unwrap_err().code(),
            "validation_error"
        );
    }

    #[test]
    fn test_quantize() {
        let c_major = Scale::new(note("C4"), ScaleType::Major).unwrap();
        assert_eq!(c_major.quantize(60), 60);
        assert_eq!(c_major.quantize(61), 60);
        assert_eq!(c_major.quantize(66), 65);
        assert_eq!(c_major.quantize(70), 69);
    }

    #[test]
    fn test_step() {
        let c_major = Scale::new(note("C4"), ScaleType::Major).unwrap();
        assert_eq!(c_major.step(&note("C4"), 3).unwrap().full_name(), "F4");
        assert_eq!(c_major.step(&note("C4"), -1).unwrap().full_name(), "B3");
        assert_eq!(c_major.step(&note("G4"), 1).unwrap().full_name(), "A4");
        assert_eq!(c_major.step(&note("C4"), 7).unwrap().full_name(), "C5");

        let d_minor = Scale::new(note("D4"), ScaleType::NaturalMinor).unwrap();
        assert_eq!(d_minor.step(&note("D4"), 5).unwrap().full_name(), "Bb4");
    }

    #[test]
    fn test_compound_degree() {
        let scale = Scale::new(note("C4"), ScaleType::Major).unwrap();
        let ninth = scale.get_compound_degree(9).unwrap();
        assert_eq!(ninth.note.full_name(), "D5");
        assert_eq!(ninth.simple(scale.len()), 2);
        assert_eq!(scale.get_compound_degree(11).unwrap().note.full_name(), "F5");
    }

    #[test]
    fn test_relative_and_parallel() {
        let c_major = Scale::new(note("C4"), ScaleType::Major).unwrap();
        let relative = c_major.relative().unwrap().unwrap();
        assert_eq!(relative.root().full_name(), "A3");
        assert_eq!(relative.scale_type(), ScaleType::NaturalMinor);

        let parallel = c_major.parallel().unwrap().unwrap();
        assert_eq!(parallel.scale_type(), ScaleType::NaturalMinor);
        assert_eq!(names(&parallel)[2], "Eb4");

        assert!(Scale::new(note("C4"), ScaleType::Lydian).unwrap().relative().is_none());
    }

    #[test]
    fn test_scale_info_from_key() {
        let info = ScaleInfo::from_key("C", "major").unwrap();
        assert_eq!(info.root.full_name(), "C4");
        assert_eq!(info.key_name(), "C");

        let info = ScaleInfo::from_key("Bb3", "minor").unwrap();
        assert_eq!(info.root.midi_number(), 58);
        assert!(info.is_minor());

        assert_eq!(ScaleInfo::from_key("C", "bebop").unwrap_err().code(), "unknown_scale_type");
        assert_eq!(ScaleInfo::from_key("Q", "major").unwrap_err().code(), "parse_error");
    }

    #[test]
    fn test_default_qualities() {
        let major = ScaleInfo::from_key("C", "major").unwrap();
        assert_eq!(major.default_quality(2).unwrap(), ChordQualityType::Minor);
        assert_eq!(major.default_quality(5).unwrap(), ChordQualityType::Major);
        assert_eq!(major.default_quality(7).unwrap(), ChordQualityType::Diminished);
        assert_eq!(major.default_quality(8).unwrap_err().code(), "range_error");

        let minor = ScaleInfo::from_key("A", "natural_minor").unwrap();
        assert_eq!(minor.default_quality(1).unwrap(), ChordQualityType::Minor);
        assert_eq!(minor.default_quality(2).unwrap(), ChordQualityType::Diminished);
        assert_eq!(minor.default_quality(3).unwrap(), ChordQualityType::Major);
    }

    #[test]
    fn test_root_degree_lookup() {
        let info = ScaleInfo::from_key("C", "major").unwrap();
        assert_eq!(info.get_scale_degree_for_root(&note("G2")).unwrap(), (5, 0));
        assert_eq!(info.get_scale_degree_for_root(&note("Bb3")).unwrap(), (7, -1));
        assert_eq!(info.get_scale_degree_for_root(&note("F#3")).unwrap(), (5, -1));

        let pentatonic = ScaleInfo::from_key("C", "major_pentatonic").unwrap();
        assert!(pentatonic.get_scale_degree_for_root(&note("F4")).is_ok());
    }

    #[test]
    fn test_key_relationships() {
        let c = ScaleInfo::from_key("C", "major").unwrap();
        assert_eq!(c.dominant().unwrap().key_name(), "G");
        assert_eq!(c.subdominant().unwrap().key_name(), "F");
        assert_eq!(c.relative().unwrap().unwrap().key_name(), "A");
        assert_eq!(c.parallel().unwrap().scale_type, ScaleType::NaturalMinor);
        assert_eq!(c.transpose(2).unwrap().key_name(), "D");
    }
}
