// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Abstract note patterns.
//!
//! A pattern is key-independent: its elements only become notes once an
//! interpreter resolves them against a scale and chord.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::presets;
use crate::error::{MusicError, Result};
use crate::music::note::{Note, MAX_OCTAVE, MIN_OCTAVE};
use crate::music::scale::ScaleDegree;

/// Longest pattern accepted
pub const MAX_PATTERN_LENGTH: usize = 64;

/// Octaves a pattern may span by default
pub const DEFAULT_OCTAVE_RANGE: (i8, i8) = (2, 6);

/// One step of a pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternElement {
    /// 1-based scale or chord degree; values past the end climb octaves
    Degree(u8),
    /// Semitones from the previous resolved note
    Interval(i32),
    /// Note name with or without octave ("E", "F#5")
    Name(String),
    Note(Note),
    ScaleDegree(ScaleDegree),
    /// Silence of the given length in beats
    Rest(f64),
}

impl fmt::Display for PatternElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternElement::Degree(d) => write!(f, "degree {}", d),
            PatternElement::Interval(i) => write!(f, "interval {:+}", i),
            PatternElement::Name(name) => write!(f, "name {}", name),
            PatternElement::Note(note) => write!(f, "note {}", note),
            PatternElement::ScaleDegree(sd) => write!(f, "scale degree {}", sd.value),
            PatternElement::Rest(beats) => write!(f, "rest {}", beats),
        }
    }
}

/// Traversal direction through chord or scale tones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternDirection {
    #[default]
    #[serde(alias = "forward")]
    Up,
    #[serde(alias = "backward")]
    Down,
    /// Up on even passes through the pattern, down on odd ones
    #[serde(alias = "alternating")]
    Alternate,
    Random,
}

impl FromStr for PatternDirection {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "up" | "forward" => Ok(PatternDirection::Up),
            "down" | "backward" => Ok(PatternDirection::Down),
            "alternate" | "alternating" => Ok(PatternDirection::Alternate),
            "random" => Ok(PatternDirection::Random),
            _ => Err(MusicError::parse("pattern direction", s)),
        }
    }
}

fn default_octave_range() -> (i8, i8) {
    DEFAULT_OCTAVE_RANGE
}

/// Pattern elements plus the policy for resolving them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotePatternData {
    pub elements: Vec<PatternElement>,
    #[serde(default)]
    pub use_chord_tones: bool,
    /// Read intervals as scale steps instead of semitones
    #[serde(default)]
    pub use_scale_mode: bool,
    #[serde(default)]
    pub arpeggio_mode: bool,
    /// Restart the pattern whenever the chord changes
    #[serde(default)]
    pub restart_on_chord: bool,
    #[serde(default)]
    pub direction: PatternDirection,
    #[serde(default = "default_octave_range")]
    pub octave_range: (i8, i8),
}

impl NotePatternData {
    pub fn new(elements: Vec<PatternElement>) -> Self {
        Self {
            elements,
            use_chord_tones: false,
            use_scale_mode: false,
            arpeggio_mode: false,
            restart_on_chord: false,
            direction: PatternDirection::default(),
            octave_range: DEFAULT_OCTAVE_RANGE,
        }
    }

    pub fn with_direction(mut self, direction: PatternDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_octave_range(mut self, low: i8, high: i8) -> Self {
        self.octave_range = (low, high);
        self
    }

    pub fn chord_tones(mut self) -> Self {
        self.use_chord_tones = true;
        self
    }

    pub fn scale_mode(mut self) -> Self {
        self.use_scale_mode = true;
        self
    }

    pub fn arpeggio(mut self) -> Self {
        self.arpeggio_mode = true;
        self
    }

    pub fn restarting(mut self) -> Self {
        self.restart_on_chord = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.elements.is_empty() {
            return Err(MusicError::Validation("note pattern has no elements".to_string()));
        }
        if self.elements.len() > MAX_PATTERN_LENGTH {
            return Err(MusicError::Validation(format!(
                "note pattern has {} elements, limit is {}",
                self.elements.len(),
                MAX_PATTERN_LENGTH
            )));
        }
        let (low, high) = self.octave_range;
        if low > high || low < MIN_OCTAVE || high > MAX_OCTAVE {
            return Err(MusicError::Range(format!(
                "octave range {}..={} must be ordered within {}..={}",
                low, high, MIN_OCTAVE, MAX_OCTAVE
            )));
        }
        for element in &self.elements {
            match element {
                PatternElement::Degree(0) => {
                    return Err(MusicError::Validation("pattern degrees start at 1".to_string()))
                }
                PatternElement::Rest(beats) if !beats.is_finite() || *beats <= 0.0 => {
                    return Err(MusicError::Validation(format!("rest length {} must be positive", beats)))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// A named, validated note pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NotePatternRecord")]
pub struct NotePattern {
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    data: NotePatternData,
}

impl NotePattern {
    pub fn new(name: impl Into<String>, data: NotePatternData) -> Result<Self> {
        data.validate()?;
        Ok(Self {
            name: name.into(),
            description: String::new(),
            data,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Pattern of running semitone intervals
    pub fn from_intervals(name: impl Into<String>, intervals: &[i32]) -> Result<Self> {
        let elements = intervals.iter().map(|&i| PatternElement::Interval(i)).collect();
        NotePattern::new(name, NotePatternData::new(elements))
    }

    /// Pattern of scale degrees
    pub fn from_degrees(name: impl Into<String>, degrees: &[u8]) -> Result<Self> {
        let elements = degrees.iter().map(|&d| PatternElement::Degree(d)).collect();
        NotePattern::new(name, NotePatternData::new(elements))
    }

    /// Built-in interval pattern such as "simple_triad"
    pub fn from_preset(name: &str) -> Result<Self> {
        let preset = presets::note_pattern_preset(name)
            .ok_or_else(|| MusicError::Pattern(format!("unknown note pattern preset '{}'", name)))?;
        Ok(NotePattern::from_intervals(preset.name, &preset.intervals())?.with_description(preset.description))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn data(&self) -> &NotePatternData {
        &self.data
    }

    pub fn elements(&self) -> &[PatternElement] {
        &self.data.elements
    }

    pub fn len(&self) -> usize {
        self.data.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.elements.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct NotePatternRecord {
    name: String,
    #[serde(default)]
    description: String,
    data: NotePatternData,
}

impl TryFrom<NotePatternRecord> for NotePattern {
    type Error = MusicError;

    fn try_from(record: NotePatternRecord) -> Result<Self> {
        Ok(NotePattern::new(record.name, record.data)?.with_description(record.description))
    }
}
