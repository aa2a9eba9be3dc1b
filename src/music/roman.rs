// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Roman numeral analysis.
//!
//! Numerals encode a scale degree, a chord quality, an optional chromatic
//! alteration (`bVII`) and an optional figured-bass inversion (`V65`).
//! Case carries the quality when no symbol does: upper case is major,
//! lower case is minor. `°`, `ø` and `+` override case.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MusicError, Result};
use crate::music::chord::{Chord, ChordQualityType};
use crate::music::scale::ScaleInfo;

const INT_TO_ROMAN: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

const ROMAN_PATTERN: &str = r"^(?P<acc>[b#]?)(?P<base>VII|VI|V|IV|III|II|I|vii|vi|v|iv|iii|ii|i)(?P<rest>.*)$";

static ROMAN_REGEX: OnceLock<Regex> = OnceLock::new();

fn roman_regex() -> &'static Regex {
    ROMAN_REGEX.get_or_init(|| Regex::new(ROMAN_PATTERN).expect("invalid regex pattern"))
}

/// Figured-bass suffixes, longest first so "64" is tried before "6"
const INVERSION_NOTATION: [(&str, u8, bool); 5] = [
    ("65", 1, true),
    ("43", 2, true),
    ("42", 3, true),
    ("64", 2, false),
    ("6", 1, false),
];

fn roman_to_int(base: &str) -> Option<u8> {
    let upper = base.to_uppercase();
    INT_TO_ROMAN
        .iter()
        .position(|r| *r == upper)
        .map(|i| i as u8 + 1)
}

/// Figure for an inversion, if the quality has one
fn inversion_figure(quality: ChordQualityType, inversion: u8) -> Option<&'static str> {
    if inversion == 0 {
        return Some("");
    }
    let seventh = quality.is_seventh();
    if !seventh && !quality.is_triad() {
        return None;
    }
    INVERSION_NOTATION
        .iter()
        .find(|(_, inv, is_seventh)| *inv == inversion && *is_seventh == seventh)
        .map(|(figure, _, _)| *figure)
}

/// Quality marker written after the numeral in root position
fn quality_suffix(quality: ChordQualityType) -> &'static str {
    match quality {
        ChordQualityType::Major | ChordQualityType::Minor => "",
        ChordQualityType::Diminished => "°",
        ChordQualityType::Augmented => "+",
        ChordQualityType::Dominant7 | ChordQualityType::Minor7 => "7",
        ChordQualityType::Major7 => "maj7",
        ChordQualityType::HalfDiminished7 => "ø7",
        ChordQualityType::Diminished7 => "°7",
        ChordQualityType::Augmented7 => "+7",
        ChordQualityType::Sus2 => "sus2",
        ChordQualityType::Sus4 => "sus4",
        ChordQualityType::Dominant9 | ChordQualityType::Minor9 => "9",
        ChordQualityType::Major9 => "maj9",
        ChordQualityType::Dominant11 | ChordQualityType::Minor11 => "11",
        ChordQualityType::Major11 => "maj11",
    }
}

/// Marker kept in front of a seventh-chord inversion figure ("V65", "viiø43")
fn seventh_marker(quality: ChordQualityType) -> &'static str {
    match quality {
        ChordQualityType::Major7 => "maj",
        ChordQualityType::Diminished7 => "°",
        ChordQualityType::HalfDiminished7 => "ø",
        ChordQualityType::Augmented7 => "+",
        _ => "",
    }
}

fn triad_from_marker(marker: &str, upper: bool) -> Option<ChordQualityType> {
    match marker {
        "" if upper => Some(ChordQualityType::Major),
        "" => Some(ChordQualityType::Minor),
        "°" | "o" => Some(ChordQualityType::Diminished),
        "+" => Some(ChordQualityType::Augmented),
        "sus2" => Some(ChordQualityType::Sus2),
        "sus4" => Some(ChordQualityType::Sus4),
        _ => None,
    }
}

fn seventh_from_marker(marker: &str, upper: bool) -> Option<ChordQualityType> {
    match marker {
        "" if upper => Some(ChordQualityType::Dominant7),
        "" => Some(ChordQualityType::Minor7),
        "maj" | "M" => Some(ChordQualityType::Major7),
        "°" | "o" => Some(ChordQualityType::Diminished7),
        "ø" => Some(ChordQualityType::HalfDiminished7),
        "+" => Some(ChordQualityType::Augmented7),
        _ => None,
    }
}

fn root_position_quality(rest: &str, upper: bool) -> Option<ChordQualityType> {
    if let Some(quality) = triad_from_marker(rest, upper) {
        return Some(quality);
    }
    let quality = match rest {
        "7" if upper => ChordQualityType::Dominant7,
        "7" => ChordQualityType::Minor7,
        "maj7" | "M7" => ChordQualityType::Major7,
        "ø7" | "ø" => ChordQualityType::HalfDiminished7,
        "°7" | "o7" => ChordQualityType::Diminished7,
        "+7" => ChordQualityType::Augmented7,
        "9" if upper => ChordQualityType::Dominant9,
        "9" => ChordQualityType::Minor9,
        "maj9" | "M9" => ChordQualityType::Major9,
        "11" if upper => ChordQualityType::Dominant11,
        "11" => ChordQualityType::Minor11,
        "maj11" | "M11" => ChordQualityType::Major11,
        _ => return None,
    };
    Some(quality)
}

/// A chord expressed as a Roman numeral in some key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RomanNumeral {
    degree: u8,
    quality: ChordQualityType,
    inversion: u8,
    alteration: i8,
}

impl RomanNumeral {
    /// Root-position numeral on a diatonic degree
    pub fn new(degree: u8, quality: ChordQualityType) -> Result<Self> {
        Self::with_details(degree, quality, 0, 0)
    }

    /// Numeral with an inversion and a chromatic alteration (-1 = flat, +1 = sharp)
    pub fn with_details(degree: u8, quality: ChordQualityType, inversion: u8, alteration: i8) -> Result<Self> {
        if !(1..=7).contains(&degree) {
            return Err(MusicError::Range(format!("scale degree {} outside 1..=7", degree)));
        }
        if !(-1..=1).contains(&alteration) {
            return Err(MusicError::Range(format!(
                "alteration {} outside -1..=1",
                alteration
            )));
        }
        if inversion_figure(quality, inversion).is_none() {
            return Err(MusicError::Range(format!(
                "no inversion figure for inversion {} of a {} chord",
                inversion, quality
            )));
        }
        Ok(Self {
            degree,
            quality,
            inversion,
            alteration,
        })
    }

    /// Numeral string for a degree and quality, e.g. (5, Dominant7) -> "V7"
    pub fn from_scale_degree(degree: u8, quality: ChordQualityType) -> Result<String> {
        Ok(RomanNumeral::new(degree, quality)?.to_string())
    }

    /// Degree and quality encoded by a numeral string
    pub fn to_scale_degree(numeral: &str) -> Result<(u8, ChordQualityType)> {
        let parsed: RomanNumeral = numeral.parse()?;
        Ok((parsed.degree, parsed.quality))
    }

    pub fn degree(&self) -> u8 {
        self.degree
    }

    pub fn quality(&self) -> ChordQualityType {
        self.quality
    }

    pub fn inversion(&self) -> u8 {
        self.inversion
    }

    pub fn alteration(&self) -> i8 {
        self.alteration
    }

    /// Build the chord this numeral names in a key
    pub fn to_chord(&self, info: &ScaleInfo) -> Result<Chord> {
        let root = info
            .get_note_for_degree(self.degree)?
            .transpose(self.alteration as i32)?;
        Chord::with_inversion(root, self.quality, self.inversion)
    }

    /// Analyse a chord against a key
    pub fn from_chord(chord: &Chord, info: &ScaleInfo) -> Result<Self> {
        let (degree, alteration) = info.get_scale_degree_for_root(&chord.root())?;
        RomanNumeral::with_details(degree, chord.quality(), chord.inversion(), alteration)
    }
}

impl FromStr for RomanNumeral {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let caps = roman_regex()
            .captures(trimmed)
            .ok_or_else(|| MusicError::parse("roman numeral", s))?;

        let base = &caps["base"];
        let degree = roman_to_int(base).ok_or_else(|| MusicError::parse("roman numeral", s))?;
        let upper = base.chars().all(|c| c.is_ascii_uppercase());
        let alteration = match &caps["acc"] {
            "b" => -1,
            "#" => 1,
            _ => 0,
        };

        let rest = &caps["rest"];
        let (quality, inversion) = match INVERSION_NOTATION
            .iter()
            .find(|(figure, _, _)| rest.ends_with(figure))
        {
            Some((figure, inversion, true)) => {
                let marker = &rest[..rest.len() - figure.len()];
                (seventh_from_marker(marker, upper), *inversion)
            }
            Some((figure, inversion, false)) => {
                let marker = &rest[..rest.len() - figure.len()];
                (triad_from_marker(marker, upper), *inversion)
            }
            None => (root_position_quality(rest, upper), 0),
        };

        let quality = quality.ok_or_else(|| MusicError::parse("roman numeral", s))?;
        RomanNumeral::with_details(degree, quality, inversion, alteration)
    }
}

impl fmt::Display for RomanNumeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accidental = match self.alteration {
            -1 => "b",
            1 => "#",
            _ => "",
        };
        let base = INT_TO_ROMAN[self.degree as usize - 1];
        let base = if self.quality.is_major_family() {
            base.to_string()
        } else {
            base.to_lowercase()
        };
        let figure = inversion_figure(self.quality, self.inversion).unwrap_or("");
        if self.inversion > 0 && self.quality.is_seventh() {
            write!(f, "{}{}{}{}", accidental, base, seventh_marker(self.quality), figure)
        } else {
            write!(f, "{}{}{}{}", accidental, base, quality_suffix(self.quality), figure)
        }
    }
}

impl TryFrom<String> for RomanNumeral {
    type Error = MusicError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<RomanNumeral> for String {
    fn from(numeral: RomanNumeral) -> Self {
        numeral.to_string()
    }
}
