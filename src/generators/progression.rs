// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord progression generator.
//!
//! Builds progressions in a key from Roman numeral patterns, explicit
//! degree/quality lists, genre templates, presets or at random. Also scores
//! progression complexity and inserts dominant preparation before returns
//! to the tonic.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::presets;
use crate::error::{MusicError, Result};
use crate::music::chord::{Chord, ChordQualityType};
use crate::music::note::Semitones;
use crate::music::roman::RomanNumeral;
use crate::music::scale::{ScaleInfo, ScaleType};

use ChordQualityType::{Dominant7, Major, Major7, Minor};

/// Genre templates as (degree, quality) pairs
const GENRE_PATTERNS: &[(&str, &[(u8, ChordQualityType)])] = &[
    ("pop", &[(1, Major), (4, Major), (5, Major), (1, Major)]),
    ("jazz", &[(2, Minor), (5, Dominant7), (1, Major7), (4, Major7)]),
    ("blues", &[(1, Dominant7), (4, Dominant7), (5, Dominant7), (1, Dominant7)]),
    ("classical", &[(1, Major), (5, Major), (4, Major), (1, Major)]),
];

/// Weights of the complexity components
const VARIETY_WEIGHT: f64 = 0.4;
const MOVEMENT_WEIGHT: f64 = 0.3;
const TENSION_WEIGHT: f64 = 0.3;

/// An ordered list of chords in a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProgressionRecord")]
pub struct ChordProgression {
    name: String,
    key: String,
    scale_type: ScaleType,
    scale_info: ScaleInfo,
    chords: Vec<Chord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    complexity: Option<f64>,
}

impl ChordProgression {
    /// Create a progression, checking every root belongs to the key
    pub fn new(name: impl Into<String>, scale_info: ScaleInfo, chords: Vec<Chord>) -> Result<Self> {
        if chords.is_empty() {
            return Err(MusicError::Validation("chord progression needs at least one chord".to_string()));
        }
        for chord in &chords {
            scale_info.get_scale_degree_for_root(&chord.root())?;
        }
        Ok(Self {
            name: name.into(),
            key: scale_info.key_name(),
            scale_type: scale_info.scale_type,
            scale_info,
            chords,
            complexity: None,
        })
    }

    /// Attach a complexity score in 0..=1
    pub fn with_complexity(mut self, complexity: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&complexity) {
            return Err(MusicError::Validation(format!(
                "complexity {} outside 0..=1",
                complexity
            )));
        }
        self.complexity = Some(complexity);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    pub fn scale_info(&self) -> &ScaleInfo {
        &self.scale_info
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn complexity(&self) -> Option<f64> {
        self.complexity
    }

    /// Analyse each chord as a Roman numeral in this key
    pub fn roman_numerals(&self) -> Result<Vec<RomanNumeral>> {
        self.chords
            .iter()
            .map(|chord| RomanNumeral::from_chord(chord, &self.scale_info))
            .collect()
    }

    /// Same progression in another key
    pub fn transpose(&self, semitones: Semitones) -> Result<Self> {
        let scale_info = self.scale_info.transpose(semitones)?;
        let chords = self
            .chords
            .iter()
            .map(|chord| chord.transpose(semitones))
            .collect::<Result<Vec<_>>>()?;
        let mut transposed = ChordProgression::new(self.name.clone(), scale_info, chords)?;
        transposed.complexity = self.complexity;
        Ok(transposed)
    }

    /// Re-voice each chord in the inversion closest to the previous one
    pub fn voice_led(&self) -> Result<Self> {
        let mut chords: Vec<Chord> = Vec::with_capacity(self.chords.len());
        for chord in &self.chords {
            let next = match chords.last() {
                Some(previous) => chord.voice_led_from(previous)?,
                None => chord.clone(),
            };
            chords.push(next);
        }
        Ok(Self {
            chords,
            ..self.clone()
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProgressionRecord {
    name: String,
    scale_info: ScaleInfo,
    chords: Vec<Chord>,
    #[serde(default)]
    complexity: Option<f64>,
}

impl TryFrom<ProgressionRecord> for ChordProgression {
    type Error = MusicError;

    fn try_from(record: ProgressionRecord) -> Result<Self> {
        let progression = ChordProgression::new(record.name, record.scale_info, record.chords)?;
        match record.complexity {
            Some(c) => progression.with_complexity(c),
            None => Ok(progression),
        }
    }
}

/// Chord progression generator for one key
pub struct ChordProgressionGenerator {
    scale_info: ScaleInfo,
    /// Chance a randomly drawn triad is extended to a seventh (0.0 - 1.0)
    seventh_probability: f64,
    rng: StdRng,
}

impl ChordProgressionGenerator {
    /// Create a generator seeded from entropy
    pub fn new(scale_info: ScaleInfo) -> Self {
        Self {
            scale_info,
            seventh_probability: 0.0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a generator with reproducible random choices
    pub fn with_seed(scale_info: ScaleInfo, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(scale_info)
        }
    }

    pub fn with_seventh_probability(mut self, probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(MusicError::Range(format!(
                "seventh probability {} outside 0..=1",
                probability
            )));
        }
        self.seventh_probability = probability;
        Ok(self)
    }

    pub fn scale_info(&self) -> &ScaleInfo {
        &self.scale_info
    }

    /// Chord on a scale degree of the key
    pub fn chord_for_degree(&self, degree: u8, quality: ChordQualityType) -> Result<Chord> {
        let root = self.scale_info.get_note_for_degree(degree)?;
        Chord::new(root, quality)
    }

    /// Resolve Roman numeral tokens into a progression
    pub fn generate_from_pattern<S: AsRef<str>>(&self, pattern: &[S]) -> Result<ChordProgression> {
        if pattern.is_empty() {
            return Err(MusicError::Pattern("progression pattern is empty".to_string()));
        }

        let chords = pattern
            .iter()
            .enumerate()
            .map(|(index, token)| {
                let token = token.as_ref();
                token
                    .parse::<RomanNumeral>()
                    .and_then(|numeral| numeral.to_chord(&self.scale_info))
                    .map_err(|e| {
                        MusicError::Pattern(format!("cannot resolve '{}' at position {}: {}", token, index, e))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let name = pattern.iter().map(|t| t.as_ref()).collect::<Vec<_>>().join("-");
        debug!(%name, key = %self.scale_info, "generated progression from pattern");
        self.finish(name, chords)
    }

    /// Resolve explicit (degree, quality) pairs into a progression
    pub fn generate_from_degrees(&self, pairs: &[(u8, ChordQualityType)]) -> Result<ChordProgression> {
        if pairs.is_empty() {
            return Err(MusicError::Pattern("progression pattern is empty".to_string()));
        }
        let chords = pairs
            .iter()
            .enumerate()
            .map(|(index, &(degree, quality))| {
                self.chord_for_degree(degree, quality).map_err(|e| {
                    MusicError::Pattern(format!("cannot resolve degree {} at position {}: {}", degree, index, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let name = self.numeral_name(pairs);
        self.finish(name, chords)
    }

    /// Random progression: uniform degrees, qualities from the key's map
    pub fn generate_random(&mut self, length: usize) -> Result<ChordProgression> {
        if length == 0 {
            return Err(MusicError::Validation("progression length must be positive".to_string()));
        }

        let degree_count = self.scale_info.scale()?.degrees_per_octave().min(7) as u8;
        let mut pairs = Vec::with_capacity(length);
        for _ in 0..length {
            let degree = self.rng.gen_range(1..=degree_count);
            let mut quality = self.scale_info.default_quality(degree)?;
            if self.rng.gen::<f64>() < self.seventh_probability {
                quality = quality.with_seventh(degree == 5);
            }
            debug!(degree, %quality, "random progression chord");
            pairs.push((degree, quality));
        }

        let chords = pairs
            .iter()
            .map(|&(degree, quality)| self.chord_for_degree(degree, quality))
            .collect::<Result<Vec<_>>>()?;
        self.finish("Random Progression".to_string(), chords)
    }

    /// Progression from parallel degree and quality lists
    pub fn generate_custom(&self, degrees: &[u8], qualities: &[ChordQualityType]) -> Result<ChordProgression> {
        if degrees.len() != qualities.len() {
            return Err(MusicError::MismatchedLength {
                degrees: degrees.len(),
                qualities: qualities.len(),
            });
        }
        let chords = degrees
            .iter()
            .zip(qualities)
            .map(|(&degree, &quality)| self.chord_for_degree(degree, quality))
            .collect::<Result<Vec<_>>>()?;
        self.finish("Custom Progression".to_string(), chords)
    }

    /// Genre template repeated to `length` chords
    pub fn generate_genre(&self, genre: &str, length: usize) -> Result<ChordProgression> {
        let wanted = genre.trim().to_lowercase();
        let template = GENRE_PATTERNS
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, template)| *template)
            .ok_or_else(|| MusicError::UnknownGenre(genre.to_string()))?;
        if length == 0 {
            return Err(MusicError::Validation("progression length must be positive".to_string()));
        }

        let pairs: Vec<(u8, ChordQualityType)> = template.iter().copied().cycle().take(length).collect();
        let progression = self.generate_from_degrees(&pairs)?;
        Ok(ChordProgression {
            name: wanted,
            ..progression
        })
    }

    /// Named preset such as "I-V-vi-IV" or "canon"
    pub fn generate_preset(&self, name: &str) -> Result<ChordProgression> {
        let preset = presets::progression_preset(name)
            .ok_or_else(|| MusicError::Pattern(format!("unknown progression preset '{}'", name)))?;
        let progression = self.generate_from_pattern(preset.numerals)?;
        Ok(ChordProgression {
            name: preset.name.to_string(),
            ..progression
        })
    }

    /// Insert a V7 before each return to the tonic that lacks one.
    ///
    /// The first chord is never prepared, so the result has at most
    /// `2 * len - 1` chords.
    pub fn generate_with_tension(&self, progression: &ChordProgression) -> Result<ChordProgression> {
        let dominant = self.chord_for_degree(5, Dominant7)?;
        let mut chords: Vec<Chord> = Vec::with_capacity(progression.len() * 2);
        let mut previous_degree: Option<u8> = None;

        for chord in progression.chords() {
            let (degree, alteration) = self.scale_info.get_scale_degree_for_root(&chord.root())?;
            let is_tonic = degree == 1 && alteration == 0;
            if is_tonic && previous_degree.is_some() && previous_degree != Some(5) {
                debug!(position = chords.len(), "inserting dominant before tonic");
                chords.push(dominant.clone());
            }
            chords.push(chord.clone());
            previous_degree = Some(if alteration == 0 { degree } else { 0 });
        }

        self.finish(format!("{} (with tension)", progression.name()), chords)
    }

    /// Score a chord list in 0..=1 from quality variety, root movement and
    /// share of tension chords
    pub fn calculate_pattern_complexity(chords: &[Chord]) -> f64 {
        if chords.is_empty() {
            return 0.0;
        }

        let distinct: HashSet<ChordQualityType> = chords.iter().map(Chord::quality).collect();
        let variety = if chords.len() > 1 {
            (distinct.len() - 1) as f64 / (chords.len() - 1) as f64
        } else {
            0.0
        };

        let movement = if chords.len() > 1 {
            let total: u32 = chords
                .windows(2)
                .map(|pair| {
                    let d = pair[0].root().pitch_class().interval_to(pair[1].root().pitch_class()) as u32;
                    d.min(12 - d)
                })
                .sum();
            total as f64 / (chords.len() - 1) as f64 / 6.0
        } else {
            0.0
        };

        let tension = chords.iter().filter(|c| c.quality().is_tension()).count() as f64 / chords.len() as f64;

        (VARIETY_WEIGHT * variety + MOVEMENT_WEIGHT * movement + TENSION_WEIGHT * tension).clamp(0.0, 1.0)
    }

    fn numeral_name(&self, pairs: &[(u8, ChordQualityType)]) -> String {
        pairs
            .iter()
            .map(|&(degree, quality)| {
                RomanNumeral::from_scale_degree(degree, quality).unwrap_or_else(|_| degree.to_string())
            })
            .collect::<Vec<_>>()
            .join("-")
    }

    fn finish(&self, name: String, chords: Vec<Chord>) -> Result<ChordProgression> {
        let complexity = Self::calculate_pattern_complexity(&chords);
        ChordProgression::new(name, self.scale_info, chords)?.with_complexity(complexity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_major() -> ChordProgressionGenerator {
        ChordProgressionGenerator::with_seed(ScaleInfo::from_key("C", "major").unwrap(), 7)
    }

    fn roots(progression: &ChordProgression) -> Vec<String> {
        progression.chords().iter().map(|c| c.root().full_name()).collect()
    }

    #[test]
    fn test_generate_from_pattern() {
        let gen = c_major();
        let prog = gen.generate_from_pattern(&["I", "vi", "IV", "V7"]).unwrap();
        assert_eq!(roots(&prog), ["C4", "A4", "F4", "G4"]);
        assert_eq!(prog.chords()[1].quality(), ChordQualityType::Minor);
        assert_eq!(prog.chords()[3].quality(), ChordQualityType::Dominant7);
        assert_eq!(prog.name(), "I-vi-IV-V7");
        assert_eq!(prog.key(), "C");
        assert!(prog.complexity().is_some());
    }

    #[test]
    fn test_pattern_errors() {
        let gen = c_major();
        let empty: [&str; 0] = [];
        assert_eq!(gen.generate_from_pattern(&empty).unwrap_err().code(), "pattern_error");
        assert_eq!(gen.generate_from_pattern(&["I", "Q"]).unwrap_err().code(), "pattern_error");
    }

    #[test]
    fn test_generate_random() {
        let mut gen = c_major();
        let prog = gen.generate_random(8).unwrap();
        assert_eq!(prog.len(), 8);
        let info = *gen.scale_info();
        for chord in prog.chords() {
            let (degree, alteration) = info.get_scale_degree_for_root(&chord.root()).unwrap();
            assert_eq!(alteration, 0);
            assert_eq!(chord.quality(), info.default_quality(degree).unwrap());
        }
        assert_eq!(gen.generate_random(0).unwrap_err().code(), "validation_error");
    }

    #[test]
    fn test_random_is_reproducible() {
        let info = ScaleInfo::from_key("D", "minor").unwrap();
        let a = ChordProgressionGenerator::with_seed(info, 99).generate_random(6).unwrap();
        let b = ChordProgressionGenerator::with_seed(info, 99).generate_random(6).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_sevenths() {
        let mut gen = c_major().with_seventh_probability(1.0).unwrap();
        let prog = gen.generate_random(10).unwrap();
        assert!(prog.chords().iter().all(|c| c.quality().is_seventh()));
        assert!(c_major().with_seventh_probability(1.5).is_err());
    }

    #[test]
    fn test_generate_custom() {
        let gen = c_major();
        let prog = gen
            .generate_custom(&[2, 5, 1], &[ChordQualityType::Minor7, Dominant7, Major7])
            .unwrap();
        assert_eq!(roots(&prog), ["D4", "G4", "C4"]);

        let err = gen.generate_custom(&[1, 4], &[Major]).unwrap_err();
        assert_eq!(err, MusicError::MismatchedLength { degrees: 2, qualities: 1 });

        let err = gen.generate_custom(&[1, 9], &[Major, Major]).unwrap_err();
        assert_eq!(err.code(), "range_error");
    }

    #[test]
    fn test_generate_genre() {
        let gen = c_major();
        let jazz = gen.generate_genre("jazz", 4).unwrap();
        assert_eq!(jazz.name(), "jazz");
        assert_eq!(jazz.chords()[1].quality(), Dominant7);

        let blues = gen.generate_genre("Blues", 6).unwrap();
        assert_eq!(blues.len(), 6);
        assert_eq!(roots(&blues)[5], "F4");

        let err = gen.generate_genre("polka", 4).unwrap_err();
        assert_eq!(err, MusicError::UnknownGenre("polka".to_string()));
    }

    #[test]
    fn test_generate_preset() {
        let gen = c_major();
        let canon = gen.generate_preset("canon").unwrap();
        assert_eq!(canon.len(), 8);
        assert_eq!(gen.generate_preset("nope").unwrap_err().code(), "pattern_error");
    }

    #[test]
    fn test_tension_insertion() {
        let gen = c_major();
        let prog = gen.generate_from_pattern(&["I", "IV", "I", "V", "I"]).unwrap();
        let tense = gen.generate_with_tension(&prog).unwrap();
        // One V7 before the second I; the final I already follows V
        assert_eq!(tense.len(), 6);
        assert_eq!(tense.chords()[2].quality(), Dominant7);
        assert_eq!(tense.chords()[2].root().full_name(), "G4");
        assert!(tense.len() <= 2 * prog.len() - 1);
    }

    #[test]
    fn test_complexity() {
        let gen = c_major();
        let simple = gen.generate_from_pattern(&["I", "I", "I", "I"]).unwrap();
        assert_eq!(ChordProgressionGenerator::calculate_pattern_complexity(simple.chords()), 0.0);

        let busy = gen.generate_from_pattern(&["I", "vii°", "III+", "V7"]).unwrap();
        let score = ChordProgressionGenerator::calculate_pattern_complexity(busy.chords());
        assert!(score > 0.5 && score <= 1.0, "score {}", score);

        assert_eq!(
            ChordProgressionGenerator::calculate_pattern_complexity(busy.chords()),
            score
        );
        assert_eq!(ChordProgressionGenerator::calculate_pattern_complexity(&[]), 0.0);
    }

    #[test]
    fn test_progression_validation() {
        let info = ScaleInfo::from_key("C", "major").unwrap();
        let err = ChordProgression::new("empty", info, vec![]).unwrap_err();
        assert_eq!(err.code(), "validation_error");

        let prog = c_major().generate_from_pattern(&["I"]).unwrap();
        assert_eq!(prog.clone().with_complexity(1.5).unwrap_err().code(), "validation_error");
    }

    #[test]
    fn test_roman_analysis_and_transpose() {
        let gen = c_major();
        let prog = gen.generate_from_pattern(&["ii7", "V7", "Imaj7"]).unwrap();
        let numerals: Vec<String> = prog.roman_numerals().unwrap().iter().map(|n| n.to_string()).collect();
        assert_eq!(numerals, ["ii7", "V7", "Imaj7"]);

        let up = prog.transpose(2).unwrap();
        assert_eq!(up.key(), "D");
        assert_eq!(roots(&up), ["E4", "A4", "D4"]);
        let numerals: Vec<String> = up.roman_numerals().unwrap().iter().map(|n| n.to_string()).collect();
        assert_eq!(numerals, ["ii7", "V7", "Imaj7"]);
    }

    #[test]
    fn test_voice_led() {
        let gen = c_major();
        let prog = gen.generate_from_pattern(&["I", "IV", "V", "I"]).unwrap();
        let led = prog.voice_led().unwrap();
        assert_eq!(led.len(), prog.len());
        assert_eq!(led.chords()[0], prog.chords()[0]);
        for (a, b) in led.chords().iter().zip(prog.chords()) {
            assert_eq!(a.root(), b.root());
            assert_eq!(a.quality(), b.quality());
        }
    }

    #[test]
    fn test_progression_serde() {
        let prog = c_major().generate_from_pattern(&["I", "V"]).unwrap();
        let yaml = serde_yaml::to_string(&prog).unwrap();
        let back: ChordProgression = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, prog);
    }
}
