// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session files.
//!
//! A session is a YAML description of one generation request: the key,
//! how to obtain a chord progression, the note pattern to play over it,
//! the rhythm that places the notes, and how strictly to check the result.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generators::pattern::{NotePattern, NotePatternData, PatternDirection, PatternElement};
use crate::generators::progression::{ChordProgression, ChordProgressionGenerator};
use crate::generators::InterpreterKind;
use crate::music::chord::ChordQualityType;
use crate::music::note::{Note, Semitones, DEFAULT_DURATION, DEFAULT_VELOCITY};
use crate::music::scale::ScaleInfo;
use crate::rhythm::{Accent, RhythmNote, RhythmPatternData};
use crate::sequence::{GeneratedSequence, NoteSequenceGenerator, ValidationLevel, VoiceLeadingRule};

/// Root of a session file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionFile {
    pub session: SessionConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
    #[serde(default)]
    pub pattern: PatternConfig,
    #[serde(default)]
    pub rhythm: RhythmConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl SessionFile {
    /// Load a session from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read session file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a session from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse session YAML")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize session to YAML")
    }

    /// Save the session to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml).with_context(|| format!("Failed to write session file: {:?}", path.as_ref()))
    }

    /// Build every domain object the session describes
    pub fn validate(&self) -> Result<()> {
        self.generator().map(|_| ())
    }

    pub fn scale_info(&self) -> Result<ScaleInfo> {
        let root = Note::from_name_octave(&self.session.key, self.session.octave, DEFAULT_DURATION, DEFAULT_VELOCITY)
            .with_context(|| format!("Invalid key '{}'", self.session.key))?;
        let scale_type = self
            .session
            .scale_type
            .parse()
            .with_context(|| format!("Invalid scale type '{}'", self.session.scale_type))?;
        Ok(ScaleInfo::new(root, scale_type))
    }

    pub fn build_progression(&self) -> Result<ChordProgression> {
        let info = self.scale_info()?;
        self.progression.build(info, self.session.seed)
    }

    pub fn build_pattern(&self) -> Result<NotePattern> {
        self.pattern.build()
    }

    pub fn build_rhythm(&self) -> Result<RhythmPatternData> {
        // Offset so the rhythm's draws differ from the progression's
        let mut rng = match self.session.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        self.rhythm.build(&mut rng)
    }

    /// Sequence generator wired from every section
    pub fn generator(&self) -> Result<NoteSequenceGenerator> {
        let progression = self.build_progression().context("Invalid progression section")?;
        let pattern = self.build_pattern().context("Invalid pattern section")?;
        let rhythm = self.build_rhythm().context("Invalid rhythm section")?;

        let mut generator = NoteSequenceGenerator::new(progression, pattern, rhythm)
            .with_validation(self.validation.level, self.validation.rules.clone())
            .with_chords(self.session.include_chords);
        if let Some(kind) = self.pattern.interpreter {
            generator = generator.with_interpreter(kind);
        }
        if let Some(seed) = self.session.seed {
            generator = generator.with_seed(seed);
        }
        Ok(generator)
    }

    /// Generate the session's note sequence
    pub fn generate(&self) -> Result<GeneratedSequence> {
        let generator = self.generator()?;
        debug!(session = %self.session.name, interpreter = %generator.interpreter(), "generating session");
        let transpose = Some(self.session.transpose).filter(|&s| s != 0);
        generator
            .generate(transpose)
            .with_context(|| format!("Failed to generate session '{}'", self.session.name))
    }
}

/// Key and global settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub name: String,
    /// Tonic name (e.g., "C", "F#", "Bb")
    #[serde(default = "default_key")]
    pub key: String,
    /// Scale type (e.g., "major", "dorian", "minor_pentatonic")
    #[serde(default = "default_scale_type")]
    pub scale_type: String,
    #[serde(default = "default_octave")]
    pub octave: i8,
    /// Seed for reproducible output
    #[serde(default)]
    pub seed: Option<u64>,
    /// Final transposition in semitones
    #[serde(default)]
    pub transpose: Semitones,
    /// Emit each chord as a sustained event
    #[serde(default)]
    pub include_chords: bool,
}

fn default_key() -> String {
    "C".to_string()
}
fn default_scale_type() -> String {
    "major".to_string()
}
fn default_octave() -> i8 {
    4
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            key: default_key(),
            scale_type: default_scale_type(),
            octave: default_octave(),
            seed: None,
            transpose: 0,
            include_chords: false,
        }
    }
}

/// Where the chord progression comes from.
///
/// At most one of `numerals`, `genre`, `preset` and `degrees` may be set.
/// With none of them the progression is random.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressionConfig {
    /// Roman numerals (e.g., ["ii7", "V7", "Imaj7"])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numerals: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Scale degrees for a custom progression, paired with `qualities`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degrees: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualities: Vec<String>,
    /// Chord count for genre and random progressions
    #[serde(default = "default_length")]
    pub length: usize,
    /// Chance of a random chord taking its seventh
    #[serde(default)]
    pub seventh_probability: f64,
    /// Prepare returns to the tonic with a dominant seventh
    #[serde(default)]
    pub tension: bool,
    /// Re-voice chords for minimal movement
    #[serde(default)]
    pub voice_lead: bool,
}

fn default_length() -> usize {
    4
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            numerals: None,
            genre: None,
            preset: Some("I-IV-V-I".to_string()),
            degrees: None,
            qualities: Vec::new(),
            length: default_length(),
            seventh_probability: 0.0,
            tension: false,
            voice_lead: false,
        }
    }
}

impl ProgressionConfig {
    pub fn build(&self, info: ScaleInfo, seed: Option<u64>) -> Result<ChordProgression> {
        let sources = [
            self.numerals.is_some(),
            self.genre.is_some(),
            self.preset.is_some(),
            self.degrees.is_some(),
        ];
        if sources.iter().filter(|&&set| set).count() > 1 {
            bail!("progression must set only one of numerals, genre, preset or degrees");
        }

        let mut generator = match seed {
            Some(seed) => ChordProgressionGenerator::with_seed(info, seed),
            None => ChordProgressionGenerator::new(info),
        }
        .with_seventh_probability(self.seventh_probability)?;

        let progression = if let Some(numerals) = &self.numerals {
            generator.generate_from_pattern(numerals)?
        } else if let Some(genre) = &self.genre {
            generator.generate_genre(genre, self.length)?
        } else if let Some(preset) = &self.preset {
            generator.generate_preset(preset)?
        } else if let Some(degrees) = &self.degrees {
            let qualities = self
                .qualities
                .iter()
                .map(|q| ChordQualityType::from_string(q))
                .collect::<crate::error::Result<Vec<_>>>()?;
            generator.generate_custom(degrees, &qualities)?
        } else {
            generator.generate_random(self.length)?
        };

        let progression = if self.tension {
            generator.generate_with_tension(&progression)?
        } else {
            progression
        };
        if self.voice_lead {
            Ok(progression.voice_led()?)
        } else {
            Ok(progression)
        }
    }
}

/// Note pattern, from a preset or explicit elements
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternConfig {
    #[serde(default = "default_pattern_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<PatternElement>,
    /// Interpreter override; otherwise chosen from the flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<InterpreterKind>,
    #[serde(default)]
    pub use_chord_tones: bool,
    #[serde(default)]
    pub use_scale_mode: bool,
    #[serde(default)]
    pub arpeggio_mode: bool,
    #[serde(default)]
    pub restart_on_chord: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<PatternDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub octave_range: Option<(i8, i8)>,
}

fn default_pattern_name() -> String {
    "pattern".to_string()
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            name: default_pattern_name(),
            preset: Some("simple_triad".to_string()),
            elements: Vec::new(),
            interpreter: None,
            use_chord_tones: false,
            use_scale_mode: false,
            arpeggio_mode: false,
            restart_on_chord: false,
            direction: None,
            octave_range: None,
        }
    }
}

impl PatternConfig {
    /// Preset or element list with this section's flags layered on top
    pub fn build(&self) -> Result<NotePattern> {
        let (name, description, base) = match (&self.preset, self.elements.is_empty()) {
            (Some(_), false) => bail!("pattern must set either a preset or elements, not both"),
            (Some(preset), true) => {
                let pattern = NotePattern::from_preset(preset)?;
                (pattern.name().to_string(), pattern.description().to_string(), pattern.data().clone())
            }
            (None, false) => (self.name.clone(), String::new(), NotePatternData::new(self.elements.clone())),
            (None, true) => bail!("pattern needs a preset or at least one element"),
        };

        let mut data = base;
        data.use_chord_tones |= self.use_chord_tones;
        data.use_scale_mode |= self.use_scale_mode;
        data.arpeggio_mode |= self.arpeggio_mode;
        data.restart_on_chord |= self.restart_on_chord;
        if let Some(direction) = self.direction {
            data = data.with_direction(direction);
        }
        if let Some((low, high)) = self.octave_range {
            data = data.with_octave_range(low, high);
        }
        Ok(NotePattern::new(name, data)?.with_description(description))
    }
}

/// Euclidean rhythm parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EuclideanConfig {
    pub hits: usize,
    pub steps: usize,
    #[serde(default = "default_step_duration")]
    pub step_duration: f64,
}

fn default_step_duration() -> f64 {
    0.5
}

/// Rhythm and the transformations applied to it, in field order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RhythmConfig {
    #[serde(default = "default_time_signature")]
    pub time_signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<RhythmNote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub euclidean: Option<EuclideanConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groove: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accents: Vec<Accent>,
    /// Probability of nudging each note's velocity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variations: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humanize: Option<f64>,
}

fn default_time_signature() -> String {
    "4/4".to_string()
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            time_signature: default_time_signature(),
            preset: Some("basic_4_4".to_string()),
            notes: Vec::new(),
            euclidean: None,
            swing: None,
            groove: None,
            accents: Vec::new(),
            variations: None,
            humanize: None,
        }
    }
}

impl RhythmConfig {
    pub fn build(&self, rng: &mut StdRng) -> Result<RhythmPatternData> {
        let sources = [self.preset.is_some(), !self.notes.is_empty(), self.euclidean.is_some()];
        let mut rhythm = match sources.iter().filter(|&&set| set).count() {
            0 => bail!("rhythm needs a preset, notes or euclidean section"),
            1 => {
                if let Some(preset) = &self.preset {
                    RhythmPatternData::from_preset(preset)?
                } else if let Some(e) = self.euclidean {
                    RhythmPatternData::euclidean(e.hits, e.steps, e.step_duration, &self.time_signature)?
                } else {
                    let rhythm = RhythmPatternData::new(self.notes.clone(), &self.time_signature)?;
                    let bar = rhythm.beats_per_bar();
                    rhythm.with_total_duration(bar)?
                }
            }
            _ => bail!("rhythm must set only one of preset, notes or euclidean"),
        };

        if let Some(ratio) = self.swing {
            rhythm = rhythm.apply_swing(ratio)?;
        }
        if let Some(groove) = &self.groove {
            rhythm = rhythm.apply_groove(groove)?;
        }
        if !self.accents.is_empty() {
            rhythm = rhythm.apply_accents(&self.accents)?;
        }
        if let Some(probability) = self.variations {
            rhythm = rhythm.apply_variations(probability, rng)?;
        }
        if let Some(amount) = self.humanize {
            rhythm = rhythm.humanize(amount, rng)?;
        }
        Ok(rhythm)
    }
}

/// Voice-leading checks run on the result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    #[serde(default)]
    pub level: ValidationLevel,
    #[serde(default = "default_rules")]
    pub rules: Vec<VoiceLeadingRule>,
}

fn default_rules() -> Vec<VoiceLeadingRule> {
    VoiceLeadingRule::ALL.to_vec()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            level: ValidationLevel::default(),
            rules: default_rules(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_values() {
        let yaml = r#"
session:
  name: "Minimal"
"#;
        let config = SessionFile::from_yaml(yaml).unwrap();
        assert_eq!(config.session.key, "C");
        assert_eq!(config.session.scale_type, "major");
        assert_eq!(config.session.octave, 4);
        assert_eq!(config.progression.preset.as_deref(), Some("I-IV-V-I"));
        assert_eq!(config.pattern.preset.as_deref(), Some("simple_triad"));
        assert_eq!(config.rhythm.preset.as_deref(), Some("basic_4_4"));
        assert_eq!(config.validation.level, ValidationLevel::Normal);
        assert_eq!(config.validation.rules.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_session() {
        let yaml = r#"
session:
  name: "Arpeggios"
  key: "A"
  scale_type: "natural_minor"
  octave: 3
  seed: 11

progression:
  numerals: ["i", "iv", "v", "i"]

pattern:
  name: "up"
  elements:
    - degree: 1
    - degree: 2
    - degree: 3
  arpeggio_mode: true
  restart_on_chord: true
  direction: up
  octave_range: [2, 5]

rhythm:
  time_signature: "3/4"
  notes:
    - position: 0.0
      duration: 1.0
      accent: strong
    - position: 1.0
      duration: 1.0
    - position: 2.0
      duration: 1.0
      is_rest: true

validation:
  level: lenient
  rules: [parallel_fifths, melodic_motion]
"#;
        let config = SessionFile::from_yaml(yaml).unwrap();
        assert_eq!(config.pattern.elements.len(), 3);
        assert_eq!(config.rhythm.notes.len(), 3);
        assert_eq!(config.validation.rules, vec![VoiceLeadingRule::ParallelFifths, VoiceLeadingRule::MelodicMotion]);

        let info = config.scale_info().unwrap();
        assert_eq!(info.root.full_name(), "A3");
        assert!(info.is_minor());

        let generated = config.generate().unwrap();
        // Four chords, two sounding slots and one rest each
        assert_eq!(generated.sequence.len(), 12);
        assert_eq!(generated.sequence.notes().count(), 8);
        let first = generated.sequence.events()[0].note().unwrap();
        assert_eq!(first.full_name(), "A3");
        assert_eq!(generated.sequence.total_duration(), 12.0);
    }

    #[test]
    fn test_progression_sources() {
        let info = ScaleInfo::from_key("C", "major").unwrap();

        let genre = ProgressionConfig {
            preset: None,
            genre: Some("blues".to_string()),
            length: 12,
            ..Default::default()
        };
        assert_eq!(genre.build(info, Some(1)).unwrap().len(), 12);

        let random = ProgressionConfig {
            preset: None,
            length: 6,
            ..Default::default()
        };
        let a = random.build(info, Some(3)).unwrap();
        let b = random.build(info, Some(3)).unwrap();
        assert_eq!(a.chords(), b.chords());

        let custom = ProgressionConfig {
            preset: None,
            degrees: Some(vec![2, 5, 1]),
            qualities: vec!["minor7".to_string(), "dominant7".to_string(), "major7".to_string()],
            ..Default::default()
        };
        let names: Vec<String> = custom.build(info, None).unwrap().chords().iter().map(|c| c.symbol()).collect();
        assert_eq!(names, ["Dm7", "G7", "Cmaj7"]);

        let both = ProgressionConfig {
            genre: Some("pop".to_string()),
            ..Default::default()
        };
        assert!(both.build(info, None).is_err());
    }

    #[test]
    fn test_tension_and_voice_leading() {
        let info = ScaleInfo::from_key("C", "major").unwrap();
        let config = ProgressionConfig {
            preset: None,
            numerals: Some(vec!["I".to_string(), "IV".to_string(), "I".to_string()]),
            tension: true,
            voice_lead: true,
            ..Default::default()
        };
        let progression = config.build(info, None).unwrap();
        assert_eq!(progression.len(), 4);
        assert_eq!(progression.chords()[2].quality(), ChordQualityType::Dominant7);
    }

    #[test]
    fn test_pattern_section() {
        let preset = PatternConfig {
            arpeggio_mode: true,
            direction: Some(PatternDirection::Down),
            ..Default::default()
        };
        let pattern = preset.build().unwrap();
        assert_eq!(pattern.name(), "simple_triad");
        assert!(pattern.data().arpeggio_mode);
        assert_eq!(pattern.data().direction, PatternDirection::Down);

        let both = PatternConfig {
            elements: vec![PatternElement::Degree(1)],
            ..Default::default()
        };
        assert!(both.build().is_err());

        let neither = PatternConfig {
            preset: None,
            ..Default::default()
        };
        assert!(neither.build().is_err());
    }

    #[test]
    fn test_rhythm_transformations() {
        let mut rng = StdRng::seed_from_u64(9);
        let config = RhythmConfig {
            preset: None,
            euclidean: Some(EuclideanConfig {
                hits: 3,
                steps: 8,
                step_duration: 0.5,
            }),
            accents: vec![Accent::Strong, Accent::Ghost],
            groove: Some("funk".to_string()),
            ..Default::default()
        };
        let rhythm = config.build(&mut rng).unwrap();
        assert_eq!(rhythm.len(), 3);
        assert_eq!(rhythm.notes()[0].accent, Some(Accent::Strong));
        assert_eq!(rhythm.notes()[1].accent, Some(Accent::Ghost));

        let bad_groove = RhythmConfig {
            groove: Some("polka".to_string()),
            ..Default::default()
        };
        assert!(bad_groove.build(&mut rng).is_err());

        let bad_swing = RhythmConfig {
            swing: Some(0.9),
            ..Default::default()
        };
        assert!(bad_swing.build(&mut rng).is_err());
    }

    #[test]
    fn test_invalid_session() {
        let bad_key = SessionFile::from_yaml("session:\n  name: x\n  key: H\n").unwrap();
        assert!(bad_key.validate().is_err());

        let bad_scale = SessionFile::from_yaml("session:\n  name: x\n  scale_type: klingon\n").unwrap();
        let err = bad_scale.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("klingon"));

        assert!(SessionFile::from_yaml("session: [1, 2]").is_err());
    }

    #[test]
    fn test_round_trip_file() {
        let original = SessionFile {
            session: SessionConfig {
                name: "Round Trip".to_string(),
                seed: Some(5),
                transpose: 2,
                ..Default::default()
            },
            progression: ProgressionConfig {
                preset: None,
                genre: Some("jazz".to_string()),
                ..Default::default()
            },
            pattern: PatternConfig::default(),
            rhythm: RhythmConfig {
                swing: Some(0.6),
                ..Default::default()
            },
            validation: ValidationConfig::default(),
        };

        let file = NamedTempFile::new().unwrap();
        original.save(file.path()).unwrap();
        let loaded = SessionFile::load(file.path()).unwrap();
        assert_eq!(loaded, original);

        let first = loaded.generate().unwrap();
        let second = original.generate().unwrap();
        assert_eq!(first.sequence, second.sequence);
    }

    #[test]
    fn test_missing_file() {
        let err = SessionFile::load("/nonexistent/session.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read session file"));
    }
}
