// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Voice-leading checks over a note sequence.
//!
//! Events starting at the same beat form a sonority whose voices are its
//! MIDI numbers in ascending order. Rules compare consecutive sonorities
//! (parallels, crossing), voices within one sonority (spacing), or the top
//! line across the sequence (melodic motion).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::NoteSequence;
use crate::error::{MusicError, Result};
use crate::music::note::MidiNote;

/// Largest melodic leap allowed between consecutive notes, in semitones
pub const MAX_INTERVAL_JUMP: i32 = 12;
/// Largest gap allowed between adjacent voices, in semitones
pub const MAX_VOICE_SPACING: i32 = 12;

const POSITION_EPSILON: f64 = 1e-9;

/// How strictly violations are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    /// Any violation is an error
    Strict,
    /// Violations are reported
    #[default]
    Normal,
    /// Only structural problems are reported
    Lenient,
}

impl FromStr for ValidationLevel {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(ValidationLevel::Strict),
            "normal" => Ok(ValidationLevel::Normal),
            "lenient" => Ok(ValidationLevel::Lenient),
            _ => Err(MusicError::parse("validation level", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceLeadingRule {
    ParallelFifths,
    ParallelOctaves,
    VoiceCrossing,
    /// Leaps larger than an octave in the top line
    MelodicMotion,
    /// Adjacent voices more than an octave apart
    VoiceSpacing,
}

impl VoiceLeadingRule {
    pub const ALL: [VoiceLeadingRule; 5] = [
        VoiceLeadingRule::ParallelFifths,
        VoiceLeadingRule::ParallelOctaves,
        VoiceLeadingRule::VoiceCrossing,
        VoiceLeadingRule::MelodicMotion,
        VoiceLeadingRule::VoiceSpacing,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VoiceLeadingRule::ParallelFifths => "parallel_fifths",
            VoiceLeadingRule::ParallelOctaves => "parallel_octaves",
            VoiceLeadingRule::VoiceCrossing => "voice_crossing",
            VoiceLeadingRule::MelodicMotion => "melodic_motion",
            VoiceLeadingRule::VoiceSpacing => "voice_spacing",
        }
    }
}

impl FromStr for VoiceLeadingRule {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        VoiceLeadingRule::ALL
            .into_iter()
            .find(|rule| rule.name() == wanted)
            .ok_or_else(|| MusicError::parse("voice-leading rule", s))
    }
}

impl fmt::Display for VoiceLeadingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A rule broken at a beat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: VoiceLeadingRule,
    pub position: f64,
    pub message: String,
}

/// Outcome of validating a sequence
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub level: ValidationLevel,
    pub errors: Vec<String>,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.violations.is_empty()
    }

    pub fn count(&self, rule: VoiceLeadingRule) -> usize {
        self.violations.iter().filter(|v| v.rule == rule).count()
    }
}

struct Sonority {
    position: f64,
    voices: Vec<MidiNote>,
}

fn sonorities(sequence: &NoteSequence) -> Vec<Sonority> {
    let mut groups: Vec<Sonority> = Vec::new();
    for event in sequence.notes() {
        match groups.last_mut() {
            Some(last) if (last.position - event.position).abs() < POSITION_EPSILON => {
                last.voices.extend(event.midi_numbers());
            }
            _ => groups.push(Sonority {
                position: event.position,
                voices: event.midi_numbers(),
            }),
        }
    }
    for group in &mut groups {
        group.voices.sort_unstable();
        group.voices.dedup();
    }
    groups.retain(|g| !g.voices.is_empty());
    groups
}

fn parallel_motion(prev: &Sonority, next: &Sonority, interval_class: i32, rule: VoiceLeadingRule, out: &mut Vec<Violation>) {
    if prev.voices.len() != next.voices.len() {
        return;
    }
    let n = prev.voices.len();
    for low in 0..n {
        for high in low + 1..n {
            let before = prev.voices[high] as i32 - prev.voices[low] as i32;
            let after = next.voices[high] as i32 - next.voices[low] as i32;
            let moved = next.voices[low] as i32 - prev.voices[low] as i32;
            let matches = |d: i32| d > 0 && d % 12 == interval_class;
            if moved != 0 && matches(before) && matches(after) {
                out.push(Violation {
                    rule,
                    position: next.position,
                    message: format!("voices {} and {} move in parallel {}", low + 1, high + 1, rule_label(rule)),
                });
            }
        }
    }
}

fn rule_label(rule: VoiceLeadingRule) -> &'static str {
    match rule {
        VoiceLeadingRule::ParallelFifths => "fifths",
        VoiceLeadingRule::ParallelOctaves => "octaves",
        _ => "motion",
    }
}

fn voice_crossing(prev: &Sonority, next: &Sonority, out: &mut Vec<Violation>) {
    if prev.voices.len() != next.voices.len() {
        return;
    }
    let n = next.voices.len();
    for voice in 0..n {
        let pitch = next.voices[voice];
        let above_old_upper = voice + 1 < n && pitch > prev.voices[voice + 1];
        let below_old_lower = voice > 0 && pitch < prev.voices[voice - 1];
        if above_old_upper || below_old_lower {
            out.push(Violation {
                rule: VoiceLeadingRule::VoiceCrossing,
                position: next.position,
                message: format!("voice {} crosses a neighbouring voice's previous pitch", voice + 1),
            });
        }
    }
}

fn melodic_motion(groups: &[Sonority], out: &mut Vec<Violation>) {
    for pair in groups.windows(2) {
        let (Some(&from), Some(&to)) = (pair[0].voices.last(), pair[1].voices.last()) else {
            continue;
        };
        let leap = (to as i32 - from as i32).abs();
        if leap > MAX_INTERVAL_JUMP {
            out.push(Violation {
                rule: VoiceLeadingRule::MelodicMotion,
                position: pair[1].position,
                message: format!("leap of {} semitones exceeds {}", leap, MAX_INTERVAL_JUMP),
            });
        }
    }
}

fn voice_spacing(group: &Sonority, out: &mut Vec<Violation>) {
    for pair in group.voices.windows(2) {
        let gap = pair[1] as i32 - pair[0] as i32;
        if gap > MAX_VOICE_SPACING {
            out.push(Violation {
                rule: VoiceLeadingRule::VoiceSpacing,
                position: group.position,
                message: format!("adjacent voices {} semitones apart", gap),
            });
        }
    }
}

pub(crate) fn validate(
    sequence: &NoteSequence,
    level: ValidationLevel,
    rules: &[VoiceLeadingRule],
) -> Result<ValidationReport> {
    let mut report = ValidationReport {
        level,
        ..Default::default()
    };

    if sequence.is_empty() {
        if level == ValidationLevel::Strict {
            return Err(MusicError::Validation("sequence is empty".to_string()));
        }
        report.errors.push("sequence is empty".to_string());
        return Ok(report);
    }
    if level == ValidationLevel::Lenient {
        return Ok(report);
    }

    let groups = sonorities(sequence);
    for &rule in rules {
        match rule {
            VoiceLeadingRule::MelodicMotion => melodic_motion(&groups, &mut report.violations),
            VoiceLeadingRule::VoiceSpacing => {
                for group in &groups {
                    voice_spacing(group, &mut report.violations);
                }
            }
            VoiceLeadingRule::ParallelFifths | VoiceLeadingRule::ParallelOctaves => {
                let class = if rule == VoiceLeadingRule::ParallelFifths { 7 } else { 0 };
                for pair in groups.windows(2) {
                    parallel_motion(&pair[0], &pair[1], class, rule, &mut report.violations);
                }
            }
            VoiceLeadingRule::VoiceCrossing => {
                for pair in groups.windows(2) {
                    voice_crossing(&pair[0], &pair[1], &mut report.violations);
                }
            }
        }
    }
    debug!(violations = report.violations.len(), ?level, "validated sequence");

    if level == ValidationLevel::Strict {
        if let Some(first) = report.violations.first() {
            return Err(MusicError::Validation(format!(
                "{} violation(s), first {} at beat {}: {}",
                report.violations.len(),
                first.rule,
                first.position,
                first.message
            )));
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::chord::{Chord, ChordQualityType};
    use crate::music::note::Note;
    use crate::sequence::{EventPitch, NoteEvent};

    fn note(s: &str) -> Note {
        Note::from_full_name(s).unwrap()
    }

    fn melody(names: &[&str]) -> NoteSequence {
        NoteSequence::from_events(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| NoteEvent::from_note(note(n), i as f64))
                .collect(),
        )
    }

    fn chords(voicings: &[&[&str]]) -> NoteSequence {
        let mut events = Vec::new();
        for (i, voicing) in voicings.iter().enumerate() {
            for n in voicing.iter() {
                events.push(NoteEvent::from_note(note(n), i as f64));
            }
        }
        NoteSequence::from_events(events)
    }

    #[test]
    fn test_melodic_leaps() {
        let seq = melody(&["C4", "D4", "E5", "D5"]);
        let report = seq.validate(ValidationLevel::Normal, &[VoiceLeadingRule::MelodicMotion]).unwrap();
        assert_eq!(report.count(VoiceLeadingRule::MelodicMotion), 1);
        assert_eq!(report.violations[0].position, 2.0);
        assert!(!report.is_valid());
    }

    #[test]
    fn test_parallel_fifths_and_octaves() {
        let fifths = chords(&[&["C3", "G3"], &["D3", "A3"]]);
        let report = fifths.validate(ValidationLevel::Normal, &VoiceLeadingRule::ALL).unwrap();
        assert_eq!(report.count(VoiceLeadingRule::ParallelFifths), 1);
        assert_eq!(report.count(VoiceLeadingRule::ParallelOctaves), 0);

        let octaves = chords(&[&["C3", "C4"], &["D3", "D4"]]);
        let report = octaves.validate(ValidationLevel::Normal, &[VoiceLeadingRule::ParallelOctaves]).unwrap();
        assert_eq!(report.count(VoiceLeadingRule::ParallelOctaves), 1);

        // Repeated fifths are not motion
        let held = chords(&[&["C3", "G3"], &["C3", "G3"]]);
        let report = held.validate(ValidationLevel::Normal, &[VoiceLeadingRule::ParallelFifths]).unwrap();
        assert!(report.is_valid());
    }

    #[test]
    fn test_spacing_and_crossing() {
        let wide = chords(&[&["C2", "E4"]]);
        let report = wide.validate(ValidationLevel::Normal, &[VoiceLeadingRule::VoiceSpacing]).unwrap();
        assert_eq!(report.count(VoiceLeadingRule::VoiceSpacing), 1);

        let crossing = chords(&[&["C4", "E4"], &["F4", "G4"]]);
        let report = crossing.validate(ValidationLevel::Normal, &[VoiceLeadingRule::VoiceCrossing]).unwrap();
        assert_eq!(report.count(VoiceLeadingRule::VoiceCrossing), 1);
    }

    #[test]
    fn test_chord_events_are_voiced() {
        let c = Chord::new(note("C4"), ChordQualityType::Major).unwrap();
        let d = Chord::new(note("D4"), ChordQualityType::Major).unwrap();
        let seq = NoteSequence::from_events(vec![
            NoteEvent::new(EventPitch::Chord(c), 0.0, 1.0, 64).unwrap(),
            NoteEvent::new(EventPitch::Chord(d), 1.0, 1.0, 64).unwrap(),
        ]);
        let report = seq.validate(ValidationLevel::Normal, &[VoiceLeadingRule::ParallelFifths]).unwrap();
        assert_eq!(report.count(VoiceLeadingRule::ParallelFifths), 1);
    }

    #[test]
    fn test_levels() {
        let seq = melody(&["C4", "C6"]);
        let rules = [VoiceLeadingRule::MelodicMotion];
        assert_eq!(seq.validate(ValidationLevel::Strict, &rules).unwrap_err().code(), "validation_error");
        assert_eq!(seq.validate(ValidationLevel::Normal, &rules).unwrap().violations.len(), 1);
        assert!(seq.validate(ValidationLevel::Lenient, &rules).unwrap().is_valid());

        let empty = NoteSequence::new();
        assert!(empty.validate(ValidationLevel::Strict, &rules).is_err());
        let report = empty.validate(ValidationLevel::Lenient, &rules).unwrap();
        assert_eq!(report.errors, vec!["sequence is empty".to_string()]);
    }

    #[test]
    fn test_rule_names() {
        for rule in VoiceLeadingRule::ALL {
            assert_eq!(rule.name().parse::<VoiceLeadingRule>().unwrap(), rule);
        }
        assert!("hidden_fifths".parse::<VoiceLeadingRule>().is_err());
        assert_eq!("STRICT".parse::<ValidationLevel>().unwrap(), ValidationLevel::Strict);
    }
}
