// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timed rhythm patterns and their transformations.
//!
//! Every transformation returns a new pattern and leaves `self` untouched.
//! Applying one twice compounds its effect.

use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::time_signature::TimeSignature;
use crate::error::{MusicError, Result};
use crate::generators::presets;
use crate::music::note::DEFAULT_VELOCITY;

/// Tolerance for comparing beat positions
const EPSILON: f64 = 1e-9;

/// Valid swing ratios
pub const SWING_RANGE: std::ops::RangeInclusive<f64> = 0.5..=0.75;

/// Per-step velocity factors; the step is `int(position * 2) % 4`
const GROOVES: &[(&str, [f64; 4])] = &[
    ("shuffle", [1.0, 0.7, 0.85, 0.7]),
    ("straight", [1.0, 0.8, 1.0, 0.8]),
    ("funk", [1.0, 0.6, 0.9, 0.75]),
];

/// Timing jitter per unit of humanize amount, in beats
const HUMANIZE_TIMING: f64 = 0.1;
/// Velocity jitter per unit of humanize amount
const HUMANIZE_VELOCITY: f64 = 20.0;
const VARIATION_VELOCITY: i32 = 10;

/// Accent levels, each scaling note velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accent {
    Strong,
    Normal,
    Weak,
    Ghost,
}

impl Accent {
    pub fn multiplier(self) -> f64 {
        match self {
            Accent::Strong => 1.2,
            Accent::Normal => 1.0,
            Accent::Weak => 0.8,
            Accent::Ghost => 0.5,
        }
    }
}

fn clamp_velocity(value: f64) -> u8 {
    value.round().clamp(1.0, 127.0) as u8
}

/// A single timed hit or rest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RhythmNoteRecord")]
pub struct RhythmNote {
    pub position: f64,
    pub duration: f64,
    pub velocity: u8,
    pub is_rest: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<Accent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swing_ratio: Option<f64>,
}

impl RhythmNote {
    pub fn new(position: f64, duration: f64) -> Result<Self> {
        if !position.is_finite() || position < 0.0 {
            return Err(MusicError::Validation(format!(
                "rhythm position {} must be a non-negative number",
                position
            )));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(MusicError::Validation(format!(
                "rhythm duration {} must be positive",
                duration
            )));
        }
        Ok(Self {
            position,
            duration,
            velocity: DEFAULT_VELOCITY,
            is_rest: false,
            accent: None,
            swing_ratio: None,
        })
    }

    pub fn rest(position: f64, duration: f64) -> Result<Self> {
        Ok(Self {
            is_rest: true,
            ..Self::new(position, duration)?
        })
    }

    pub fn with_velocity(mut self, velocity: u8) -> Result<Self> {
        if velocity > 127 {
            return Err(MusicError::Validation(format!("velocity {} outside 0..=127", velocity)));
        }
        self.velocity = velocity;
        Ok(self)
    }

    pub fn with_accent(mut self, accent: Accent) -> Self {
        self.accent = Some(accent);
        self
    }

    /// Beat at which this note stops sounding
    pub fn end(&self) -> f64 {
        self.position + self.duration
    }

    /// Velocity after the accent is applied
    pub fn effective_velocity(&self) -> u8 {
        match self.accent {
            Some(accent) => clamp_velocity(self.velocity as f64 * accent.multiplier()),
            None => self.velocity,
        }
    }
}

fn default_velocity() -> u8 {
    DEFAULT_VELOCITY
}

#[derive(Debug, Deserialize)]
struct RhythmNoteRecord {
    position: f64,
    duration: f64,
    #[serde(default = "default_velocity")]
    velocity: u8,
    #[serde(default)]
    is_rest: bool,
    #[serde(default)]
    accent: Option<Accent>,
    #[serde(default)]
    swing_ratio: Option<f64>,
}

impl TryFrom<RhythmNoteRecord> for RhythmNote {
    type Error = MusicError;

    fn try_from(record: RhythmNoteRecord) -> Result<Self> {
        let mut note = RhythmNote::new(record.position, record.duration)?.with_velocity(record.velocity)?;
        note.is_rest = record.is_rest;
        note.accent = record.accent;
        note.swing_ratio = record.swing_ratio;
        Ok(note)
    }
}

/// Reject empty or overlapping note lists.
///
/// Notes are compared in position order; rests never overlap anything.
pub fn check_notes(notes: &[RhythmNote]) -> Result<()> {
    if notes.is_empty() {
        return Err(MusicError::Validation("rhythm pattern needs at least one note".to_string()));
    }

    let mut sounding: Vec<&RhythmNote> = notes.iter().filter(|n| !n.is_rest).collect();
    sounding.sort_by(|a, b| a.position.total_cmp(&b.position));
    for pair in sounding.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        if second.position < first.end() - EPSILON {
            return Err(MusicError::Overlap {
                first_position: first.position,
                first_duration: first.duration,
                second_position: second.position,
            });
        }
    }
    Ok(())
}

/// Hit placement from Bjorklund's algorithm
pub fn euclidean(hits: usize, steps: usize) -> Vec<bool> {
    if steps == 0 {
        return vec![];
    }
    if hits >= steps {
        return vec![true; steps];
    }
    if hits == 0 {
        return vec![false; steps];
    }

    let mut groups = vec![vec![true]; hits];
    let mut remainder = vec![vec![false]; steps - hits];

    while remainder.len() > 1 {
        let paired = groups.len().min(remainder.len());
        for (group, tail) in groups.iter_mut().zip(remainder.iter()) {
            group.extend_from_slice(tail);
        }
        remainder = if groups.len() > paired {
            groups.drain(paired..).collect()
        } else {
            remainder.drain(paired..).collect()
        };
    }

    groups.into_iter().chain(remainder).flatten().collect()
}

/// An ordered set of rhythm notes in a meter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RhythmPatternRecord")]
pub struct RhythmPatternData {
    notes: Vec<RhythmNote>,
    time_signature: TimeSignature,
    total_duration: f64,
}

impl RhythmPatternData {
    /// Validate notes and meter; notes are kept sorted by position
    pub fn new(notes: Vec<RhythmNote>, time_signature: &str) -> Result<Self> {
        Self::with_time_signature(notes, time_signature.parse()?)
    }

    pub fn with_time_signature(mut notes: Vec<RhythmNote>, time_signature: TimeSignature) -> Result<Self> {
        check_notes(&notes)?;
        notes.sort_by(|a, b| a.position.total_cmp(&b.position));
        let mut pattern = Self {
            notes,
            time_signature,
            total_duration: 0.0,
        };
        pattern.update_duration();
        Ok(pattern)
    }

    /// Set an explicit total; it never shrinks below the last note's end
    pub fn with_total_duration(mut self, total_duration: f64) -> Result<Self> {
        if !total_duration.is_finite() || total_duration <= 0.0 {
            return Err(MusicError::Validation(format!(
                "total duration {} must be positive",
                total_duration
            )));
        }
        self.total_duration = total_duration;
        self.update_duration();
        Ok(self)
    }

    /// Built-in rhythm such as "basic_4_4" or "waltz"
    pub fn from_preset(name: &str) -> Result<Self> {
        let preset = presets::rhythm_preset(name)
            .ok_or_else(|| MusicError::Pattern(format!("unknown rhythm preset '{}'", name)))?;
        let notes = preset
            .hits
            .iter()
            .map(|hit| Ok(RhythmNote::new(hit.position, hit.duration)?.with_accent(hit.accent)))
            .collect::<Result<Vec<_>>>()?;
        let pattern = Self::new(notes, preset.time_signature)?;
        let bar = pattern.beats_per_bar();
        let pattern = pattern.with_total_duration(bar)?;
        match preset.swing {
            Some(ratio) => pattern.apply_swing(ratio),
            None => Ok(pattern),
        }
    }

    /// `hits` notes spread evenly over `steps` steps of `step_duration` beats
    pub fn euclidean(hits: usize, steps: usize, step_duration: f64, time_signature: &str) -> Result<Self> {
        if hits == 0 || steps == 0 {
            return Err(MusicError::Validation(format!(
                "euclidean rhythm needs hits and steps, got {}/{}",
                hits, steps
            )));
        }
        let notes = euclidean(hits, steps)
            .into_iter()
            .enumerate()
            .filter(|(_, hit)| *hit)
            .map(|(step, _)| RhythmNote::new(step as f64 * step_duration, step_duration))
            .collect::<Result<Vec<_>>>()?;
        Self::new(notes, time_signature)?.with_total_duration(steps as f64 * step_duration)
    }

    pub fn notes(&self) -> &[RhythmNote] {
        &self.notes
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn beats_per_bar(&self) -> f64 {
        self.time_signature.beats_per_bar()
    }

    /// Whole bars needed to hold the pattern
    pub fn bars(&self) -> usize {
        (self.total_duration / self.beats_per_bar() - EPSILON).ceil().max(1.0) as usize
    }

    /// Notes starting inside a beat range
    pub fn events_in(&self, range: Range<f64>) -> impl Iterator<Item = &RhythmNote> + '_ {
        self.notes
            .iter()
            .filter(move |n| n.position >= range.start - EPSILON && n.position < range.end - EPSILON)
    }

    /// Delay off-beat eighths to `ratio` of the beat.
    ///
    /// A swung note keeps its end point so it never runs into the next beat.
    pub fn apply_swing(&self, ratio: f64) -> Result<Self> {
        if !SWING_RANGE.contains(&ratio) {
            return Err(MusicError::Range(format!("swing ratio {} outside 0.5..=0.75", ratio)));
        }
        let notes = self
            .notes
            .iter()
            .map(|note| {
                let beat = note.position.floor();
                let is_offbeat = (note.position - beat - 0.5).abs() < EPSILON;
                let swung = beat + ratio;
                let duration = note.end() - swung;
                if !is_offbeat || duration <= EPSILON {
                    return *note;
                }
                RhythmNote {
                    position: swung,
                    duration,
                    swing_ratio: Some(ratio),
                    ..*note
                }
            })
            .collect();
        self.rebuilt(notes)
    }

    /// Scale velocities by a named groove template
    pub fn apply_groove(&self, groove: &str) -> Result<Self> {
        let wanted = groove.trim().to_lowercase();
        let (_, factors) = GROOVES
            .iter()
            .find(|(name, _)| *name == wanted)
            .ok_or_else(|| MusicError::UnknownGroove(groove.to_string()))?;
        let notes = self
            .notes
            .iter()
            .map(|note| {
                let step = (note.position * 2.0) as usize % factors.len();
                RhythmNote {
                    velocity: clamp_velocity(note.velocity as f64 * factors[step]),
                    ..*note
                }
            })
            .collect();
        self.rebuilt(notes)
    }

    /// Random timing and velocity drift scaled by `amount` (0.0 - 1.0).
    ///
    /// Shifted notes are pushed back so they never overlap their predecessor.
    pub fn humanize<R: Rng>(&self, amount: f64, rng: &mut R) -> Result<Self> {
        if !(0.0..=1.0).contains(&amount) {
            return Err(MusicError::Range(format!("humanize amount {} outside 0..=1", amount)));
        }
        let spread = amount * HUMANIZE_TIMING;
        let velocity_spread = (amount * HUMANIZE_VELOCITY).round() as i32;

        let mut previous_end = 0.0_f64;
        let mut notes = Vec::with_capacity(self.notes.len());
        for note in &self.notes {
            let jitter: f64 = rng.gen_range(-spread..=spread);
            let mut position = (note.position + jitter).max(0.0);
            if !note.is_rest {
                position = position.max(previous_end);
            }
            let shift: i32 = rng.gen_range(-velocity_spread..=velocity_spread);
            let humanized = RhythmNote {
                position,
                velocity: clamp_velocity((note.velocity as i32 + shift) as f64),
                ..*note
            };
            if !note.is_rest {
                previous_end = humanized.end();
            }
            notes.push(humanized);
        }
        debug!(amount, notes = notes.len(), "humanized rhythm");
        self.rebuilt(notes)
    }

    /// Cycle accents over the sounding notes in order
    pub fn apply_accents(&self, accents: &[Accent]) -> Result<Self> {
        if accents.is_empty() {
            return Err(MusicError::Validation("accent list is empty".to_string()));
        }
        let mut cycle = accents.iter().cycle();
        let notes = self
            .notes
            .iter()
            .map(|note| {
                if note.is_rest {
                    return *note;
                }
                RhythmNote {
                    accent: cycle.next().copied(),
                    ..*note
                }
            })
            .collect();
        self.rebuilt(notes)
    }

    /// Nudge each sounding note's velocity with the given probability
    pub fn apply_variations<R: Rng>(&self, probability: f64, rng: &mut R) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(MusicError::Range(format!(
                "variation probability {} outside 0..=1",
                probability
            )));
        }
        let notes = self
            .notes
            .iter()
            .map(|note| {
                if note.is_rest || !rng.gen_bool(probability) {
                    return *note;
                }
                let shift = rng.gen_range(-VARIATION_VELOCITY..=VARIATION_VELOCITY);
                RhythmNote {
                    velocity: clamp_velocity((note.velocity as i32 + shift) as f64),
                    ..*note
                }
            })
            .collect();
        self.rebuilt(notes)
    }

    fn update_duration(&mut self) {
        let end = self.notes.iter().map(RhythmNote::end).fold(0.0, f64::max);
        self.total_duration = self.total_duration.max(end);
    }

    fn rebuilt(&self, notes: Vec<RhythmNote>) -> Result<Self> {
        let mut pattern = Self::with_time_signature(notes, self.time_signature)?;
        pattern.total_duration = pattern.total_duration.max(self.total_duration);
        Ok(pattern)
    }
}

#[derive(Debug, Deserialize)]
struct RhythmPatternRecord {
    notes: Vec<RhythmNote>,
    #[serde(default)]
    time_signature: TimeSignature,
    #[serde(default)]
    total_duration: Option<f64>,
}

impl TryFrom<RhythmPatternRecord> for RhythmPatternData {
    type Error = MusicError;

    fn try_from(record: RhythmPatternRecord) -> Result<Self> {
        let pattern = RhythmPatternData::with_time_signature(record.notes, record.time_signature)?;
        match record.total_duration {
            Some(total) => pattern.with_total_duration(total),
            None => Ok(pattern),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quarters(count: usize) -> Vec<RhythmNote> {
        (0..count).map(|i| RhythmNote::new(i as f64, 1.0).unwrap()).collect()
    }

    fn eighths(count: usize) -> Vec<RhythmNote> {
        (0..count).map(|i| RhythmNote::new(i as f64 * 0.5, 0.5).unwrap()).collect()
    }

    #[test]
    fn test_valid_pattern() {
        let pattern = RhythmPatternData::new(quarters(2), "4/4").unwrap();
        assert_eq!(pattern.total_duration(), 2.0);
        assert_eq!(pattern.len(), 2);
        assert_eq!(pattern.bars(), 1);
    }

    #[test]
    fn test_overlap_rejected() {
        let mut notes = quarters(2);
        notes.push(RhythmNote::new(0.5, 1.0).unwrap());
        let err = RhythmPatternData::new(notes, "4/4").unwrap_err();
        assert_eq!(
            err,
            MusicError::Overlap {
                first_position: 0.0,
                first_duration: 1.0,
                second_position: 0.5
            }
        );
    }

    #[test]
    fn test_rests_do_not_overlap() {
        let mut notes = quarters(2);
        notes.push(RhythmNote::rest(0.5, 1.0).unwrap());
        assert!(RhythmPatternData::new(notes, "4/4").is_ok());
    }

    #[test]
    fn test_empty_and_bad_meter() {
        assert_eq!(RhythmPatternData::new(vec![], "4/4").unwrap_err().code(), "validation_error");
        assert_eq!(RhythmPatternData::new(quarters(1), "4/6").unwrap_err().code(), "parse_error");
        assert!(RhythmNote::new(-1.0, 1.0).is_err());
        assert!(RhythmNote::new(0.0, 0.0).is_err());
    }

    #[test]
    fn test_total_duration_never_shrinks() {
        let pattern = RhythmPatternData::new(quarters(3), "4/4").unwrap();
        assert_eq!(pattern.clone().with_total_duration(8.0).unwrap().total_duration(), 8.0);
        assert_eq!(pattern.with_total_duration(1.0).unwrap().total_duration(), 3.0);
    }

    #[test]
    fn test_swing() {
        let pattern = RhythmPatternData::new(eighths(4), "4/4").unwrap();
        let swung = pattern.apply_swing(0.75).unwrap();
        assert_eq!(swung.notes()[0].position, 0.0);
        assert_eq!(swung.notes()[1].position, 0.75);
        assert_eq!(swung.notes()[1].duration, 0.25);
        assert_eq!(swung.notes()[1].swing_ratio, Some(0.75));
        assert_eq!(swung.notes()[3].position, 1.75);
        assert_eq!(swung.total_duration(), pattern.total_duration());

        assert_eq!(pattern.apply_swing(0.4).unwrap_err().code(), "range_error");
        assert_eq!(pattern.apply_swing(0.8).unwrap_err().code(), "range_error");
    }

    #[test]
    fn test_groove() {
        let notes: Vec<_> = eighths(4).into_iter().map(|n| n.with_velocity(100).unwrap()).collect();
        let pattern = RhythmPatternData::new(notes, "4/4").unwrap();
        let funk = pattern.apply_groove("funk").unwrap();
        let velocities: Vec<u8> = funk.notes().iter().map(|n| n.velocity).collect();
        assert_eq!(velocities, vec![100, 60, 90, 75]);

        let err = pattern.apply_groove("polka").unwrap_err();
        assert_eq!(err, MusicError::UnknownGroove("polka".to_string()));
    }

    #[test]
    fn test_humanize_keeps_order() {
        let pattern = RhythmPatternData::new(eighths(8), "4/4").unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let human = pattern.humanize(1.0, &mut rng).unwrap();
        assert_eq!(human.len(), 8);
        assert!(check_notes(human.notes()).is_ok());
        for (a, b) in human.notes().iter().zip(pattern.notes()) {
            assert!((a.position - b.position).abs() <= 0.6);
        }

        let still = pattern.humanize(0.0, &mut rng).unwrap();
        assert_eq!(still.notes(), pattern.notes());

        assert_eq!(pattern.humanize(1.5, &mut rng).unwrap_err().code(), "range_error");
    }

    #[test]
    fn test_accents() {
        let mut notes = quarters(3);
        notes.push(RhythmNote::rest(3.0, 1.0).unwrap());
        let pattern = RhythmPatternData::new(notes, "4/4").unwrap();
        let accented = pattern.apply_accents(&[Accent::Strong, Accent::Weak]).unwrap();
        let accents: Vec<_> = accented.notes().iter().map(|n| n.accent).collect();
        assert_eq!(accents, vec![Some(Accent::Strong), Some(Accent::Weak), Some(Accent::Strong), None]);
        assert_eq!(accented.notes()[0].effective_velocity(), 77);

        assert_eq!(pattern.apply_accents(&[]).unwrap_err().code(), "validation_error");
    }

    #[test]
    fn test_variations() {
        let pattern = RhythmPatternData::new(quarters(4), "4/4").unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let same = pattern.apply_variations(0.0, &mut rng).unwrap();
        assert_eq!(same.notes(), pattern.notes());

        let varied = pattern.apply_variations(1.0, &mut rng).unwrap();
        for note in varied.notes() {
            assert!((note.velocity as i32 - DEFAULT_VELOCITY as i32).abs() <= VARIATION_VELOCITY);
        }
        assert!(pattern.apply_variations(-0.1, &mut rng).is_err());
    }

    #[test]
    fn test_euclidean() {
        assert_eq!(euclidean(3, 8).iter().filter(|&&h| h).count(), 3);
        assert_eq!(euclidean(5, 8).iter().filter(|&&h| h).count(), 5);
        assert_eq!(euclidean(0, 4), vec![false; 4]);
        assert_eq!(euclidean(4, 4), vec![true; 4]);
        assert!(euclidean(3, 8)[0]);

        let tresillo = RhythmPatternData::euclidean(3, 8, 0.5, "4/4").unwrap();
        assert_eq!(tresillo.len(), 3);
        assert_eq!(tresillo.total_duration(), 4.0);
    }

    #[test]
    fn test_presets_and_windows() {
        let waltz = RhythmPatternData::from_preset("waltz").unwrap();
        assert_eq!(waltz.beats_per_bar(), 3.0);
        assert_eq!(waltz.total_duration(), 3.0);

        let swing = RhythmPatternData::from_preset("swing_basic").unwrap();
        assert_eq!(swing.notes()[1].swing_ratio, Some(0.67));
        assert_eq!(swing.events_in(0.0..1.0).count(), 2);
        assert_eq!(swing.events_in(2.0..4.0).count(), 4);

        assert_eq!(RhythmPatternData::from_preset("tango").unwrap_err().code(), "pattern_error");
    }

    #[test]
    fn test_bars() {
        let pattern = RhythmPatternData::new(quarters(4), "3/4").unwrap();
        assert_eq!(pattern.bars(), 2);
        let exact = RhythmPatternData::new(quarters(6), "3/4").unwrap();
        assert_eq!(exact.bars(), 2);
    }
}
