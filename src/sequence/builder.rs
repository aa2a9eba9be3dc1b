// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Combines a progression, a note pattern and a rhythm into a sequence.
//!
//! The rhythm is laid down once per chord. Each sounding rhythm slot takes
//! the next element of the pattern, resolved against that chord; rhythm
//! rests stay silent without consuming the pattern.

use tracing::{debug, info};

use super::validation::{ValidationLevel, ValidationReport, VoiceLeadingRule};
use super::{EventPitch, NoteEvent, NoteSequence};
use crate::error::{MusicError, Result};
use crate::generators::pattern::NotePattern;
use crate::generators::progression::ChordProgression;
use crate::generators::{InterpreterKind, PatternContext, PatternCursor, SkippedElement};
use crate::music::note::Semitones;
use crate::rhythm::RhythmPatternData;

/// A generated sequence with its diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSequence {
    pub sequence: NoteSequence,
    /// Pattern elements that could not be resolved, per chord
    pub skipped: Vec<(usize, SkippedElement)>,
    pub report: ValidationReport,
}

/// Builds note sequences from a progression, pattern and rhythm
#[derive(Debug, Clone)]
pub struct NoteSequenceGenerator {
    progression: ChordProgression,
    pattern: NotePattern,
    rhythm: RhythmPatternData,
    interpreter: InterpreterKind,
    validation_level: ValidationLevel,
    rules: Vec<VoiceLeadingRule>,
    include_chords: bool,
    seed: Option<u64>,
}

impl NoteSequenceGenerator {
    /// Generator using the interpreter implied by the pattern's flags
    pub fn new(progression: ChordProgression, pattern: NotePattern, rhythm: RhythmPatternData) -> Self {
        let interpreter = InterpreterKind::for_pattern(pattern.data());
        Self {
            progression,
            pattern,
            rhythm,
            interpreter,
            validation_level: ValidationLevel::default(),
            rules: Vec::new(),
            include_chords: false,
            seed: None,
        }
    }

    pub fn with_interpreter(mut self, interpreter: InterpreterKind) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_validation(mut self, level: ValidationLevel, rules: Vec<VoiceLeadingRule>) -> Self {
        self.validation_level = level;
        self.rules = rules;
        self
    }

    /// Also emit each chord as a sustained event under the pattern
    pub fn with_chords(mut self, include: bool) -> Self {
        self.include_chords = include;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn progression(&self) -> &ChordProgression {
        &self.progression
    }

    pub fn interpreter(&self) -> InterpreterKind {
        self.interpreter
    }

    /// Build the sequence, optionally transposed, and validate it
    pub fn generate(&self, transpose: Option<Semitones>) -> Result<GeneratedSequence> {
        if self.progression.is_empty() {
            return Err(MusicError::Validation("chord progression cannot be empty".to_string()));
        }

        let interpreter = self.interpreter.create();
        let mut cursor = match self.seed {
            Some(seed) => PatternCursor::with_seed(seed),
            None => PatternCursor::new(),
        };
        let mut context = PatternContext::new(*self.progression.scale_info())?;
        let bar_length = self.rhythm.total_duration();

        let mut events = Vec::new();
        let mut skipped = Vec::new();

        for (chord_index, chord) in self.progression.chords().iter().enumerate() {
            let offset = chord_index as f64 * bar_length;
            context.set_chord(Some(chord.clone()));

            if self.include_chords {
                events.push(NoteEvent::new(EventPitch::Chord(chord.clone()), offset, bar_length, chord.root().velocity())?);
            }

            for slot in self.rhythm.notes() {
                let position = offset + slot.position;
                if slot.is_rest {
                    events.push(NoteEvent::rest(position, slot.duration)?);
                    continue;
                }

                let result = interpreter.interpret_steps(&self.pattern, &context, &mut cursor, 1);
                skipped.extend(result.skipped.into_iter().map(|s| (chord_index, s)));
                let Some(event) = result.events.into_iter().next() else {
                    continue;
                };
                let timed = match event.pitch {
                    EventPitch::Rest => NoteEvent::rest(position, slot.duration)?,
                    pitch => NoteEvent::new(pitch, position, slot.duration, slot.effective_velocity())?,
                };
                events.push(timed);
            }
        }

        let mut sequence = NoteSequence::from_events(events);
        if let Some(semitones) = transpose.filter(|&s| s != 0) {
            sequence = sequence.transpose(semitones)?;
        }

        debug!(
            events = sequence.len(),
            skipped = skipped.len(),
            interpreter = %self.interpreter,
            "assembled sequence"
        );
        let report = sequence.validate(self.validation_level, &self.rules)?;
        info!(
            progression = self.progression.name(),
            pattern = self.pattern.name(),
            events = sequence.len(),
            violations = report.violations.len(),
            "generated note sequence"
        );

        Ok(GeneratedSequence {
            sequence,
            skipped,
            report,
        })
    }
}
