// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note events and sequences, the final output of generation.

pub mod builder;
pub mod validation;

use serde::{Deserialize, Serialize};

use crate::error::{MusicError, Result};
use crate::music::chord::Chord;
use crate::music::note::{MidiNote, Note, Semitones};
use crate::music::scale::ScaleDegree;

pub use builder::{GeneratedSequence, NoteSequenceGenerator};
pub use validation::{ValidationLevel, ValidationReport, Violation, VoiceLeadingRule};

/// What sounds at an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPitch {
    Note(Note),
    Degree(ScaleDegree),
    Chord(Chord),
    Rest,
}

/// A pitch (or silence) placed in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: EventPitch,
    /// Start in beats from the beginning of the sequence
    pub position: f64,
    pub duration: f64,
    pub velocity: u8,
}

impl NoteEvent {
    pub fn new(pitch: EventPitch, position: f64, duration: f64, velocity: u8) -> Result<Self> {
        if !position.is_finite() || position < 0.0 {
            return Err(MusicError::Validation(format!("event position {} must be non-negative", position)));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(MusicError::Validation(format!("event duration {} must be positive", duration)));
        }
        if velocity > 127 {
            return Err(MusicError::Validation(format!("velocity {} outside 0..=127", velocity)));
        }
        Ok(Self {
            pitch,
            position,
            duration,
            velocity,
        })
    }

    /// Event taking its length and velocity from the note
    pub fn from_note(note: Note, position: f64) -> Self {
        Self {
            pitch: EventPitch::Note(note),
            position: position.max(0.0),
            duration: note.duration(),
            velocity: note.velocity(),
        }
    }

    pub fn rest(position: f64, duration: f64) -> Result<Self> {
        Self::new(EventPitch::Rest, position, duration, 0)
    }

    pub fn is_rest(&self) -> bool {
        matches!(self.pitch, EventPitch::Rest)
    }

    pub fn end(&self) -> f64 {
        self.position + self.duration
    }

    /// The single note of a note or degree event
    pub fn note(&self) -> Option<Note> {
        match &self.pitch {
            EventPitch::Note(note) => Some(*note),
            EventPitch::Degree(sd) => Some(sd.note),
            _ => None,
        }
    }

    /// Sounding MIDI numbers, lowest voice first for chords
    pub fn midi_numbers(&self) -> Vec<MidiNote> {
        match &self.pitch {
            EventPitch::Note(note) => vec![note.midi_number()],
            EventPitch::Degree(sd) => vec![sd.note.midi_number()],
            EventPitch::Chord(chord) => chord.midi_numbers(),
            EventPitch::Rest => vec![],
        }
    }

    pub fn transpose(&self, semitones: Semitones) -> Result<Self> {
        let pitch = match &self.pitch {
            EventPitch::Note(note) => EventPitch::Note(note.transpose(semitones)?),
            EventPitch::Degree(sd) => EventPitch::Degree(ScaleDegree::new(sd.value, sd.note.transpose(semitones)?)?),
            EventPitch::Chord(chord) => EventPitch::Chord(chord.transpose(semitones)?),
            EventPitch::Rest => EventPitch::Rest,
        };
        Ok(Self { pitch, ..self.clone() })
    }
}

/// Time-ordered note events
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NoteSequence {
    events: Vec<NoteEvent>,
}

impl NoteSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence from events in any order; sorting is stable by position
    pub fn from_events(mut events: Vec<NoteEvent>) -> Self {
        events.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { events }
    }

    /// Insert keeping position order
    pub fn push(&mut self, event: NoteEvent) {
        let at = self.events.partition_point(|e| e.position <= event.position);
        self.events.insert(at, event);
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sounding events only
    pub fn notes(&self) -> impl Iterator<Item = &NoteEvent> + '_ {
        self.events.iter().filter(|e| !e.is_rest())
    }

    /// End of the last event in beats
    pub fn total_duration(&self) -> f64 {
        self.events.iter().map(NoteEvent::end).fold(0.0, f64::max)
    }

    pub fn transpose(&self, semitones: Semitones) -> Result<Self> {
        let events = self
            .events
            .iter()
            .map(|e| e.transpose(semitones))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { events })
    }

    /// Check voice-leading rules at the given strictness
    pub fn validate(&self, level: ValidationLevel, rules: &[VoiceLeadingRule]) -> Result<ValidationReport> {
        validation::validate(self, level, rules)
    }
}
