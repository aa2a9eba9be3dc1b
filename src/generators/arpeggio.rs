// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Arpeggio pattern interpreter.
//!
//! Elements walk the tones of the current chord, repeated across the
//! pattern's octave range. Degree `n` is the `n`th chord tone counted from
//! the chord's bass (direction up) or its top note (direction down).

use rand::Rng;

use super::{
    chord_ladder, nearest_in_ladder, note_from_name, InterpreterKind, NotePatternData, PatternContext, PatternCursor,
    PatternDirection, PatternElement, PatternInterpreter, Resolved,
};
use crate::error::{MusicError, Result};
use crate::music::chord::Chord;
use crate::music::note::Note;

/// Resolves elements against chord tones
#[derive(Debug, Clone, Copy, Default)]
pub struct ArpeggioPatternInterpreter;

impl ArpeggioPatternInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Factory function for registry
    pub fn create() -> Box<dyn PatternInterpreter> {
        Box::new(Self::new())
    }
}

/// Direction in effect for the cursor's current pass
pub(crate) fn effective_direction(direction: PatternDirection, cursor: &PatternCursor) -> PatternDirection {
    match direction {
        PatternDirection::Alternate if cursor.passes() % 2 == 0 => PatternDirection::Up,
        PatternDirection::Alternate => PatternDirection::Down,
        other => other,
    }
}

fn ladder_index(ladder: &[Note], note: Note) -> usize {
    let target = note.midi_number() as i32;
    ladder
        .iter()
        .enumerate()
        .min_by_key(|(_, n)| ((n.midi_number() as i32 - target).abs(), n.midi_number()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

pub(crate) fn chord_tone_at(
    ladder: &[Note],
    chord: &Chord,
    degree: u8,
    direction: PatternDirection,
    cursor: &mut PatternCursor,
) -> Result<Note> {
    if degree == 0 {
        return Err(MusicError::Range("chord tone degrees start at 1".to_string()));
    }
    let len = ladder.len() as i64;
    let steps = degree as i64 - 1;
    let index = match direction {
        PatternDirection::Random => cursor.rng().gen_range(0..ladder.len()) as i64,
        PatternDirection::Down => {
            let top = chord
                .notes()
                .iter()
                .copied()
                .max_by_key(Note::midi_number)
                .unwrap_or_else(|| chord.root());
            (ladder_index(ladder, top) as i64 - steps).rem_euclid(len)
        }
        _ => (ladder_index(ladder, chord.bass()) as i64 + steps).rem_euclid(len),
    };
    Ok(ladder[index as usize])
}

fn require_chord_tone(chord: &Chord, note: Note) -> Result<Note> {
    if chord.contains_pitch_class(note.pitch_class()) {
        Ok(note)
    } else {
        Err(MusicError::Validation(format!(
            "{} is not a tone of {}",
            note.full_name(),
            chord.symbol()
        )))
    }
}

impl PatternInterpreter for ArpeggioPatternInterpreter {
    fn kind(&self) -> InterpreterKind {
        InterpreterKind::Arpeggio
    }

    fn resolve_element(
        &self,
        element: &PatternElement,
        pattern: &NotePatternData,
        context: &PatternContext,
        cursor: &mut PatternCursor,
    ) -> Result<Resolved> {
        if let PatternElement::Rest(beats) = element {
            return Ok(Resolved::Rest(*beats));
        }

        let chord = context.chord_or_tonic()?;
        let ladder = chord_ladder(&chord, pattern.octave_range);
        if ladder.is_empty() {
            return Err(MusicError::Range(format!(
                "no tones of {} fit octaves {}..={}",
                chord.symbol(),
                pattern.octave_range.0,
                pattern.octave_range.1
            )));
        }
        let direction = effective_direction(pattern.direction, cursor);

        let note = match element {
            PatternElement::Degree(degree) => chord_tone_at(&ladder, &chord, *degree, direction, cursor)?,
            PatternElement::ScaleDegree(sd) => chord_tone_at(&ladder, &chord, sd.value, direction, cursor)?,
            PatternElement::Interval(semitones) => {
                let origin = cursor.reference().unwrap_or(ladder[ladder_index(&ladder, chord.bass())]);
                let target = origin.midi_number() as i32 + semitones;
                nearest_in_ladder(&ladder, target)
                    .ok_or_else(|| MusicError::Range(format!("no chord tone near MIDI {}", target)))?
            }
            PatternElement::Name(name) => {
                let octave = cursor.reference().unwrap_or_else(|| chord.root()).octave();
                require_chord_tone(&chord, note_from_name(name, octave)?)?
            }
            PatternElement::Note(note) => require_chord_tone(&chord, *note)?,
            PatternElement::Rest(beats) => return Ok(Resolved::Rest(*beats)),
        };
        cursor.set_reference(note);
        Ok(Resolved::Note(note))
    }
}
