// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Melodic pattern interpreter.
//!
//! Mixes chord-tone and scale-tone resolution according to the pattern's
//! flags:
//!
//! - `use_chord_tones`: degrees pick chord tones and intervals snap to the
//!   nearest chord tone.
//! - `use_scale_mode`: intervals count scale steps rather than semitones.
//!
//! With neither flag, intervals move chromatically from the previous note.
//! Interval results are folded back into the pattern's octave range.

use super::arpeggio::{chord_tone_at, effective_direction};
use super::{
    chord_ladder, fold_into_range, nearest_in_ladder, note_from_name, wrapped_degree, InterpreterKind,
    NotePatternData, PatternContext, PatternCursor, PatternElement, PatternInterpreter, Resolved,
};
use crate::error::{MusicError, Result};
use crate::music::note::Note;

/// Free melodic interpreter
#[derive(Debug, Clone, Copy, Default)]
pub struct MelodicPatternInterpreter;

impl MelodicPatternInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Factory function for registry
    pub fn create() -> Box<dyn PatternInterpreter> {
        Box::new(Self::new())
    }

    fn resolve_degree(
        &self,
        degree: u8,
        pattern: &NotePatternData,
        context: &PatternContext,
        cursor: &mut PatternCursor,
    ) -> Result<Note> {
        if !pattern.use_chord_tones {
            return wrapped_degree(&context.scale, degree);
        }
        let chord = context.chord_or_tonic()?;
        let ladder = chord_ladder(&chord, pattern.octave_range);
        if ladder.is_empty() {
            return Err(MusicError::Range(format!("no tones of {} in octave range", chord.symbol())));
        }
        let direction = effective_direction(pattern.direction, cursor);
        chord_tone_at(&ladder, &chord, degree, direction, cursor)
    }

    fn resolve_interval(
        &self,
        interval: i32,
        pattern: &NotePatternData,
        context: &PatternContext,
        cursor: &mut PatternCursor,
    ) -> Result<Note> {
        let chord = if pattern.use_chord_tones {
            Some(context.chord_or_tonic()?)
        } else {
            None
        };
        let origin = match (cursor.reference(), &chord) {
            (Some(reference), _) => reference,
            (None, Some(chord)) => chord.bass(),
            (None, None) => context.scale.root(),
        };

        let moved = if pattern.use_scale_mode {
            context.scale.step(&origin, interval)?
        } else {
            origin.transpose(interval)?
        };

        let landed = match &chord {
            Some(chord) => {
                let ladder = chord_ladder(chord, pattern.octave_range);
                nearest_in_ladder(&ladder, moved.midi_number() as i32)
                    .ok_or_else(|| MusicError::Range(format!("no tones of {} in octave range", chord.symbol())))?
            }
            None => moved,
        };
        fold_into_range(landed, pattern.octave_range)
    }
}

impl PatternInterpreter for MelodicPatternInterpreter {
    fn kind(&self) -> InterpreterKind {
        InterpreterKind::Melodic
    }

    fn resolve_element(
        &self,
        element: &PatternElement,
        pattern: &NotePatternData,
        context: &PatternContext,
        cursor: &mut PatternCursor,
    ) -> Result<Resolved> {
        let note = match element {
            PatternElement::Rest(beats) => return Ok(Resolved::Rest(*beats)),
            PatternElement::Degree(degree) => self.resolve_degree(*degree, pattern, context, cursor)?,
            PatternElement::ScaleDegree(sd) => self.resolve_degree(sd.value, pattern, context, cursor)?,
            PatternElement::Interval(interval) => self.resolve_interval(*interval, pattern, context, cursor)?,
            PatternElement::Name(name) => {
                let octave = cursor.reference().unwrap_or_else(|| context.scale.root()).octave();
                note_from_name(name, octave)?
            }
            PatternElement::Note(note) => *note,
        };
        cursor.set_reference(note);
        Ok(Resolved::Note(note))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::pattern::{NotePattern, PatternDirection};
    use crate::music::chord::Chord;
    use crate::music::scale::ScaleInfo;

    fn context(chord: Option<&str>) -> PatternContext {
        let ctx = PatternContext::new(ScaleInfo::from_key("C", "major").unwrap()).unwrap();
        match chord {
            Some(symbol) => ctx.with_chord(Chord::from_symbol(symbol, 4).unwrap()),
            None => ctx,
        }
    }

    fn run(data: NotePatternData, ctx: &PatternContext) -> Vec<String> {
        let pattern = NotePattern::new("melody", data).unwrap();
        let mut cursor = PatternCursor::with_seed(5);
        MelodicPatternInterpreter
            .interpret(&pattern, ctx, &mut cursor)
            .events
            .iter()
            .filter_map(|e| e.note())
            .map(|n| n.full_name())
            .collect()
    }

    fn intervals(values: &[i32]) -> NotePatternData {
        NotePatternData::new(values.iter().map(|&i| PatternElement::Interval(i)).collect())
    }

    #[test]
    fn test_chromatic_intervals() {
        let names = run(intervals(&[0, 1, 1, 1]), &context(None));
        assert_eq!(names, ["C4", "C#4", "D4", "D#4"]);
    }

    #[test]
    fn test_scale_mode_steps() {
        let names = run(intervals(&[0, 2, 2, -1]).scale_mode(), &context(None));
        assert_eq!(names, ["C4", "E4", "G4", "F4"]);
    }

    #[test]
    fn test_chord_tones_snap() {
        let names = run(intervals(&[0, 3, 3, 5]).chord_tones(), &context(Some("F")));
        assert_eq!(names, ["F4", "A4", "C5", "F5"]);

        // G4 sits between F4 and A4; ties go down
        let names = run(intervals(&[0, 2]).chord_tones(), &context(Some("F")));
        assert_eq!(names, ["F4", "F4"]);
    }

    #[test]
    fn test_chord_degrees_and_scale_degrees() {
        let degrees = |values: &[u8]| NotePatternData::new(values.iter().map(|&d| PatternElement::Degree(d)).collect());

        assert_eq!(run(degrees(&[1, 2, 3]), &context(Some("G"))), ["C4", "D4", "E4"]);
        assert_eq!(run(degrees(&[1, 2, 3]).chord_tones(), &context(Some("G"))), ["G4", "B4", "D5"]);

        let down = degrees(&[1, 2]).chord_tones().with_direction(PatternDirection::Down);
        assert_eq!(run(down, &context(Some("G"))), ["D5", "B4"]);
    }

    #[test]
    fn test_octave_range_folding() {
        let data = intervals(&[0, 12, 12]).with_octave_range(3, 4);
        assert_eq!(run(data, &context(None)), ["C4", "C4", "C4"]);
    }

    #[test]
    fn test_free_names() {
        let data = NotePatternData::new(vec![PatternElement::Name("Eb".to_string()), PatternElement::Interval(-1)]);
        assert_eq!(run(data, &context(None)), ["Eb4", "D4"]);
    }
}
