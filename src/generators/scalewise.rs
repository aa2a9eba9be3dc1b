// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scale-wise pattern interpreter.
//!
//! Every element must land on a member of the context scale. Degrees past
//! the end of the scale continue into the octaves above; interval steps are
//! folded back into the pattern's octave range.

use super::{
    fold_into_range, note_from_name, wrapped_degree, InterpreterKind, NotePatternData, PatternContext, PatternCursor,
    PatternElement, PatternInterpreter, Resolved,
};
use crate::error::{MusicError, Result};
use crate::music::note::Note;
use crate::music::scale::Scale;

/// Resolves degrees and intervals strictly inside a scale
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalePatternInterpreter;

impl ScalePatternInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Factory function for registry
    pub fn create() -> Box<dyn PatternInterpreter> {
        Box::new(Self::new())
    }
}

fn require_member(scale: &Scale, note: Note) -> Result<Note> {
    if scale.contains_pitch_class(note.pitch_class()) {
        Ok(note)
    } else {
        Err(MusicError::NotInScale {
            note: note.full_name(),
            scale: scale.to_string(),
        })
    }
}

impl PatternInterpreter for ScalePatternInterpreter {
    fn kind(&self) -> InterpreterKind {
        InterpreterKind::Scale
    }

    fn resolve_element(
        &self,
        element: &PatternElement,
        pattern: &NotePatternData,
        context: &PatternContext,
        cursor: &mut PatternCursor,
    ) -> Result<Resolved> {
        let scale = &context.scale;
        let note = match element {
            PatternElement::Rest(beats) => return Ok(Resolved::Rest(*beats)),
            PatternElement::Degree(degree) => wrapped_degree(scale, *degree)?,
            PatternElement::ScaleDegree(sd) => wrapped_degree(scale, sd.value)?,
            PatternElement::Interval(semitones) => {
                let origin = cursor.reference().unwrap_or_else(|| scale.root());
                let moved = fold_into_range(origin.transpose(*semitones)?, pattern.octave_range)?;
                require_member(scale, moved)?
            }
            PatternElement::Name(name) => {
                let octave = cursor.reference().unwrap_or_else(|| scale.root()).octave();
                require_member(scale, note_from_name(name, octave)?)?
            }
            PatternElement::Note(note) => require_member(scale, *note)?,
        };
        cursor.set_reference(note);
        Ok(Resolved::Note(note))
    }
}
