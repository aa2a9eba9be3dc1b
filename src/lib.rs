// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! notegen - music theory data model and note generation.
//!
//! Notes, scales, chords and Roman numerals live in [`music`]. Chord
//! progressions and note patterns are produced in [`generators`], rhythms
//! in [`rhythm`], and [`sequence`] combines all three into a validated
//! [`NoteSequence`]. [`config`] reads the same request from a YAML file.

pub mod config;
pub mod error;
pub mod generators;
pub mod music;
pub mod rhythm;
pub mod sequence;

pub use config::SessionFile;
pub use error::{MusicError, Result};
pub use generators::{
    ChordProgression, ChordProgressionGenerator, InterpreterKind, InterpreterRegistry, Interpretation, NotePattern,
    NotePatternData, PatternContext, PatternCursor, PatternDirection, PatternElement, PatternInterpreter,
};
pub use music::{Chord, ChordQualityType, Note, RomanNumeral, Scale, ScaleDegree, ScaleInfo, ScaleType};
pub use rhythm::{Accent, RhythmNote, RhythmPatternData, TimeSignature};
pub use sequence::{
    EventPitch, GeneratedSequence, NoteEvent, NoteSequence, NoteSequenceGenerator, ValidationLevel, ValidationReport,
    VoiceLeadingRule,
};
