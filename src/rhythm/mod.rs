// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Rhythm pattern engine.
//!
//! Timed notes and rests in a meter, validated for overlap, plus the swing,
//! groove, humanize, accent and variation transformations.

pub mod pattern;
pub mod time_signature;

pub use pattern::{check_notes, euclidean, Accent, RhythmNote, RhythmPatternData};
pub use time_signature::TimeSignature;
