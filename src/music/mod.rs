// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory core.
//!
//! Pitches, scales, chords and Roman numeral analysis. Everything here is a
//! pure value computation over read-only tables.

pub mod chord;
pub mod note;
pub mod roman;
pub mod scale;

pub use chord::{Chord, ChordQualityType};
pub use note::{Accidental, Letter, MidiNote, Note, NoteName, PitchClass, Semitones};
pub use roman::RomanNumeral;
pub use scale::{Scale, ScaleDegree, ScaleInfo, ScaleType, MAJOR_DEGREE_QUALITIES, MINOR_DEGREE_QUALITIES};
