// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for the music-theory core.
//!
//! Every failure the core can produce is one of these kinds. They are raised
//! at the point of violation and propagate straight to the caller.

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, MusicError>;

/// Errors raised while building or transforming musical data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MusicError {
    /// Structural or range constraint violated at construction
    #[error("validation failed: {0}")]
    Validation(String),

    /// A string did not match its expected grammar
    #[error("cannot parse {what} from '{input}'")]
    Parse { what: &'static str, input: String },

    /// A numeric value fell outside its valid domain
    #[error("out of range: {0}")]
    Range(String),

    #[error("unknown chord quality '{0}'")]
    UnknownQuality(String),

    #[error("unknown scale type '{0}'")]
    UnknownScaleType(String),

    #[error("unknown groove '{0}' (expected one of: shuffle, straight, funk)")]
    UnknownGroove(String),

    #[error("unknown genre '{0}' (expected one of: pop, jazz, blues, classical)")]
    UnknownGenre(String),

    /// Two sounding rhythm notes share part of their time span
    #[error("rhythm notes overlap: note at {first_position} (length {first_duration}) runs into note at {second_position}")]
    Overlap {
        first_position: f64,
        first_duration: f64,
        second_position: f64,
    },

    #[error("mismatched lengths: {degrees} degrees but {qualities} qualities")]
    MismatchedLength { degrees: usize, qualities: usize },

    #[error("note {note} is not in scale {scale}")]
    NotInScale { note: String, scale: String },

    /// A progression or note pattern could not be resolved
    #[error("pattern error: {0}")]
    Pattern(String),
}

impl MusicError {
    /// Stable identifier for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            MusicError::Validation(_) => "validation_error",
            MusicError::Parse { .. } => "parse_error",
            MusicError::Range(_) => "range_error",
            MusicError::UnknownQuality(_) => "unknown_quality",
            MusicError::UnknownScaleType(_) => "unknown_scale_type",
            MusicError::UnknownGroove(_) => "unknown_groove",
            MusicError::UnknownGenre(_) => "unknown_genre",
            MusicError::Overlap { .. } => "overlap",
            MusicError::MismatchedLength { .. } => "mismatched_length",
            MusicError::NotInScale { .. } => "not_in_scale",
            MusicError::Pattern(_) => "pattern_error",
        }
    }

    pub(crate) fn parse(what: &'static str, input: impl Into<String>) -> Self {
        MusicError::Parse {
            what,
            input: input.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(MusicError::Range("x".into()).code(), "range_error");
        assert_eq!(MusicError::parse("note", "H4").code(), "parse_error");
        assert_eq!(
            MusicError::MismatchedLength {
                degrees: 2,
                qualities: 3
            }
            .code(),
            "mismatched_length"
        );
    }

    #[test]
    fn test_error_messages() {
        let err = MusicError::parse("roman numeral", "VIII");
        assert_eq!(err.to_string(), "cannot parse roman numeral from 'VIII'");

        let err = MusicError::UnknownGenre("polka".into());
        assert!(err.to_string().contains("polka"));
        assert!(err.to_string().contains("jazz"));
    }
}
