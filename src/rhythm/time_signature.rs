// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MusicError, Result};

const TIME_SIGNATURE_PATTERN: &str = r"^\d+/\d+$";

static TIME_SIGNATURE_REGEX: OnceLock<Regex> = OnceLock::new();

fn time_signature_regex() -> &'static Regex {
    TIME_SIGNATURE_REGEX.get_or_init(|| Regex::new(TIME_SIGNATURE_PATTERN).expect("invalid regex pattern"))
}

/// Meter written as "N/D"; D must be a power of two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSignature {
    numerator: u32,
    denominator: u32,
}

impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32) -> Result<Self> {
        if numerator == 0 || denominator == 0 || denominator & (denominator - 1) != 0 {
            return Err(MusicError::parse(
                "time signature",
                format!("{}/{}", numerator, denominator),
            ));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// Bar length in quarter-note beats
    pub fn beats_per_bar(&self) -> f64 {
        self.numerator as f64 * 4.0 / self.denominator as f64
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl FromStr for TimeSignature {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !time_signature_regex().is_match(s) {
            return Err(MusicError::parse("time signature", s));
        }
        let (num, den) = s.split_once('/').ok_or_else(|| MusicError::parse("time signature", s))?;
        let numerator = num.parse().map_err(|_| MusicError::parse("time signature", s))?;
        let denominator = den.parse().map_err(|_| MusicError::parse("time signature", s))?;
        TimeSignature::new(numerator, denominator)
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl TryFrom<String> for TimeSignature {
    type Error = MusicError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TimeSignature> for String {
    fn from(ts: TimeSignature) -> Self {
        ts.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_signatures() {
        let ts: TimeSignature = "4/4".parse().unwrap();
        assert_eq!(ts, TimeSignature::default());
        assert_eq!(ts.beats_per_bar(), 4.0);

        let ts: TimeSignature = "6/8".parse().unwrap();
        assert_eq!(ts.numerator(), 6);
        assert_eq!(ts.beats_per_bar(), 3.0);

        assert_eq!("7/16".parse::<TimeSignature>().unwrap().to_string(), "7/16");
    }

    #[test]
    fn test_reject_bad_time_signatures() {
        for bad in ["4/3", "0/4", "4/0", "4-4", "four/4", "4/4/4", "", "-3/4"] {
            let err = bad.parse::<TimeSignature>().unwrap_err();
            assert_eq!(err.code(), "parse_error", "{}", bad);
        }
    }

    #[test]
    fn test_time_signature_serde() {
        let ts: TimeSignature = serde_yaml::from_str("\"3/4\"").unwrap();
        assert_eq!(ts.beats_per_bar(), 3.0);
        assert!(serde_yaml::from_str::<TimeSignature>("\"3/5\"").is_err());
    }
}
