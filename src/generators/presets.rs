// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Built-in preset tables for progressions, note patterns and rhythms.

use crate::rhythm::Accent;

/// A named Roman numeral progression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionPreset {
    pub name: &'static str,
    pub description: &'static str,
    pub numerals: &'static [&'static str],
}

pub const PROGRESSION_PRESETS: &[ProgressionPreset] = &[
    ProgressionPreset {
        name: "I-IV-V-I",
        description: "Basic major cadence",
        numerals: &["I", "IV", "V", "I"],
    },
    ProgressionPreset {
        name: "I-V-vi-IV",
        description: "Pop progression",
        numerals: &["I", "V", "vi", "IV"],
    },
    ProgressionPreset {
        name: "I-IV-I-V",
        description: "Folk turnaround",
        numerals: &["I", "IV", "I", "V"],
    },
    ProgressionPreset {
        name: "ii-V-I",
        description: "Jazz cadence",
        numerals: &["ii7", "V7", "Imaj7"],
    },
    ProgressionPreset {
        name: "I-vi-IV-V",
        description: "Fifties progression",
        numerals: &["I", "vi", "IV", "V"],
    },
    ProgressionPreset {
        name: "canon",
        description: "Pachelbel's Canon",
        numerals: &["I", "V", "vi", "iii", "IV", "I", "IV", "V"],
    },
    ProgressionPreset {
        name: "i-iv-v",
        description: "Minor cadence",
        numerals: &["i", "iv", "v"],
    },
    ProgressionPreset {
        name: "i-VI-III-VII",
        description: "Minor pop progression",
        numerals: &["i", "VI", "III", "VII"],
    },
];

/// Look up a progression preset by name, ignoring case
pub fn progression_preset(name: &str) -> Option<&'static ProgressionPreset> {
    let name = name.trim();
    PROGRESSION_PRESETS
        .iter()
        .find(|p| p.name == name)
        .or_else(|| PROGRESSION_PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name)))
}

/// A note pattern given as semitone offsets from the starting note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotePatternPreset {
    pub name: &'static str,
    pub description: &'static str,
    pub offsets: &'static [i32],
}

impl NotePatternPreset {
    /// Offsets rewritten as steps between consecutive notes.
    ///
    /// The first entry is the offset of the first note from the reference.
    pub fn intervals(&self) -> Vec<i32> {
        let mut previous = 0;
        self.offsets
            .iter()
            .map(|&offset| {
                let step = offset - previous;
                previous = offset;
                step
            })
            .collect()
    }
}

pub const NOTE_PATTERN_PRESETS: &[NotePatternPreset] = &[
    NotePatternPreset {
        name: "simple_triad",
        description: "Major triad",
        offsets: &[0, 4, 7],
    },
    NotePatternPreset {
        name: "minor_triad",
        description: "Minor triad",
        offsets: &[0, 3, 7],
    },
    NotePatternPreset {
        name: "ascending_scale",
        description: "Major scale upwards",
        offsets: &[0, 2, 4, 5, 7, 9, 11, 12],
    },
    NotePatternPreset {
        name: "descending_scale",
        description: "Major scale downwards",
        offsets: &[12, 11, 9, 7, 5, 4, 2, 0],
    },
    NotePatternPreset {
        name: "triad_arpeggio",
        description: "Triad up and back down",
        offsets: &[0, 4, 7, 12, 7, 4],
    },
    NotePatternPreset {
        name: "pentatonic",
        description: "Major pentatonic upwards",
        offsets: &[0, 2, 4, 7, 9],
    },
];

pub fn note_pattern_preset(name: &str) -> Option<&'static NotePatternPreset> {
    let name = name.trim().to_lowercase();
    NOTE_PATTERN_PRESETS.iter().find(|p| p.name == name)
}

/// One hit of a rhythm preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetHit {
    pub position: f64,
    pub duration: f64,
    pub accent: Accent,
}

const fn hit(position: f64, duration: f64, accent: Accent) -> PresetHit {
    PresetHit {
        position,
        duration,
        accent,
    }
}

/// A named one-bar rhythm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RhythmPreset {
    pub name: &'static str,
    pub time_signature: &'static str,
    pub hits: &'static [PresetHit],
    /// Swing ratio applied after construction
    pub swing: Option<f64>,
}

pub const RHYTHM_PRESETS: &[RhythmPreset] = &[
    RhythmPreset {
        name: "basic_4_4",
        time_signature: "4/4",
        hits: &[
            hit(0.0, 1.0, Accent::Strong),
            hit(1.0, 1.0, Accent::Weak),
            hit(2.0, 1.0, Accent::Normal),
            hit(3.0, 1.0, Accent::Weak),
        ],
        swing: None,
    },
    RhythmPreset {
        name: "waltz",
        time_signature: "3/4",
        hits: &[
            hit(0.0, 1.0, Accent::Strong),
            hit(1.0, 1.0, Accent::Weak),
            hit(2.0, 1.0, Accent::Weak),
        ],
        swing: None,
    },
    RhythmPreset {
        name: "swing_basic",
        time_signature: "4/4",
        hits: &[
            hit(0.0, 0.5, Accent::Strong),
            hit(0.5, 0.5, Accent::Weak),
            hit(1.0, 0.5, Accent::Normal),
            hit(1.5, 0.5, Accent::Weak),
            hit(2.0, 0.5, Accent::Normal),
            hit(2.5, 0.5, Accent::Weak),
            hit(3.0, 0.5, Accent::Normal),
            hit(3.5, 0.5, Accent::Weak),
        ],
        swing: Some(0.67),
    },
    RhythmPreset {
        name: "syncopated",
        time_signature: "4/4",
        hits: &[
            hit(0.0, 0.75, Accent::Strong),
            hit(0.75, 0.75, Accent::Normal),
            hit(1.5, 1.0, Accent::Strong),
            hit(2.5, 0.5, Accent::Weak),
            hit(3.0, 1.0, Accent::Normal),
        ],
        swing: None,
    },
];

pub fn rhythm_preset(name: &str) -> Option<&'static RhythmPreset> {
    let name = name.trim().to_lowercase();
    RHYTHM_PRESETS.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progression_lookup() {
        assert_eq!(progression_preset("canon").unwrap().numerals.len(), 8);
        assert_eq!(progression_preset("I-V-vi-IV").unwrap().numerals[2], "vi");
        assert!(progression_preset("CANON").is_some());
        assert!(progression_preset("unknown").is_none());
    }

    #[test]
    fn test_note_pattern_intervals() {
        let triad = note_pattern_preset("simple_triad").unwrap();
        assert_eq!(triad.intervals(), vec![0, 4, 3]);

        let down = note_pattern_preset("descending_scale").unwrap();
        assert_eq!(down.intervals()[0], 12);
        assert!(down.intervals()[1..].iter().all(|&i| i < 0));
    }

    #[test]
    fn test_rhythm_presets_fit_their_bar() {
        for preset in RHYTHM_PRESETS {
            let beats: f64 = preset.time_signature.split('/').next().unwrap().parse().unwrap();
            let end = preset
                .hits
                .iter()
                .map(|h| h.position + h.duration)
                .fold(0.0, f64::max);
            assert!(end <= beats, "{} runs past its bar", preset.name);
        }
        assert!(rhythm_preset("Waltz").is_some());
    }
}
