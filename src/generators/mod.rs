// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Generators that turn abstract material into concrete notes.
//!
//! Progressions come from [`progression`]. Note patterns are resolved by
//! one of three interpreters sharing the [`PatternInterpreter`] trait:
//! scale-wise, arpeggio and melodic. Interpreters hold no traversal state;
//! the position inside a looping pattern lives in a [`PatternCursor`].

pub mod arpeggio;
pub mod melody;
pub mod pattern;
pub mod presets;
pub mod progression;
pub mod scalewise;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{MusicError, Result};
use crate::music::chord::Chord;
use crate::music::note::{Note, DEFAULT_DURATION, DEFAULT_VELOCITY};
use crate::music::scale::{Scale, ScaleInfo};
use crate::sequence::NoteEvent;

pub use pattern::{NotePattern, NotePatternData, PatternDirection, PatternElement};
pub use progression::{ChordProgression, ChordProgressionGenerator};

/// Key and harmony a pattern is resolved against
#[derive(Debug, Clone, PartialEq)]
pub struct PatternContext {
    pub scale_info: ScaleInfo,
    pub scale: Scale,
    pub chord: Option<Chord>,
}

impl PatternContext {
    pub fn new(scale_info: ScaleInfo) -> Result<Self> {
        Ok(Self {
            scale: scale_info.scale()?,
            scale_info,
            chord: None,
        })
    }

    pub fn with_chord(mut self, chord: Chord) -> Self {
        self.chord = Some(chord);
        self
    }

    pub fn set_chord(&mut self, chord: Option<Chord>) {
        self.chord = chord;
    }

    /// The current chord, or the tonic chord of the key
    pub fn chord_or_tonic(&self) -> Result<Chord> {
        match &self.chord {
            Some(chord) => Ok(chord.clone()),
            None => Chord::new(self.scale_info.root, self.scale_info.default_quality(1)?),
        }
    }
}

/// Traversal state for applying a fixed pattern repeatedly
#[derive(Debug, Clone)]
pub struct PatternCursor {
    index: usize,
    passes: usize,
    reference: Option<Note>,
    last_chord: Option<Chord>,
    rng: StdRng,
}

impl PatternCursor {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Cursor whose random choices repeat for the same seed
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            index: 0,
            passes: 0,
            reference: None,
            last_chord: None,
            rng,
        }
    }

    /// Index of the next element to resolve
    pub fn index(&self) -> usize {
        self.index
    }

    /// Completed passes through the pattern
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Last resolved note, the origin for intervals
    pub fn reference(&self) -> Option<Note> {
        self.reference
    }

    pub fn set_reference(&mut self, note: Note) {
        self.reference = Some(note);
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Back to the first element with no reference note
    pub fn reset(&mut self) {
        self.index = 0;
        self.passes = 0;
        self.reference = None;
    }

    /// Move past the current element, wrapping modulo `len`
    pub fn advance(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.index += 1;
        if self.index >= len {
            self.index = 0;
            self.passes += 1;
        }
    }

    /// Record the chord in effect, restarting if it changed and `restart` is set
    pub fn sync_chord(&mut self, chord: Option<&Chord>, restart: bool) {
        let changed = self.last_chord.as_ref() != chord;
        if changed && restart && self.last_chord.is_some() {
            self.reset();
        }
        if changed {
            self.last_chord = chord.cloned();
        }
    }
}

impl Default for PatternCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// What a single element resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Note(Note),
    Rest(f64),
}

/// An element left out of the output and why
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedElement {
    pub index: usize,
    pub element: PatternElement,
    pub reason: MusicError,
}

/// Events produced from a pattern plus any elements that could not resolve
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interpretation {
    pub events: Vec<NoteEvent>,
    pub skipped: Vec<SkippedElement>,
}

impl Interpretation {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Fail on the first skipped element instead of degrading
    pub fn into_strict(self) -> Result<Vec<NoteEvent>> {
        match self.skipped.into_iter().next() {
            Some(skip) => Err(MusicError::Pattern(format!(
                "element {} ({}) could not be resolved: {}",
                skip.index, skip.element, skip.reason
            ))),
            None => Ok(self.events),
        }
    }
}

/// Resolves pattern elements into notes against a scale and chord
pub trait PatternInterpreter: Send + Sync {
    fn kind(&self) -> InterpreterKind;

    /// Resolve one element, updating the cursor's reference note
    fn resolve_element(
        &self,
        element: &PatternElement,
        pattern: &NotePatternData,
        context: &PatternContext,
        cursor: &mut PatternCursor,
    ) -> Result<Resolved>;

    /// One full pass over the pattern from the cursor's position
    fn interpret(&self, pattern: &NotePattern, context: &PatternContext, cursor: &mut PatternCursor) -> Interpretation {
        self.interpret_steps(pattern, context, cursor, pattern.len())
    }

    /// Resolve `steps` elements, wrapping around the pattern as needed.
    ///
    /// Unresolvable elements are logged and skipped. The cursor advances
    /// past skipped elements as well as resolved ones, so a bad element
    /// never stalls the pattern.
    fn interpret_steps(
        &self,
        pattern: &NotePattern,
        context: &PatternContext,
        cursor: &mut PatternCursor,
        steps: usize,
    ) -> Interpretation {
        let data = pattern.data();
        let mut result = Interpretation::default();
        if pattern.is_empty() {
            return result;
        }

        cursor.sync_chord(context.chord.as_ref(), data.restart_on_chord);
        let mut position = 0.0;
        for _ in 0..steps {
            let index = cursor.index() % pattern.len();
            let element = &data.elements[index];
            match self.resolve_element(element, data, context, cursor) {
                Ok(Resolved::Note(note)) => {
                    result.events.push(NoteEvent::from_note(note, position));
                    position += note.duration();
                }
                Ok(Resolved::Rest(beats)) => {
                    if let Ok(rest) = NoteEvent::rest(position, beats) {
                        result.events.push(rest);
                    }
                    position += beats;
                }
                Err(reason) => {
                    warn!(
                        pattern = pattern.name(),
                        index,
                        element = %element,
                        error = %reason,
                        "skipping unresolvable pattern element"
                    );
                    result.skipped.push(SkippedElement {
                        index,
                        element: element.clone(),
                        reason,
                    });
                }
            }
            cursor.advance(pattern.len());
        }
        result
    }
}

/// The built-in interpretation strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpreterKind {
    #[default]
    Scale,
    Arpeggio,
    Melodic,
}

impl InterpreterKind {
    pub const ALL: [InterpreterKind; 3] = [InterpreterKind::Scale, InterpreterKind::Arpeggio, InterpreterKind::Melodic];

    pub fn name(self) -> &'static str {
        match self {
            InterpreterKind::Scale => "scale",
            InterpreterKind::Arpeggio => "arpeggio",
            InterpreterKind::Melodic => "melodic",
        }
    }

    /// Strategy implied by a pattern's flags
    pub fn for_pattern(data: &NotePatternData) -> Self {
        if data.arpeggio_mode {
            InterpreterKind::Arpeggio
        } else if data.use_chord_tones || data.use_scale_mode {
            InterpreterKind::Melodic
        } else {
            InterpreterKind::Scale
        }
    }

    pub fn create(self) -> Box<dyn PatternInterpreter> {
        match self {
            InterpreterKind::Scale => scalewise::ScalePatternInterpreter::create(),
            InterpreterKind::Arpeggio => arpeggio::ArpeggioPatternInterpreter::create(),
            InterpreterKind::Melodic => melody::MelodicPatternInterpreter::create(),
        }
    }
}

impl FromStr for InterpreterKind {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "scale" | "scalewise" => Ok(InterpreterKind::Scale),
            "arpeggio" => Ok(InterpreterKind::Arpeggio),
            "melodic" | "melody" => Ok(InterpreterKind::Melodic),
            _ => Err(MusicError::Pattern(format!("unknown interpreter '{}'", s))),
        }
    }
}

impl fmt::Display for InterpreterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Factory function type for creating interpreters
pub type InterpreterFactory = fn() -> Box<dyn PatternInterpreter>;

/// Registry of interpreters by name
#[derive(Default)]
pub struct InterpreterRegistry {
    factories: HashMap<String, InterpreterFactory>,
}

impl InterpreterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the scale, arpeggio and melodic interpreters
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("scale", scalewise::ScalePatternInterpreter::create);
        registry.register("arpeggio", arpeggio::ArpeggioPatternInterpreter::create);
        registry.register("melodic", melody::MelodicPatternInterpreter::create);
        registry
    }

    pub fn register(&mut self, name: &str, factory: InterpreterFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn PatternInterpreter>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Registered names, sorted
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for InterpreterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpreterRegistry")
            .field("interpreters", &self.available())
            .finish()
    }
}

/// Note named with or without octave; bare names take `octave`
pub(crate) fn note_from_name(name: &str, octave: i8) -> Result<Note> {
    let name = name.trim();
    match Note::from_full_name(name) {
        Ok(note) => Ok(note),
        Err(_) => Note::from_name_octave(name, octave, DEFAULT_DURATION, DEFAULT_VELOCITY),
    }
}

/// Scale degree that may run past one octave, counted from the scale root
pub(crate) fn wrapped_degree(scale: &Scale, degree: u8) -> Result<Note> {
    if degree == 0 {
        return Err(MusicError::Range("pattern degrees start at 1".to_string()));
    }
    let per_octave = scale.degrees_per_octave();
    let zero_based = degree as usize - 1;
    let octaves = (zero_based / per_octave) as i32;
    scale
        .get_note_at_degree(zero_based % per_octave + 1)?
        .transpose(octaves * 12)
}

/// Move a note by whole octaves until it sits inside `range`
pub(crate) fn fold_into_range(note: Note, (low, high): (i8, i8)) -> Result<Note> {
    let mut folded = note;
    while folded.octave() > high {
        folded = folded.transpose(-12)?;
    }
    while folded.octave() < low {
        folded = folded.transpose(12)?;
    }
    Ok(folded)
}

/// Every note of a chord's pitch classes inside an octave range, ascending
pub(crate) fn chord_ladder(chord: &Chord, (low, high): (i8, i8)) -> Vec<Note> {
    let mut ladder: Vec<Note> = (low..=high)
        .flat_map(|octave| {
            chord
                .notes()
                .iter()
                .filter_map(move |n| Note::new(n.name(), octave, DEFAULT_DURATION, DEFAULT_VELOCITY).ok())
        })
        .collect();
    ladder.sort_by_key(Note::midi_number);
    ladder.dedup_by_key(|n| n.midi_number());
    ladder
}

/// Ladder note nearest to `midi`; ties go down
pub(crate) fn nearest_in_ladder(ladder: &[Note], midi: i32) -> Option<Note> {
    ladder
        .iter()
        .min_by_key(|n| ((n.midi_number() as i32 - midi).abs(), n.midi_number()))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::chord::ChordQualityType;

    struct EchoInterpreter;

    impl PatternInterpreter for EchoInterpreter {
        fn kind(&self) -> InterpreterKind {
            InterpreterKind::Scale
        }

        fn resolve_element(
            &self,
            element: &PatternElement,
            _pattern: &NotePatternData,
            _context: &PatternContext,
            _cursor: &mut PatternCursor,
        ) -> Result<Resolved> {
            match element {
                PatternElement::Note(note) => Ok(Resolved::Note(*note)),
                PatternElement::Rest(beats) => Ok(Resolved::Rest(*beats)),
                other => Err(MusicError::Pattern(format!("echo cannot play {}", other))),
            }
        }
    }

    fn echo() -> Box<dyn PatternInterpreter> {
        Box::new(EchoInterpreter)
    }

    fn context() -> PatternContext {
        PatternContext::new(ScaleInfo::from_key("C", "major").unwrap()).unwrap()
    }

    fn note(s: &str) -> Note {
        Note::from_full_name(s).unwrap()
    }

    #[test]
    fn test_skips_are_reported() {
        let data = NotePatternData::new(vec![
            PatternElement::Note(note("C4")),
            PatternElement::Degree(3),
            PatternElement::Rest(0.5),
            PatternElement::Note(note("E4")),
        ]);
        let pattern = NotePattern::new("mixed", data).unwrap();
        let mut cursor = PatternCursor::with_seed(1);
        let result = EchoInterpreter.interpret(&pattern, &context(), &mut cursor);

        assert_eq!(result.events.len(), 3);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].index, 1);
        assert!(!result.is_complete());
        assert_eq!(result.events[2].position, 1.5);
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.passes(), 1);

        let err = result.into_strict().unwrap_err();
        assert_eq!(err.code(), "pattern_error");
    }

    #[test]
    fn test_cursor_moves_past_a_skipped_element() {
        let data = NotePatternData::new(vec![PatternElement::Degree(2), PatternElement::Note(note("D4"))]);
        let pattern = NotePattern::new("bad first", data).unwrap();
        let mut cursor = PatternCursor::with_seed(1);

        let first = EchoInterpreter.interpret_steps(&pattern, &context(), &mut cursor, 1);
        assert!(first.events.is_empty());
        assert_eq!(first.skipped.len(), 1);
        assert_eq!(cursor.index(), 1);

        let second = EchoInterpreter.interpret_steps(&pattern, &context(), &mut cursor, 1);
        assert_eq!(second.events[0].note().unwrap().full_name(), "D4");
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.passes(), 1);
    }

    #[test]
    fn test_steps_wrap_around() {
        let data = NotePatternData::new(vec![PatternElement::Note(note("C4")), PatternElement::Note(note("D4"))]);
        let pattern = NotePattern::new("pair", data).unwrap();
        let mut cursor = PatternCursor::with_seed(1);
        let result = EchoInterpreter.interpret_steps(&pattern, &context(), &mut cursor, 5);
        let names: Vec<String> = result.events.iter().filter_map(|e| e.note()).map(|n| n.full_name()).collect();
        assert_eq!(names, ["C4", "D4", "C4", "D4", "C4"]);
        assert_eq!(cursor.index(), 1);
        assert!(result.into_strict().is_ok());
    }

    #[test]
    fn test_cursor_restarts_on_chord_change() {
        let c = Chord::new(note("C4"), ChordQualityType::Major).unwrap();
        let f = Chord::new(note("F4"), ChordQualityType::Major).unwrap();
        let mut cursor = PatternCursor::with_seed(1);

        cursor.sync_chord(Some(&c), true);
        cursor.advance(4);
        cursor.set_reference(note("E4"));
        cursor.sync_chord(Some(&c), true);
        assert_eq!(cursor.index(), 1);

        cursor.sync_chord(Some(&f), true);
        assert_eq!(cursor.index(), 0);
        assert!(cursor.reference().is_none());

        cursor.advance(4);
        cursor.sync_chord(Some(&c), false);
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn test_registry() {
        let mut registry = InterpreterRegistry::with_builtins();
        assert_eq!(registry.available(), ["arpeggio", "melodic", "scale"]);
        assert_eq!(registry.create("arpeggio").unwrap().kind(), InterpreterKind::Arpeggio);
        assert!(registry.create("nonexistent").is_none());

        registry.register("echo", echo);
        assert!(registry.create("echo").is_some());
        assert!(format!("{:?}", registry).contains("echo"));
    }

    #[test]
    fn test_kind_selection() {
        let base = NotePatternData::new(vec![PatternElement::Degree(1)]);
        assert_eq!(InterpreterKind::for_pattern(&base), InterpreterKind::Scale);
        assert_eq!(InterpreterKind::for_pattern(&base.clone().chord_tones()), InterpreterKind::Melodic);
        assert_eq!(InterpreterKind::for_pattern(&base.arpeggio()), InterpreterKind::Arpeggio);
        assert_eq!("melody".parse::<InterpreterKind>().unwrap(), InterpreterKind::Melodic);
        assert_eq!("drums".parse::<InterpreterKind>().unwrap_err().code(), "pattern_error");
        for kind in InterpreterKind::ALL {
            assert_eq!(kind.create().kind(), kind);
        }
    }

    #[test]
    fn test_helpers() {
        let scale = context().scale;
        assert_eq!(wrapped_degree(&scale, 9).unwrap().full_name(), "D5");
        assert_eq!(wrapped_degree(&scale, 8).unwrap().full_name(), "C5");
        assert!(wrapped_degree(&scale, 0).is_err());

        assert_eq!(fold_into_range(note("C7"), (3, 5)).unwrap().full_name(), "C5");
        assert_eq!(note_from_name("E", 3).unwrap().full_name(), "E3");
        assert_eq!(note_from_name("Bb2", 3).unwrap().full_name(), "Bb2");

        let chord = Chord::new(note("C4"), ChordQualityType::Major).unwrap();
        let ladder = chord_ladder(&chord, (3, 4));
        let names: Vec<String> = ladder.iter().map(|n| n.full_name()).collect();
        assert_eq!(names, ["C3", "E3", "G3", "C4", "E4", "G4"]);
        assert_eq!(nearest_in_ladder(&ladder, 62).unwrap().full_name(), "C4");
    }
}
