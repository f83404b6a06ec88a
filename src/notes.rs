// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Notes and note sources.
//!
//! A note source is a named, non-empty list of pitches. Sources come from
//! inline strings (`label:60,62,64`), from MIDI files, or from the built-in
//! song table.

use core::fmt;
use std::str::FromStr;

use midly::num::u7;

mod error;
pub mod midi_file;

pub use error::{FileError, ParseError};
pub use midi_file::TrackSelection;

/// The highest pitch a note may have.
pub const MAX_PITCH: i64 = 127;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A single MIDI-compatible pitch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Note(u7);

impl Note {
    /// Creates a note from a pitch, rejecting anything outside 0-127.
    pub fn new(pitch: i64) -> Result<Note, ParseError> {
        if !(0..=MAX_PITCH).contains(&pitch) {
            return Err(ParseError::PitchOutOfRange(pitch));
        }
        Ok(Note(u7::from(pitch as u8)))
    }

    /// Returns the MIDI pitch.
    pub fn pitch(&self) -> u8 {
        self.0.as_int()
    }

    /// Returns the equal-tempered frequency of the note, with A4 = 440Hz.
    pub fn frequency(&self) -> f32 {
        440.0 * 2f32.powf((self.pitch() as f32 - 69.0) / 12.0)
    }

    /// Returns the scientific pitch name, e.g. C4 for 60.
    pub fn name(&self) -> String {
        let pitch = self.pitch() as i32;
        format!("{}{}", NOTE_NAMES[(pitch % 12) as usize], pitch / 12 - 1)
    }
}

impl From<u7> for Note {
    fn from(key: u7) -> Self {
        Note(key)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.pitch(), self.name())
    }
}

/// An ordered, named list of notes. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct NoteSource {
    label: String,
    notes: Vec<Note>,
}

impl NoteSource {
    /// Creates a new note source. The label must be non-empty and there must be at least one note.
    pub fn new(label: &str, notes: Vec<Note>) -> Result<NoteSource, ParseError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ParseError::EmptyLabel);
        }
        if notes.is_empty() {
            return Err(ParseError::EmptyNoteList(label.to_string()));
        }

        Ok(NoteSource {
            label: label.to_string(),
            notes,
        })
    }

    /// Creates a note source from raw pitches. Used for the built-in song table.
    fn from_pitches(label: &str, pitches: &[u8]) -> NoteSource {
        NoteSource {
            label: label.to_string(),
            notes: pitches.iter().map(|pitch| Note(u7::from(*pitch))).collect(),
        }
    }

    /// Builds a source without any checks.
    #[cfg(test)]
    pub(crate) fn unchecked(label: &str, notes: Vec<Note>) -> NoteSource {
        NoteSource {
            label: label.to_string(),
            notes,
        }
    }

    /// Gets the label of the source.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Gets the notes of the source.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Gets the number of notes in the source.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Always false for a constructed source, kept for the len/is_empty pairing.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl FromStr for NoteSource {
    type Err = ParseError;

    /// Parses an inline source of the form `label:60,62,64`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (label, body) = raw
            .split_once(':')
            .ok_or_else(|| ParseError::MissingSeparator(raw.to_string()))?;

        let label = label.trim();
        if label.is_empty() {
            return Err(ParseError::EmptyLabel);
        }

        let notes = body
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                let pitch = token
                    .parse::<i64>()
                    .map_err(|e| ParseError::InvalidPitch {
                        token: token.to_string(),
                        source: e,
                    })?;
                Note::new(pitch)
            })
            .collect::<Result<Vec<Note>, ParseError>>()?;

        NoteSource::new(label, notes)
    }
}

impl fmt::Display for NoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} notes)", self.label, self.notes.len())
    }
}

/// The songs used when nothing else is configured.
pub fn builtin_songs() -> Vec<NoteSource> {
    vec![
        NoteSource::from_pitches(
            "Twinkle Fragment",
            &[60, 60, 67, 67, 69, 69, 67, 65, 65, 64, 64, 62, 62, 60],
        ),
        NoteSource::from_pitches("Ascending C Major", &[60, 62, 64, 65, 67, 69, 71, 72]),
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    fn pitches(source: &NoteSource) -> Vec<u8> {
        source.notes().iter().map(|note| note.pitch()).collect()
    }

    #[test]
    fn test_parse_inline() {
        let source: NoteSource = "lead:60,62,64,67".parse().expect("should parse");
        assert_eq!("lead", source.label());
        assert_eq!(vec![60, 62, 64, 67], pitches(&source));
        assert_eq!(4, source.len());
    }

    #[test]
    fn test_parse_inline_whitespace() {
        let source: NoteSource = " bass : 40, 43 ,,45 ".parse().expect("should parse");
        assert_eq!("bass", source.label());
        assert_eq!(vec![40, 43, 45], pitches(&source));
    }

    #[test]
    fn test_parse_inline_errors() {
        assert!(matches!(
            "60,62".parse::<NoteSource>(),
            Err(ParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            ":60,62".parse::<NoteSource>(),
            Err(ParseError::EmptyLabel)
        ));
        assert!(matches!(
            "lead:".parse::<NoteSource>(),
            Err(ParseError::EmptyNoteList(_))
        ));
        assert!(matches!(
            "lead: , ,".parse::<NoteSource>(),
            Err(ParseError::EmptyNoteList(_))
        ));
        assert!(matches!(
            "lead:60,sixty".parse::<NoteSource>(),
            Err(ParseError::InvalidPitch { .. })
        ));
        assert!(matches!(
            "lead:60,128".parse::<NoteSource>(),
            Err(ParseError::PitchOutOfRange(128))
        ));
        assert!(matches!(
            "lead:-1".parse::<NoteSource>(),
            Err(ParseError::PitchOutOfRange(-1))
        ));
    }

    #[test]
    fn test_note() {
        let a4 = Note::new(69).expect("valid pitch");
        assert_eq!(440.0, a4.frequency());
        assert_eq!("A4", a4.name());

        let c4 = Note::new(60).expect("valid pitch");
        assert!((c4.frequency() - 261.6256).abs() < 0.01);
        assert_eq!("C4", c4.name());
        assert_eq!("60 (C4)", c4.to_string());

        assert_eq!("C-1", Note::new(0).expect("valid pitch").name());
        assert_eq!("G9", Note::new(127).expect("valid pitch").name());
    }

    #[test]
    fn test_empty_source_rejected() {
        assert!(matches!(
            NoteSource::new("nothing", vec![]),
            Err(ParseError::EmptyNoteList(_))
        ));
        assert!(matches!(
            NoteSource::new("  ", vec![Note::new(60).expect("valid pitch")]),
            Err(ParseError::EmptyLabel)
        ));
    }

    #[test]
    fn test_builtin_songs() {
        let songs = builtin_songs();
        assert_eq!(2, songs.len());
        assert_eq!("Twinkle Fragment", songs[0].label());
        assert_eq!(14, songs[0].len());
        assert_eq!(
            vec![60, 62, 64, 65, 67, 69, 71, 72],
            pitches(&songs[1])
        );
    }
}
