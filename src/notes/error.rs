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
use std::num::ParseIntError;
use std::path::PathBuf;

/// Errors from parsing an inline note source.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("source '{0}' must look like label:60,62,64")]
    MissingSeparator(String),

    #[error("source label must not be empty")]
    EmptyLabel,

    #[error("source '{0}' needs at least one note")]
    EmptyNoteList(String),

    #[error("invalid pitch '{token}': {source}")]
    InvalidPitch {
        token: String,
        source: ParseIntError,
    },

    #[error("pitch {0} is outside of 0-127")]
    PitchOutOfRange(i64),
}

/// Errors from reading notes out of a MIDI file.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to parse MIDI file {}: {source}", .path.display())]
    Midi {
        path: PathBuf,
        source: midly::Error,
    },

    #[error("MIDI file {} has {count} tracks, track {index} was requested", .path.display())]
    TrackOutOfRange {
        path: PathBuf,
        index: usize,
        count: usize,
    },

    #[error("no playable notes in MIDI file {}", .0.display())]
    NoNotes(PathBuf),
}
