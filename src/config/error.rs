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
use crate::notes::{FileError, ParseError};

/// Typed error for startup configuration failures. Any of these stops the
/// singer before the keyboard hook is installed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("invalid MIDI track selection: {0}")]
    InvalidTrack(String),

    #[error("volume must be between 0.0 and 1.0, got {0}")]
    InvalidVolume(f32),

    #[error("no song sources were configured")]
    NoSources,

    #[error("song source '{0}' has no notes")]
    EmptySource(String),

    #[error("invalid inline song '{raw}': {source}")]
    Inline { raw: String, source: ParseError },

    #[error(transparent)]
    File(#[from] FileError),
}
