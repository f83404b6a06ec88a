// Copyright (C) 2024 Michael Wilson <mike@mdwn.dev>
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
use tracing::{debug, info, span, Level, Span};

use crate::config::ConfigError;
use crate::notes::{Note, NoteSource};
use core::fmt;

/// Raised when a playlist has no notes to give. Construction prevents this, so
/// seeing it means an invariant was broken.
#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    #[error("the playlist has no notes")]
    Empty,
}

/// Playlist is the cyclic sequence of notes played by the sequencer.
pub struct Playlist {
    /// The sources that make up this playlist, in order.
    sources: Vec<NoteSource>,
    /// The flattened notes of all sources.
    notes: Vec<Note>,
    /// The index of the source each flattened note came from.
    owners: Vec<usize>,
    /// The current position of the playlist.
    position: usize,
    /// The logging span.
    span: Span,
}

impl fmt::Display for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Playlist ({} sources, {} notes):",
            self.sources.len(),
            self.notes.len()
        )?;
        for source in self.sources.iter() {
            writeln!(f, "  - {}", source)?;
        }

        Ok(())
    }
}

impl Playlist {
    /// Creates a new playlist. There must be at least one source and every source must
    /// have notes.
    pub fn new(sources: Vec<NoteSource>) -> Result<Playlist, ConfigError> {
        if sources.is_empty() {
            return Err(ConfigError::NoSources);
        }

        let mut notes = Vec::new();
        let mut owners = Vec::new();
        for (index, source) in sources.iter().enumerate() {
            // NoteSource constructors already refuse empty lists.
            if source.is_empty() {
                return Err(ConfigError::EmptySource(source.label().to_string()));
            }
            notes.extend_from_slice(source.notes());
            owners.extend(std::iter::repeat(index).take(source.len()));
        }

        Ok(Playlist {
            sources,
            notes,
            owners,
            position: 0,
            span: span!(Level::INFO, "playlist"),
        })
    }

    /// Return the note at the current position of the playlist.
    pub fn current(&self) -> Result<Note, PlaylistError> {
        self.notes
            .get(self.position)
            .copied()
            .ok_or(PlaylistError::Empty)
    }

    /// Returns the note at the current position and moves to the next one. Moving past
    /// the last note wraps around to the first.
    pub fn advance(&mut self) -> Result<Note, PlaylistError> {
        let _enter = self.span.enter();

        let note = self.current()?;
        self.position = (self.position + 1) % self.notes.len();
        if self.position == 0 {
            debug!(notes = self.notes.len(), "Playlist wrapped to the beginning.");
        }

        Ok(note)
    }

    /// Moves back to the first note of the first source.
    pub fn restart(&mut self) {
        let _enter = self.span.enter();

        self.position = 0;
        info!("Restarting playlist.");
    }

    /// Returns the current position in the flattened notes.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the total number of notes.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Always false for a constructed playlist.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Returns the sources of the playlist.
    pub fn sources(&self) -> &[NoteSource] {
        &self.sources
    }

    /// Returns the source that the note at the given flattened position belongs to.
    pub fn source_at(&self, position: usize) -> Option<&NoteSource> {
        self.owners
            .get(position)
            .and_then(|index| self.sources.get(*index))
    }
}
