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
use core::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use midly::{MidiMessage, Smf, Track, TrackEventKind};
use tracing::{debug, info};

use super::{FileError, Note, NoteSource};

/// Which track of a MIDI file supplies the melody.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackSelection {
    /// The first track that contains any note-on events.
    #[default]
    First,
    /// Note-ons from every track, ordered by absolute tick.
    Merged,
    /// A specific track, zero indexed.
    Index(usize),
}

impl FromStr for TrackSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(TrackSelection::First),
            "merged" => Ok(TrackSelection::Merged),
            other => other
                .parse::<usize>()
                .map(TrackSelection::Index)
                .map_err(|_| format!("unknown MIDI track selection '{}'", s)),
        }
    }
}

impl fmt::Display for TrackSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackSelection::First => write!(f, "first"),
            TrackSelection::Merged => write!(f, "merged"),
            TrackSelection::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Loads a note source from the given MIDI file.
pub fn load(path: &Path, selection: TrackSelection) -> Result<NoteSource, FileError> {
    let buf = fs::read(path).map_err(|e| FileError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let smf = Smf::parse(&buf).map_err(|e| FileError::Midi {
        path: path.to_path_buf(),
        source: e,
    })?;

    let notes = match selection {
        TrackSelection::First => smf
            .tracks
            .iter()
            .map(|track| note_ons(track))
            .find(|notes| !notes.is_empty())
            .unwrap_or_default(),
        TrackSelection::Merged => {
            let mut timed: Vec<(u64, Note)> = smf
                .tracks
                .iter()
                .flat_map(|track| timed_note_ons(track))
                .collect();
            // Stable, so simultaneous notes keep their track order.
            timed.sort_by_key(|(tick, _)| *tick);
            timed.into_iter().map(|(_, note)| note).collect()
        }
        TrackSelection::Index(index) => match smf.tracks.get(index) {
            Some(track) => note_ons(track),
            None => {
                return Err(FileError::TrackOutOfRange {
                    path: path.to_path_buf(),
                    index,
                    count: smf.tracks.len(),
                })
            }
        },
    };

    debug!(
        file = path.display().to_string(),
        tracks = smf.tracks.len(),
        selection = selection.to_string(),
        notes = notes.len(),
        "Parsed MIDI file."
    );

    let label = format!(
        "MIDI:{}",
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string())
    );
    let source =
        NoteSource::new(&label, notes).map_err(|_| FileError::NoNotes(path.to_path_buf()))?;

    info!(source = source.label(), notes = source.len(), "Loaded MIDI source.");
    Ok(source)
}

/// Returns the note-on events of a track paired with their absolute tick.
/// A note-on with zero velocity is a note-off and is skipped.
fn timed_note_ons(track: &Track) -> Vec<(u64, Note)> {
    let mut tick: u64 = 0;
    let mut notes = Vec::new();
    for event in track.iter() {
        tick += event.delta.as_int() as u64;
        if let TrackEventKind::Midi {
            message: MidiMessage::NoteOn { key, vel },
            ..
        } = &event.kind
        {
            if vel.as_int() > 0 {
                notes.push((tick, Note::from(*key)));
            }
        }
    }
    notes
}

fn note_ons(track: &Track) -> Vec<Note> {
    timed_note_ons(track)
        .into_iter()
        .map(|(_, note)| note)
        .collect()
}
