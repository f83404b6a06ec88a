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
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use duration_string::DurationString;
use tracing::info;

use crate::gate::{self, Gate, DEFAULT_GATE_INTERVAL};
use crate::notes::{self, midi_file, NoteSource, TrackSelection};
use crate::playlist::Playlist;
use crate::sequencer::Sequencer;

use self::singer::Singer;

mod audio;
mod error;
mod singer;

pub use self::audio::{Audio, DEFAULT_DEVICE};
pub use self::error::ConfigError;

/// Values given on the command line. They win over the configuration file.
#[derive(Debug, Default)]
pub struct Overrides {
    /// The configuration file to load first.
    pub config: Option<PathBuf>,
    /// Gate interval in seconds.
    pub gate_seconds: Option<f64>,
    /// Extra inline songs.
    pub songs: Vec<String>,
    /// Extra MIDI files.
    pub midi_files: Vec<PathBuf>,
    /// The MIDI track selection.
    pub midi_track: Option<String>,
    /// The audio device name.
    pub device: Option<String>,
    /// How long each note sounds.
    pub note_duration: Option<String>,
    /// Peak amplitude of each note.
    pub volume: Option<f32>,
    /// Never fall back to the built-in songs.
    pub no_builtin: bool,
}

/// The fully resolved startup configuration.
#[derive(Debug)]
pub struct Settings {
    gate: Duration,
    songs: Vec<String>,
    midi_files: Vec<PathBuf>,
    midi_track: TrackSelection,
    builtin_songs: bool,
    audio: Audio,
}

impl Settings {
    /// Loads the configuration file, if any, and applies the overrides on top of it.
    pub fn resolve(overrides: Overrides) -> Result<Settings, ConfigError> {
        let (file, base_path) = match &overrides.config {
            Some(path) => {
                info!(path = path.display().to_string(), "Loading configuration.");
                (
                    Singer::deserialize(path)?,
                    path.parent().map(Path::to_path_buf).unwrap_or_default(),
                )
            }
            None => (Singer::default(), PathBuf::new()),
        };

        let gate = match (overrides.gate_seconds, &file.gate) {
            (Some(seconds), _) => gate::interval_from_secs(seconds),
            (None, Some(gate)) => parse_duration(gate)?,
            (None, None) => DEFAULT_GATE_INTERVAL,
        };

        let midi_track = match overrides.midi_track.as_ref().or(file.midi_track.as_ref()) {
            Some(selection) => selection
                .parse::<TrackSelection>()
                .map_err(ConfigError::InvalidTrack)?,
            None => TrackSelection::default(),
        };

        let mut songs = file.songs;
        songs.extend(overrides.songs);

        let mut midi_files: Vec<PathBuf> = file
            .midi_files
            .iter()
            .map(|midi_file| base_path.join(midi_file))
            .collect();
        midi_files.extend(overrides.midi_files);

        let builtin_songs = !overrides.no_builtin && file.builtin_songs.unwrap_or(true);

        let audio = file.audio.unwrap_or_default().merge(
            overrides.device,
            overrides.note_duration,
            overrides.volume,
        );

        Ok(Settings {
            gate,
            songs,
            midi_files,
            midi_track,
            builtin_songs,
            audio,
        })
    }

    /// Returns the gate interval.
    pub fn gate(&self) -> Duration {
        self.gate
    }

    /// Returns the audio configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Loads every configured source: inline songs first, then MIDI files, each in the
    /// order given. The built-in songs fill in when nothing else is configured.
    pub fn load_sources(&self) -> Result<Vec<NoteSource>, ConfigError> {
        let mut sources = Vec::new();

        for raw in self.songs.iter() {
            let source = raw.parse::<NoteSource>().map_err(|e| ConfigError::Inline {
                raw: raw.clone(),
                source: e,
            })?;
            sources.push(source);
        }

        for path in self.midi_files.iter() {
            sources.push(midi_file::load(path, self.midi_track)?);
        }

        if sources.is_empty() && self.builtin_songs {
            info!("No songs configured, using the built-in songs.");
            sources = notes::builtin_songs();
        }

        if sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(sources)
    }

    /// Loads the sources and builds the playlist.
    pub fn playlist(&self) -> Result<Playlist, ConfigError> {
        Playlist::new(self.load_sources()?)
    }
}

/// Parses a duration string such as 400ms or 1s.
pub(crate) fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    DurationString::from_string(value.trim().to_string())
        .map(Duration::from)
        .map_err(|e| ConfigError::InvalidDuration {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Initializes the sequencer and controller from the settings and returns the controller.
/// The playlist is built before the audio device or the keyboard hook are touched, so a
/// bad song never leaves a hook installed.
pub fn init_sequencer_and_controller(
    settings: &Settings,
) -> Result<crate::controller::Controller, Box<dyn Error>> {
    let playlist = settings.playlist()?;
    let device = crate::audio::get_device(settings.audio())?;
    let sequencer = Arc::new(Sequencer::new(
        Gate::new(settings.gate()),
        playlist,
        device,
    ));

    Ok(crate::controller::Controller::new(
        sequencer,
        Arc::new(crate::controller::keyboard::Driver::new()),
    ))
}
