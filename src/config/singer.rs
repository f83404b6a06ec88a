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
use std::path::Path;

use config::{Config, File};
use serde::Deserialize;

use super::audio::Audio;
use super::error::ConfigError;

/// The configuration file for the singer.
#[derive(Deserialize, Default, Debug)]
pub(super) struct Singer {
    /// Minimum time between accepted key presses, e.g. 400ms.
    pub gate: Option<String>,
    /// Whether the built-in songs are used when no other songs are configured.
    pub builtin_songs: Option<bool>,
    /// Inline songs in the form label:60,62,64.
    #[serde(default)]
    pub songs: Vec<String>,
    /// MIDI files to read songs from. Relative paths resolve against the config file.
    #[serde(default)]
    pub midi_files: Vec<String>,
    /// Which MIDI track supplies the melody: first, merged, or a track index.
    pub midi_track: Option<String>,
    /// The audio configuration.
    pub audio: Option<Audio>,
}

impl Singer {
    /// Parse the singer configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Singer, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Singer>()?)
    }
}
