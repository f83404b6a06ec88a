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
use serde::Deserialize;

use super::{error::ConfigError, parse_duration};
use crate::audio::synth::{Tone, DEFAULT_NOTE_DURATION, DEFAULT_VOLUME};

/// The name that selects the host's default output device.
pub const DEFAULT_DEVICE: &str = "default";

/// A YAML representation of the audio configuration.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Audio {
    /// The audio device. Unset or "default" picks the host default.
    device: Option<String>,

    /// How long each note sounds, e.g. 550ms.
    note_duration: Option<String>,

    /// Peak amplitude of each note, 0.0-1.0 (default: 0.3).
    volume: Option<f32>,
}

impl Audio {
    /// New will create a new Audio configuration.
    #[cfg(test)]
    pub fn new(device: &str) -> Audio {
        Audio {
            device: Some(device.to_string()),
            note_duration: None,
            volume: None,
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    /// Returns the tone that notes are rendered with.
    pub fn tone(&self) -> Result<Tone, ConfigError> {
        let duration = match &self.note_duration {
            Some(note_duration) => parse_duration(note_duration)?,
            None => DEFAULT_NOTE_DURATION,
        };
        let volume = self.volume.unwrap_or(DEFAULT_VOLUME);
        if !(0.0..=1.0).contains(&volume) {
            return Err(ConfigError::InvalidVolume(volume));
        }

        Ok(Tone::new(duration, volume))
    }

    /// Applies command line overrides on top of this configuration.
    pub(super) fn merge(
        mut self,
        device: Option<String>,
        note_duration: Option<String>,
        volume: Option<f32>,
    ) -> Audio {
        if device.is_some() {
            self.device = device;
        }
        if note_duration.is_some() {
            self.note_duration = note_duration;
        }
        if volume.is_some() {
            self.volume = volume;
        }
        self
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_defaults() {
        let audio = Audio::default();
        assert_eq!(DEFAULT_DEVICE, audio.device());
        assert_eq!(Tone::default(), audio.tone().expect("default tone"));
    }

    #[test]
    fn test_merge_and_tone() {
        let audio = Audio::new("speakers").merge(
            None,
            Some("1s".to_string()),
            Some(0.5),
        );
        assert_eq!("speakers", audio.device());

        let tone = audio.tone().expect("valid tone");
        assert_eq!(Duration::from_secs(1), tone.duration());
        assert_eq!(0.5, tone.volume());

        let audio = audio.merge(Some("mock-device".to_string()), None, Some(1.5));
        assert_eq!("mock-device", audio.device());
        assert!(matches!(audio.tone(), Err(ConfigError::InvalidVolume(_))));

        let audio = Audio::default().merge(None, Some("soon".to_string()), None);
        assert!(matches!(
            audio.tone(),
            Err(ConfigError::InvalidDuration { .. })
        ));
    }
}
