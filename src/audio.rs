// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
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
use std::{error::Error, fmt, sync::Arc};

use crate::config;
use crate::notes::Note;

pub mod cpal;
pub mod mixer;
pub mod mock;
pub mod synth;

/// Channel used to hand new voices to the mixer without lock contention.
pub type VoiceSender = crossbeam_channel::Sender<mixer::Voice>;

/// Fatal errors from opening the audio backend.
#[derive(Debug, thiserror::Error)]
pub enum AudioInitError {
    #[error("no default output device available")]
    NoDefaultDevice,

    #[error("no output device found with name {0}")]
    DeviceNotFound(String),

    #[error("unable to list devices: {0}")]
    Devices(#[from] ::cpal::DevicesError),

    #[error("unable to get the default output config: {0}")]
    DefaultConfig(#[from] ::cpal::DefaultStreamConfigError),

    #[error("unsupported sample format {0}")]
    UnsupportedSampleFormat(String),

    #[error("unable to build output stream: {0}")]
    BuildStream(#[from] ::cpal::BuildStreamError),

    #[error("unable to start output stream: {0}")]
    PlayStream(#[from] ::cpal::PlayStreamError),

    #[error("unable to start the output thread: {0}")]
    Thread(#[from] std::io::Error),

    #[error("the output thread exited before the stream started")]
    ThreadExited,

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

/// Errors from playing a single note. These never stop the sequencer.
#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    #[error("the output stream is no longer running")]
    Disconnected,

    #[error("device error: {0}")]
    Device(String),
}

/// A voice player. Every call to play starts a new voice that is independent of
/// any voice already sounding.
pub trait Device: fmt::Display + Send + Sync {
    /// Starts playing the note and returns without waiting for it to finish. Once
    /// started, the voice belongs to the device.
    fn play(&self, note: Note) -> Result<(), PlayError>;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets the device described by the configuration. Names starting with "mock" get a
/// mock device that makes no sound.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Device>, AudioInitError> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device)));
    };

    Ok(Arc::new(cpal::Device::get(device, config.tone()?)?))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_mock_device() {
        let device = get_device(&config::Audio::new("mock-singer")).expect("mock device");
        assert_eq!("mock-singer (Mock)", device.to_string());
        assert!(device.play(Note::new(60).expect("valid pitch")).is_ok());
    }
}
