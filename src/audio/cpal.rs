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
use std::{collections::HashMap, error::Error, fmt, sync::Arc, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use parking_lot::RwLock;
use tracing::{debug, error, info, span, Level};

use super::mixer::{Voice, VoiceMixer};
use super::synth::Tone;
use super::{AudioInitError, PlayError, VoiceSender};
use crate::config::DEFAULT_DEVICE;
use crate::notes::Note;

/// A voice player backed by a cpal output stream. The stream runs on its own
/// thread for as long as the device is alive.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The name of the host the device belongs to.
    host: String,
    /// The sample rate of the output stream.
    sample_rate: u32,
    /// The number of output channels.
    num_channels: u16,
    /// How notes are rendered.
    tone: Tone,
    /// Rendered notes, so a pitch is only synthesized once.
    rendered: RwLock<HashMap<Note, Arc<[f32]>>>,
    /// Hands new voices to the mixer in the audio callback.
    voice_tx: VoiceSender,
    /// Dropping this stops the output thread.
    _shutdown_tx: crossbeam_channel::Sender<()>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}, {}Hz) ({})",
            self.name, self.num_channels, self.sample_rate, self.host
        )
    }
}

impl Device {
    /// Lists cpal output devices.
    pub fn list() -> Result<Vec<String>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<String> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let max_channels = match device.supported_output_configs() {
                    Ok(configs) => configs.map(|config| config.channels()).max().unwrap_or(0),
                    Err(_) => continue,
                };

                if max_channels > 0 {
                    devices.push(format!(
                        "{} (Channels={}) ({})",
                        device.name()?,
                        max_channels,
                        host_id.name()
                    ));
                }
            }
        }

        devices.sort();
        Ok(devices)
    }

    /// Finds the named output device across all hosts.
    fn find(name: &str) -> Result<(cpal::Device, String), AudioInitError> {
        if name == DEFAULT_DEVICE {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or(AudioInitError::NoDefaultDevice)?;
            return Ok((device, host.id().name().to_string()));
        }

        for host_id in cpal::available_hosts() {
            let host = match cpal::host_from_id(host_id) {
                Ok(host) => host,
                Err(e) => {
                    debug!(err = e.to_string(), host = host_id.name(), "Host unavailable");
                    continue;
                }
            };

            for device in host.output_devices()? {
                if device.name().is_ok_and(|device_name| device_name.trim() == name) {
                    return Ok((device, host_id.name().to_string()));
                }
            }
        }

        Err(AudioInitError::DeviceNotFound(name.to_string()))
    }

    /// Opens the given device and starts its output stream.
    pub fn get(name: &str, tone: Tone) -> Result<Device, AudioInitError> {
        let span = span!(Level::INFO, "audio device (cpal)");
        let _enter = span.enter();

        let (device, host) = Device::find(name)?;
        let supported = device.default_output_config()?;
        let sample_rate = supported.sample_rate().0;
        let num_channels = supported.channels();

        let (voice_tx, voice_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), AudioInitError>>(1);

        // Streams aren't Send on every platform, so the stream is created and owned by
        // the output thread.
        thread::Builder::new()
            .name("keysinger-output".to_string())
            .spawn(move || {
                let mixer = VoiceMixer::new(voice_rx, num_channels);
                let config = supported.config();
                let stream = match supported.sample_format() {
                    cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer),
                    cpal::SampleFormat::F64 => build_stream::<f64>(&device, &config, mixer),
                    cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer),
                    cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, mixer),
                    cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer),
                    cpal::SampleFormat::U8 => build_stream::<u8>(&device, &config, mixer),
                    other => Err(AudioInitError::UnsupportedSampleFormat(format!("{:?}", other))),
                };

                let stream = match stream {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(e.into()));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                // Keep the stream alive until the device is dropped.
                let _ = shutdown_rx.recv();
                debug!("Output thread stopping.");
            })?;

        ready_rx
            .recv()
            .map_err(|_| AudioInitError::ThreadExited)??;

        let device = Device {
            name: name.to_string(),
            host,
            sample_rate,
            num_channels,
            tone,
            rendered: RwLock::new(HashMap::new()),
            voice_tx,
            _shutdown_tx: shutdown_tx,
        };
        info!(device = device.to_string(), "Output stream started.");

        Ok(device)
    }

    /// Returns the rendered samples for the note, rendering them the first time.
    fn samples(&self, note: Note) -> Arc<[f32]> {
        if let Some(samples) = self.rendered.read().get(&note) {
            return samples.clone();
        }

        self.rendered
            .write()
            .entry(note)
            .or_insert_with(|| Arc::from(self.tone.render(note, self.sample_rate)))
            .clone()
    }
}

impl super::Device for Device {
    fn play(&self, note: Note) -> Result<(), PlayError> {
        let voice = Voice::new(self.samples(note));
        debug!(note = note.to_string(), voice = voice.id(), "Starting voice.");
        self.voice_tx
            .send(voice)
            .map_err(|_| PlayError::Disconnected)
    }
}

/// Builds an output stream that converts the mixer's float output into the device's
/// sample type.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut mixer: VoiceMixer,
) -> Result<cpal::Stream, AudioInitError>
where
    T: SizedSample + FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    Ok(device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len(), 0.0);
            mixer.fill(&mut scratch);
            for (dst, src) in data.iter_mut().zip(scratch.iter()) {
                *dst = T::from_sample(*src);
            }
        },
        |err| error!("CPAL output stream error: {}", err),
        None,
    )?)
}
