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
// Voice mixing that's independent of any audio backend.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;

/// Global voice ID counter.
static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

/// A single sounding note. Once handed to the mixer, the mixer owns it until it
/// runs out of samples.
pub struct Voice {
    /// Unique ID for this voice.
    id: u64,
    /// The rendered mono samples.
    samples: Arc<[f32]>,
    /// The next sample to play.
    position: usize,
}

impl Voice {
    /// Creates a new voice that starts at the beginning of the samples.
    pub fn new(samples: Arc<[f32]>) -> Voice {
        Voice {
            id: NEXT_VOICE_ID.fetch_add(1, Ordering::Relaxed),
            samples,
            position: 0,
        }
    }

    /// Returns the ID of the voice.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns true once every sample has been played.
    pub fn is_finished(&self) -> bool {
        self.position >= self.samples.len()
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        match self.samples.get(self.position) {
            Some(sample) => {
                self.position += 1;
                *sample
            }
            None => 0.0,
        }
    }
}

/// Sums every active voice into interleaved output frames. New voices arrive over
/// a channel so that the audio callback never waits on a lock.
pub struct VoiceMixer {
    /// Voices currently sounding.
    voices: Vec<Voice>,
    /// Incoming voices.
    voice_rx: Receiver<Voice>,
    /// Number of interleaved output channels.
    num_channels: u16,
}

impl VoiceMixer {
    /// Creates a new mixer.
    pub fn new(voice_rx: Receiver<Voice>, num_channels: u16) -> VoiceMixer {
        VoiceMixer {
            voices: Vec::new(),
            voice_rx,
            num_channels: num_channels.max(1),
        }
    }

    /// Returns the number of voices still sounding.
    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    /// Fills the interleaved output buffer. Every channel gets the same mono mix.
    pub fn fill(&mut self, output: &mut [f32]) {
        while let Ok(voice) = self.voice_rx.try_recv() {
            self.voices.push(voice);
        }

        let num_channels = self.num_channels as usize;
        for frame in output.chunks_mut(num_channels) {
            let mut mixed = 0.0f32;
            for voice in self.voices.iter_mut() {
                mixed += voice.next_sample();
            }
            frame.fill(mixed.clamp(-1.0, 1.0));
        }

        self.voices.retain(|voice| !voice.is_finished());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn voice(samples: &[f32]) -> Voice {
        Voice::new(Arc::from(samples.to_vec()))
    }

    #[test]
    fn test_voice_ids_unique() {
        let first = voice(&[0.0]);
        let second = voice(&[0.0]);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_mix_overlapping_voices() {
        let (voice_tx, voice_rx) = crossbeam_channel::unbounded();
        let mut mixer = VoiceMixer::new(voice_rx, 2);

        voice_tx
            .send(voice(&[0.1, 0.1, 0.1, 0.1]))
            .expect("mixer should be listening");
        let mut output = vec![0.0f32; 4];
        mixer.fill(&mut output);
        assert_eq!(vec![0.1, 0.1, 0.1, 0.1], output);
        assert_eq!(1, mixer.active_count());

        // A second voice joins without cutting off the first.
        voice_tx
            .send(voice(&[0.2, 0.2, 0.2, 0.2]))
            .expect("mixer should be listening");
        let mut output = vec![0.0f32; 6];
        mixer.fill(&mut output);
        assert!((output[0] - 0.3).abs() < 1e-6);
        assert!((output[1] - 0.3).abs() < 1e-6);
        assert!((output[2] - 0.3).abs() < 1e-6);
        // The first voice ran out, so only the second remains.
        assert!((output[4] - 0.2).abs() < 1e-6);
        assert_eq!(1, mixer.active_count());

        let mut output = vec![0.0f32; 2];
        mixer.fill(&mut output);
        assert_eq!(0, mixer.active_count());
        let mut output = vec![1.0f32; 2];
        mixer.fill(&mut output);
        assert_eq!(vec![0.0, 0.0], output);
    }

    #[test]
    fn test_mix_clamps() {
        let (voice_tx, voice_rx) = crossbeam_channel::unbounded();
        let mut mixer = VoiceMixer::new(voice_rx, 1);
        for _ in 0..4 {
            voice_tx
                .send(voice(&[0.5, -0.5]))
                .expect("mixer should be listening");
        }

        let mut output = vec![0.0f32; 2];
        mixer.fill(&mut output);
        assert_eq!(vec![1.0, -1.0], output);
    }
}
