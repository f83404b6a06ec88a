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
use std::f32::consts::PI;
use std::time::Duration;

use crate::notes::Note;

pub const DEFAULT_NOTE_DURATION: Duration = Duration::from_millis(550);
pub const DEFAULT_VOLUME: f32 = 0.3;
const ATTACK: Duration = Duration::from_millis(15);
const RELEASE: Duration = Duration::from_millis(200);

/// The shape of a rendered note: a sine wave with a linear attack and release.
#[derive(Clone, Debug, PartialEq)]
pub struct Tone {
    /// How long each note sounds.
    duration: Duration,
    /// Peak amplitude, 0.0-1.0.
    volume: f32,
}

impl Tone {
    pub fn new(duration: Duration, volume: f32) -> Tone {
        Tone {
            duration,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    #[cfg(test)]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[cfg(test)]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Renders the note as mono samples at the given sample rate.
    pub fn render(&self, note: Note, sample_rate: u32) -> Vec<f32> {
        let len = samples_for(self.duration, sample_rate);
        let attack = samples_for(ATTACK, sample_rate).clamp(1, len.max(1));
        let release = samples_for(RELEASE, sample_rate).clamp(1, len.max(1));
        let frequency = note.frequency();

        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                let mut gain = 1.0;
                if i < attack {
                    gain *= ramp(i, attack);
                }
                if i >= len - release {
                    gain *= ramp(len - 1 - i, release);
                }
                (2.0 * PI * frequency * t).sin() * gain * self.volume
            })
            .collect()
    }
}

impl Default for Tone {
    fn default() -> Self {
        Tone::new(DEFAULT_NOTE_DURATION, DEFAULT_VOLUME)
    }
}

fn samples_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * sample_rate as f64) as usize
}

/// Linear ramp from 0.0 at step 0 to 1.0 at the last step.
fn ramp(step: usize, steps: usize) -> f32 {
    if steps <= 1 {
        return 1.0;
    }
    step as f32 / (steps - 1) as f32
}
