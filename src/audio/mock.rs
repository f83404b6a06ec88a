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
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::info;

use super::PlayError;
use crate::notes::Note;

/// A voice started on the mock device. It sounds until finished by hand.
#[derive(Clone)]
pub struct Voice {
    note: Note,
    finished: Arc<AtomicBool>,
}

impl Voice {
    /// Returns the note the voice is playing.
    pub fn note(&self) -> Note {
        self.note
    }

    /// Returns true if the voice is still sounding.
    pub fn is_live(&self) -> bool {
        !self.finished.load(Ordering::Relaxed)
    }

    /// Finishes the voice.
    #[cfg(test)]
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }
}

/// A mock device. Doesn't actually play anything, but remembers every voice it started.
#[derive(Clone)]
pub struct Device {
    name: String,
    voices: Arc<Mutex<Vec<Voice>>>,
    fail_next: Arc<AtomicBool>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            voices: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the notes played so far, in order.
    #[cfg(test)]
    pub fn played(&self) -> Vec<Note> {
        self.voices.lock().iter().map(Voice::note).collect()
    }

    /// Returns every voice started so far.
    #[cfg(test)]
    pub fn voices(&self) -> Vec<Voice> {
        self.voices.lock().clone()
    }

    /// Returns the voices that are still sounding.
    #[cfg(test)]
    pub fn live_voices(&self) -> Vec<Voice> {
        self.voices
            .lock()
            .iter()
            .filter(|voice| voice.is_live())
            .cloned()
            .collect()
    }

    /// Makes the next call to play fail, like a device hiccup would.
    #[cfg(test)]
    pub fn fail_next_play(&self) {
        self.fail_next.store(true, Ordering::Relaxed);
    }
}

impl super::Device for Device {
    /// Records a new live voice and returns immediately.
    fn play(&self, note: Note) -> Result<(), PlayError> {
        if self.fail_next.swap(false, Ordering::Relaxed) {
            return Err(PlayError::Device(format!("{} refused to play", self.name)));
        }

        let voice = Voice {
            note,
            finished: Arc::new(AtomicBool::new(false)),
        };
        let mut voices = self.voices.lock();
        let live = voices.iter().filter(|voice| voice.is_live()).count() + 1;
        info!(
            device = self.name,
            note = voice.note().to_string(),
            live,
            "Playing note."
        );
        voices.push(voice);
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}

#[cfg(test)]
mod test {
    use crate::audio::Device as _;
    use crate::notes::Note;

    use super::Device;

    #[test]
    fn test_second_voice_does_not_stop_first() {
        let device = Device::get("mock-device");
        let c4 = Note::new(60).expect("valid pitch");
        let e4 = Note::new(64).expect("valid pitch");

        device.play(c4).expect("play should succeed");
        device.play(e4).expect("play should succeed");

        let live = device.live_voices();
        assert_eq!(2, live.len());
        assert_eq!(vec![c4, e4], live.iter().map(|v| v.note()).collect::<Vec<_>>());

        device.voices()[0].finish();
        assert_eq!(vec![e4], device.live_voices().iter().map(|v| v.note()).collect::<Vec<_>>());
        assert_eq!(vec![c4, e4], device.played());
    }

    #[test]
    fn test_fail_next_play() {
        let device = Device::get("mock-device");
        let note = Note::new(60).expect("valid pitch");

        device.fail_next_play();
        assert!(device.play(note).is_err());
        assert!(device.play(note).is_ok());
        assert_eq!(vec![note], device.played());
    }
}
