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
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, span, Level, Span};

use crate::audio;
use crate::controller::TriggerEvent;
use crate::gate::Gate;
use crate::notes::Note;
use crate::playlist::{Playlist, PlaylistError};

/// What happened to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The gate rejected the trigger. Nothing moved and nothing played.
    Rejected,
    /// The playlist advanced and the note was sent to the device.
    Dispatched(Note),
}

/// The state that every trigger reads and writes.
struct State {
    gate: Gate,
    playlist: Playlist,
}

/// The sequencer turns triggers into notes: gate, advance, play.
pub struct Sequencer {
    /// Gate and playlist share one lock so a trigger is checked, advanced, and
    /// dispatched as one step.
    state: Mutex<State>,
    /// The voice player.
    device: Arc<dyn audio::Device>,
    /// The logging span.
    span: Span,
}

impl Sequencer {
    /// Creates a new sequencer.
    pub fn new(gate: Gate, playlist: Playlist, device: Arc<dyn audio::Device>) -> Sequencer {
        Sequencer {
            state: Mutex::new(State { gate, playlist }),
            device,
            span: span!(Level::INFO, "sequencer"),
        }
    }

    /// Handles a single trigger. Safe to call from any thread. A device failure is
    /// logged and the trigger still counts; only a broken playlist is an error.
    pub fn handle_trigger(&self, event: TriggerEvent) -> Result<Outcome, PlaylistError> {
        let _enter = self.span.enter();

        let mut state = self.state.lock();
        if !state.gate.should_accept(event.at()) {
            debug!("Trigger rejected by the gate.");
            return Ok(Outcome::Rejected);
        }

        let position = state.playlist.position();
        let note = state.playlist.advance()?;

        info!(
            source = state
                .playlist
                .source_at(position)
                .map(|source| source.label())
                .unwrap_or_default(),
            note = note.to_string(),
            position = format!("{}/{}", position + 1, state.playlist.len()),
            "Playing note."
        );

        // Dispatch returns as soon as the voice is queued, so it's fine under the lock.
        if let Err(e) = self.device.play(note) {
            error!(
                err = e.to_string(),
                note = note.to_string(),
                "Unable to play note."
            );
        }

        Ok(Outcome::Dispatched(note))
    }

    /// Moves the playlist back to its first note. The gate is left alone.
    pub fn restart(&self) {
        let _enter = self.span.enter();
        self.state.lock().playlist.restart();
    }

    /// Returns the gate interval.
    pub fn gate_interval(&self) -> Duration {
        self.state.lock().gate.interval()
    }

    /// Returns the current playlist position and the total number of notes.
    pub fn position(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.playlist.position(), state.playlist.len())
    }

    /// Returns a description of the playlist.
    pub fn describe_playlist(&self) -> String {
        self.state.lock().playlist.to_string()
    }

    /// Returns the device the sequencer plays through.
    pub fn device(&self) -> &Arc<dyn audio::Device> {
        &self.device
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use crate::audio::mock;
    use crate::controller::TriggerEvent;
    use crate::gate::Gate;
    use crate::notes::{Note, NoteSource};
    use crate::playlist::Playlist;

    use super::{Outcome, Sequencer};

    fn sequencer(interval: Duration, sources: &[&str]) -> (Sequencer, Arc<mock::Device>) {
        let device = Arc::new(mock::Device::get("mock-device"));
        let playlist = Playlist::new(
            sources
                .iter()
                .map(|raw| raw.parse::<NoteSource>().expect("valid source"))
                .collect(),
        )
        .expect("valid playlist");
        (
            Sequencer::new(Gate::new(interval), playlist, device.clone()),
            device,
        )
    }

    fn pitches(notes: &[Note]) -> Vec<u8> {
        notes.iter().map(|note| note.pitch()).collect()
    }

    #[test]
    fn test_spaced_triggers_all_dispatch() {
        let (sequencer, device) =
            sequencer(Duration::from_millis(400), &["a:60,62", "b:64"]);
        let start = Instant::now();

        let outcomes: Vec<Outcome> = (0..4)
            .map(|i| {
                sequencer
                    .handle_trigger(TriggerEvent::new(start + Duration::from_millis(400 * i)))
                    .expect("playlist has notes")
            })
            .collect();

        assert!(outcomes
            .iter()
            .all(|outcome| matches!(outcome, Outcome::Dispatched(_))));
        assert_eq!(vec![60, 62, 64, 60], pitches(&device.played()));
        assert_eq!((1, 3), sequencer.position());
    }

    #[test]
    fn test_close_triggers_rejected() {
        let (sequencer, device) = sequencer(Duration::from_millis(400), &["lead:60,62,64,67"]);
        let start = Instant::now();

        assert_eq!(
            Outcome::Dispatched(Note::new(60).expect("valid pitch")),
            sequencer
                .handle_trigger(TriggerEvent::new(start))
                .expect("playlist has notes")
        );
        assert_eq!(
            Outcome::Rejected,
            sequencer
                .handle_trigger(TriggerEvent::new(start + Duration::from_millis(150)))
                .expect("playlist has notes")
        );

        // The rejected trigger changed nothing.
        assert_eq!((1, 4), sequencer.position());
        assert_eq!(vec![60], pitches(&device.played()));

        assert!(matches!(
            sequencer
                .handle_trigger(TriggerEvent::new(start + Duration::from_millis(400)))
                .expect("playlist has notes"),
            Outcome::Dispatched(_)
        ));
        assert_eq!(vec![60, 62], pitches(&device.played()));
    }

    #[test]
    fn test_overlapping_voices_stay_live() {
        let (sequencer, device) = sequencer(Duration::ZERO, &["lead:60,64"]);
        let now = Instant::now();

        sequencer
            .handle_trigger(TriggerEvent::new(now))
            .expect("playlist has notes");
        sequencer
            .handle_trigger(TriggerEvent::new(now))
            .expect("playlist has notes");

        assert_eq!(2, device.live_voices().len());
    }

    #[test]
    fn test_play_failure_is_swallowed() {
        let (sequencer, device) = sequencer(Duration::ZERO, &["lead:60,62,64"]);
        let now = Instant::now();

        device.fail_next_play();
        assert_eq!(
            Outcome::Dispatched(Note::new(60).expect("valid pitch")),
            sequencer
                .handle_trigger(TriggerEvent::new(now))
                .expect("playlist has notes")
        );
        sequencer
            .handle_trigger(TriggerEvent::new(now))
            .expect("playlist has notes");

        // The failed note still moved the cursor; the loop kept going.
        assert_eq!(vec![62], pitches(&device.played()));
        assert_eq!((2, 3), sequencer.position());
    }

    #[test]
    fn test_restart() {
        let (sequencer, device) = sequencer(Duration::ZERO, &["a:60,62", "b:64"]);
        let now = Instant::now();

        for _ in 0..2 {
            sequencer
                .handle_trigger(TriggerEvent::new(now))
                .expect("playlist has notes");
        }
        assert_eq!((2, 3), sequencer.position());

        sequencer.restart();
        assert_eq!((0, 3), sequencer.position());
        assert_eq!(
            Outcome::Dispatched(Note::new(60).expect("valid pitch")),
            sequencer
                .handle_trigger(TriggerEvent::new(now))
                .expect("playlist has notes")
        );
        assert_eq!(vec![60, 62, 60], pitches(&device.played()));
    }

    #[test]
    fn test_concurrent_triggers_never_skip_or_repeat() {
        let raw = format!(
            "scale:{}",
            (0..100)
                .map(|pitch| pitch.to_string())
                .collect::<Vec<String>>()
                .join(",")
        );
        let (sequencer, device) = sequencer(Duration::ZERO, &[raw.as_str()]);
        let sequencer = Arc::new(sequencer);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sequencer = sequencer.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        sequencer
                            .handle_trigger(TriggerEvent::new(Instant::now()))
                            .expect("playlist has notes");
                    }
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().is_ok());
        }

        let played = pitches(&device.played());
        assert_eq!((0..100).collect::<Vec<u8>>(), played);
        assert_eq!(100, played.iter().collect::<HashSet<_>>().len());
        assert_eq!((0, 100), sequencer.position());
    }

    #[test]
    fn test_concurrent_triggers_within_gate_accept_once() {
        let (sequencer, device) = sequencer(Duration::from_secs(60), &["lead:60,62,64"]);
        let sequencer = Arc::new(sequencer);
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sequencer = sequencer.clone();
                thread::spawn(move || {
                    sequencer
                        .handle_trigger(TriggerEvent::new(now))
                        .expect("playlist has notes")
                })
            })
            .collect();

        let dispatched = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread panicked"))
            .filter(|outcome| matches!(outcome, Outcome::Dispatched(_)))
            .count();
        assert_eq!(1, dispatched);
        assert_eq!(vec![60], pitches(&device.played()));
    }
}
