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
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, error, info, span, Level};

use crate::playlist::PlaylistError;
use crate::sequencer::{Outcome, Sequencer};

pub mod keyboard;

/// A key was pressed. Which key doesn't matter, only when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    at: Instant,
}

impl TriggerEvent {
    /// Creates a trigger that happened at the given instant.
    pub fn new(at: Instant) -> TriggerEvent {
        TriggerEvent { at }
    }

    /// Creates a trigger that happened just now.
    pub fn now() -> TriggerEvent {
        TriggerEvent::new(Instant::now())
    }

    /// Returns when the trigger happened.
    pub fn at(&self) -> Instant {
        self.at
    }
}

/// Events that drivers send to the controller.
#[derive(Debug)]
pub enum Event {
    /// A key was pressed.
    Trigger(TriggerEvent),

    /// The driver could not keep watching for input.
    Failed(TriggerError),
}

/// Errors from an input driver.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("unable to install the global keyboard hook: {0}")]
    Install(String),
}

/// Errors that stop the controller.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Trigger(#[from] TriggerError),

    #[error(transparent)]
    Playlist(#[from] PlaylistError),
}

/// An input driver. Once started it sends an event for every trigger until stopped.
pub trait Driver: Send + Sync + 'static {
    /// Starts watching for input. Events are sent to events_tx.
    fn start(&self, events_tx: UnboundedSender<Event>) -> Result<(), TriggerError>;

    /// Stops delivering events.
    fn stop(&self);
}

/// Feeds driver events to the sequencer.
pub struct Controller {
    sequencer: Arc<Sequencer>,
    driver: Arc<dyn Driver>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(sequencer: Arc<Sequencer>, driver: Arc<dyn Driver>) -> Controller {
        Controller { sequencer, driver }
    }

    /// Returns the sequencer driven by this controller.
    pub fn sequencer(&self) -> &Arc<Sequencer> {
        &self.sequencer
    }

    /// Runs until the shutdown future resolves, the driver goes away, or something
    /// fatal happens. The driver is stopped on the way out.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), ControllerError>
    where
        F: Future<Output = ()>,
    {
        let span = span!(Level::INFO, "controller");
        let _enter = span.enter();

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        self.driver.start(events_tx)?;

        // Every run starts from the top of the playlist.
        self.sequencer.restart();

        let (position, notes) = self.sequencer.position();
        info!(
            gate = format!("{:?}", self.sequencer.gate_interval()),
            position,
            notes,
            device = self.sequencer.device().to_string(),
            "Controller started."
        );

        tokio::pin!(shutdown);
        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested.");
                    break Ok(());
                }
                event = events_rx.recv() => match event {
                    Some(Event::Trigger(trigger)) => match self.sequencer.handle_trigger(trigger) {
                        Ok(Outcome::Dispatched(note)) => {
                            debug!(note = note.to_string(), "Trigger dispatched.");
                        }
                        Ok(Outcome::Rejected) => {}
                        Err(e) => {
                            error!(err = e.to_string(), "Playlist invariant violated.");
                            break Err(e.into());
                        }
                    },
                    Some(Event::Failed(e)) => {
                        error!(err = e.to_string(), "Driver failed.");
                        break Err(e.into());
                    }
                    None => {
                        info!("Controller closing.");
                        break Ok(());
                    }
                },
            }
        };

        self.driver.stop();
        result
    }
}
