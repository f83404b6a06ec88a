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
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use rdev::EventType;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, span, Level};

use super::{Event, TriggerError, TriggerEvent};

/// A driver that listens to the keyboard globally, whichever window has focus.
/// Every key press is a trigger.
pub struct Driver {
    stopped: Arc<AtomicBool>,
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Maps a raw input event to a trigger. Key releases, mouse, and wheel
    /// events are ignored, as is everything after the driver is stopped.
    fn trigger_for(event_type: &EventType, stopped: &AtomicBool) -> Option<TriggerEvent> {
        if stopped.load(Ordering::Relaxed) {
            return None;
        }

        match event_type {
            EventType::KeyPress(_) => Some(TriggerEvent::now()),
            _ => None,
        }
    }
}

impl super::Driver for Driver {
    fn start(&self, events_tx: UnboundedSender<Event>) -> Result<(), TriggerError> {
        let stopped = self.stopped.clone();

        // rdev::listen never returns, so it can't live on the blocking pool.
        thread::Builder::new()
            .name("keysinger-keyboard".to_string())
            .spawn(move || {
                let span = span!(Level::INFO, "keyboard driver");
                let _enter = span.enter();

                info!("Keyboard driver started.");

                let callback_tx = events_tx.clone();
                let result = rdev::listen(move |event| {
                    if let Some(trigger) = Driver::trigger_for(&event.event_type, &stopped) {
                        if callback_tx.send(Event::Trigger(trigger)).is_err() {
                            debug!("Controller gone, dropping trigger.");
                        }
                    }
                });

                if let Err(e) = result {
                    error!(err = format!("{:?}", e), "Keyboard hook failed.");
                    let _ = events_tx.send(Event::Failed(TriggerError::Install(format!(
                        "{:?}",
                        e
                    ))));
                }
            })
            .map_err(|e| TriggerError::Install(e.to_string()))?;

        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
        info!("Keyboard driver stopped.");
    }
}
