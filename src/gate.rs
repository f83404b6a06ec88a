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
use std::time::{Duration, Instant};

use tracing::warn;

/// The default minimum time between accepted triggers.
pub const DEFAULT_GATE_INTERVAL: Duration = Duration::from_millis(400);

/// A debounce gate. Triggers arriving within the interval of the last accepted
/// trigger are rejected.
#[derive(Debug)]
pub struct Gate {
    /// The minimum time between accepted triggers.
    interval: Duration,
    /// When the last trigger was accepted.
    last_accepted: Option<Instant>,
}

impl Gate {
    /// Creates a new gate with the given interval.
    pub fn new(interval: Duration) -> Gate {
        Gate {
            interval,
            last_accepted: None,
        }
    }

    /// Returns the gate interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true and records the trigger if it's far enough from the last accepted
    /// one. An instant earlier than the last accepted trigger counts as no time elapsed.
    pub fn should_accept(&mut self, now: Instant) -> bool {
        if let Some(last_accepted) = self.last_accepted {
            if now.saturating_duration_since(last_accepted) < self.interval {
                return false;
            }
        }

        self.last_accepted = Some(now);
        true
    }
}

impl Default for Gate {
    fn default() -> Self {
        Gate::new(DEFAULT_GATE_INTERVAL)
    }
}

/// Converts seconds into a gate interval, normalizing bad input to zero.
pub fn interval_from_secs(seconds: f64) -> Duration {
    if !seconds.is_finite() || seconds < 0.0 {
        warn!(seconds, "Gate interval must be a non-negative number, using 0.");
        return Duration::ZERO;
    }
    Duration::from_secs_f64(seconds)
}
