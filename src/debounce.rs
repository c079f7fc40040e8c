//! Alert Debouncer - suppresses identical alerts inside a cool-down window
//!
//! Only the most recent emission is remembered. A different code always goes
//! through; the same code goes through once the window has elapsed.

use crate::types::AlertCode;
use std::time::{Duration, Instant};

/// Last emitted alert of a monitoring session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceState {
    pub last: Option<(AlertCode, Instant)>,
}

pub struct AlertDebouncer {
    window: Duration,
    state: DebounceState,
}

impl AlertDebouncer {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceState::default(),
        }
    }

    /// Returns `true` when the alert should be sent, recording it as the
    /// latest emission.
    pub fn consider(&mut self, code: AlertCode, now: Instant) -> bool {
        let emit = match self.state.last {
            None => true,
            Some((last_code, last_time)) => {
                last_code != code || now.saturating_duration_since(last_time) > self.window
            }
        };

        if emit {
            self.state.last = Some((code, now));
        } else {
            log::trace!("Suppressed repeated {code} alert");
        }
        emit
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = DebounceState::default();
    }
}

impl Default for AlertDebouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}
