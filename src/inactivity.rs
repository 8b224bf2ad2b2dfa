//! Inactivity detection.
//!
//! Every activity event re-arms a single countdown. When the countdown runs
//! out the monitor switches to a repeating toggle between idle and the idle
//! pose. Countdown and toggle live in one phase value, so at most one of them
//! exists at any time and re-arming replaces whichever is live.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::InactivityConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InactivityPhase {
    Disarmed,
    /// Waiting for the quiet period to elapse
    Countdown { deadline: Instant },
    /// Toggling the idle pose on a fixed period
    Toggling { next_toggle: Instant },
}

pub struct InactivityMonitor {
    delay: Duration,
    period: Duration,
    phase: InactivityPhase,
}

impl InactivityMonitor {
    pub fn new(config: &InactivityConfig) -> Self {
        Self {
            delay: config.delay(),
            period: config.toggle_period(),
            phase: InactivityPhase::Disarmed,
        }
    }

    pub fn phase(&self) -> InactivityPhase {
        self.phase
    }

    pub fn is_countdown_pending(&self) -> bool {
        matches!(self.phase, InactivityPhase::Countdown { .. })
    }

    pub fn is_toggling(&self) -> bool {
        matches!(self.phase, InactivityPhase::Toggling { .. })
    }

    /// Record activity: cancel any countdown or toggle and start a fresh countdown.
    ///
    /// Returns `true` if a running toggle was cancelled.
    pub fn arm(&mut self, now: Instant) -> bool {
        let was_toggling = self.is_toggling();
        if was_toggling {
            info!("Activity resumed, idle toggling stopped");
        }
        self.phase = InactivityPhase::Countdown {
            deadline: now + self.delay,
        };
        was_toggling
    }

    pub fn disarm(&mut self) {
        self.phase = InactivityPhase::Disarmed;
    }

    /// When the monitor next needs attention
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            InactivityPhase::Disarmed => None,
            InactivityPhase::Countdown { deadline } => Some(deadline),
            InactivityPhase::Toggling { next_toggle } => Some(next_toggle),
        }
    }

    /// Handle the deadline. Returns `true` when the idle pose should toggle now.
    pub fn fire(&mut self, now: Instant) -> bool {
        let due = match self.phase {
            InactivityPhase::Disarmed => return false,
            InactivityPhase::Countdown { deadline } => deadline,
            InactivityPhase::Toggling { next_toggle } => next_toggle,
        };
        if now < due {
            return false;
        }

        if self.is_countdown_pending() {
            info!("No activity for {:?}, idle toggling started", self.delay);
        } else {
            debug!("Idle toggle");
        }

        let mut next_toggle = due + self.period;
        if next_toggle <= now {
            next_toggle = now + self.period;
        }
        self.phase = InactivityPhase::Toggling { next_toggle };
        true
    }
}
