//! Interactive redraw timer.
//!
//! The host owns the actual clock. It asks for the pending fire time with
//! [`Scheduler::poll`] (or keeps the token from [`Scheduler::pending`]) and
//! hands the token back when it fires. Every cancel bumps a generation
//! counter, so a token that was issued before a cancel, or before
//! [`Scheduler::shutdown`], no longer matches and its fire is ignored.

use log::debug;

use crate::error::FaceError;
use crate::mode::DisplayMode;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerState {
    Armed,
    Disarmed,
}

/// One scheduled fire.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimerToken {
    generation: u32,
    due_ms: i64,
}

impl TimerToken {
    #[inline]
    pub fn due_ms(&self) -> i64 {
        self.due_ms
    }
}

/// Delay until the next multiple of `interval_ms`, counted from the epoch.
/// Never zero: on a boundary the next fire is a whole interval away.
pub fn next_delay(interval_ms: u32, now_ms: i64) -> u32 {
    let interval = interval_ms as i64;
    (interval - now_ms.rem_euclid(interval)) as u32
}

#[derive(Clone, Debug)]
pub struct Scheduler {
    interval_ms: u32,
    generation: u32,
    pending: Option<TimerToken>,
    shut_down: bool,
}

impl Scheduler {
    pub fn new(interval_ms: u32) -> Result<Self, FaceError> {
        if interval_ms == 0 {
            return Err(FaceError::InvalidInterval(interval_ms));
        }
        Ok(Self {
            interval_ms,
            generation: 0,
            pending: None,
            shut_down: false,
        })
    }

    #[inline]
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Ticking only makes sense while the face is on screen and interactive.
    #[inline]
    pub fn should_run(mode: &DisplayMode) -> bool {
        mode.visible && !mode.ambient
    }

    pub fn state(&self) -> TimerState {
        if self.pending.is_some() {
            TimerState::Armed
        } else {
            TimerState::Disarmed
        }
    }

    #[inline]
    pub fn pending(&self) -> Option<TimerToken> {
        self.pending
    }

    fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.pending.take().is_some() {
            debug!("timer canceled");
        }
    }

    /// Cancel whatever is pending, then schedule the next aligned fire if
    /// the mode wants ticking.
    pub fn rearm(&mut self, now_ms: i64, mode: &DisplayMode) {
        self.cancel();
        if self.shut_down || !Self::should_run(mode) {
            return;
        }
        let delay = next_delay(self.interval_ms, now_ms);
        let token = TimerToken {
            generation: self.generation,
            due_ms: now_ms + delay as i64,
        };
        debug!("timer armed: +{}ms (due {})", delay, token.due_ms);
        self.pending = Some(token);
    }

    /// Hand out the pending token once it is due.
    ///
    /// The token leaves `pending` here, so `state()` reads `Disarmed` until
    /// the host feeds it back to `fire`.
    pub fn poll(&mut self, now_ms: i64) -> Option<TimerToken> {
        match self.pending {
            Some(t) if t.due_ms <= now_ms => self.pending.take(),
            _ => None,
        }
    }

    /// Handle a fire. Returns true if a redraw should be requested.
    ///
    /// A current token rearms the timer for the next boundary. Stale tokens
    /// and fires after shutdown change nothing.
    #[must_use]
    pub fn fire(&mut self, token: TimerToken, now_ms: i64, mode: &DisplayMode) -> bool {
        if self.shut_down {
            debug!("timer fire after shutdown ignored");
            return false;
        }
        if token.generation != self.generation {
            debug!(
                "stale timer fire ignored (gen {} != {})",
                token.generation, self.generation
            );
            return false;
        }
        self.rearm(now_ms, mode);
        true
    }

    /// Cancel for good. Nothing rearms after this.
    pub fn shutdown(&mut self) {
        self.cancel();
        self.shut_down = true;
        debug!("timer shut down");
    }

    #[inline]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}
