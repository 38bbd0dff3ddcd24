//! Timer sources for the event loop.
//!
//! Every timer is a slot in a [`TimerSet`] owned by the
//! [`EventLoop`](crate::mux::EventLoop); handlers address their timers through
//! the same [`Token`] the loop hands them at registration. A timer that has
//! expired is *pending* until its handler consumes it — an unconsumed pending
//! timer forces the next readiness wait to return immediately, so a handler
//! that forgets to consume spins the loop on purpose rather than silently
//! losing a tick.
//!
//! Expiry is computed against the loop's monotonic clock; `TimerSet` carries
//! the current cycle time so every handler in one wake cycle observes the same
//! instant.

use core::fmt;
use core::time::Duration;

use crate::mux::{Token, MAX_SOURCES};

// ═══════════════════════════════════════════════════════════════
//  Timer types
// ═══════════════════════════════════════════════════════════════

/// Expiry behaviour of a timer source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Re-expires every period until cancelled.
    Recurring,
    /// Expires at most once per arm call, then goes inert.
    OneShot,
}

/// A single timer slot.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    kind: TimerKind,
    period: Duration,
    /// Next expiry, as monotonic time-since-boot. `None` = inert.
    deadline: Option<Duration>,
    /// Expired but not yet consumed by its handler.
    pending: bool,
}

impl Timer {
    /// A timer armed at `now`. A zero or absent period leaves it inert until
    /// a later `arm` call, matching a descriptor created with a null period.
    pub fn new(kind: TimerKind, period: Option<Duration>, now: Duration) -> Self {
        let period = period.unwrap_or(Duration::ZERO);
        let deadline = (!period.is_zero()).then(|| now + period);
        Self {
            kind,
            period,
            deadline,
            pending: false,
        }
    }
}

/// Errors from timer operations. Any of these reaching the loop is fatal:
/// they mean a handler is addressing a slot that does not hold a timer,
/// which is a wiring bug, not a runtime condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The token does not name a registered source.
    UnknownToken,
    /// The token names a stream source, not a timer.
    NotATimer,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownToken => write!(f, "unknown source token"),
            Self::NotATimer => write!(f, "source is not a timer"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Timer set
// ═══════════════════════════════════════════════════════════════

/// All timer slots of one event loop, indexed by source token.
///
/// Stream sources occupy a `None` slot so token indices stay aligned with the
/// loop's source table.
pub struct TimerSet {
    slots: heapless::Vec<Option<Timer>, MAX_SOURCES>,
    /// Monotonic time of the current wake cycle.
    now: Duration,
}

impl TimerSet {
    pub fn new() -> Self {
        Self {
            slots: heapless::Vec::new(),
            now: Duration::ZERO,
        }
    }

    /// Append a slot and return its token. Called by the loop at
    /// registration; the slot index is the token index.
    pub fn add_slot(&mut self, timer: Option<Timer>) -> Option<Token> {
        let token = Token::new(self.slots.len());
        self.slots.push(timer).ok()?;
        Some(token)
    }

    /// Advance the cycle time. Called by the loop once per wake.
    pub(crate) fn set_now(&mut self, now: Duration) {
        self.now = now;
    }

    /// Monotonic time of the current wake cycle.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Arm (or re-arm) a recurring timer. Overwrites any pending expiry.
    /// A zero period disarms the timer, leaving it inert.
    pub fn arm(&mut self, token: Token, period: Duration) -> Result<(), TimerError> {
        let now = self.now;
        let t = self.timer_mut(token)?;
        t.kind = TimerKind::Recurring;
        t.period = period;
        t.deadline = (!period.is_zero()).then(|| now + period);
        t.pending = false;
        Ok(())
    }

    /// Arm a single expiry after `delay`. Overwrites any pending expiry.
    pub fn arm_once(&mut self, token: Token, delay: Duration) -> Result<(), TimerError> {
        let now = self.now;
        let t = self.timer_mut(token)?;
        t.kind = TimerKind::OneShot;
        t.deadline = Some(now + delay);
        t.pending = false;
        Ok(())
    }

    /// Disarm a timer. Clears any pending expiry.
    pub fn cancel(&mut self, token: Token) -> Result<(), TimerError> {
        let t = self.timer_mut(token)?;
        t.deadline = None;
        t.pending = false;
        Ok(())
    }

    /// Acknowledge an expiry. Must be called by the handler before it
    /// returns, or the next readiness wait re-fires immediately.
    ///
    /// Consuming an unexpired timer is a no-op. A recurring timer is
    /// rescheduled one full period from the current cycle time — after a
    /// period change the new period applies from now, with no credit for
    /// time already elapsed.
    pub fn consume(&mut self, token: Token) -> Result<(), TimerError> {
        let now = self.now;
        let t = self.timer_mut(token)?;
        if !t.pending {
            return Ok(());
        }
        t.pending = false;
        t.deadline = match t.kind {
            TimerKind::Recurring if !t.period.is_zero() => Some(now + t.period),
            _ => None,
        };
        Ok(())
    }

    /// Whether the timer behind `token` has an unconsumed expiry.
    pub fn is_pending(&self, token: Token) -> bool {
        self.slots
            .get(token.index())
            .and_then(|s| s.as_ref())
            .is_some_and(|t| t.pending)
    }

    /// Whether any timer has an unconsumed expiry.
    pub(crate) fn any_pending(&self) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|t| t.pending)
    }

    /// Earliest armed deadline, if any timer is armed.
    pub(crate) fn next_deadline(&self) -> Option<Duration> {
        self.slots
            .iter()
            .flatten()
            .filter(|t| !t.pending)
            .filter_map(|t| t.deadline)
            .min()
    }

    /// Mark every timer whose deadline has passed as pending.
    pub(crate) fn mark_expired(&mut self) {
        let now = self.now;
        for t in self.slots.iter_mut().flatten() {
            if let Some(deadline) = t.deadline {
                if deadline <= now {
                    t.pending = true;
                }
            }
        }
    }

    fn timer_mut(&mut self, token: Token) -> Result<&mut Timer, TimerError> {
        self.slots
            .get_mut(token.index())
            .ok_or(TimerError::UnknownToken)?
            .as_mut()
            .ok_or(TimerError::NotATimer)
    }
}

impl Default for TimerSet {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
