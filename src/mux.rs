//! Event loop / readiness multiplexer.
//!
//! The loop owns every registered source (timers and readable streams) and
//! their handlers. One wake cycle: block on the wait backend until a stream
//! is readable or the earliest timer deadline passes, resolve the ready
//! subset, then invoke each ready source's handler exactly once, in
//! registration order.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Event Sources                           │
//! │                                                              │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌──────────┐   │
//! │  │ Recurring │  │ One-Shot  │  │ Serial    │  │ Shutdown │   │
//! │  │ Timers    │  │ Timers    │  │ Stream    │  │ Flag     │   │
//! │  └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └─────┬────┘   │
//! │        │              │              │              │        │
//! │        ▼              ▼              ▼              ▼        │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            EventLoop::run (single thread)              │  │
//! │  │     wait ─▶ resolve ready ─▶ dispatch handlers         │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failure containment: a handler returning an error marks the loop for
//! shutdown but the current wake cycle is drained first — every other source
//! that was ready this cycle still gets its handler invocation. The shutdown
//! flag itself is a single atomic, safe to trip from a signal context.

use core::fmt;
use core::time::Duration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info};

use crate::app::ports::{ClockPort, WaitBackend};
use crate::error::Result;
use crate::timer::{Timer, TimerKind, TimerSet};

/// Maximum number of registered sources (stack-allocated tables).
pub const MAX_SOURCES: usize = 8;

// ═══════════════════════════════════════════════════════════════
//  Identity types
// ═══════════════════════════════════════════════════════════════

/// Opaque handle to a registered source. The loop passes each handler its
/// own token so it can consume or re-arm its timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token(usize);

impl Token {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Backend-level identity of a readable stream (file-descriptor-shaped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamId(pub u64);

/// Ready streams reported by one backend wait.
pub type ReadySet = heapless::Vec<StreamId, MAX_SOURCES>;

/// Readiness interest for a stream registration, as a bitmask. Only read
/// interest exists today; the mask keeps the registration contract explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interest(u8);

impl Interest {
    pub const READABLE: Interest = Interest(0b0000_0001);

    pub const fn empty() -> Self {
        Interest(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Interest) -> bool {
        self.0 & other.0 == other.0
    }
}

// ═══════════════════════════════════════════════════════════════
//  Registration and termination
// ═══════════════════════════════════════════════════════════════

/// Rejected registrations are programming errors caught at wiring time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    /// The source table is full.
    Exhausted,
    /// The stream identity is already registered.
    DuplicateStream,
    /// A stream registered with no interest can never fire.
    EmptyInterest,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "source table full"),
            Self::DuplicateStream => write!(f, "stream already registered"),
            Self::EmptyInterest => write!(f, "empty interest mask"),
        }
    }
}

/// Why [`EventLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The shutdown flag was raised (signal or handler request).
    ShutdownRequested,
    /// A handler or the wait backend reported a fatal failure.
    SourceFailure,
    /// Nothing registered can ever become ready again.
    SourcesExhausted,
}

/// Cooperative shutdown flag.
///
/// `request` performs a single lock-free atomic store and nothing else, so a
/// clone of this flag may be tripped from a signal handler. All other
/// shutdown bookkeeping happens synchronously inside the loop after it
/// observes the flag, once per wake cycle.
#[derive(Clone)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Async-signal-safe: one atomic store, no logging, no allocation.
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Event loop
// ═══════════════════════════════════════════════════════════════

/// Handler invoked when a source is ready. Receives the shared context, the
/// loop's timer table (to consume its own expiry and arm others), and its
/// own token. An `Err` return is fatal to the loop.
pub type Handler<S> = Box<dyn FnMut(&mut S, &mut TimerSet, Token) -> Result<()>>;

struct Entry<S> {
    /// `Some` for readable streams, `None` for timers.
    stream: Option<StreamId>,
    handler: Handler<S>,
}

/// Single-threaded readiness-driven scheduler.
///
/// Generic over the shared context `S` so the orchestration state stays an
/// explicit argument to every handler instead of hiding in statics.
pub struct EventLoop<S, K, W> {
    clock: K,
    backend: W,
    timers: TimerSet,
    entries: heapless::Vec<Entry<S>, MAX_SOURCES>,
    shutdown: ShutdownFlag,
    reason: Option<TerminationReason>,
}

impl<S, K: ClockPort, W: WaitBackend> EventLoop<S, K, W> {
    pub fn new(clock: K, backend: W) -> Self {
        let mut timers = TimerSet::new();
        timers.set_now(clock.monotonic());
        Self {
            clock,
            backend,
            timers,
            entries: heapless::Vec::new(),
            shutdown: ShutdownFlag::new(),
            reason: None,
        }
    }

    /// A clone of the shutdown flag, e.g. to wire into a signal handler.
    pub fn shutdown_handle(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    /// Register a timer source. `period = None` (or zero) leaves the timer
    /// inert until a handler arms it.
    pub fn register_timer(
        &mut self,
        kind: TimerKind,
        period: Option<Duration>,
        handler: Handler<S>,
    ) -> core::result::Result<Token, RegistrationError> {
        if self.entries.is_full() {
            return Err(RegistrationError::Exhausted);
        }
        let now = self.clock.monotonic();
        self.timers.set_now(now);
        let token = self
            .timers
            .add_slot(Some(Timer::new(kind, period, now)))
            .ok_or(RegistrationError::Exhausted)?;
        self.entries
            .push(Entry {
                stream: None,
                handler,
            })
            .ok()
            .ok_or(RegistrationError::Exhausted)?;
        info!(
            "registered {:?} timer as source {} (period {:?})",
            kind,
            token.index(),
            period
        );
        Ok(token)
    }

    /// Register a readable stream source.
    pub fn register_stream(
        &mut self,
        id: StreamId,
        interest: Interest,
        handler: Handler<S>,
    ) -> core::result::Result<Token, RegistrationError> {
        if interest.is_empty() {
            return Err(RegistrationError::EmptyInterest);
        }
        if self.entries.iter().any(|e| e.stream == Some(id)) {
            return Err(RegistrationError::DuplicateStream);
        }
        if self.entries.is_full() {
            return Err(RegistrationError::Exhausted);
        }
        let token = self
            .timers
            .add_slot(None)
            .ok_or(RegistrationError::Exhausted)?;
        self.entries
            .push(Entry {
                stream: Some(id),
                handler,
            })
            .ok()
            .ok_or(RegistrationError::Exhausted)?;
        info!("registered stream {:?} as source {}", id, token.index());
        Ok(token)
    }

    /// Run until shutdown is requested or a source fails fatally.
    ///
    /// The shutdown flag is polled once per wake cycle; a cycle whose
    /// handlers are already dispatching always completes before the loop
    /// exits, whatever raised the flag.
    pub fn run(&mut self, state: &mut S) -> TerminationReason {
        let mut ready = ReadySet::new();

        loop {
            if self.shutdown.is_requested() {
                let reason = self
                    .reason
                    .take()
                    .unwrap_or(TerminationReason::ShutdownRequested);
                info!("event loop exiting: {:?}", reason);
                return reason;
            }

            let Self {
                clock,
                backend,
                timers,
                entries,
                shutdown,
                reason,
            } = self;

            let now = clock.monotonic();
            timers.set_now(now);
            timers.mark_expired();

            // An unconsumed expiry forces an immediate re-fire.
            let timeout = if timers.any_pending() {
                Some(Duration::ZERO)
            } else {
                timers.next_deadline().map(|d| d.saturating_sub(now))
            };

            let mut watched: heapless::Vec<StreamId, MAX_SOURCES> = heapless::Vec::new();
            for entry in entries.iter() {
                if let Some(id) = entry.stream {
                    // Capacity matches the entry table; push cannot fail.
                    let _ = watched.push(id);
                }
            }

            if timeout.is_none() && watched.is_empty() {
                info!("no armed timers and no streams; nothing can fire");
                return TerminationReason::SourcesExhausted;
            }

            ready.clear();
            if let Err(e) = backend.wait(&watched, timeout, &mut ready) {
                error!("readiness wait failed: {e}");
                reason.get_or_insert(TerminationReason::SourceFailure);
                shutdown.request();
                continue;
            }

            let now = clock.monotonic();
            timers.set_now(now);
            timers.mark_expired();

            for (index, entry) in entries.iter_mut().enumerate() {
                let token = Token::new(index);
                let is_ready = match entry.stream {
                    Some(id) => ready.contains(&id),
                    None => timers.is_pending(token),
                };
                if !is_ready {
                    continue;
                }
                debug!("dispatching source {index}");
                if let Err(e) = (entry.handler)(state, timers, token) {
                    // Fatal, but the rest of this wake cycle still runs.
                    error!("handler for source {index} failed: {e}");
                    reason.get_or_insert(TerminationReason::SourceFailure);
                    shutdown.request();
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
