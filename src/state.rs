//! Shared device state.
//!
//! One explicit struct threaded by reference through every handler
//! invocation — no hidden statics. The single-threaded event loop
//! linearises all reads and writes, so none of this needs synchronisation.

use crate::drivers::indicator::Color;
use crate::error::Error;

/// Last temperature/humidity measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Climate {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Presentation mirrors of the two commanded outputs.
///
/// The physical drivers are authoritative; if a driver call fails the
/// failure is logged and the mirror is updated anyway, so the display can
/// transiently diverge from the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorFlags {
    pub lamp_on: bool,
    pub alarm_on: bool,
}

/// Blink-rate selection for the activity indicator.
///
/// `interval_index` addresses the ordered interval table in
/// [`SystemConfig`](crate::config::SystemConfig); both the local button and
/// the remote desired state write it, last writer wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkConfig {
    pub interval_index: usize,
    pub color: Color,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            interval_index: 0,
            color: Color::Blue,
        }
    }
}

/// Cross-cutting state shared by all handlers.
#[derive(Debug, Default)]
pub struct DeviceState {
    /// Mutated exclusively by the cloud client's connectivity callback.
    pub connected: bool,
    pub blink: BlinkConfig,
    pub flags: ActuatorFlags,
    /// Last climate reading, also served over the serial link.
    pub climate: Climate,
    /// Activity indicator phase, toggled each blink tick.
    pub activity_on: bool,
    /// Blink-rate index applied from a cloud callback, awaiting
    /// acknowledgment once the cloud client is free again.
    pub pending_rate_ack: Option<u32>,
    /// Fatal condition raised from inside a cloud callback, surfaced to the
    /// loop by the owning handler after the callback returns.
    pub failure: Option<Error>,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }
}
