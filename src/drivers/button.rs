//! Polled, debounced push-button input.
//!
//! Active-low momentary switch behind an [`embedded-hal`] `InputPin`. The
//! input is sampled on a fixed cadence by a dedicated recurring timer; a
//! press is reported only on the High→Low transition against the previously
//! recorded level, so a held button yields exactly one event.
//!
//! Debounce quality is therefore a function of the polling granularity —
//! there is no hysteresis or filtering here. With the millisecond poll tick
//! this matches the switch bounce envelope of the supported buttons; faster
//! polling would need a real filter.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::error::SensorError;

/// Result of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    None,
    Pressed,
}

/// Observed input level. Low means pressed (active-low wiring).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

/// Edge detector over a digital input pin.
pub struct DebouncedButton<P> {
    pin: P,
    last: Level,
}

impl<P: InputPin> DebouncedButton<P> {
    /// The level starts as High ("released") until the first poll observes
    /// otherwise, so a button already held at boot reports one press.
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            last: Level::High,
        }
    }

    /// Sample the pin once. Call on the input-poll timer cadence.
    ///
    /// A read failure indicates handle corruption and escalates to the loop
    /// as fatal through the caller.
    pub fn poll(&mut self) -> Result<Edge, SensorError> {
        let level = match self.pin.is_low() {
            Ok(true) => Level::Low,
            Ok(false) => Level::High,
            Err(e) => {
                warn!("button level read failed: {e:?}");
                return Err(SensorError::GpioReadFailed);
            }
        };

        let edge = if level == Level::Low && self.last == Level::High {
            Edge::Pressed
        } else {
            Edge::None
        };
        self.last = level;
        Ok(edge)
    }
}
