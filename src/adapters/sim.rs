//! Host simulation adapters.
//!
//! In-memory stand-ins for every hardware port so the full wiring runs on a
//! development machine: sensors synthesize slowly varying readings,
//! actuators and indicators track state and log, the display renders to the
//! log stream, and the wait backend simply sleeps out each timeout.
//!
//! The real board adapters implement the same port traits against the
//! vendor peripheral APIs and are selected at bring-up time.

use core::time::Duration;

use log::{debug, info, warn};

use crate::app::ports::{
    ActuatorPort, CloudEvents, CloudPort, DisplayPort, IndicatorPort, SensorPort, SerialPort,
    StatusFrame, WaitBackend,
};
use crate::drivers::indicator::{Color, Indicator};
use crate::error::{ActuatorError, CloudError, Result, SensorError, SerialError};
use crate::mux::{ReadySet, StreamId};
use crate::state::Climate;

// ───────────────────────────────────────────────────────────────
// Simulated sensors + actuators + indicators + display
// ───────────────────────────────────────────────────────────────

pub struct SimHardware {
    ticks: u32,
    pub lamp_on: bool,
    pub alarm_on: bool,
    pub indicators: [(Indicator, Color); 3],
}

impl SimHardware {
    pub fn new() -> Self {
        Self {
            ticks: 0,
            lamp_on: false,
            alarm_on: false,
            indicators: [
                (Indicator::Activity, Color::Off),
                (Indicator::Message, Color::Off),
                (Indicator::Network, Color::Off),
            ],
        }
    }
}

impl Default for SimHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for SimHardware {
    fn read_climate(&mut self) -> core::result::Result<Climate, SensorError> {
        self.ticks = self.ticks.wrapping_add(1);
        // Slow triangle wave around room conditions.
        let phase = (self.ticks % 120) as f32;
        let drift = if phase < 60.0 { phase } else { 120.0 - phase } / 60.0;
        Ok(Climate {
            temperature_c: 21.0 + 3.0 * drift,
            humidity_pct: 45.0 + 10.0 * drift,
        })
    }

    fn read_light_mv(&mut self) -> core::result::Result<f32, SensorError> {
        // Alternate between "room occupied" and "room dark" every 30 ticks.
        Ok(if (self.ticks / 30) % 2 == 0 { 1800.0 } else { 600.0 })
    }
}

impl ActuatorPort for SimHardware {
    fn set_lamp(&mut self, on: bool) -> core::result::Result<(), ActuatorError> {
        self.lamp_on = on;
        info!("[sim] lamp {}", if on { "on" } else { "off" });
        Ok(())
    }

    fn set_alarm(&mut self, on: bool) -> core::result::Result<(), ActuatorError> {
        self.alarm_on = on;
        info!("[sim] alarm {}", if on { "on" } else { "off" });
        Ok(())
    }
}

impl IndicatorPort for SimHardware {
    fn set_indicator(&mut self, which: Indicator, color: Color) {
        for slot in &mut self.indicators {
            if slot.0 == which && slot.1 != color {
                debug!("[sim] indicator {which:?} -> {}", color.name());
                slot.1 = color;
            }
        }
    }
}

impl DisplayPort for SimHardware {
    fn render(&mut self, frame: &StatusFrame) {
        debug!(
            "[sim] display | {} | {:.1} C {:.1} % | lamp {} alarm {}",
            frame.clock,
            frame.temperature_c,
            frame.humidity_pct,
            if frame.lamp_on { "on" } else { "off" },
            if frame.alarm_on { "on" } else { "off" },
        );
    }
}

// ───────────────────────────────────────────────────────────────
// Simulated serial channel (idle — never reports ready)
// ───────────────────────────────────────────────────────────────

pub struct SimSerial;

impl SerialPort for SimSerial {
    fn read(&mut self, _buf: &mut [u8]) -> core::result::Result<usize, SerialError> {
        Ok(0)
    }

    fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, SerialError> {
        debug!("[sim] serial tx {} bytes", buf.len());
        Ok(buf.len())
    }
}

// ───────────────────────────────────────────────────────────────
// Null cloud client
// ───────────────────────────────────────────────────────────────

/// Placeholder cloud client for hosts without endpoint credentials; the
/// provisioned transport replaces this at deployment.
pub struct NullCloud;

impl CloudPort for NullCloud {
    fn initialize(&mut self) -> core::result::Result<(), CloudError> {
        info!("[sim] cloud client initialised (null transport)");
        Ok(())
    }

    fn teardown(&mut self) {}

    fn try_setup_connection(&mut self, _events: &mut dyn CloudEvents) -> bool {
        false
    }

    fn do_periodic_work(&mut self, _events: &mut dyn CloudEvents) {}

    fn publish(&mut self, _payload: &str) -> core::result::Result<(), CloudError> {
        Err(CloudError::NotConnected)
    }

    fn report_property(
        &mut self,
        _name: &str,
        _value: u32,
    ) -> core::result::Result<(), CloudError> {
        Err(CloudError::NotConnected)
    }
}

// ───────────────────────────────────────────────────────────────
// Sleeping wait backend
// ───────────────────────────────────────────────────────────────

/// Timer-only backend: sleeps out each timeout on the host. Streams are
/// accepted but never report ready — good enough for simulation, where the
/// serial peer is absent anyway.
pub struct SleepBackend {
    stream_note_logged: bool,
}

impl SleepBackend {
    pub fn new() -> Self {
        Self {
            stream_note_logged: false,
        }
    }
}

impl Default for SleepBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitBackend for SleepBackend {
    fn wait(
        &mut self,
        watched: &[StreamId],
        timeout: Option<Duration>,
        _ready: &mut ReadySet,
    ) -> Result<()> {
        if !watched.is_empty() && !self.stream_note_logged {
            warn!(
                "[sim] sleep backend cannot watch streams; {} stream(s) stay idle",
                watched.len()
            );
            self.stream_note_logged = true;
        }
        std::thread::sleep(timeout.unwrap_or(Duration::from_secs(1)));
        Ok(())
    }
}
