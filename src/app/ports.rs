//! Port traits — the boundary between the orchestration core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ handlers / dispatcher (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, indicators, display, serial channel,
//! cloud client, OS wait primitive, clock) implement these traits. The
//! handlers wired in [`runtime`](crate::runtime) consume them via generics,
//! so the orchestration core never touches hardware directly and every test
//! runs against mocks.

use core::time::Duration;

use crate::drivers::indicator::{Color, Indicator};
use crate::error::{ActuatorError, CloudError, Result, SensorError, SerialError};
use crate::mux::{ReadySet, StreamId};
use crate::state::Climate;

// ───────────────────────────────────────────────────────────────
// Clock port (monotonic scheduling + wall-clock stamps)
// ───────────────────────────────────────────────────────────────

/// Formatted wall-clock label for the status display (`%m-%d %H:%M:%S`).
pub type ClockLabel = heapless::String<20>;

/// Time queries. The event loop uses only [`monotonic`](ClockPort::monotonic);
/// telemetry stamping and the display use the wall-clock methods.
pub trait ClockPort {
    /// Monotonic time since boot.
    fn monotonic(&self) -> Duration;

    /// Wall-clock milliseconds since the Unix epoch.
    fn epoch_millis(&self) -> u64;

    /// Short local-time label for the status display.
    fn wall_clock_label(&self) -> ClockLabel;
}

// ───────────────────────────────────────────────────────────────
// Wait backend (driven adapter: OS readiness primitive → loop)
// ───────────────────────────────────────────────────────────────

/// The blocking readiness primitive behind the event loop.
///
/// One call per wake cycle: block until any watched stream is readable or
/// the timeout elapses, then report the ready subset. `None` timeout blocks
/// indefinitely. A returned error is unrecoverable for the process — the
/// loop drains the cycle and exits.
pub trait WaitBackend {
    fn wait(
        &mut self,
        watched: &[StreamId],
        timeout: Option<Duration>,
        ready: &mut ReadySet,
    ) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the environmental sensors.
pub trait SensorPort {
    /// Trigger a fresh temperature/humidity measurement.
    fn read_climate(&mut self) -> core::result::Result<Climate, SensorError>;

    /// Read the ambient light level, converted to millivolts.
    fn read_light_mv(&mut self) -> core::result::Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the two commanded outputs.
///
/// Callers log failures and still update the presentation mirror in the
/// shared state; the physical driver remains the authority on actual output
/// state.
pub trait ActuatorPort {
    /// Drive the peer lamp output.
    fn set_lamp(&mut self, on: bool) -> core::result::Result<(), ActuatorError>;

    /// Drive the alarm relay.
    fn set_alarm(&mut self, on: bool) -> core::result::Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → RGB indicators)
// ───────────────────────────────────────────────────────────────

/// Three-channel indicator bank. Adapters map a [`Color`] onto the three
/// GPIO/PWM channels of the addressed indicator.
pub trait IndicatorPort {
    fn set_indicator(&mut self, which: Indicator, color: Color);
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → local display)
// ───────────────────────────────────────────────────────────────

/// One status frame, rendered once per status tick. Rendering primitives
/// (fonts, cursor addressing) live entirely in the adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusFrame {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub clock: ClockLabel,
    pub lamp_on: bool,
    pub alarm_on: bool,
}

pub trait DisplayPort {
    fn render(&mut self, frame: &StatusFrame);
}

// ───────────────────────────────────────────────────────────────
// Serial port (driven adapter: UART channel ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Byte-level serial channel. `read` must only be called once the channel
/// has been reported readable, and returns however many bytes were pending
/// (zero is legal). `write` may accept fewer bytes than offered; callers
/// retry until everything is on the wire.
pub trait SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, SerialError>;
    fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, SerialError>;
}

// ───────────────────────────────────────────────────────────────
// Cloud collaborator (driven adapter: domain ↔ telemetry endpoint)
// ───────────────────────────────────────────────────────────────

/// Response to a remotely invoked method, relayed verbatim by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// JSON response body.
    pub body: String,
}

/// Inbound event capability handed to the cloud client.
///
/// The client delivers everything it receives through these four methods,
/// always from within a handler invocation on the loop thread — never
/// concurrently with other handlers.
pub trait CloudEvents {
    /// A device-bound message arrived.
    fn on_message(&mut self, payload: &str);

    /// The remote desired state pushed a new blink-interval index.
    fn on_config_update(&mut self, desired_index: u32);

    /// A named method was invoked; the returned response is relayed back.
    fn on_method_call(&mut self, name: &str, payload: &str) -> MethodResponse;

    /// Connection to the endpoint was established or lost.
    fn on_connectivity_changed(&mut self, connected: bool);
}

/// The cloud telemetry client.
///
/// `do_periodic_work` must be driven on a fixed cadence to keep the
/// connection serviced; callbacks fire from inside it (and from inside
/// `try_setup_connection`), synchronously on the caller's thread.
pub trait CloudPort {
    /// One-time client initialisation.
    fn initialize(&mut self) -> core::result::Result<(), CloudError>;

    /// Release the client.
    fn teardown(&mut self);

    /// Idempotent connection setup. Returns whether a usable client exists.
    fn try_setup_connection(&mut self, events: &mut dyn CloudEvents) -> bool;

    /// Service the connection and deliver any queued inbound events.
    fn do_periodic_work(&mut self, events: &mut dyn CloudEvents);

    /// Fire-and-forget publish of a serialized telemetry record.
    fn publish(&mut self, payload: &str) -> core::result::Result<(), CloudError>;

    /// Report a named integer property as acknowledged device state.
    fn report_property(&mut self, name: &str, value: u32)
        -> core::result::Result<(), CloudError>;
}
