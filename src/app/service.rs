//! Telemetry dispatcher and cloud event sink.
//!
//! Two short-lived views over the shared context, built inside a handler
//! invocation and dropped before it returns:
//!
//! - [`Dispatcher`] is the full outbound view (it holds the cloud client):
//!   connectivity-gated sends, blink-rate application and acknowledgment.
//! - [`CloudInbox`] is the inbound capability handed to the cloud client
//!   while it services the connection. It deliberately does *not* hold the
//!   client — an acknowledgment triggered from inside a callback is parked
//!   in the shared state and flushed by the owning handler afterwards.
//!
//! Connectivity gating is strict: a send while disconnected is dropped with
//! a warning, never queued.

use log::{info, warn};
use serde::Deserialize;

use crate::app::commands::InboundCommand;
use crate::app::ports::{
    ActuatorPort, ClockPort, CloudEvents, CloudPort, IndicatorPort, MethodResponse,
};
use crate::app::telemetry::{ReadingKind, TelemetryRecord};
use crate::config::SystemConfig;
use crate::drivers::indicator::{Color, Indicator};
use crate::error::Result;
use crate::mux::Token;
use crate::state::DeviceState;
use crate::timer::TimerSet;

/// Named property carrying the acknowledged blink-rate index.
pub const BLINK_RATE_PROPERTY: &str = "LedBlinkRateProperty";

/// The one remotely invokable method.
pub const COLOR_CONTROL_METHOD: &str = "LedColorControlMethod";

// ───────────────────────────────────────────────────────────────
// Outbound dispatcher
// ───────────────────────────────────────────────────────────────

/// Full outbound view over the shared context.
pub struct Dispatcher<'a, HW, C, K> {
    pub cfg: &'a SystemConfig,
    pub state: &'a mut DeviceState,
    pub hw: &'a mut HW,
    pub cloud: &'a mut C,
    pub clock: &'a K,
    pub timers: &'a mut TimerSet,
    pub flash_timer: Token,
    pub blink_timer: Token,
}

impl<HW, C, K> Dispatcher<'_, HW, C, K>
where
    HW: ActuatorPort + IndicatorPort,
    C: CloudPort,
    K: ClockPort,
{
    /// Send one reading to the cloud endpoint.
    ///
    /// Dropped with a warning while disconnected. On a successful hand-off
    /// the send/receive indicator flashes once; delivery acknowledgment is
    /// the client's concern, not ours.
    pub fn send(&mut self, kind: ReadingKind, value: f64) -> Result<()> {
        if !self.state.connected {
            warn!("dropping {kind:?} reading: not connected to the cloud endpoint");
            return Ok(());
        }

        let record = TelemetryRecord::new(&self.cfg.origin, self.clock.epoch_millis(), kind, value);
        if let Err(e) = self.cloud.publish(&record.to_json()) {
            warn!("publish of {kind:?} reading failed: {e}");
        }

        self.flash(Color::Red)
    }

    /// Re-arm the blink timer from the currently selected interval and
    /// report the applied index upstream.
    pub fn apply_blink_rate(&mut self) -> Result<()> {
        let index = self.state.blink.interval_index;
        let period = self.cfg.blink_interval(index);
        info!("blink interval set to {:?} (index {index})", period);
        self.timers.arm(self.blink_timer, period)?;
        self.report_blink_rate(index as u32);
        Ok(())
    }

    /// Report an acknowledgment parked by a cloud callback, if any.
    pub fn flush_pending_ack(&mut self) {
        if let Some(index) = self.state.pending_rate_ack.take() {
            self.report_blink_rate(index);
        }
    }

    fn report_blink_rate(&mut self, index: u32) {
        if self.state.connected {
            if let Err(e) = self.cloud.report_property(BLINK_RATE_PROPERTY, index) {
                warn!("blink-rate report failed: {e}");
            }
        } else {
            warn!("cannot report blink rate: not connected to the cloud endpoint");
        }
    }

    fn flash(&mut self, color: Color) -> Result<()> {
        self.hw.set_indicator(Indicator::Message, color);
        self.timers
            .arm_once(self.flash_timer, self.cfg.flash_duration())?;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound cloud event sink
// ───────────────────────────────────────────────────────────────

/// Inbound capability handed to [`CloudPort::do_periodic_work`].
///
/// Mutations here follow the same rules as everywhere else — actuator
/// failures are logged and the mirror updated anyway; timer failures are a
/// wiring bug and are parked in `state.failure` for the owning handler to
/// escalate.
pub struct CloudInbox<'a, HW> {
    pub cfg: &'a SystemConfig,
    pub state: &'a mut DeviceState,
    pub hw: &'a mut HW,
    pub timers: &'a mut TimerSet,
    pub flash_timer: Token,
    pub blink_timer: Token,
}

#[derive(Deserialize)]
struct ColorBody {
    color: String,
}

impl<HW: ActuatorPort + IndicatorPort> CloudInbox<'_, HW> {
    fn flash(&mut self, color: Color) {
        self.hw.set_indicator(Indicator::Message, color);
        if let Err(e) = self
            .timers
            .arm_once(self.flash_timer, self.cfg.flash_duration())
        {
            self.state.failure.get_or_insert(e.into());
        }
    }

    fn apply_lamp(&mut self, on: bool) {
        if let Err(e) = self.hw.set_lamp(on) {
            warn!("lamp command failed: {e}");
        }
        self.state.flags.lamp_on = on;
        info!("lamp {}", if on { "on" } else { "off" });
    }

    fn apply_alarm(&mut self, on: bool) {
        if let Err(e) = self.hw.set_alarm(on) {
            warn!("alarm command failed: {e}");
        }
        self.state.flags.alarm_on = on;
        info!("alarm {}", if on { "on" } else { "off" });
    }
}

impl<HW: ActuatorPort + IndicatorPort> CloudEvents for CloudInbox<'_, HW> {
    fn on_message(&mut self, payload: &str) {
        // Payloads that don't decode are dropped without acknowledgment or
        // receive flash; the sender gets nothing back either way.
        let Some(command) = InboundCommand::decode(payload) else {
            return;
        };
        match command {
            InboundCommand::SetLight(on) => self.apply_lamp(on),
            InboundCommand::SetAlarm(on) => self.apply_alarm(on),
            InboundCommand::Unknown(tag) => warn!("unrecognized device command '{tag}'"),
        }
        self.flash(Color::Yellow);
    }

    fn on_config_update(&mut self, desired_index: u32) {
        let count = self.cfg.blink_intervals_secs.len();
        let index = desired_index as usize % count;
        info!("desired blink-rate index {desired_index}, applying {index}");
        self.state.blink.interval_index = index;
        if let Err(e) = self.timers.arm(self.blink_timer, self.cfg.blink_interval(index)) {
            self.state.failure.get_or_insert(e.into());
            return;
        }
        // The client is busy delivering this callback; the acknowledgment
        // goes out on the service tick that invoked us.
        self.state.pending_rate_ack = Some(index as u32);
    }

    fn on_method_call(&mut self, name: &str, payload: &str) -> MethodResponse {
        if name != COLOR_CONTROL_METHOD {
            info!("method not found: '{name}'");
            return MethodResponse {
                status: 404,
                body: format!("\"method not found '{name}'\""),
            };
        }

        let color = serde_json::from_str::<ColorBody>(payload)
            .ok()
            .and_then(|body| Color::from_name(&body.color));

        match color {
            Some(color) => {
                info!("blink color set to '{}'", color.name());
                self.state.blink.color = color;
                MethodResponse {
                    status: 200,
                    body: format!(
                        "{{ \"success\" : true, \"message\" : \"led color set to {}\" }}",
                        color.name()
                    ),
                }
            }
            None => {
                info!("unrecognised color-control payload");
                MethodResponse {
                    status: 400,
                    body: "{ \"success\" : false, \"message\" : \"request does not contain an \
                           identifiable color\" }"
                        .to_string(),
                }
            }
        }
    }

    fn on_connectivity_changed(&mut self, connected: bool) {
        info!(
            "cloud endpoint {}",
            if connected { "connected" } else { "unreachable" }
        );
        self.state.connected = connected;
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
