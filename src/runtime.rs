//! Source registration and handler wiring.
//!
//! This is where the controller's periodic duties meet the event loop. Each
//! duty is a closure over the ports it owns outright (the serial link, the
//! two buttons); everything shared lives in [`HubContext`] and is passed by
//! reference into every invocation.
//!
//! Registration order is dispatch order within a wake cycle:
//!
//! 1. serial stream — peer commands
//! 2. flash clear (one-shot, inert until a send/receive arms it)
//! 3. blink tick (recurring) — indicators + climate telemetry
//! 4. input poll (recurring, fast) — debounced buttons
//! 5. cloud service (recurring) — connection upkeep + inbound callbacks
//! 6. status tick (recurring) — presence telemetry + display frame
//!
//! The flash timer is registered before everything that arms it, so every
//! later closure can capture its token.

use embedded_hal::digital::InputPin;
use log::info;

use crate::app::ports::{
    ActuatorPort, ClockPort, CloudPort, DisplayPort, IndicatorPort, SensorPort, SerialPort,
    StatusFrame, WaitBackend,
};
use crate::app::service::{CloudInbox, Dispatcher};
use crate::app::telemetry::ReadingKind;
use crate::config::SystemConfig;
use crate::drivers::button::{DebouncedButton, Edge};
use crate::drivers::indicator::{Color, Indicator};
use crate::mux::{EventLoop, Interest, RegistrationError, StreamId, Token};
use crate::serial::SerialLink;
use crate::state::DeviceState;
use crate::timer::TimerKind;

/// Everything the handlers share, passed by reference into each invocation.
pub struct HubContext<HW, C, K> {
    pub cfg: SystemConfig,
    pub state: DeviceState,
    pub hw: HW,
    pub cloud: C,
    pub clock: K,
}

impl<HW, C, K> HubContext<HW, C, K> {
    pub fn new(cfg: SystemConfig, hw: HW, cloud: C, clock: K) -> Self {
        Self {
            cfg,
            state: DeviceState::new(),
            hw,
            cloud,
            clock,
        }
    }
}

/// Tokens of every registered source, in registration order.
#[derive(Debug, Clone, Copy)]
pub struct SourceTokens {
    pub serial: Option<Token>,
    pub flash: Token,
    pub blink: Token,
    pub input_poll: Token,
    pub cloud_service: Token,
    pub status: Token,
}

/// Register all controller duties on the loop.
///
/// `serial` is optional so headless deployments (no peer attached) can run
/// the same wiring.
pub fn wire<HW, C, K, LK, W, SP, P1, P2>(
    ev: &mut EventLoop<HubContext<HW, C, K>, LK, W>,
    cfg: &SystemConfig,
    serial: Option<(StreamId, SP)>,
    rate_button: DebouncedButton<P1>,
    send_button: DebouncedButton<P2>,
) -> Result<SourceTokens, RegistrationError>
where
    HW: SensorPort + ActuatorPort + IndicatorPort + DisplayPort,
    C: CloudPort,
    K: ClockPort,
    LK: ClockPort,
    W: WaitBackend,
    SP: SerialPort + 'static,
    P1: InputPin + 'static,
    P2: InputPin + 'static,
{
    // ── 1. Serial peer link ───────────────────────────────────
    let serial_token = match serial {
        Some((id, port)) => {
            let mut link = SerialLink::new(port);
            Some(ev.register_stream(
                id,
                Interest::READABLE,
                Box::new(move |ctx, _timers, _token| {
                    let HubContext { state, hw, .. } = ctx;
                    link.on_readable(state, hw)
                }),
            )?)
        }
        None => None,
    };

    // ── 2. Send/receive flash clear ───────────────────────────
    let flash = ev.register_timer(
        TimerKind::OneShot,
        None,
        Box::new(|ctx, timers, token| {
            timers.consume(token)?;
            ctx.hw.set_indicator(Indicator::Message, Color::Off);
            Ok(())
        }),
    )?;

    // ── 3. Blink / climate-update tick ────────────────────────
    let blink = ev.register_timer(
        TimerKind::Recurring,
        Some(cfg.initial_blink()),
        Box::new(move |ctx, timers, token| {
            timers.consume(token)?;
            let HubContext {
                cfg,
                state,
                hw,
                cloud,
                clock,
            } = ctx;

            let network = if state.connected { Color::Green } else { Color::Off };
            hw.set_indicator(Indicator::Network, network);

            state.activity_on = !state.activity_on;
            let activity = if state.activity_on {
                state.blink.color
            } else {
                Color::Off
            };
            hw.set_indicator(Indicator::Activity, activity);

            let climate = hw.read_climate()?;
            state.climate = climate;
            info!(
                "temperature {:.1} C, humidity {:.1} %",
                climate.temperature_c, climate.humidity_pct
            );

            let mut dispatcher = Dispatcher {
                cfg: &*cfg,
                state: &mut *state,
                hw: &mut *hw,
                cloud: &mut *cloud,
                clock: &*clock,
                timers: &mut *timers,
                flash_timer: flash,
                blink_timer: token,
            };
            dispatcher.send(ReadingKind::Temperature, f64::from(climate.temperature_c))?;
            dispatcher.send(ReadingKind::Humidity, f64::from(climate.humidity_pct))?;
            Ok(())
        }),
    )?;

    // ── 4. Debounced input poll ───────────────────────────────
    let mut rate_button = rate_button;
    let mut send_button = send_button;
    let input_poll = ev.register_timer(
        TimerKind::Recurring,
        Some(cfg.input_poll_interval()),
        Box::new(move |ctx, timers, token| {
            timers.consume(token)?;
            let HubContext {
                cfg,
                state,
                hw,
                cloud,
                clock,
            } = ctx;

            if rate_button.poll()? == Edge::Pressed {
                state.blink.interval_index =
                    (state.blink.interval_index + 1) % cfg.blink_intervals_secs.len();
                info!(
                    "rate button pressed; blink index now {}",
                    state.blink.interval_index
                );
                Dispatcher {
                    cfg: &*cfg,
                    state: &mut *state,
                    hw: &mut *hw,
                    cloud: &mut *cloud,
                    clock: &*clock,
                    timers: &mut *timers,
                    flash_timer: flash,
                    blink_timer: blink,
                }
                .apply_blink_rate()?;
            }

            if send_button.poll()? == Edge::Pressed {
                info!("send button pressed");
                Dispatcher {
                    cfg: &*cfg,
                    state: &mut *state,
                    hw: &mut *hw,
                    cloud: &mut *cloud,
                    clock: &*clock,
                    timers: &mut *timers,
                    flash_timer: flash,
                    blink_timer: blink,
                }
                .send(ReadingKind::Custom, 1.0)?;
            }
            Ok(())
        }),
    )?;

    // ── 5. Cloud service tick ─────────────────────────────────
    let cloud_service = ev.register_timer(
        TimerKind::Recurring,
        Some(cfg.cloud_work_interval()),
        Box::new(move |ctx, timers, token| {
            timers.consume(token)?;
            let HubContext {
                cfg,
                state,
                hw,
                cloud,
                clock,
            } = ctx;

            {
                let mut inbox = CloudInbox {
                    cfg: &*cfg,
                    state: &mut *state,
                    hw: &mut *hw,
                    timers: &mut *timers,
                    flash_timer: flash,
                    blink_timer: blink,
                };
                // Setup is idempotent; a live client just gets serviced.
                if cloud.try_setup_connection(&mut inbox) {
                    cloud.do_periodic_work(&mut inbox);
                }
            }

            if let Some(e) = state.failure.take() {
                return Err(e);
            }

            Dispatcher {
                cfg: &*cfg,
                state: &mut *state,
                hw: &mut *hw,
                cloud: &mut *cloud,
                clock: &*clock,
                timers: &mut *timers,
                flash_timer: flash,
                blink_timer: blink,
            }
            .flush_pending_ack();
            Ok(())
        }),
    )?;

    // ── 6. Status / presence tick ─────────────────────────────
    let status = ev.register_timer(
        TimerKind::Recurring,
        Some(cfg.status_refresh()),
        Box::new(move |ctx, timers, token| {
            timers.consume(token)?;
            let HubContext {
                cfg,
                state,
                hw,
                cloud,
                clock,
            } = ctx;

            let climate = hw.read_climate()?;
            state.climate = climate;

            let light_mv = hw.read_light_mv()?;
            let present = light_mv >= cfg.presence_threshold_mv;
            let value = if present { 1.0 } else { 0.0 };

            {
                let mut dispatcher = Dispatcher {
                    cfg: &*cfg,
                    state: &mut *state,
                    hw: &mut *hw,
                    cloud: &mut *cloud,
                    clock: &*clock,
                    timers: &mut *timers,
                    flash_timer: flash,
                    blink_timer: blink,
                };
                dispatcher.send(ReadingKind::Presence, value)?;
                if !present {
                    dispatcher.send(ReadingKind::Presence, value)?;
                }
                // TODO: collapse the repeated presence sends once the fleet
                // dashboard stops double-counting absence reports.
                dispatcher.send(ReadingKind::Presence, value)?;
            }

            let frame = StatusFrame {
                temperature_c: climate.temperature_c,
                humidity_pct: climate.humidity_pct,
                clock: clock.wall_clock_label(),
                lamp_on: state.flags.lamp_on,
                alarm_on: state.flags.alarm_on,
            };
            hw.render(&frame);
            Ok(())
        }),
    )?;

    Ok(SourceTokens {
        serial: serial_token,
        flash,
        blink,
        input_poll,
        cloud_service,
        status,
    })
}
