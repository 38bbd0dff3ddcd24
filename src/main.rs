//! EnvHub Controller — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimHardware            SystemClock          NullCloud         │
//! │  (Sensor+Actuator+      (ClockPort)          (CloudPort)       │
//! │   Indicator+Display)                                           │
//! │  SimSerial              SleepBackend                           │
//! │  (SerialPort)           (WaitBackend)                          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          EventLoop + handlers (pure logic)             │    │
//! │  │  timers · debounce · serial dispatch · telemetry       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Result;
use log::info;
use tracing_subscriber::EnvFilter;

use envhub::adapters::clock::SystemClock;
use envhub::adapters::sim::{NullCloud, SimHardware, SimSerial, SleepBackend};
use envhub::app::ports::CloudPort;
use envhub::config::SystemConfig;
use envhub::drivers::button::DebouncedButton;
use envhub::mux::{EventLoop, StreamId};
use envhub::runtime::{self, HubContext};

/// Input pin stand-in for the host build: never pressed.
struct IdlePin;

impl embedded_hal::digital::ErrorType for IdlePin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::InputPin for IdlePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

fn main() -> Result<()> {
    // ── 1. Bootstrap log output ───────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("EnvHub v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration + adapters ───────────────────────────
    let cfg = SystemConfig::default();
    let clock = SystemClock::new();

    let mut cloud = NullCloud;
    cloud.initialize().map_err(envhub::error::Error::from)?;

    // ── 3. Event loop + source wiring ─────────────────────────
    let mut ev = EventLoop::new(clock.clone(), SleepBackend::new());

    let tokens = runtime::wire(
        &mut ev,
        &cfg,
        Some((StreamId(3), SimSerial)),
        DebouncedButton::new(IdlePin),
        DebouncedButton::new(IdlePin),
    )
    .map_err(|e| anyhow::anyhow!("source registration failed: {e}"))?;
    info!("sources registered: {tokens:?}");

    let mut ctx = HubContext::new(cfg, SimHardware::new(), cloud, clock);

    info!("system ready, entering event loop");

    // ── 4. Run until shutdown ─────────────────────────────────
    let reason = ev.run(&mut ctx);
    info!("event loop exited: {reason:?}");

    ctx.cloud.teardown();
    Ok(())
}
