//! Mock adapters for integration tests.
//!
//! Everything records its full call history so tests can assert on ordering
//! and timing without real peripherals. The clock and wait backend share a
//! cell: each wait "sleeps" by advancing the clock by the requested timeout,
//! so scenarios run in virtual time.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use envhub::app::ports::{
    ActuatorPort, ClockLabel, ClockPort, CloudEvents, CloudPort, DisplayPort, IndicatorPort,
    MethodResponse, SensorPort, SerialPort, StatusFrame, WaitBackend,
};
use envhub::config::SystemConfig;
use envhub::drivers::button::DebouncedButton;
use envhub::drivers::indicator::{Color, Indicator};
use envhub::error::{ActuatorError, CloudError, Result, SensorError, SerialError};
use envhub::mux::{EventLoop, ReadySet, ShutdownFlag, StreamId, TerminationReason};
use envhub::runtime::{self, HubContext, SourceTokens};
use envhub::state::Climate;

pub const SERIAL_ID: StreamId = StreamId(3);

// ── Clock ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockClock(pub Rc<Cell<Duration>>);

impl MockClock {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(Duration::ZERO)))
    }
}

impl ClockPort for MockClock {
    fn monotonic(&self) -> Duration {
        self.0.get()
    }

    fn epoch_millis(&self) -> u64 {
        1_700_000_000_000 + self.0.get().as_millis() as u64
    }

    fn wall_clock_label(&self) -> ClockLabel {
        ClockLabel::try_from("01-01 00:00:00").unwrap()
    }
}

// ── Wait backend ──────────────────────────────────────────────

#[derive(Default)]
pub struct BackendCtl {
    /// Stream readiness per wait call, consumed front-first.
    pub ready_script: VecDeque<Vec<StreamId>>,
    /// Trip the shutdown flag on the nth wait (1-based); that cycle still
    /// dispatches before the loop observes the flag.
    pub stop_after_waits: Option<usize>,
    pub flag: Option<ShutdownFlag>,
    pub waits: usize,
}

pub struct MockBackend {
    clock: MockClock,
    ctl: Rc<RefCell<BackendCtl>>,
}

impl WaitBackend for MockBackend {
    fn wait(
        &mut self,
        _watched: &[StreamId],
        timeout: Option<Duration>,
        ready: &mut ReadySet,
    ) -> Result<()> {
        let mut ctl = self.ctl.borrow_mut();
        ctl.waits += 1;
        if let Some(n) = ctl.stop_after_waits {
            if ctl.waits >= n {
                ctl.flag.as_ref().expect("flag wired").request();
            }
        }
        self.clock
            .0
            .set(self.clock.0.get() + timeout.unwrap_or(Duration::from_secs(1)));
        if let Some(ids) = ctl.ready_script.pop_front() {
            for id in ids {
                ready.push(id).unwrap();
            }
        }
        Ok(())
    }
}

// ── Hardware ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    Lamp(bool),
    Alarm(bool),
}

pub struct MockHardware {
    now: Rc<Cell<Duration>>,
    pub climate: Climate,
    light_script: Rc<RefCell<VecDeque<f32>>>,
    last_light: f32,
    pub calls: Vec<HwCall>,
    /// (time, indicator, color) for every paint.
    pub indicator_log: Vec<(Duration, Indicator, Color)>,
    pub frames: Vec<StatusFrame>,
}

impl MockHardware {
    pub fn new(clock: &MockClock, light_script: Rc<RefCell<VecDeque<f32>>>) -> Self {
        Self {
            now: clock.0.clone(),
            climate: Climate {
                temperature_c: 23.5,
                humidity_pct: 40.0,
            },
            light_script,
            last_light: 1800.0,
            calls: Vec::new(),
            indicator_log: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Paint history of one indicator.
    pub fn paints(&self, which: Indicator) -> Vec<(Duration, Color)> {
        self.indicator_log
            .iter()
            .filter(|(_, i, _)| *i == which)
            .map(|(t, _, c)| (*t, *c))
            .collect()
    }
}

impl SensorPort for MockHardware {
    fn read_climate(&mut self) -> core::result::Result<Climate, SensorError> {
        Ok(self.climate)
    }

    fn read_light_mv(&mut self) -> core::result::Result<f32, SensorError> {
        if let Some(mv) = self.light_script.borrow_mut().pop_front() {
            self.last_light = mv;
        }
        Ok(self.last_light)
    }
}

impl ActuatorPort for MockHardware {
    fn set_lamp(&mut self, on: bool) -> core::result::Result<(), ActuatorError> {
        self.calls.push(HwCall::Lamp(on));
        Ok(())
    }

    fn set_alarm(&mut self, on: bool) -> core::result::Result<(), ActuatorError> {
        self.calls.push(HwCall::Alarm(on));
        Ok(())
    }
}

impl IndicatorPort for MockHardware {
    fn set_indicator(&mut self, which: Indicator, color: Color) {
        self.indicator_log.push((self.now.get(), which, color));
    }
}

impl DisplayPort for MockHardware {
    fn render(&mut self, frame: &StatusFrame) {
        self.frames.push(frame.clone());
    }
}

// ── Cloud client ──────────────────────────────────────────────

pub enum CloudDelivery {
    Message(String),
    ConfigUpdate(u32),
    Method { name: String, payload: String },
    Connectivity(bool),
}

#[derive(Default)]
pub struct MockCloud {
    /// Result of every `try_setup_connection`.
    pub connect: bool,
    /// Connectivity callback fired once on the next setup call.
    pub announce: Option<bool>,
    /// Drained (all of them) on the next `do_periodic_work`.
    pub deliveries: VecDeque<CloudDelivery>,
    pub published: Vec<String>,
    pub reported: Vec<(String, u32)>,
    pub method_responses: Vec<MethodResponse>,
}

impl MockCloud {
    pub fn connected() -> Self {
        Self {
            connect: true,
            announce: Some(true),
            ..Self::default()
        }
    }

    pub fn published_kinds(&self) -> Vec<String> {
        self.published
            .iter()
            .map(|p| {
                let v: serde_json::Value = serde_json::from_str(p).unwrap();
                v["data"]["type"].as_str().unwrap().to_string()
            })
            .collect()
    }
}

impl CloudPort for MockCloud {
    fn initialize(&mut self) -> core::result::Result<(), CloudError> {
        Ok(())
    }

    fn teardown(&mut self) {}

    fn try_setup_connection(&mut self, events: &mut dyn CloudEvents) -> bool {
        if let Some(connected) = self.announce.take() {
            events.on_connectivity_changed(connected);
        }
        self.connect
    }

    fn do_periodic_work(&mut self, events: &mut dyn CloudEvents) {
        while let Some(delivery) = self.deliveries.pop_front() {
            match delivery {
                CloudDelivery::Message(payload) => events.on_message(&payload),
                CloudDelivery::ConfigUpdate(index) => events.on_config_update(index),
                CloudDelivery::Method { name, payload } => {
                    let resp = events.on_method_call(&name, &payload);
                    self.method_responses.push(resp);
                }
                CloudDelivery::Connectivity(connected) => {
                    events.on_connectivity_changed(connected);
                }
            }
        }
    }

    fn publish(&mut self, payload: &str) -> core::result::Result<(), CloudError> {
        self.published.push(payload.to_string());
        Ok(())
    }

    fn report_property(&mut self, name: &str, value: u32) -> core::result::Result<(), CloudError> {
        self.reported.push((name.to_string(), value));
        Ok(())
    }
}

// ── Serial channel ────────────────────────────────────────────

#[derive(Default)]
pub struct MockSerial {
    pub rx: VecDeque<Vec<u8>>,
    pub tx: Rc<RefCell<Vec<u8>>>,
    pub fail_read: bool,
}

impl SerialPort for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, SerialError> {
        if self.fail_read {
            return Err(SerialError::ReadFailed);
        }
        match self.rx.pop_front() {
            Some(frame) => {
                let n = frame.len().min(buf.len());
                buf[..n].copy_from_slice(&frame[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }

    fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, SerialError> {
        self.tx.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
}

// ── Buttons ───────────────────────────────────────────────────

/// Pin replaying a scripted level sequence (true = low/pressed); sticks at
/// released once the script runs dry.
pub struct MockPin {
    script: Rc<RefCell<VecDeque<bool>>>,
}

impl MockPin {
    pub fn new(script: Rc<RefCell<VecDeque<bool>>>) -> Self {
        Self { script }
    }
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::InputPin for MockPin {
    fn is_high(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(!self.script.borrow().front().copied().unwrap_or(false))
    }

    fn is_low(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(self.script.borrow_mut().pop_front().unwrap_or(false))
    }
}

// ── Scenario harness ──────────────────────────────────────────

pub type TestContext = HubContext<MockHardware, MockCloud, MockClock>;

/// A fully wired loop over mock adapters, run in virtual time.
pub struct Scenario {
    pub clock: MockClock,
    pub ctl: Rc<RefCell<BackendCtl>>,
    pub light: Rc<RefCell<VecDeque<f32>>>,
    pub rate_pin: Rc<RefCell<VecDeque<bool>>>,
    pub send_pin: Rc<RefCell<VecDeque<bool>>>,
    pub serial_tx: Rc<RefCell<Vec<u8>>>,
    pub tokens: SourceTokens,
    pub ev: EventLoop<TestContext, MockClock, MockBackend>,
    pub ctx: TestContext,
}

impl Scenario {
    pub fn new(cfg: SystemConfig, cloud: MockCloud, serial: Option<MockSerial>) -> Self {
        let clock = MockClock::new();
        let ctl = Rc::new(RefCell::new(BackendCtl::default()));
        let light = Rc::new(RefCell::new(VecDeque::new()));
        let rate_pin = Rc::new(RefCell::new(VecDeque::new()));
        let send_pin = Rc::new(RefCell::new(VecDeque::new()));

        let serial_tx = serial
            .as_ref()
            .map(|s| s.tx.clone())
            .unwrap_or_default();

        let backend = MockBackend {
            clock: clock.clone(),
            ctl: ctl.clone(),
        };
        let mut ev = EventLoop::new(clock.clone(), backend);
        ctl.borrow_mut().flag = Some(ev.shutdown_handle());

        let tokens = runtime::wire(
            &mut ev,
            &cfg,
            serial.map(|s| (SERIAL_ID, s)),
            DebouncedButton::new(MockPin::new(rate_pin.clone())),
            DebouncedButton::new(MockPin::new(send_pin.clone())),
        )
        .expect("registration");

        let hw = MockHardware::new(&clock, light.clone());
        let ctx = HubContext::new(cfg, hw, cloud, clock.clone());

        Self {
            clock,
            ctl,
            light,
            rate_pin,
            send_pin,
            serial_tx,
            tokens,
            ev,
            ctx,
        }
    }

    pub fn stop_after_waits(&mut self, n: usize) {
        self.ctl.borrow_mut().stop_after_waits = Some(n);
    }

    pub fn script_ready(&mut self, per_wait: Vec<Vec<StreamId>>) {
        self.ctl.borrow_mut().ready_script = per_wait.into();
    }

    pub fn run(&mut self) -> TerminationReason {
        self.ev.run(&mut self.ctx)
    }
}

/// Cadences compressed so scenarios finish in a handful of waits.
pub fn fast_config() -> SystemConfig {
    SystemConfig {
        initial_blink_secs: 10,
        input_poll_interval_ms: 500,
        cloud_work_interval_secs: 1,
        status_refresh_secs: 1,
        ..SystemConfig::default()
    }
}
