//! Unified error types for the EnvHub controller.
//!
//! Follows embedded best practice: a single `Error` enum that every subsystem
//! can convert into, keeping the event loop's error handling uniform. All
//! variants are `Copy` so they can be cheaply carried through handler returns
//! and the shared device state without allocation.
//!
//! The split mirrors the failure taxonomy of the controller: I/O failures on
//! registered sources are fatal to the whole loop, while malformed protocol
//! input never produces an `Error` at all (it is logged and dropped at the
//! decode boundary).

use core::fmt;

use crate::timer::TimerError;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fatal condition in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The readiness wait itself failed (multiplexer backend).
    Wait(&'static str),
    /// A timer source could not be armed, cancelled, or consumed.
    Timer(TimerError),
    /// The serial link failed while reading or writing a frame.
    Serial(SerialError),
    /// A sensor or digital input could not be read.
    Sensor(SensorError),
    /// The cloud collaborator failed.
    Cloud(CloudError),
    /// Peripheral or collaborator initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wait(msg) => write!(f, "wait: {msg}"),
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::Serial(e) => write!(f, "serial: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Cloud(e) => write!(f, "cloud: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Serial link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    /// Read from the link returned an error.
    ReadFailed,
    /// Write to the link returned an error.
    WriteFailed,
    /// The underlying channel is gone.
    Closed,
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "read failed"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::Closed => write!(f, "channel closed"),
        }
    }
}

impl From<SerialError> for Error {
    fn from(e: SerialError) -> Self {
        Self::Serial(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor / input errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// GPIO level read returned an error.
    GpioReadFailed,
    /// The climate sensor did not answer or returned garbage.
    ClimateReadFailed,
    /// The light sensor ADC read failed.
    LightReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::ClimateReadFailed => write!(f, "climate read failed"),
            Self::LightReadFailed => write!(f, "light read failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

/// Actuator failures are logged where they occur and never escalate: the
/// presentation mirror in [`DeviceState`](crate::state::DeviceState) is
/// updated regardless, so the display can transiently diverge from the
/// physical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
    /// The relay driver rejected the command.
    RelayFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::RelayFailed => write!(f, "relay command failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Cloud collaborator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudError {
    /// The publish primitive reported a failure.
    PublishFailed,
    /// Reporting a named property failed.
    ReportFailed,
    /// The client has no established connection.
    NotConnected,
    /// Client setup failed.
    SetupFailed,
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PublishFailed => write!(f, "publish failed"),
            Self::ReportFailed => write!(f, "property report failed"),
            Self::NotConnected => write!(f, "not connected"),
            Self::SetupFailed => write!(f, "client setup failed"),
        }
    }
}

impl From<CloudError> for Error {
    fn from(e: CloudError) -> Self {
        Self::Cloud(e)
    }
}

impl From<TimerError> for Error {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
