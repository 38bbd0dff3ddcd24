//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter        | Implements                         | Connects to          |
//! |----------------|------------------------------------|----------------------|
//! | `clock`        | ClockPort                          | std/chrono clocks    |
//! | `sim`          | SensorPort, ActuatorPort,          | in-memory simulation |
//! |                | IndicatorPort, DisplayPort,        |                      |
//! |                | SerialPort, CloudPort, WaitBackend |                      |

pub mod clock;
pub mod sim;
