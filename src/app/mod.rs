//! Application core — pure orchestration logic, zero I/O.
//!
//! This module contains the business rules for the EnvHub controller:
//! typed command decoding, telemetry records, and the dispatcher that gates
//! every send on connectivity. All interaction with hardware and the cloud
//! client happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod commands;
pub mod ports;
pub mod service;
pub mod telemetry;
