//! Serial peer link handler.
//!
//! The peer speaks a bare token protocol: each readiness event on the
//! channel is read as one complete frame into a bounded buffer and decoded
//! as a single command. Frames spanning multiple reads are not reassembled —
//! a command split across two wake cycles is two garbage tokens and gets
//! dropped. The peer keeps frames atomic in practice; reassembly stays out
//! of this layer.
//!
//! Unrecognized tokens are ignored without a response. Read and write
//! failures are fatal to the loop: the channel handle is a registered event
//! source, and a broken handle cannot be serviced again.

use core::fmt::Write as _;

use log::{debug, warn};

use crate::app::commands::SerialCommand;
use crate::app::ports::{ActuatorPort, SerialPort};
use crate::error::{Error, Result};
use crate::state::DeviceState;

/// Maximum payload accepted per frame.
pub const FRAME_CAP: usize = 256;

/// Owns the serial channel and its dispatch.
pub struct SerialLink<P> {
    port: P,
}

impl<P: SerialPort> SerialLink<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    /// Service one readiness event: read a frame, decode, dispatch.
    pub fn on_readable(
        &mut self,
        state: &mut DeviceState,
        hw: &mut impl ActuatorPort,
    ) -> Result<()> {
        let mut buf = [0u8; FRAME_CAP];
        let n = match self.port.read(&mut buf) {
            Ok(n) => n,
            Err(e) => {
                warn!("serial read failed: {e}");
                return Err(Error::Serial(e));
            }
        };
        if n == 0 {
            return Ok(());
        }
        debug!("serial rx {n} bytes");

        match SerialCommand::parse(&buf[..n]) {
            Some(SerialCommand::LampOn) => {
                if let Err(e) = hw.set_lamp(true) {
                    warn!("lamp command failed: {e}");
                }
                state.flags.lamp_on = true;
            }
            Some(SerialCommand::LampOff) => {
                if let Err(e) = hw.set_lamp(false) {
                    warn!("lamp command failed: {e}");
                }
                state.flags.lamp_on = false;
            }
            Some(SerialCommand::QueryTemperature) => {
                let mut text = String::new();
                // write! to String cannot fail.
                let _ = write!(text, "{:.6}", state.climate.temperature_c);
                self.write_all(text.as_bytes())?;
            }
            None => {
                // Unknown tokens get no error response on purpose.
                debug!("ignoring unrecognized serial token");
            }
        }
        Ok(())
    }

    /// Push a whole response onto the wire, retrying partial writes until
    /// everything is sent or the channel errors out.
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut sent = 0;
        let mut writes = 0;
        while sent < data.len() {
            writes += 1;
            match self.port.write(&data[sent..]) {
                Ok(n) => sent += n,
                Err(e) => {
                    warn!("serial write failed after {sent}/{} bytes: {e}", data.len());
                    return Err(Error::Serial(e));
                }
            }
        }
        debug!("serial tx {sent} bytes in {writes} writes");
        Ok(())
    }
}
