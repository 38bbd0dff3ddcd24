//! Inbound command decoding.
//!
//! Both inbound channels (the serial peer link and the cloud message stream)
//! are decoded into closed tagged variants at the boundary, so the dispatch
//! logic downstream never touches raw bytes or JSON. Anything that does not
//! decode is dropped by the caller — permissive by design, the peers get no
//! error response.

use serde::Deserialize;

// ───────────────────────────────────────────────────────────────
// Serial peer commands
// ───────────────────────────────────────────────────────────────

/// One command token from the serial peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialCommand {
    /// `lightOn` — drive the lamp output on.
    LampOn,
    /// `lightOff` — drive the lamp output off.
    LampOff,
    /// `tempT` — answer with the last temperature reading.
    QueryTemperature,
}

impl SerialCommand {
    /// Parse one received frame. The frame is treated as a NUL-terminated
    /// token: bytes after the first NUL are ignored, the token itself must
    /// match exactly (case-sensitive, no trailing newline expected).
    pub fn parse(frame: &[u8]) -> Option<Self> {
        let end = frame.iter().position(|&b| b == 0).unwrap_or(frame.len());
        match &frame[..end] {
            b"lightOn" => Some(Self::LampOn),
            b"lightOff" => Some(Self::LampOff),
            b"tempT" => Some(Self::QueryTemperature),
            _ => None,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Cloud messages
// ───────────────────────────────────────────────────────────────

/// A decoded device-bound cloud command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundCommand {
    SetLight(bool),
    SetAlarm(bool),
    /// Well-formed envelope with a tag this device does not handle.
    Unknown(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Data")]
    data: Payload,
}

#[derive(Deserialize)]
struct Payload {
    #[serde(rename = "type")]
    kind: String,
    value: f64,
}

impl InboundCommand {
    /// Decode `{"Data":{"type":...,"value":0|1}}`. Returns `None` for
    /// anything that is not a well-formed envelope — including a missing
    /// tag — which the caller treats as a silent no-op.
    pub fn decode(payload: &str) -> Option<Self> {
        let envelope: Envelope = serde_json::from_str(payload).ok()?;
        let on = envelope.data.value == 1.0;
        Some(match envelope.data.kind.as_str() {
            "SetLight" => Self::SetLight(on),
            "SetAlarm" => Self::SetAlarm(on),
            _ => Self::Unknown(envelope.data.kind),
        })
    }
}
