//! Outbound telemetry records.
//!
//! A record is a structured value built fresh per send and serialized by a
//! single codec function — the wire shape lives here and nowhere else.

/// What a record measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingKind {
    Presence,
    Temperature,
    Humidity,
    /// Operator-triggered marker reading (e.g. the send button).
    Custom,
}

impl ReadingKind {
    const fn wire_name(self) -> &'static str {
        match self {
            Self::Presence => "Presence",
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::Custom => "Custom",
        }
    }
}

/// One tagged reading bound for the cloud endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord<'a> {
    pub origin: &'a str,
    pub timestamp_millis: u64,
    pub kind: ReadingKind,
    pub value: f64,
}

impl<'a> TelemetryRecord<'a> {
    pub fn new(origin: &'a str, timestamp_millis: u64, kind: ReadingKind, value: f64) -> Self {
        Self {
            origin,
            timestamp_millis,
            kind,
            value,
        }
    }

    /// Serialize to the wire shape:
    /// `{"type":"Reading","origin":...,"timestamp":...,"data":{"type":...,"value":...}}`
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "type": "Reading",
            "origin": self.origin,
            "timestamp": self.timestamp_millis,
            "data": {
                "type": self.kind.wire_name(),
                "value": self.value,
            },
        })
        .to_string()
    }
}
