//! Departure events.

use serde::Serialize;

use super::LineType;

/// One scheduled vehicle departure at a stop, with realtime-derived fields.
///
/// Built only by the normalizer, and only when line number, destination
/// and a parsable scheduled time were all present upstream. Never mutated;
/// each refresh replaces the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    /// Line label, e.g. "U79" or "SB15".
    pub line: String,
    /// Direction / destination text.
    pub destination: String,
    /// Platform or track label; empty when upstream has none.
    pub platform: String,
    pub line_type: LineType,
    /// Minutes from now until the realtime departure. Zero or negative
    /// means due or already gone.
    pub minutes_until: i64,
    /// Realtime minus scheduled, in minutes.
    pub delay_minutes: i64,
    /// Scheduled time as "HH:MM".
    pub scheduled_time: String,
}

impl Departure {
    /// Whether the departure runs behind schedule.
    pub fn is_delayed(&self) -> bool {
        self.delay_minutes > 0
    }

    /// Whether the departure is due now or already gone.
    pub fn is_due(&self) -> bool {
        self.minutes_until <= 0
    }

    /// Whether the platform label matches `platform`, ignoring case.
    pub fn is_at_platform(&self, platform: &str) -> bool {
        self.platform.to_lowercase() == platform.to_lowercase()
    }
}
