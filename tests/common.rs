//! Shared helpers for apireq integration tests.

use apireq::message::LogEntry;
use serde_json::{Value, json};

/// Decode a JSON array literal into transcript entries.
pub fn entries(value: Value) -> Vec<LogEntry> {
    serde_json::from_value(value).expect("transcript fixture should decode")
}

/// Parse the payload text of an entry, treating absent text as `{}`.
pub fn payload(entry: &LogEntry) -> Value {
    serde_json::from_str(entry.text().unwrap_or("{}")).expect("payload should be JSON")
}

pub fn say(say: &str, text: &str, ts: i64) -> Value {
    json!({"type": "say", "say": say, "text": text, "ts": ts})
}
