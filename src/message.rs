//! Transcript log entries and their JSON wire format.
//!
//! The chat UI records everything it shows as loosely shaped JSON objects:
//! `{"type": "say", "say": "api_req_started", "text": "...", "ts": 1000}`.
//! Only the two API request kinds carry structure this crate cares about;
//! every other record is kept as the raw object so it round-trips untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// `say` value of the entry written when an outbound API call begins.
pub const SAY_API_REQ_STARTED: &str = "api_req_started";
/// `say` value of the entry written when an outbound API call completes.
pub const SAY_API_REQ_FINISHED: &str = "api_req_finished";

const KEY_TYPE: &str = "type";
const KEY_SAY: &str = "say";
const KEY_TEXT: &str = "text";
const KEY_TS: &str = "ts";

// === Types ===

/// One record of the transcript log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub enum LogEntry {
    /// An outbound API call started; `text` holds the request descriptor.
    RequestStarted(ApiRequestEntry),
    /// An outbound API call finished; `text` holds cost and usage figures.
    RequestFinished(ApiRequestEntry),
    /// Any other record, kept verbatim.
    Other(Map<String, Value>),
}

/// Discriminant of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    RequestStarted,
    RequestFinished,
    Other,
}

/// Fields shared by the start and finish records of an API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequestEntry {
    /// Timestamp in milliseconds.
    pub ts: i64,
    /// Serialized JSON object, absent when the producer wrote none.
    pub text: Option<String>,
    /// Every other field of the record (`reasoning`, `partial`, ...), in
    /// their original order.
    pub extra: Map<String, Value>,
}

/// Errors raised while decoding a record into a [`LogEntry`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EntryError {
    #[error("Failed to decode {say} entry: missing ts")]
    MissingTimestamp { say: &'static str },

    #[error("Failed to decode {say} entry: ts must be an integer, got {value}")]
    InvalidTimestamp { say: &'static str, value: Value },

    #[error("Failed to decode {say} entry at ts {ts}: text must be a string")]
    InvalidText { say: &'static str, ts: i64 },
}

/// Errors raised while reading the payload of an API request record.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("payload is a JSON {found}, expected an object")]
    NotObject { found: &'static str },
}

// === LogEntry ===

impl LogEntry {
    /// Build an `api_req_started` record.
    #[must_use]
    pub fn started(text: Option<&str>, ts: i64) -> Self {
        LogEntry::RequestStarted(ApiRequestEntry::new(ts, text.map(str::to_string)))
    }

    /// Build an `api_req_finished` record.
    #[must_use]
    pub fn finished(text: Option<&str>, ts: i64) -> Self {
        LogEntry::RequestFinished(ApiRequestEntry::new(ts, text.map(str::to_string)))
    }

    #[must_use]
    pub fn kind(&self) -> EntryKind {
        match self {
            LogEntry::RequestStarted(_) => EntryKind::RequestStarted,
            LogEntry::RequestFinished(_) => EntryKind::RequestFinished,
            LogEntry::Other(_) => EntryKind::Other,
        }
    }

    /// The API request fields, for either request kind.
    #[must_use]
    pub fn api_request(&self) -> Option<&ApiRequestEntry> {
        match self {
            LogEntry::RequestStarted(req) | LogEntry::RequestFinished(req) => Some(req),
            LogEntry::Other(_) => None,
        }
    }

    /// Timestamp of the record, when it has an integer one.
    #[must_use]
    pub fn ts(&self) -> Option<i64> {
        match self {
            LogEntry::RequestStarted(req) | LogEntry::RequestFinished(req) => Some(req.ts),
            LogEntry::Other(raw) => raw.get(KEY_TS).and_then(Value::as_i64),
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            LogEntry::RequestStarted(req) | LogEntry::RequestFinished(req) => req.text.as_deref(),
            LogEntry::Other(raw) => raw.get(KEY_TEXT).and_then(Value::as_str),
        }
    }
}

impl TryFrom<Map<String, Value>> for LogEntry {
    type Error = EntryError;

    fn try_from(mut raw: Map<String, Value>) -> Result<Self, Self::Error> {
        let kind = classify(&raw);
        let say = match kind {
            EntryKind::RequestStarted => SAY_API_REQ_STARTED,
            EntryKind::RequestFinished => SAY_API_REQ_FINISHED,
            EntryKind::Other => return Ok(LogEntry::Other(raw)),
        };

        raw.shift_remove(KEY_TYPE);
        raw.shift_remove(KEY_SAY);
        let ts = match raw.shift_remove(KEY_TS) {
            Some(value) => value
                .as_i64()
                .ok_or(EntryError::InvalidTimestamp { say, value })?,
            None => return Err(EntryError::MissingTimestamp { say }),
        };
        let text = match raw.shift_remove(KEY_TEXT) {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text),
            Some(_) => return Err(EntryError::InvalidText { say, ts }),
        };

        let req = ApiRequestEntry {
            ts,
            text,
            extra: raw,
        };
        Ok(match kind {
            EntryKind::RequestStarted => LogEntry::RequestStarted(req),
            _ => LogEntry::RequestFinished(req),
        })
    }
}

impl From<LogEntry> for Map<String, Value> {
    fn from(entry: LogEntry) -> Self {
        match entry {
            LogEntry::RequestStarted(req) => req.into_record(SAY_API_REQ_STARTED),
            LogEntry::RequestFinished(req) => req.into_record(SAY_API_REQ_FINISHED),
            LogEntry::Other(raw) => raw,
        }
    }
}

fn classify(raw: &Map<String, Value>) -> EntryKind {
    if raw.get(KEY_TYPE).and_then(Value::as_str) != Some("say") {
        return EntryKind::Other;
    }
    match raw.get(KEY_SAY).and_then(Value::as_str) {
        Some(SAY_API_REQ_STARTED) => EntryKind::RequestStarted,
        Some(SAY_API_REQ_FINISHED) => EntryKind::RequestFinished,
        _ => EntryKind::Other,
    }
}

// === ApiRequestEntry ===

impl ApiRequestEntry {
    #[must_use]
    pub fn new(ts: i64, text: Option<String>) -> Self {
        Self {
            ts,
            text,
            extra: Map::new(),
        }
    }

    /// Attach an extra field, replacing any previous value under `key`.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Parse `text` into a JSON object.
    ///
    /// Absent and empty text both read as `{}`; any other text must be a
    /// serialized object.
    pub fn payload(&self) -> Result<Map<String, Value>, PayloadError> {
        let text = match self.text.as_deref() {
            None | Some("") => return Ok(Map::new()),
            Some(text) => text,
        };
        match serde_json::from_str::<Value>(text).map_err(PayloadError::Malformed)? {
            Value::Object(map) => Ok(map),
            other => Err(PayloadError::NotObject {
                found: json_type_name(&other),
            }),
        }
    }

    fn into_record(self, say: &'static str) -> Map<String, Value> {
        let mut record = Map::with_capacity(self.extra.len() + 4);
        record.insert(KEY_TYPE.to_string(), Value::from("say"));
        record.insert(KEY_SAY.to_string(), Value::from(say));
        if let Some(text) = self.text {
            record.insert(KEY_TEXT.to_string(), Value::String(text));
        }
        record.insert(KEY_TS.to_string(), Value::from(self.ts));
        record.extend(self.extra);
        record
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryKind::RequestStarted => SAY_API_REQ_STARTED,
            EntryKind::RequestFinished => SAY_API_REQ_FINISHED,
            EntryKind::Other => "other",
        };
        f.write_str(label)
    }
}
