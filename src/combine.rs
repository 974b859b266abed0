//! Merge `api_req_started` / `api_req_finished` pairs into single records.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::message::{ApiRequestEntry, LogEntry, PayloadError};

/// Which half of a request pair a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSide {
    Start,
    Finish,
}

/// Errors that abort a combine pass.
#[derive(Debug, Error)]
pub enum CombineError {
    #[error("Failed to merge request at ts {ts}: {side} payload is unreadable: {source}")]
    Payload {
        side: PayloadSide,
        ts: i64,
        #[source]
        source: PayloadError,
    },
}

/// Combine API request start and finish records.
///
/// Each `api_req_finished` record is folded into the most recent
/// `api_req_started` record that has not been matched yet: the two JSON
/// payloads are merged (finish keys win) and the start record is replaced in
/// place. Finish records never appear in the output, including ones with no
/// pending start. Starts that never see a finish pass through unchanged.
///
/// The input is left untouched. A payload that is present but is not a JSON
/// object fails the whole call.
///
/// # Examples
///
/// ```
/// use apireq::combine::combine_api_requests;
/// use apireq::message::LogEntry;
///
/// let entries = vec![
///     LogEntry::started(Some(r#"{"request":"GET /api/data"}"#), 1000),
///     LogEntry::finished(Some(r#"{"cost":0.005}"#), 1001),
/// ];
/// let combined = combine_api_requests(&entries)?;
/// assert_eq!(combined.len(), 1);
/// assert_eq!(combined[0].text(), Some(r#"{"request":"GET /api/data","cost":0.005}"#));
/// # Ok::<(), apireq::combine::CombineError>(())
/// ```
pub fn combine_api_requests(entries: &[LogEntry]) -> Result<Vec<LogEntry>, CombineError> {
    let mut combined: Vec<LogEntry> = Vec::with_capacity(entries.len());
    // Indices into `combined` of starts still waiting for a finish.
    let mut pending: Vec<usize> = Vec::new();

    for entry in entries {
        match entry {
            LogEntry::RequestStarted(_) => {
                pending.push(combined.len());
                combined.push(entry.clone());
            }
            LogEntry::RequestFinished(finish) => {
                let Some(index) = pending.pop() else {
                    tracing::debug!(ts = finish.ts, "Dropping api_req_finished with no pending start");
                    continue;
                };
                if let LogEntry::RequestStarted(start) = &mut combined[index] {
                    let merged = merge_payloads(start, finish)?;
                    tracing::trace!(start_ts = start.ts, finish_ts = finish.ts, "Combined API request");
                    start.text = Some(merged);
                }
            }
            LogEntry::Other(_) => combined.push(entry.clone()),
        }
    }

    Ok(combined)
}

fn merge_payloads(start: &ApiRequestEntry, finish: &ApiRequestEntry) -> Result<String, CombineError> {
    let mut merged = start.payload().map_err(|source| CombineError::Payload {
        side: PayloadSide::Start,
        ts: start.ts,
        source,
    })?;
    let finished = finish.payload().map_err(|source| CombineError::Payload {
        side: PayloadSide::Finish,
        ts: finish.ts,
        source,
    })?;
    // Colliding keys keep their start position but take the finish value.
    merged.extend(finished);
    Ok(Value::Object(merged).to_string())
}

impl fmt::Display for PayloadSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadSide::Start => f.write_str("start"),
            PayloadSide::Finish => f.write_str("finish"),
        }
    }
}
