//! Totals over combined API request records.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::message::{LogEntry, PayloadError};

/// Aggregated request usage for a transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageSummary {
    /// Number of `api_req_started` records.
    pub requests: usize,
    /// Requests whose payload carries a numeric `cost`.
    pub completed: usize,
    /// Sum of `cost` in USD.
    pub total_cost: f64,
    pub tokens_in: u64,
    pub tokens_out: u64,
}

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Failed to read payload of request at ts {ts}: {source}")]
    Payload {
        ts: i64,
        #[source]
        source: PayloadError,
    },
}

impl UsageSummary {
    /// Format the total cost for display, e.g. `$0.0120`.
    #[must_use]
    pub fn display_cost(&self, decimals: usize) -> String {
        format!("${:.*}", decimals, self.total_cost)
    }
}

/// Summarize an already-combined sequence.
///
/// Finish records are ignored, so run [`crate::combine::combine_api_requests`]
/// first to fold their figures into the start records.
pub fn summarize(entries: &[LogEntry]) -> Result<UsageSummary, UsageError> {
    let mut summary = UsageSummary::default();

    for entry in entries {
        let LogEntry::RequestStarted(req) = entry else {
            continue;
        };
        summary.requests += 1;

        let payload = req.payload().map_err(|source| UsageError::Payload {
            ts: req.ts,
            source,
        })?;
        if let Some(cost) = payload.get("cost").and_then(Value::as_f64) {
            summary.completed += 1;
            summary.total_cost += cost;
        }
        summary.tokens_in += payload.get("tokensIn").and_then(Value::as_u64).unwrap_or(0);
        summary.tokens_out += payload.get("tokensOut").and_then(Value::as_u64).unwrap_or(0);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::combine_api_requests;

    #[test]
    fn totals_combined_requests() {
        let entries = vec![
            LogEntry::started(Some(r#"{"request":"a"}"#), 1),
            LogEntry::finished(Some(r#"{"cost":0.005,"tokensIn":10,"tokensOut":4}"#), 2),
            LogEntry::started(Some(r#"{"request":"b"}"#), 3),
            LogEntry::finished(Some(r#"{"cost":0.007,"tokensIn":20}"#), 4),
            LogEntry::started(Some(r#"{"request":"c"}"#), 5),
        ];
        let combined = combine_api_requests(&entries).unwrap();

        let summary = summarize(&combined).unwrap();

        assert_eq!(summary.requests, 3);
        assert_eq!(summary.completed, 2);
        assert!((summary.total_cost - 0.012).abs() < 1e-12);
        assert_eq!(summary.tokens_in, 30);
        assert_eq!(summary.tokens_out, 4);
        assert_eq!(summary.display_cost(4), "$0.0120");
    }

    #[test]
    fn empty_transcript_has_zero_usage() {
        let summary = summarize(&[]).unwrap();
        assert_eq!(summary, UsageSummary::default());
        assert_eq!(summary.display_cost(2), "$0.00");
    }

    #[test]
    fn non_numeric_cost_is_not_counted() {
        let entries = vec![LogEntry::started(Some(r#"{"cost":"free"}"#), 1)];
        let summary = summarize(&entries).unwrap();
        assert_eq!(summary.requests, 1);
        assert_eq!(summary.completed, 0);
    }

    #[test]
    fn unreadable_payload_is_an_error() {
        let entries = vec![LogEntry::started(Some("oops"), 8)];
        let err = summarize(&entries).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read payload of request at ts 8"));
    }
}
