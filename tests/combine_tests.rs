//! End-to-end tests: transcript JSON in, combined transcript JSON out.

mod common;

use apireq::combine::{CombineError, PayloadSide, combine_api_requests};
use apireq::message::EntryKind;
use apireq::usage::summarize;
use common::{entries, payload, say};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[test]
fn combines_a_transcript_with_chatter() {
    let transcript = entries(json!([
        say("text", "hi", 999),
        say("api_req_started", r#"{"request":"GET /x"}"#, 1000),
        say("api_req_finished", r#"{"cost":0.01}"#, 1001),
    ]));

    let combined = combine_api_requests(&transcript).unwrap();

    assert_eq!(combined.len(), 2);
    assert_eq!(combined[0], transcript[0]);
    assert_eq!(combined[1].kind(), EntryKind::RequestStarted);
    assert_eq!(combined[1].ts(), Some(1000));
    assert_eq!(payload(&combined[1]), json!({"request": "GET /x", "cost": 0.01}));
}

#[test]
fn output_reencodes_as_start_records_only() {
    let transcript = entries(json!([
        {"type": "ask", "ask": "followup", "text": "Proceed?", "ts": 1},
        {
            "type": "say",
            "say": "api_req_started",
            "text": "{\"request\":\"POST /v1/chat\"}",
            "ts": 2,
            "reasoning": "thinking",
            "partial": false
        },
        say("api_req_finished", r#"{"cost":0.25,"tokensIn":100,"tokensOut":40}"#, 3),
        say("api_req_finished", r#"{"cost":9}"#, 4),
    ]));

    let combined = combine_api_requests(&transcript).unwrap();
    let encoded = serde_json::to_value(&combined).unwrap();

    let Value::Array(records) = encoded else {
        panic!("expected an array");
    };
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0],
        json!({"type": "ask", "ask": "followup", "text": "Proceed?", "ts": 1})
    );

    let merged = &records[1];
    assert_eq!(merged["say"], json!("api_req_started"));
    assert_eq!(merged["ts"], json!(2));
    assert_eq!(merged["reasoning"], json!("thinking"));
    assert_eq!(merged["partial"], json!(false));
    let text: Value = serde_json::from_str(merged["text"].as_str().unwrap()).unwrap();
    assert_eq!(
        text,
        json!({"request": "POST /v1/chat", "cost": 0.25, "tokensIn": 100, "tokensOut": 40})
    );
}

#[test]
fn relative_order_of_kept_entries_is_preserved() {
    let transcript = entries(json!([
        say("api_req_started", r#"{"request":"a"}"#, 1),
        say("text", "between", 2),
        say("api_req_started", r#"{"request":"b"}"#, 3),
        say("api_req_finished", r#"{"cost":1}"#, 4),
        say("text", "after", 5),
        say("api_req_finished", r#"{"cost":2}"#, 6),
    ]));

    let combined = combine_api_requests(&transcript).unwrap();

    let timestamps: Vec<_> = combined.iter().filter_map(|entry| entry.ts()).collect();
    assert_eq!(timestamps, vec![1, 2, 3, 5]);
    assert_eq!(payload(&combined[0]), json!({"request": "a", "cost": 2}));
    assert_eq!(payload(&combined[2]), json!({"request": "b", "cost": 1}));
}

#[test]
fn summary_reflects_combined_costs() {
    let transcript = entries(json!([
        say("api_req_started", r#"{"request":"a"}"#, 1),
        say("api_req_finished", r#"{"cost":0.5}"#, 2),
        say("api_req_started", r#"{"request":"b"}"#, 3),
    ]));

    let combined = combine_api_requests(&transcript).unwrap();
    let summary = summarize(&combined).unwrap();

    assert_eq!(summary.requests, 2);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.display_cost(2), "$0.50");
}

#[test]
fn corrupt_payload_aborts_without_partial_output() {
    let transcript = entries(json!([
        say("api_req_started", r#"{"request":"ok"}"#, 1),
        say("api_req_finished", r#"{"cost":0.1}"#, 2),
        say("api_req_started", "{broken", 3),
        say("api_req_finished", r#"{"cost":0.2}"#, 4),
    ]));

    let err = combine_api_requests(&transcript).unwrap_err();

    let CombineError::Payload { side, ts, .. } = err;
    assert_eq!(side, PayloadSide::Start);
    assert_eq!(ts, 3);
}
