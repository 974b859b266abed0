//! Tools for the API request records of a chat transcript.
//!
//! - [`message`] models transcript log entries and their JSON wire format.
//! - [`combine`] folds each `api_req_finished` record into its matching
//!   `api_req_started` record.
//! - [`usage`] totals cost and token counts over combined records.
//! - [`balance`] formats OpenRouter / Requesty key info for display.
//!
//! [`config`], [`logging`] and [`palette`] back the `apireq` binary.

pub mod balance;
pub mod combine;
pub mod config;
pub mod logging;
pub mod message;
pub mod palette;
pub mod usage;
