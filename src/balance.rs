//! Provider balance display for OpenRouter and Requesty API keys.
//!
//! Callers fetch key info from the provider themselves; this module only turns
//! the decoded response into the amount and settings link shown to the user.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

pub const OPENROUTER_SETTINGS_URL: &str = "https://openrouter.ai/settings/keys";
pub const REQUESTY_SETTINGS_URL: &str = "https://app.requesty.ai/settings";

/// Key info returned by OpenRouter's key endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OpenRouterKeyInfo {
    /// Credit limit of the key; `None` for unlimited keys.
    #[serde(default)]
    pub limit: Option<f64>,
    #[serde(default)]
    pub usage: f64,
}

/// Key info returned by Requesty's key endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RequestyKeyInfo {
    /// Organization balance, sent as a decimal string.
    pub org_balance: String,
}

/// Provider responses arrive either bare or wrapped in `{"data": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

/// A balance ready to show, linking to the provider's settings page.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceDisplay {
    pub amount: f64,
    pub href: &'static str,
}

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("Failed to parse key info: {0}")]
    InvalidKeyInfo(#[from] serde_json::Error),

    #[error("Failed to parse balance '{value}' as a number")]
    InvalidBalance { value: String },
}

impl fmt::Display for BalanceDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.amount)
    }
}

/// Remaining credit on an OpenRouter key, or `None` when the key has no limit.
#[must_use]
pub fn openrouter_balance(info: &OpenRouterKeyInfo) -> Option<BalanceDisplay> {
    let limit = info.limit.filter(|limit| *limit != 0.0)?;
    Some(BalanceDisplay {
        amount: limit - info.usage,
        href: OPENROUTER_SETTINGS_URL,
    })
}

/// Organization balance on a Requesty key.
pub fn requesty_balance(info: &RequestyKeyInfo) -> Result<BalanceDisplay, BalanceError> {
    let amount = info
        .org_balance
        .trim()
        .parse::<f64>()
        .map_err(|_| BalanceError::InvalidBalance {
            value: info.org_balance.clone(),
        })?;
    Ok(BalanceDisplay {
        amount,
        href: REQUESTY_SETTINGS_URL,
    })
}

pub fn parse_openrouter_key_info(text: &str) -> Result<OpenRouterKeyInfo, BalanceError> {
    Ok(unwrap_envelope(serde_json::from_str(text)?))
}

pub fn parse_requesty_key_info(text: &str) -> Result<RequestyKeyInfo, BalanceError> {
    Ok(unwrap_envelope(serde_json::from_str(text)?))
}

fn unwrap_envelope<T>(envelope: Envelope<T>) -> T {
    match envelope {
        Envelope::Wrapped { data } | Envelope::Bare(data) => data,
    }
}
