//! Configuration loading and defaults for apireq.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_COST_DECIMALS: usize = 4;
const MAX_COST_DECIMALS: usize = 10;

// === Types ===

/// Resolved CLI configuration, including defaults and environment overrides.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Digits after the decimal point when printing cost totals.
    pub cost_decimals: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(flatten)]
    base: Config,
    profiles: Option<HashMap<String, Config>>,
}

// === Config Loading ===

impl Config {
    /// Load configuration from disk and merge with environment overrides.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load(path: Option<PathBuf>, profile: Option<&str>) -> Result<Self> {
        let path = path.or_else(default_config_path);
        let mut config = match path.as_ref() {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                let parsed: ConfigFile = toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
                apply_profile(parsed, profile)?
            }
            _ => apply_profile(ConfigFile::default(), profile)?,
        };

        apply_env_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges.
    pub fn validate(&self) -> Result<()> {
        if let Some(decimals) = self.cost_decimals
            && decimals > MAX_COST_DECIMALS
        {
            anyhow::bail!("cost_decimals must be at most {MAX_COST_DECIMALS}, got {decimals}");
        }
        Ok(())
    }

    #[must_use]
    pub fn pretty(&self) -> bool {
        self.pretty.unwrap_or(false)
    }

    #[must_use]
    pub fn cost_decimals(&self) -> usize {
        self.cost_decimals.unwrap_or(DEFAULT_COST_DECIMALS)
    }
}

// === Defaults ===

fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("APIREQ_CONFIG_PATH")
        && !path.trim().is_empty()
    {
        return Some(expand_path(&path));
    }
    dirs::home_dir().map(|home| home.join(".apireq").join("config.toml"))
}

fn expand_path(path: &str) -> PathBuf {
    let expanded = shellexpand::tilde(path);
    PathBuf::from(expanded.as_ref())
}

// === Environment Overrides ===

fn apply_env_overrides(config: &mut Config) {
    if let Ok(value) = std::env::var("APIREQ_PRETTY") {
        config.pretty = Some(value == "1" || value.eq_ignore_ascii_case("true"));
    }
    if let Ok(value) = std::env::var("APIREQ_COST_DECIMALS")
        && let Ok(parsed) = value.trim().parse::<usize>()
    {
        config.cost_decimals = Some(parsed);
    }
}

fn apply_profile(config: ConfigFile, profile: Option<&str>) -> Result<Config> {
    let Some(profile_name) = profile else {
        return Ok(config.base);
    };
    let profiles = config.profiles.as_ref();
    match profiles.and_then(|profiles| profiles.get(profile_name)) {
        Some(override_cfg) => Ok(merge_config(config.base, override_cfg.clone())),
        None => {
            let available = profiles
                .map(|profiles| {
                    let mut keys = profiles.keys().cloned().collect::<Vec<_>>();
                    keys.sort();
                    if keys.is_empty() {
                        "none".to_string()
                    } else {
                        keys.join(", ")
                    }
                })
                .unwrap_or_else(|| "none".to_string());
            anyhow::bail!("Profile '{profile_name}' not found. Available profiles: {available}")
        }
    }
}

fn merge_config(base: Config, override_cfg: Config) -> Config {
    Config {
        pretty: override_cfg.pretty.or(base.pretty),
        cost_decimals: override_cfg.cost_decimals.or(base.cost_decimals),
    }
}

/// Resolve the path `load` would read when no explicit path is given.
#[must_use]
pub fn resolved_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(default_config_path)
}
