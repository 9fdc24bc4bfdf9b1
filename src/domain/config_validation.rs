//! Configuration validation.
//!
//! Turns raw config values into typed run settings, rejecting anything malformed
//! before a run starts.

use crate::domain::error::PullbackError;
use crate::domain::params::{
    TriggerParams, DEFAULT_MIN_FOREIGN, DEFAULT_MIN_INSTITUTION, DEFAULT_MIN_RATE,
    DEFAULT_MIN_VALUE,
};
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const TRIGGER_SECTION: &str = "trigger";
pub const RUN_SECTION: &str = "run";
pub const DEFAULT_STRATEGY_ID: &str = "ma5_support";
pub const DEFAULT_OUTPUT_DIR: &str = "results";

/// Values that switch a threshold off.
const DISABLED: [&str; 3] = ["", "off", "none"];

/// Settings from the `[run]` section plus the parsed trigger thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub strategy_id: String,
    pub input: Option<PathBuf>,
    pub manual_triggers: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub derive_entry_check: bool,
    pub trigger: TriggerParams,
}

pub fn load_run_config(config: &dyn ConfigPort) -> Result<RunConfig, PullbackError> {
    let strategy_id = config
        .get_string(RUN_SECTION, "strategy_id")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| DEFAULT_STRATEGY_ID.to_string());
    validate_strategy_id(&strategy_id)?;

    let path = |key: &str| {
        config
            .get_string(RUN_SECTION, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    };

    Ok(RunConfig {
        strategy_id,
        input: path("input"),
        manual_triggers: path("manual_triggers"),
        output_dir: path("output_dir").unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        derive_entry_check: config.get_bool(RUN_SECTION, "derive_entry_check", false),
        trigger: load_trigger_params(config)?,
    })
}

pub fn load_trigger_params(config: &dyn ConfigPort) -> Result<TriggerParams, PullbackError> {
    let params = TriggerParams {
        min_rate: threshold(config, "min_rate", Some(DEFAULT_MIN_RATE))?,
        max_rate: threshold(config, "max_rate", None)?,
        min_value: threshold(config, "min_value", Some(DEFAULT_MIN_VALUE))?,
        max_value: threshold(config, "max_value", None)?,
        min_foreign: threshold(config, "min_foreign", Some(DEFAULT_MIN_FOREIGN))?,
        min_institution: threshold(config, "min_institution", Some(DEFAULT_MIN_INSTITUTION))?,
    };
    check_range(params.min_rate, params.max_rate, "max_rate")?;
    check_range(params.min_value, params.max_value, "max_value")?;
    Ok(params)
}

/// Absent key: `default`. `off`, `none` or an empty value: disabled.
fn threshold(
    config: &dyn ConfigPort,
    key: &str,
    default: Option<f64>,
) -> Result<Option<f64>, PullbackError> {
    let Some(raw) = config.get_string(TRIGGER_SECTION, key) else {
        return Ok(default);
    };
    let value = raw.trim();
    if DISABLED.contains(&value.to_lowercase().as_str()) {
        return Ok(None);
    }
    let parsed: f64 = value
        .replace('_', "")
        .parse()
        .map_err(|_| invalid(key, format!("expected a number or 'off', got '{value}'")))?;
    if !parsed.is_finite() {
        return Err(invalid(key, format!("{key} must be finite")));
    }
    Ok(Some(parsed))
}

fn check_range(min: Option<f64>, max: Option<f64>, max_key: &str) -> Result<(), PullbackError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(invalid(
            max_key,
            format!("{max_key} ({max}) is below its minimum ({min})"),
        )),
        _ => Ok(()),
    }
}

pub fn validate_strategy_id(id: &str) -> Result<(), PullbackError> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(())
    } else {
        Err(PullbackError::ConfigInvalid {
            section: RUN_SECTION.to_string(),
            key: "strategy_id".to_string(),
            reason: format!("'{id}' must be non-empty and use only letters, digits, '_', '-', '.'"),
        })
    }
}

fn invalid(key: &str, reason: String) -> PullbackError {
    PullbackError::ConfigInvalid {
        section: TRIGGER_SECTION.to_string(),
        key: key.to_string(),
        reason,
    }
}
