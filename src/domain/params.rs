//! Trigger thresholds and run parameters.

use chrono::NaiveDate;

pub const DEFAULT_MIN_RATE: f64 = 10.0;
pub const DEFAULT_MIN_VALUE: f64 = 10_000_000_000.0;
pub const DEFAULT_MIN_FOREIGN: f64 = 0.0;
pub const DEFAULT_MIN_INSTITUTION: f64 = 0.0;

/// Threshold filters applied to a candidate trigger bar. `None` disables a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerParams {
    pub min_rate: Option<f64>,
    pub max_rate: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_foreign: Option<f64>,
    pub min_institution: Option<f64>,
}

impl Default for TriggerParams {
    fn default() -> Self {
        TriggerParams {
            min_rate: Some(DEFAULT_MIN_RATE),
            max_rate: None,
            min_value: Some(DEFAULT_MIN_VALUE),
            max_value: None,
            min_foreign: Some(DEFAULT_MIN_FOREIGN),
            min_institution: Some(DEFAULT_MIN_INSTITUTION),
        }
    }
}

impl TriggerParams {
    /// Every filter disabled.
    pub fn unfiltered() -> Self {
        TriggerParams {
            min_rate: None,
            max_rate: None,
            min_value: None,
            max_value: None,
            min_foreign: None,
            min_institution: None,
        }
    }
}

/// One row of the manual trigger list.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualTrigger {
    pub name: String,
    pub date: NaiveDate,
    pub theme: Option<String>,
}

/// Everything the batch entry point needs besides the data itself.
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub trigger: TriggerParams,
    /// When present the batch runs in manual mode, one pass per listed trigger.
    pub manual_triggers: Option<Vec<ManualTrigger>>,
    /// Fill missing entry checks from Low_MA_5 before scanning.
    pub derive_entry_check: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds() {
        let p = TriggerParams::default();
        assert_eq!(p.min_rate, Some(10.0));
        assert_eq!(p.max_rate, None);
        assert_eq!(p.min_value, Some(10_000_000_000.0));
        assert_eq!(p.max_value, None);
        assert_eq!(p.min_foreign, Some(0.0));
        assert_eq!(p.min_institution, Some(0.0));
    }

    #[test]
    fn unfiltered_disables_everything() {
        let p = TriggerParams::unfiltered();
        assert!(p.min_rate.is_none());
        assert!(p.min_value.is_none());
        assert!(p.min_foreign.is_none());
        assert!(p.min_institution.is_none());
    }

    #[test]
    fn run_params_default_is_auto_mode() {
        let p = RunParams::default();
        assert!(p.manual_triggers.is_none());
        assert!(!p.derive_entry_check);
        assert_eq!(p.trigger, TriggerParams::default());
    }
}
