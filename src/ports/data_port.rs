//! Data access port trait.

use crate::domain::error::PullbackError;
use crate::domain::params::ManualTrigger;
use crate::domain::series::SeriesSet;
use chrono::NaiveDate;

/// Summary of one symbol's data without loading every bar into the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInfo {
    pub code: String,
    pub name: String,
    pub bars: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

pub trait DataPort {
    /// Load every symbol. A missing mandatory column is an error; a symbol whose rows
    /// fail to parse is reported in [`SeriesSet::skipped`] instead.
    fn load_series(&self) -> Result<SeriesSet, PullbackError>;

    fn list_symbols(&self) -> Result<Vec<SymbolInfo>, PullbackError>;
}

/// Source of the manual trigger list.
pub trait TriggerListPort {
    fn load_triggers(&self) -> Result<Vec<ManualTrigger>, PullbackError>;
}
