//! Report generation port trait.

use crate::domain::batch::BatchReport;
use crate::domain::error::PullbackError;
use std::path::PathBuf;

/// Port for writing batch results.
pub trait ReportPort {
    /// Write every output for `report` under the name `strategy_id`. Returns the paths
    /// written, in order.
    fn write(&self, report: &BatchReport, strategy_id: &str) -> Result<Vec<PathBuf>, PullbackError>;
}
