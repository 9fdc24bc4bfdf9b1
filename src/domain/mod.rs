//! Core domain types and logic.

pub mod error;
pub mod bar;
pub mod series;
pub mod params;
pub mod trigger;
pub mod entry;
pub mod exit;
pub mod analytics;
pub mod entry_check;
pub mod trade;
pub mod simulator;
pub mod batch;
pub mod summary;
pub mod config_validation;

#[cfg(test)]
pub(crate) mod testkit;
