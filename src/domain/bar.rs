//! Daily bar representation.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Precomputed verdict on whether an entry at this bar would actually have filled.
///
/// Derived from Low_MA_5 (see [`crate::domain::entry_check`]). The naming follows the
/// upstream data: `Low_MA_5 < low` is labelled `No_Entry_Made`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryCheck {
    EntryMade,
    NoEntryMade,
}

impl EntryCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryCheck::EntryMade => "Entry_Made",
            EntryCheck::NoEntryMade => "No_Entry_Made",
        }
    }
}

impl fmt::Display for EntryCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Entry_Made" => Ok(EntryCheck::EntryMade),
            "No_Entry_Made" => Ok(EntryCheck::NoEntryMade),
            other => Err(format!("unknown entry check value '{other}'")),
        }
    }
}

/// One symbol's record for one trading day.
///
/// Moving averages that the data source could not yet compute (the first bars of a
/// series) are stored as `NaN` for the mandatory MAs and `None` for MA60/MA120, so any
/// comparison against them fails.
#[derive(Debug, Clone)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub traded_value: f64,
    pub pct_change: f64,
    pub ma5: f64,
    pub ma10: f64,
    pub ma20: f64,
    pub ma60: Option<f64>,
    pub ma120: Option<f64>,
    pub foreign_net_buy: Option<f64>,
    pub institution_net_buy: Option<f64>,
    pub entry_check: Option<EntryCheck>,
}

impl DailyBar {
    /// True if any of low/high/open/close trades below MA5.
    pub fn crossed_below_ma5(&self) -> bool {
        [self.low, self.high, self.open, self.close]
            .iter()
            .any(|&p| p < self.ma5)
    }

    /// MA5 > MA10 > MA20.
    pub fn is_aligned(&self) -> bool {
        self.ma5 > self.ma10 && self.ma10 > self.ma20
    }

    /// MA5 > MA10 > MA20 > MA60; `None` when MA60 is unavailable.
    pub fn is_aligned_to_ma60(&self) -> Option<bool> {
        self.ma60.map(|ma60| self.is_aligned() && self.ma20 > ma60)
    }

    /// MA5 > MA10 > MA20 > MA60 > MA120; `None` when MA60 or MA120 is unavailable.
    pub fn is_aligned_to_ma120(&self) -> Option<bool> {
        match (self.is_aligned_to_ma60(), self.ma60, self.ma120) {
            (Some(aligned), Some(ma60), Some(ma120)) => Some(aligned && ma60 > ma120),
            _ => None,
        }
    }

    /// Open, high, low and close all equal: no price movement, a likely trading halt.
    pub fn is_flat(&self) -> bool {
        self.open == self.close && self.open == self.high && self.open == self.low
    }
}

/// Percent difference of `value` over `base`.
pub fn spread_pct(value: f64, base: f64) -> f64 {
    (value - base) / base * 100.0
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
