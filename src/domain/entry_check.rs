//! Entry-check derivation from Low_MA_5.
//!
//! Low_MA_5 replaces today's close with today's low in a 5-day close average:
//! (close[d-4] + close[d-3] + close[d-2] + close[d-1] + low[d]) / 5.
//! A bar is labelled `No_Entry_Made` when Low_MA_5 < low, `Entry_Made` otherwise.

use crate::domain::bar::{DailyBar, EntryCheck};

const LOOKBACK: usize = 4;

pub fn low_ma5(bars: &[DailyBar], index: usize) -> Option<f64> {
    if index < LOOKBACK {
        return None;
    }
    let prev_closes: f64 = bars[index - LOOKBACK..index].iter().map(|b| b.close).sum();
    let value = (prev_closes + bars[index].low) / 5.0;
    value.is_finite().then_some(value)
}

pub fn classify(low_ma5: f64, low: f64) -> EntryCheck {
    if low_ma5 < low {
        EntryCheck::NoEntryMade
    } else {
        EntryCheck::EntryMade
    }
}

/// Fill in `entry_check` on bars that lack one. Returns the number of bars filled.
pub fn derive_missing(bars: &mut [DailyBar]) -> usize {
    let mut filled = 0;
    for index in LOOKBACK..bars.len() {
        if bars[index].entry_check.is_some() {
            continue;
        }
        if let Some(value) = low_ma5(bars, index) {
            bars[index].entry_check = Some(classify(value, bars[index].low));
            filled += 1;
        }
    }
    filled
}
