//! Trigger scanning: the setup day that opens a search for an entry.
//!
//! A bar qualifies when every enabled threshold passes and the fixed shape rules hold:
//! - previous bar did not fall more than 10%
//! - close is at least 5% above MA5
//! - MA20 at most 4% above MA10, MA10 at most 5% above MA5
//! - open did not gap down more than 10% from the previous close
//! - no run of 3+ unchanged days among the 20 bars before the trigger

use crate::domain::bar::{round_to, spread_pct, DailyBar};
use crate::domain::params::TriggerParams;
use chrono::NaiveDate;

pub const MIN_PREV_PCT_CHANGE: f64 = -10.0;
pub const MIN_CLOSE_OVER_MA5: f64 = 1.05;
pub const MAX_MA20_OVER_MA10_PCT: f64 = 4.0;
pub const MAX_MA10_OVER_MA5_PCT: f64 = 5.0;
pub const MIN_OPEN_GAP_PCT: f64 = -10.0;
pub const FLAT_LOOKBACK: usize = 20;
pub const FLAT_RUN_LIMIT: usize = 3;

#[derive(Debug, Clone)]
pub struct TriggerEvent {
    pub index: usize,
    pub date: NaiveDate,
    pub bar: DailyBar,
    /// Highest high from the trigger until MA5 is first touched, over the prior close.
    pub intra_high_pct: f64,
}

pub fn passes_thresholds(bar: &DailyBar, params: &TriggerParams) -> bool {
    let foreign = bar.foreign_net_buy.unwrap_or(0.0);
    let institution = bar.institution_net_buy.unwrap_or(0.0);

    params.min_rate.is_none_or(|min| bar.pct_change > min)
        && params.max_rate.is_none_or(|max| bar.pct_change < max)
        && params.min_value.is_none_or(|min| bar.traded_value > min)
        && params.max_value.is_none_or(|max| bar.traded_value < max)
        && params.min_foreign.is_none_or(|min| foreign > min)
        && params.min_institution.is_none_or(|min| institution > min)
}

/// Fixed shape rules for the bar at `index` given its predecessor.
pub fn passes_shape_rules(prev: &DailyBar, bar: &DailyBar) -> bool {
    if prev.pct_change < MIN_PREV_PCT_CHANGE {
        return false;
    }
    if !(bar.close >= bar.ma5 * MIN_CLOSE_OVER_MA5) {
        return false;
    }
    if !(spread_pct(bar.ma20, bar.ma10) <= MAX_MA20_OVER_MA10_PCT) {
        return false;
    }
    if !(spread_pct(bar.ma10, bar.ma5) <= MAX_MA10_OVER_MA5_PCT) {
        return false;
    }
    spread_pct(bar.open, prev.close) >= MIN_OPEN_GAP_PCT
}

/// True if the lookback window before `index` holds 3+ consecutive zero-change days.
pub fn has_flat_run(bars: &[DailyBar], index: usize) -> bool {
    let start = index.saturating_sub(FLAT_LOOKBACK);
    let mut run = 0usize;
    for bar in &bars[start..index] {
        if bar.pct_change == 0.0 {
            run += 1;
            if run >= FLAT_RUN_LIMIT {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Max high from `index` forward, stopping after the first later bar whose low
/// touches MA5, expressed as percent over the previous close.
pub fn intra_high_pct(bars: &[DailyBar], index: usize) -> f64 {
    let prev_close = bars[index - 1].close;
    let mut max_high = bars[index].high;
    for bar in &bars[index + 1..] {
        max_high = max_high.max(bar.high);
        if bar.low <= bar.ma5 {
            break;
        }
    }
    round_to(spread_pct(max_high, prev_close), 2)
}

/// Evaluate the bar at `index` as a trigger. The first bar never qualifies.
pub fn evaluate(bars: &[DailyBar], index: usize, params: &TriggerParams) -> Option<TriggerEvent> {
    if index == 0 || index >= bars.len() {
        return None;
    }
    let bar = &bars[index];
    let prev = &bars[index - 1];

    if !passes_thresholds(bar, params) || !passes_shape_rules(prev, bar) {
        return None;
    }
    if has_flat_run(bars, index) {
        return None;
    }

    Some(TriggerEvent {
        index,
        date: bar.date,
        bar: bar.clone(),
        intra_high_pct: intra_high_pct(bars, index),
    })
}
