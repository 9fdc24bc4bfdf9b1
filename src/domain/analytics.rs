//! Per-trade analytics derived from the bars around a completed trade.

use crate::domain::bar::{round_to, spread_pct, DailyBar, EntryCheck};

pub const SLOPE_WINDOW: usize = 3;
pub const HALT_NOTE: &str = " | halt suspected";

pub fn return_pct(entry_price: f64, exit_price: f64) -> f64 {
    round_to(spread_pct(exit_price, entry_price), 2)
}

/// Highest high from trigger through entry, relative to the entry price.
pub fn pre_entry_peak_pct(
    bars: &[DailyBar],
    trigger_index: usize,
    entry_index: usize,
    entry_price: f64,
) -> f64 {
    let peak = bars[trigger_index..=entry_index]
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    round_to(spread_pct(peak, entry_price), 2)
}

/// Best high reachable before MA10 is touched, counting only bars that opened at or
/// above MA10. Zero for same-day round trips or when no bar qualifies.
///
/// The scan runs from the bar after entry to the first MA10 touch and is not bounded
/// by the exit.
pub fn max_gain_until_ma10(
    bars: &[DailyBar],
    entry_index: usize,
    exit_index: usize,
    entry_price: f64,
) -> f64 {
    if bars[exit_index].date == bars[entry_index].date {
        return 0.0;
    }

    let best = bars[entry_index + 1..]
        .iter()
        .take_while(|b| !(b.low <= b.ma10))
        .filter(|b| b.open >= b.ma10)
        .map(|b| b.high)
        .fold(None, |acc: Option<f64>, high| {
            Some(acc.map_or(high, |a| a.max(high)))
        });

    match best {
        Some(high) => round_to(spread_pct(high, entry_price), 2),
        None => 0.0,
    }
}

/// More than one motionless bar after entry through exit suggests a trading halt.
pub fn halt_suspected(bars: &[DailyBar], entry_index: usize, exit_index: usize) -> bool {
    if exit_index <= entry_index {
        return false;
    }
    bars[entry_index + 1..=exit_index]
        .iter()
        .filter(|b| b.is_flat())
        .count()
        > 1
}

/// Least-squares slope of `values` against 0, 1, 2, ...
pub fn least_squares_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 || values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, &y)| {
            let dx = i as f64 - mean_x;
            (num + dx * (y - mean_y), den + dx * dx)
        });
    Some(num / den)
}

/// Slope of a moving average over the trailing window ending at `index`.
pub fn ma_slope(bars: &[DailyBar], index: usize, ma: impl Fn(&DailyBar) -> f64) -> Option<f64> {
    if index + 1 < SLOPE_WINDOW {
        return None;
    }
    let window: Vec<f64> = bars[index + 1 - SLOPE_WINDOW..=index].iter().map(ma).collect();
    least_squares_slope(&window).map(|s| round_to(s, 4))
}

/// Return per unit of MA5/MA10 spread. Undefined when the spread is zero.
pub fn risk_to_reward(return_pct: f64, spread_ma5_10: f64) -> Option<f64> {
    if spread_ma5_10 == 0.0 || !spread_ma5_10.is_finite() {
        None
    } else {
        Some(round_to(return_pct / spread_ma5_10, 4))
    }
}

/// Return that counts only when the entry bar is flagged `Entry_Made`.
pub fn verified_return(return_pct: f64, entry_check: Option<EntryCheck>) -> f64 {
    match entry_check {
        Some(EntryCheck::EntryMade) => return_pct,
        _ => 0.0,
    }
}
