//! Exit resolution: target (MA5/MA10 spread projected from entry) versus MA10 stop.

use crate::domain::bar::{round_to, DailyBar};
use crate::domain::entry::EntryEvent;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => f.write_str("win"),
            Outcome::Loss => f.write_str("loss"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitEvent {
    pub index: usize,
    pub date: NaiveDate,
    pub price: f64,
    pub target_price: f64,
    pub outcome: Outcome,
    pub note: String,
    /// Worst low against the entry price while held, in percent (<= 0).
    pub max_drawdown: f64,
}

/// entry * (1 + (MA5 - MA10) / MA10), rounded to 2 decimals.
pub fn target_price(entry_price: f64, ma5: f64, ma10: f64) -> f64 {
    round_to(entry_price * (1.0 + (ma5 - ma10) / ma10), 2)
}

/// Stop fill: the open when the bar gapped below MA10, else MA10 itself.
fn stop_fill(bar: &DailyBar) -> (f64, bool) {
    if bar.open < bar.ma10 {
        (bar.open, true)
    } else {
        (bar.ma10, false)
    }
}

/// Walk forward from the entry bar until the target or MA10 is hit.
///
/// When both are hit on the same bar the MA10 stop wins. A target-only hit on the
/// entry bar itself is ignored.
pub fn resolve(bars: &[DailyBar], entry: &EntryEvent) -> Option<ExitEvent> {
    let entry_bar = bars.get(entry.index)?;
    let target = target_price(entry.price, entry_bar.ma5, entry_bar.ma10);
    let mut max_drawdown = 0.0_f64;

    for (index, bar) in bars.iter().enumerate().skip(entry.index) {
        let drawdown = (bar.low - entry.price) / entry.price * 100.0;
        max_drawdown = max_drawdown.min(drawdown);

        let hit_target = bar.high >= target;
        let hit_ma10 = bar.low <= bar.ma10 || bar.open < bar.ma10;

        let (price, outcome, note) = match (hit_target, hit_ma10) {
            (true, true) => {
                let (price, gapped) = stop_fill(bar);
                let note = if gapped {
                    "both hit, gapped below MA10, exited at open"
                } else {
                    "both hit, MA10 breached intraday, exited at MA10"
                };
                (price, Outcome::Loss, note)
            }
            (true, false) if index == entry.index => continue,
            (true, false) => (target, Outcome::Win, "target hit first"),
            (false, true) => {
                let (price, gapped) = stop_fill(bar);
                let note = if gapped {
                    "gapped below MA10, exited at open"
                } else {
                    "MA10 breached intraday, exited at MA10"
                };
                (price, Outcome::Loss, note)
            }
            (false, false) => continue,
        };

        return Some(ExitEvent {
            index,
            date: bar.date,
            price,
            target_price: target,
            outcome,
            note: note.to_string(),
            max_drawdown: round_to(max_drawdown, 2),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::EntryRule;
    use crate::domain::testkit::*;

    // Entry bar: MA5 102.9, MA10 98 -> 5% spread, target 105 from an entry at 100.
    fn entry_bar(n: i64) -> DailyBar {
        with_mas(ohlc(n, 100.0, 103.0, 100.0, 102.0), 102.9, 98.0, 95.0)
    }

    fn held(n: i64, open: f64, high: f64, low: f64, close: f64, ma10: f64) -> DailyBar {
        with_mas(ohlc(n, open, high, low, close), 105.0, ma10, 95.0)
    }

    fn entry_at(bars: &[DailyBar], index: usize, price: f64) -> EntryEvent {
        EntryEvent {
            index,
            date: bars[index].date,
            price,
            rule: EntryRule::GapDown,
        }
    }

    #[test]
    fn target_price_from_spread() {
        assert_eq!(target_price(100.0, 105.0, 100.0), 105.0);
        assert_eq!(target_price(98.765, 103.0, 100.0), 101.73);
    }

    #[test]
    fn target_hit_later_is_a_win() {
        let bars = vec![
            entry_bar(0),
            held(1, 102.0, 104.0, 101.0, 103.0, 100.5),
            held(2, 103.0, 106.0, 102.0, 105.5, 101.0),
        ];
        let exit = resolve(&bars, &entry_at(&bars, 0, 100.0)).unwrap();
        assert_eq!(exit.index, 2);
        assert_eq!(exit.outcome, Outcome::Win);
        assert_eq!(exit.price, 105.0);
        assert_eq!(exit.target_price, 105.0);
        assert_eq!(exit.note, "target hit first");
        assert_eq!(exit.max_drawdown, 0.0);
    }

    #[test]
    fn same_day_target_is_ignored() {
        let bars = vec![
            with_mas(ohlc(0, 100.0, 106.0, 100.5, 105.0), 105.0, 100.0, 95.0),
            held(1, 101.0, 102.0, 99.0, 99.5, 100.0),
        ];
        let exit = resolve(&bars, &entry_at(&bars, 0, 100.5)).unwrap();
        assert_eq!(exit.index, 1);
        assert_eq!(exit.outcome, Outcome::Loss);
    }

    #[test]
    fn same_day_stop_is_allowed() {
        let bars = vec![with_mas(
            ohlc(0, 101.0, 102.0, 99.0, 100.0),
            105.0,
            100.0,
            95.0,
        )];
        let exit = resolve(&bars, &entry_at(&bars, 0, 101.0)).unwrap();
        assert_eq!(exit.index, 0);
        assert_eq!(exit.outcome, Outcome::Loss);
        assert_eq!(exit.price, 100.0);
    }

    #[test]
    fn both_hit_resolves_to_loss_at_ma10() {
        let bars = vec![
            entry_bar(0),
            held(1, 102.0, 107.0, 100.5, 103.0, 101.0),
        ];
        let exit = resolve(&bars, &entry_at(&bars, 0, 100.0)).unwrap();
        assert_eq!(exit.outcome, Outcome::Loss);
        assert_eq!(exit.price, 101.0);
        assert!(exit.note.starts_with("both hit"));
    }

    #[test]
    fn both_hit_with_gap_exits_at_open() {
        let bars = vec![
            entry_bar(0),
            held(1, 100.5, 107.0, 99.0, 103.0, 101.0),
        ];
        let exit = resolve(&bars, &entry_at(&bars, 0, 100.0)).unwrap();
        assert_eq!(exit.outcome, Outcome::Loss);
        assert_eq!(exit.price, 100.5);
        assert_eq!(exit.note, "both hit, gapped below MA10, exited at open");
    }

    #[test]
    fn ma10_breach_intraday_exits_at_ma10() {
        let bars = vec![
            entry_bar(0),
            held(1, 103.0, 104.0, 101.5, 103.0, 100.5),
            held(2, 103.0, 103.5, 101.0, 101.5, 102.0),
        ];
        let exit = resolve(&bars, &entry_at(&bars, 0, 100.0)).unwrap();
        assert_eq!(exit.index, 2);
        assert_eq!(exit.price, 102.0);
        assert_eq!(exit.outcome, Outcome::Loss);
        assert_eq!(exit.note, "MA10 breached intraday, exited at MA10");
    }

    #[test]
    fn gap_below_ma10_exits_at_open() {
        let bars = vec![
            entry_bar(0),
            held(1, 98.0, 99.0, 96.0, 97.0, 100.5),
        ];
        let exit = resolve(&bars, &entry_at(&bars, 0, 100.0)).unwrap();
        assert_eq!(exit.price, 98.0);
        assert_eq!(exit.note, "gapped below MA10, exited at open");
        assert_eq!(exit.max_drawdown, -4.0);
    }

    #[test]
    fn drawdown_tracks_worst_low() {
        let bars = vec![
            entry_bar(0),
            held(1, 100.5, 101.0, 98.5, 100.0, 98.0),
            held(2, 100.0, 101.0, 99.0, 100.5, 98.0),
            held(3, 101.0, 105.0, 100.0, 104.0, 98.5),
        ];
        let exit = resolve(&bars, &entry_at(&bars, 0, 100.0)).unwrap();
        assert_eq!(exit.outcome, Outcome::Win);
        assert_eq!(exit.max_drawdown, -1.5);
    }

    #[test]
    fn no_hit_means_no_exit() {
        let bars = vec![
            entry_bar(0),
            held(1, 102.0, 104.0, 101.0, 103.0, 100.5),
        ];
        assert!(resolve(&bars, &entry_at(&bars, 0, 100.0)).is_none());
    }
}
