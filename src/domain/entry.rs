//! Entry resolution: the first pullback into MA5 after a trigger.

use crate::domain::bar::{spread_pct, DailyBar};
use crate::domain::trigger::TriggerEvent;
use chrono::NaiveDate;
use std::fmt;

/// Minimum MA5-over-MA10 spread (%) on the entry bar.
pub const MIN_ENTRY_SPREAD_PCT: f64 = 3.0;

/// How the entry price was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRule {
    /// Opened below MA5 (but above MA10): fill at the open.
    GapDown,
    /// The bar's range contains MA5: fill at MA5.
    Ma5Overlap,
    /// Neither case applies: fill at the open.
    FallbackOpen,
}

impl fmt::Display for EntryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryRule::GapDown => "open",
            EntryRule::Ma5Overlap => "ma5",
            EntryRule::FallbackOpen => "fallback_open",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryEvent {
    pub index: usize,
    pub date: NaiveDate,
    pub price: f64,
    pub rule: EntryRule,
}

/// Decide the entry on the first bar that crossed below MA5.
/// Returns `None` when that bar disqualifies the trigger.
pub fn price_candidate(bar: &DailyBar) -> Option<(f64, EntryRule)> {
    if bar.open < bar.ma10 {
        return None;
    }

    let (price, rule) = if bar.open < bar.ma5 {
        (bar.open, EntryRule::GapDown)
    } else if bar.low <= bar.ma5 && bar.ma5 <= bar.high {
        (bar.ma5, EntryRule::Ma5Overlap)
    } else {
        (bar.open, EntryRule::FallbackOpen)
    };

    if spread_pct(bar.ma5, bar.ma10) < MIN_ENTRY_SPREAD_PCT || !bar.is_aligned() {
        return None;
    }
    Some((price, rule))
}

/// Scan forward from the trigger. Only the first MA5 cross-down is considered;
/// if it fails the checks, the trigger is abandoned.
pub fn resolve(bars: &[DailyBar], trigger: &TriggerEvent) -> Option<EntryEvent> {
    let start = trigger.index + 1;
    let offset = bars.get(start..)?.iter().position(DailyBar::crossed_below_ma5)?;
    let index = start + offset;
    let bar = &bars[index];

    let (price, rule) = price_candidate(bar)?;
    Some(EntryEvent {
        index,
        date: bar.date,
        price,
        rule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testkit::*;

    fn trigger_at(bars: &[DailyBar], index: usize) -> TriggerEvent {
        TriggerEvent {
            index,
            date: bars[index].date,
            bar: bars[index].clone(),
            intra_high_pct: 0.0,
        }
    }

    // MA5 104, MA10 100, MA20 95: 4% spread, aligned.
    fn pullback(n: i64, open: f64, high: f64, low: f64, close: f64) -> DailyBar {
        with_mas(ohlc(n, open, high, low, close), 104.0, 100.0, 95.0)
    }

    #[test]
    fn overlap_enters_at_ma5() {
        let bars = vec![
            bar(0),
            trigger_bar(1),
            pullback(2, 106.0, 107.0, 103.0, 105.0),
        ];
        let entry = resolve(&bars, &trigger_at(&bars, 1)).unwrap();
        assert_eq!(entry.index, 2);
        assert_eq!(entry.price, 104.0);
        assert_eq!(entry.rule, EntryRule::Ma5Overlap);
    }

    #[test]
    fn gap_down_enters_at_open() {
        let bars = vec![
            bar(0),
            trigger_bar(1),
            pullback(2, 102.0, 103.0, 101.0, 102.5),
        ];
        let entry = resolve(&bars, &trigger_at(&bars, 1)).unwrap();
        assert_eq!(entry.price, 102.0);
        assert_eq!(entry.rule, EntryRule::GapDown);
    }

    #[test]
    fn fallback_enters_at_open() {
        // only the close prints below MA5; the recorded range misses it
        let b = pullback(2, 105.0, 106.0, 104.5, 103.0);
        assert_eq!(price_candidate(&b), Some((105.0, EntryRule::FallbackOpen)));
    }

    #[test]
    fn open_below_ma10_abandons() {
        let bars = vec![
            bar(0),
            trigger_bar(1),
            pullback(2, 99.0, 101.0, 98.0, 100.0),
            pullback(3, 106.0, 107.0, 103.0, 105.0),
        ];
        assert!(resolve(&bars, &trigger_at(&bars, 1)).is_none());
    }

    #[test]
    fn narrow_spread_abandons() {
        // MA5 102, MA10 100: 2% spread
        let b = with_mas(ohlc(2, 103.0, 104.0, 101.0, 103.0), 102.0, 100.0, 95.0);
        assert!(price_candidate(&b).is_none());
    }

    #[test]
    fn misaligned_averages_abandon() {
        let b = with_mas(ohlc(2, 106.0, 107.0, 103.0, 105.0), 104.0, 100.0, 101.0);
        assert!(price_candidate(&b).is_none());
    }

    #[test]
    fn skips_bars_above_ma5() {
        let bars = vec![
            bar(0),
            trigger_bar(1),
            pullback(2, 110.0, 112.0, 108.0, 111.0),
            pullback(3, 109.0, 110.0, 105.0, 106.0),
            pullback(4, 106.0, 107.0, 103.0, 105.0),
        ];
        let entry = resolve(&bars, &trigger_at(&bars, 1)).unwrap();
        assert_eq!(entry.index, 4);
        assert_eq!(entry.date, day(4));
    }

    #[test]
    fn no_cross_down_means_no_entry() {
        let bars = vec![
            bar(0),
            trigger_bar(1),
            pullback(2, 110.0, 112.0, 108.0, 111.0),
        ];
        assert!(resolve(&bars, &trigger_at(&bars, 1)).is_none());
    }

    #[test]
    fn trigger_on_last_bar_has_no_entry() {
        let bars = vec![bar(0), trigger_bar(1)];
        assert!(resolve(&bars, &trigger_at(&bars, 1)).is_none());
    }
}
