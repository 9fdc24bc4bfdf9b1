//! Bar and trade builders shared by the domain unit tests.

use crate::domain::bar::DailyBar;
use crate::domain::entry::EntryRule;
use crate::domain::exit::Outcome;
use crate::domain::trade::TradeRecord;
use chrono::NaiveDate;

pub fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(n)
}

/// A quiet bar: trades 99..101 around a close of 100 with every MA at 100.
pub fn bar(n: i64) -> DailyBar {
    DailyBar {
        date: day(n),
        open: 100.0,
        high: 101.0,
        low: 99.0,
        close: 100.0,
        traded_value: 0.0,
        pct_change: 1.0,
        ma5: 100.0,
        ma10: 100.0,
        ma20: 100.0,
        ma60: None,
        ma120: None,
        foreign_net_buy: None,
        institution_net_buy: None,
        entry_check: None,
    }
}

pub fn ohlc(n: i64, open: f64, high: f64, low: f64, close: f64) -> DailyBar {
    DailyBar {
        open,
        high,
        low,
        close,
        ..bar(n)
    }
}

pub fn with_mas(mut b: DailyBar, ma5: f64, ma10: f64, ma20: f64) -> DailyBar {
    b.ma5 = ma5;
    b.ma10 = ma10;
    b.ma20 = ma20;
    b
}

/// A bar that satisfies every fixed trigger rule under unfiltered thresholds:
/// close 110 against MA5 100, MA10 98, MA20 97.
pub fn trigger_bar(n: i64) -> DailyBar {
    DailyBar {
        pct_change: 12.0,
        traded_value: 2.0e10,
        ..with_mas(ohlc(n, 100.0, 111.0, 100.0, 110.0), 100.0, 98.0, 97.0)
    }
}

/// A closed trade with neutral analytics; override fields with struct update syntax.
pub fn trade(code: &str, entry: i64, exit: i64, return_pct: f64) -> TradeRecord {
    TradeRecord {
        code: code.to_string(),
        name: code.to_string(),
        theme: None,
        entry_id: format!("{code}_EN1"),
        exit_id: format!("{code}_EX1"),
        trigger_date: day(entry - 1),
        trigger_close: 110.0,
        trigger_pct_change: 12.0,
        trigger_traded_value: 2.0e10,
        trigger_intra_high_pct: 11.0,
        foreign_net_buy: None,
        institution_net_buy: None,
        entry_date: day(entry),
        entry_price: 100.0,
        entry_rule: EntryRule::Ma5Overlap,
        exit_date: day(exit),
        exit_price: 100.0 + return_pct,
        target_price: 105.0,
        outcome: if return_pct > 0.0 { Outcome::Win } else { Outcome::Loss },
        note: String::new(),
        return_pct,
        days_to_entry: 1,
        days_held: (exit - entry) as usize,
        pre_entry_peak_pct: 0.0,
        max_gain_pct: 0.0,
        max_drawdown: 0.0,
        spread_ma5_10: 5.0,
        spread_ma5_20: 8.0,
        aligned_ma60: None,
        aligned_ma120: None,
        slope_ma5: None,
        slope_ma10: None,
        slope_ma20: None,
        risk_to_reward: Some(return_pct / 5.0),
        entry_check: None,
        verified_return: 0.0,
        min_rate: None,
        max_rate: None,
        min_value: None,
        max_value: None,
        min_foreign: None,
        min_institution: None,
    }
}
