#![allow(dead_code)]

use chrono::NaiveDate;
use pullback::domain::bar::DailyBar;
use pullback::domain::entry::EntryRule;
use pullback::domain::error::PullbackError;
use pullback::domain::exit::Outcome;
use pullback::domain::series::{RecordSeries, SeriesSet, SkippedSymbol};
use pullback::domain::trade::TradeRecord;
use pullback::ports::data_port::{DataPort, SymbolInfo};
use std::process::ExitCode;

pub struct MockDataPort {
    pub series: Vec<RecordSeries>,
    pub skipped: Vec<SkippedSymbol>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            series: Vec::new(),
            skipped: Vec::new(),
            error: None,
        }
    }

    pub fn with_bars(mut self, code: &str, name: &str, bars: Vec<DailyBar>) -> Self {
        self.series
            .push(RecordSeries::new(code.to_string(), name.to_string(), bars).unwrap());
        self
    }

    pub fn with_skipped(mut self, code: &str, reason: &str) -> Self {
        self.skipped.push(SkippedSymbol {
            code: code.to_string(),
            reason: reason.to_string(),
        });
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_series(&self) -> Result<SeriesSet, PullbackError> {
        if let Some(reason) = &self.error {
            return Err(PullbackError::Input {
                reason: reason.clone(),
            });
        }
        Ok(SeriesSet {
            series: self.series.clone(),
            skipped: self.skipped.clone(),
        })
    }

    fn list_symbols(&self) -> Result<Vec<SymbolInfo>, PullbackError> {
        Ok(self
            .series
            .iter()
            .filter_map(|s| {
                Some(SymbolInfo {
                    code: s.code.clone(),
                    name: s.name.clone(),
                    bars: s.len(),
                    first_date: s.first_date()?,
                    last_date: s.last_date()?,
                })
            })
            .collect())
    }
}

pub fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap() + chrono::Duration::days(n)
}

/// Quiet bar around 100 with every MA at 100.
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

pub fn make_bar(n: i64, ohlc: [f64; 4], mas: [f64; 3]) -> DailyBar {
    DailyBar {
        open: ohlc[0],
        high: ohlc[1],
        low: ohlc[2],
        close: ohlc[3],
        ma5: mas[0],
        ma10: mas[1],
        ma20: mas[2],
        ..bar(n)
    }
}

/// Passes every fixed trigger rule once thresholds are off.
pub fn trigger_bar(n: i64) -> DailyBar {
    DailyBar {
        pct_change: 12.0,
        traded_value: 2.0e10,
        ..make_bar(n, [100.0, 111.0, 100.0, 110.0], [100.0, 98.0, 97.0])
    }
}

/// Trigger on day 1, entry at the day-3 open of 100 with target 105, MA10 exit at 102 on
/// day 5.
pub fn worked_example() -> Vec<DailyBar> {
    vec![
        bar(0),
        trigger_bar(1),
        make_bar(2, [110.0, 114.0, 108.0, 113.0], [104.0, 99.0, 97.0]),
        make_bar(3, [100.0, 102.0, 99.5, 101.0], [103.95, 99.0, 95.0]),
        make_bar(4, [101.0, 103.0, 100.5, 102.0], [104.0, 100.0, 96.0]),
        make_bar(5, [103.0, 104.0, 101.0, 101.5], [104.0, 102.0, 97.0]),
    ]
}

/// The worked example shifted by `offset` days.
pub fn worked_example_at(offset: i64) -> Vec<DailyBar> {
    worked_example()
        .into_iter()
        .map(|b| DailyBar {
            date: b.date + chrono::Duration::days(offset),
            ..b
        })
        .collect()
}

pub const CSV_HEADER: &str =
    "date,code,name,open,high,low,close,traded_value,pct_change,ma5,ma10,ma20";

/// Render bars in the input file layout.
pub fn bars_to_csv(code: &str, name: &str, bars: &[DailyBar]) -> String {
    bars.iter()
        .map(|b| {
            format!(
                "{},{},{},{},{},{},{},{},{},{},{},{}\n",
                b.date,
                code,
                name,
                b.open,
                b.high,
                b.low,
                b.close,
                b.traded_value,
                b.pct_change,
                b.ma5,
                b.ma10,
                b.ma20
            )
        })
        .collect()
}

pub fn make_trade(code: &str, entry: NaiveDate, exit: NaiveDate, return_pct: f64) -> TradeRecord {
    TradeRecord {
        code: code.to_string(),
        name: code.to_string(),
        theme: None,
        entry_id: format!("{code}_EN1"),
        exit_id: format!("{code}_EX1"),
        trigger_date: entry - chrono::Duration::days(1),
        trigger_close: 110.0,
        trigger_pct_change: 12.0,
        trigger_traded_value: 2.0e10,
        trigger_intra_high_pct: 11.0,
        foreign_net_buy: None,
        institution_net_buy: None,
        entry_date: entry,
        entry_price: 100.0,
        entry_rule: EntryRule::Ma5Overlap,
        exit_date: exit,
        exit_price: 100.0 + return_pct,
        target_price: 105.0,
        outcome: if return_pct > 0.0 {
            Outcome::Win
        } else {
            Outcome::Loss
        },
        note: String::new(),
        return_pct,
        days_to_entry: 1,
        days_held: (exit - entry).num_days() as usize,
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

/// `ExitCode` has no `PartialEq`; compare the debug rendering instead.
pub fn same_exit(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}
