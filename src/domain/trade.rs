//! Trade records: one row per completed trigger/entry/exit.

use crate::domain::analytics;
use crate::domain::bar::{round_to, spread_pct, DailyBar, EntryCheck};
use crate::domain::entry::{EntryEvent, EntryRule};
use crate::domain::exit::{ExitEvent, Outcome};
use crate::domain::params::TriggerParams;
use crate::domain::trigger::TriggerEvent;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub code: String,
    pub name: String,
    pub theme: Option<String>,
    pub entry_id: String,
    pub exit_id: String,

    pub trigger_date: NaiveDate,
    pub trigger_close: f64,
    pub trigger_pct_change: f64,
    pub trigger_traded_value: f64,
    pub trigger_intra_high_pct: f64,
    pub foreign_net_buy: Option<f64>,
    pub institution_net_buy: Option<f64>,

    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub entry_rule: EntryRule,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub target_price: f64,
    pub outcome: Outcome,
    pub note: String,

    pub return_pct: f64,
    pub days_to_entry: usize,
    pub days_held: usize,
    pub pre_entry_peak_pct: f64,
    pub max_gain_pct: f64,
    pub max_drawdown: f64,
    pub spread_ma5_10: f64,
    pub spread_ma5_20: f64,
    pub aligned_ma60: Option<bool>,
    pub aligned_ma120: Option<bool>,
    pub slope_ma5: Option<f64>,
    pub slope_ma10: Option<f64>,
    pub slope_ma20: Option<f64>,
    pub risk_to_reward: Option<f64>,
    pub entry_check: Option<EntryCheck>,
    /// Filled in by the batch once every symbol has been simulated.
    pub verified_return: f64,

    pub min_rate: Option<f64>,
    pub max_rate: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_foreign: Option<f64>,
    pub min_institution: Option<f64>,
}

/// Symbol identity stamped onto every record of one pass.
#[derive(Debug, Clone, Copy)]
pub struct Stamp<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub theme: Option<&'a str>,
    pub params: &'a TriggerParams,
}

impl TradeRecord {
    /// Assemble the record for the `seq`-th trade (1-based) of a symbol.
    pub fn assemble(
        bars: &[DailyBar],
        stamp: Stamp<'_>,
        seq: usize,
        trigger: &TriggerEvent,
        entry: &EntryEvent,
        exit: &ExitEvent,
    ) -> Self {
        let entry_bar = &bars[entry.index];
        let return_pct = analytics::return_pct(entry.price, exit.price);
        let spread_ma5_10 = round_to(spread_pct(entry_bar.ma5, entry_bar.ma10), 2);

        let mut note = exit.note.clone();
        if analytics::halt_suspected(bars, entry.index, exit.index) {
            note.push_str(analytics::HALT_NOTE);
        }

        let params = stamp.params;
        TradeRecord {
            code: stamp.code.to_string(),
            name: stamp.name.to_string(),
            theme: stamp.theme.map(str::to_string),
            entry_id: format!("{}_EN{seq}", stamp.code),
            exit_id: format!("{}_EX{seq}", stamp.code),

            trigger_date: trigger.date,
            trigger_close: trigger.bar.close,
            trigger_pct_change: trigger.bar.pct_change,
            trigger_traded_value: trigger.bar.traded_value,
            trigger_intra_high_pct: trigger.intra_high_pct,
            foreign_net_buy: trigger.bar.foreign_net_buy,
            institution_net_buy: trigger.bar.institution_net_buy,

            entry_date: entry.date,
            entry_price: entry.price,
            entry_rule: entry.rule,
            exit_date: exit.date,
            exit_price: exit.price,
            target_price: exit.target_price,
            outcome: exit.outcome,
            note,

            return_pct,
            days_to_entry: entry.index - trigger.index,
            days_held: exit.index - entry.index,
            pre_entry_peak_pct: analytics::pre_entry_peak_pct(
                bars,
                trigger.index,
                entry.index,
                entry.price,
            ),
            max_gain_pct: analytics::max_gain_until_ma10(bars, entry.index, exit.index, entry.price),
            max_drawdown: exit.max_drawdown,
            spread_ma5_10,
            spread_ma5_20: round_to(spread_pct(entry_bar.ma5, entry_bar.ma20), 2),
            aligned_ma60: entry_bar.is_aligned_to_ma60(),
            aligned_ma120: entry_bar.is_aligned_to_ma120(),
            slope_ma5: analytics::ma_slope(bars, entry.index, |b| b.ma5),
            slope_ma10: analytics::ma_slope(bars, entry.index, |b| b.ma10),
            slope_ma20: analytics::ma_slope(bars, entry.index, |b| b.ma20),
            risk_to_reward: analytics::risk_to_reward(return_pct, spread_ma5_10),
            entry_check: entry_bar.entry_check,
            verified_return: 0.0,

            min_rate: params.min_rate,
            max_rate: params.max_rate,
            min_value: params.min_value,
            max_value: params.max_value,
            min_foreign: params.min_foreign,
            min_institution: params.min_institution,
        }
    }

    pub fn is_win(&self) -> bool {
        self.outcome == Outcome::Win
    }

    /// Whether `date` falls within the holding period, both ends inclusive.
    pub fn holds_on(&self, date: NaiveDate) -> bool {
        self.entry_date <= date && date <= self.exit_date
    }
}
