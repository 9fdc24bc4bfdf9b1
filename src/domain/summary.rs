//! Batch-level aggregates over the full trade collection.
//!
//! Everything here needs the complete set of trades: the daily table spans the
//! calendar from the earliest entry to the latest exit.

use crate::domain::bar::round_to;
use crate::domain::trade::TradeRecord;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Number of trades held on each calendar date from the earliest entry to the latest
/// exit. Empty when there are no trades.
pub fn held_counts(trades: &[TradeRecord]) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    let (Some(first), Some(last)) = (
        trades.iter().map(|t| t.entry_date).min(),
        trades.iter().map(|t| t.exit_date).max(),
    ) else {
        return counts;
    };

    for date in first.iter_days().take_while(|d| *d <= last) {
        counts.insert(date, 0);
    }
    for trade in trades {
        for date in trade.entry_date.iter_days().take_while(|d| *d <= trade.exit_date) {
            if let Some(count) = counts.get_mut(&date) {
                *count += 1;
            }
        }
    }
    counts
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

// ---------------------------------------------------------------------------
// Daily
// ---------------------------------------------------------------------------

/// One line of the daily table. Counts are kept as `f64` so the Total and Average
/// lines share the type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyFigures {
    pub return_sum: f64,
    pub trades: f64,
    pub max_gain_avg: f64,
    pub drawdown_avg: f64,
    pub spread_avg: f64,
    pub rr_sum: f64,
    pub rr_avg: Option<f64>,
    pub entries: f64,
    pub exits: f64,
    pub held: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub figures: DailyFigures,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub rows: Vec<DailyRow>,
    pub total: DailyFigures,
    pub average: DailyFigures,
}

impl DailySummary {
    pub fn build(trades: &[TradeRecord], held: &BTreeMap<NaiveDate, usize>) -> Self {
        let mut by_entry: BTreeMap<NaiveDate, Vec<&TradeRecord>> = BTreeMap::new();
        let mut exits: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for trade in trades {
            by_entry.entry(trade.entry_date).or_default().push(trade);
            *exits.entry(trade.exit_date).or_default() += 1;
        }

        let rows: Vec<DailyRow> = held
            .iter()
            .map(|(&date, &held_count)| {
                let day = by_entry.get(&date).map(Vec::as_slice).unwrap_or(&[]);
                let rr: Vec<f64> = day.iter().filter_map(|t| t.risk_to_reward).collect();
                let figures = DailyFigures {
                    return_sum: round2(day.iter().map(|t| t.return_pct).sum()),
                    trades: day.len() as f64,
                    max_gain_avg: round2(mean(day.iter().map(|t| t.max_gain_pct)).unwrap_or(0.0)),
                    drawdown_avg: round2(mean(day.iter().map(|t| t.max_drawdown)).unwrap_or(0.0)),
                    spread_avg: round2(mean(day.iter().map(|t| t.spread_ma5_10)).unwrap_or(0.0)),
                    rr_sum: round2(rr.iter().sum()),
                    rr_avg: mean(rr.iter().copied()).map(round2),
                    entries: day.len() as f64,
                    exits: exits.get(&date).copied().unwrap_or(0) as f64,
                    held: held_count as f64,
                };
                DailyRow { date, figures }
            })
            .collect();

        let total = Self::fold_rows(&rows, |values| Some(values.iter().sum()));
        let average = Self::fold_rows(&rows, |values| mean(values.iter().copied()));
        DailySummary {
            rows,
            total,
            average,
        }
    }

    /// Apply `f` column by column. Undefined risk/reward cells are skipped.
    fn fold_rows(rows: &[DailyRow], f: impl Fn(&[f64]) -> Option<f64>) -> DailyFigures {
        let column = |get: fn(&DailyFigures) -> f64| -> f64 {
            let values: Vec<f64> = rows.iter().map(|r| get(&r.figures)).collect();
            round2(f(&values).unwrap_or(0.0))
        };
        let rr: Vec<f64> = rows.iter().filter_map(|r| r.figures.rr_avg).collect();
        DailyFigures {
            return_sum: column(|d| d.return_sum),
            trades: column(|d| d.trades),
            max_gain_avg: column(|d| d.max_gain_avg),
            drawdown_avg: column(|d| d.drawdown_avg),
            spread_avg: column(|d| d.spread_avg),
            rr_sum: column(|d| d.rr_sum),
            rr_avg: if rr.is_empty() { None } else { f(&rr).map(round2) },
            entries: column(|d| d.entries),
            exits: column(|d| d.exits),
            held: column(|d| d.held),
        }
    }
}

// ---------------------------------------------------------------------------
// Weekly
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyRow {
    /// ISO week label, e.g. `2024-W07`.
    pub week: String,
    pub return_sum: f64,
    pub wins: usize,
    pub losses: usize,
    pub win_ratio: f64,
}

pub fn weekly_summary(trades: &[TradeRecord]) -> Vec<WeeklyRow> {
    let mut groups: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
    for trade in trades {
        let iso = trade.entry_date.iso_week();
        groups
            .entry((iso.year(), iso.week()))
            .or_default()
            .push(trade.return_pct);
    }

    groups
        .into_iter()
        .map(|((year, week), returns)| {
            let wins = returns.iter().filter(|r| **r > 0.0).count();
            WeeklyRow {
                week: format!("{year}-W{week:02}"),
                return_sum: round2(returns.iter().sum()),
                wins,
                losses: returns.len() - wins,
                win_ratio: round2(wins as f64 / returns.len() as f64),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Monthly
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyFigures {
    pub return_sum: f64,
    pub cumulative: f64,
    pub wins: f64,
    pub losses: f64,
    pub win_ratio: f64,
    pub rr_avg: Option<f64>,
    pub trades: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyColumn {
    /// `YYYY-MM`
    pub month: String,
    pub figures: MonthlyFigures,
}

/// Months run left to right when written out, followed by Total and Average.
/// Total sums the additive rows and keeps the final cumulative return; its win ratio and
/// mean risk/reward come from all trades. Average is the mean over the month columns only.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub months: Vec<MonthlyColumn>,
    pub total: MonthlyFigures,
    pub average: MonthlyFigures,
}

impl MonthlySummary {
    pub fn build(trades: &[TradeRecord]) -> Self {
        let mut groups: BTreeMap<(i32, u32), Vec<&TradeRecord>> = BTreeMap::new();
        for trade in trades {
            let d = trade.entry_date;
            groups.entry((d.year(), d.month())).or_default().push(trade);
        }

        let mut cumulative = 0.0;
        let months: Vec<MonthlyColumn> = groups
            .into_iter()
            .map(|((year, month), group)| {
                let return_sum: f64 = group.iter().map(|t| t.return_pct).sum();
                cumulative += return_sum;
                let wins = group.iter().filter(|t| t.return_pct > 0.0).count();
                MonthlyColumn {
                    month: format!("{year:04}-{month:02}"),
                    figures: MonthlyFigures {
                        return_sum: round2(return_sum),
                        cumulative: round2(cumulative),
                        wins: wins as f64,
                        losses: (group.len() - wins) as f64,
                        win_ratio: round2(wins as f64 / group.len() as f64),
                        rr_avg: mean(group.iter().filter_map(|t| t.risk_to_reward)).map(round2),
                        trades: group.len() as f64,
                    },
                }
            })
            .collect();

        let wins: f64 = months.iter().map(|m| m.figures.wins).sum();
        let trade_count: f64 = months.iter().map(|m| m.figures.trades).sum();
        let total = MonthlyFigures {
            return_sum: round2(months.iter().map(|m| m.figures.return_sum).sum()),
            cumulative: round2(cumulative),
            wins,
            losses: months.iter().map(|m| m.figures.losses).sum(),
            win_ratio: if trade_count > 0.0 {
                round2(wins / trade_count)
            } else {
                0.0
            },
            rr_avg: mean(trades.iter().filter_map(|t| t.risk_to_reward)).map(round2),
            trades: trade_count,
        };

        let average_of = |get: fn(&MonthlyFigures) -> f64| {
            round2(mean(months.iter().map(|m| get(&m.figures))).unwrap_or(0.0))
        };
        let average = MonthlyFigures {
            return_sum: average_of(|m| m.return_sum),
            cumulative: average_of(|m| m.cumulative),
            wins: average_of(|m| m.wins),
            losses: average_of(|m| m.losses),
            win_ratio: average_of(|m| m.win_ratio),
            rr_avg: mean(months.iter().filter_map(|m| m.figures.rr_avg)).map(round2),
            trades: average_of(|m| m.trades),
        };

        MonthlySummary {
            months,
            total,
            average,
        }
    }
}

// ---------------------------------------------------------------------------
// Streaks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakStats {
    pub max_win: usize,
    pub max_loss: usize,
}

/// Longest runs of strictly positive and strictly negative values.
pub fn max_streaks(values: &[f64]) -> StreakStats {
    let longest = |pred: fn(f64) -> bool| {
        values
            .iter()
            .fold((0usize, 0usize), |(run, best), &v| {
                let run = if pred(v) { run + 1 } else { 0 };
                (run, best.max(run))
            })
            .1
    };
    StreakStats {
        max_win: longest(|v| v > 0.0),
        max_loss: longest(|v| v < 0.0),
    }
}

/// Summed return per entry date, in date order.
pub fn returns_by_entry_date(trades: &[TradeRecord]) -> Vec<f64> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for trade in trades {
        *by_date.entry(trade.entry_date).or_default() += trade.return_pct;
    }
    by_date.into_values().collect()
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Summaries {
    pub daily: DailySummary,
    pub weekly: Vec<WeeklyRow>,
    pub monthly: MonthlySummary,
    pub streaks: StreakStats,
    pub max_held: usize,
}

impl Summaries {
    /// `None` for an empty trade collection.
    pub fn build(trades: &[TradeRecord]) -> Option<Self> {
        if trades.is_empty() {
            return None;
        }
        let held = held_counts(trades);
        Some(Summaries {
            daily: DailySummary::build(trades, &held),
            weekly: weekly_summary(trades),
            monthly: MonthlySummary::build(trades),
            streaks: max_streaks(&returns_by_entry_date(trades)),
            max_held: held.values().copied().max().unwrap_or(0),
        })
    }
}
