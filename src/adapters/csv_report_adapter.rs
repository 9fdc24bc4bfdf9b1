//! CSV report adapter implementing ReportPort.
//!
//! Writes `{id}_results.csv` always, and `{id}_daily.csv`, `{id}_weekly.csv`,
//! `{id}_monthly.csv` and `{id}_stats.csv` when the batch produced trades.

use std::fmt::Display;
use std::fs;
use std::path::PathBuf;

use chrono::Datelike;

use crate::domain::analytics::HALT_NOTE;
use crate::domain::batch::BatchReport;
use crate::domain::error::PullbackError;
use crate::domain::summary::{DailyFigures, DailySummary, MonthlyFigures, MonthlySummary, Summaries, WeeklyRow};
use crate::domain::trade::TradeRecord;
use crate::ports::report_port::ReportPort;

pub const TRADE_COLUMNS: [&str; 48] = [
    "code",
    "name",
    "theme",
    "entry_id",
    "exit_id",
    "trigger_date",
    "trigger_close",
    "trigger_pct_change",
    "trigger_traded_value",
    "trigger_intra_high_pct",
    "foreign_net_buy",
    "institution_net_buy",
    "entry_date",
    "entry_price",
    "entry_rule",
    "exit_date",
    "exit_price",
    "target_price",
    "outcome",
    "note",
    "return_pct",
    "verified_return",
    "days_to_entry",
    "days_held",
    "pre_entry_peak_pct",
    "max_gain_pct",
    "max_drawdown",
    "spread_ma5_10",
    "spread_ma5_20",
    "aligned_ma5_10_20_60",
    "aligned_ma5_10_20_60_120",
    "slope_ma5",
    "slope_ma10",
    "slope_ma20",
    "risk_to_reward",
    "entry_check",
    "min_rate",
    "max_rate",
    "min_value",
    "max_value",
    "min_foreign",
    "min_institution",
    "halt_suspected",
    "is_win",
    "holding_calendar_days",
    "trigger_to_exit_days",
    "entry_year_month",
    "entry_iso_week",
];

fn report_err(e: impl Display) -> PullbackError {
    PullbackError::Report {
        reason: e.to_string(),
    }
}

fn opt<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, PullbackError> {
    let data = wtr.into_inner().map_err(report_err)?;
    String::from_utf8(data).map_err(report_err)
}

/// Export the trade table, one row per trade.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String, PullbackError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(TRADE_COLUMNS).map_err(report_err)?;

    for t in trades {
        let iso = t.entry_date.iso_week();
        wtr.write_record([
            t.code.clone(),
            t.name.clone(),
            t.theme.clone().unwrap_or_default(),
            t.entry_id.clone(),
            t.exit_id.clone(),
            t.trigger_date.to_string(),
            t.trigger_close.to_string(),
            t.trigger_pct_change.to_string(),
            t.trigger_traded_value.to_string(),
            t.trigger_intra_high_pct.to_string(),
            opt(t.foreign_net_buy),
            opt(t.institution_net_buy),
            t.entry_date.to_string(),
            t.entry_price.to_string(),
            t.entry_rule.to_string(),
            t.exit_date.to_string(),
            t.exit_price.to_string(),
            t.target_price.to_string(),
            t.outcome.to_string(),
            t.note.clone(),
            t.return_pct.to_string(),
            t.verified_return.to_string(),
            t.days_to_entry.to_string(),
            t.days_held.to_string(),
            t.pre_entry_peak_pct.to_string(),
            t.max_gain_pct.to_string(),
            t.max_drawdown.to_string(),
            t.spread_ma5_10.to_string(),
            t.spread_ma5_20.to_string(),
            opt(t.aligned_ma60),
            opt(t.aligned_ma120),
            opt(t.slope_ma5),
            opt(t.slope_ma10),
            opt(t.slope_ma20),
            opt(t.risk_to_reward),
            opt(t.entry_check),
            opt(t.min_rate),
            opt(t.max_rate),
            opt(t.min_value),
            opt(t.max_value),
            opt(t.min_foreign),
            opt(t.min_institution),
            t.note.ends_with(HALT_NOTE).to_string(),
            t.is_win().to_string(),
            (t.exit_date - t.entry_date).num_days().to_string(),
            (t.exit_date - t.trigger_date).num_days().to_string(),
            t.entry_date.format("%Y-%m").to_string(),
            format!("{}-W{:02}", iso.year(), iso.week()),
        ])
        .map_err(report_err)?;
    }
    finish(wtr)
}

fn daily_fields(label: String, d: &DailyFigures) -> [String; 11] {
    [
        label,
        d.return_sum.to_string(),
        d.trades.to_string(),
        d.max_gain_avg.to_string(),
        d.drawdown_avg.to_string(),
        d.spread_avg.to_string(),
        d.rr_sum.to_string(),
        opt(d.rr_avg),
        d.entries.to_string(),
        d.exits.to_string(),
        d.held.to_string(),
    ]
}

pub fn export_daily_csv(daily: &DailySummary) -> Result<String, PullbackError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "return_pct_sum",
        "trades",
        "max_gain_pct_avg",
        "max_drawdown_avg",
        "spread_ma5_10_avg",
        "risk_to_reward_sum",
        "risk_to_reward_avg",
        "entries",
        "exits",
        "held",
    ])
    .map_err(report_err)?;

    for row in &daily.rows {
        wtr.write_record(daily_fields(row.date.to_string(), &row.figures))
            .map_err(report_err)?;
    }
    wtr.write_record(daily_fields("Total".to_string(), &daily.total))
        .map_err(report_err)?;
    wtr.write_record(daily_fields("Average".to_string(), &daily.average))
        .map_err(report_err)?;
    finish(wtr)
}

pub fn export_weekly_csv(weekly: &[WeeklyRow]) -> Result<String, PullbackError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["week", "return_pct_sum", "wins", "losses", "win_ratio"])
        .map_err(report_err)?;
    for w in weekly {
        wtr.write_record([
            w.week.clone(),
            w.return_sum.to_string(),
            w.wins.to_string(),
            w.losses.to_string(),
            w.win_ratio.to_string(),
        ])
        .map_err(report_err)?;
    }
    finish(wtr)
}

/// Months as columns, metrics as rows, with Total and Average columns last.
pub fn export_monthly_csv(monthly: &MonthlySummary) -> Result<String, PullbackError> {
    let columns: Vec<&MonthlyFigures> = monthly
        .months
        .iter()
        .map(|m| &m.figures)
        .chain([&monthly.total, &monthly.average])
        .collect();

    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["metric".to_string()];
    header.extend(monthly.months.iter().map(|m| m.month.clone()));
    header.push("Total".to_string());
    header.push("Average".to_string());
    wtr.write_record(&header).map_err(report_err)?;

    let metrics: [(&str, fn(&MonthlyFigures) -> String); 7] = [
        ("return_pct_sum", |m| m.return_sum.to_string()),
        ("cumulative_return_pct", |m| m.cumulative.to_string()),
        ("wins", |m| m.wins.to_string()),
        ("losses", |m| m.losses.to_string()),
        ("win_ratio", |m| m.win_ratio.to_string()),
        ("risk_to_reward_avg", |m| opt(m.rr_avg)),
        ("trades", |m| m.trades.to_string()),
    ];
    for (label, value) in metrics {
        let mut record = vec![label.to_string()];
        record.extend(columns.iter().map(|c| value(c)));
        wtr.write_record(&record).map_err(report_err)?;
    }
    finish(wtr)
}

pub fn export_stats_csv(summaries: &Summaries, trades: usize) -> Result<String, PullbackError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["metric", "value"]).map_err(report_err)?;
    for (metric, value) in [
        ("trades", trades),
        ("max_win_streak", summaries.streaks.max_win),
        ("max_loss_streak", summaries.streaks.max_loss),
        ("max_held", summaries.max_held),
    ] {
        wtr.write_record([metric.to_string(), value.to_string()])
            .map_err(report_err)?;
    }
    finish(wtr)
}

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn save(&self, file_name: String, content: &str) -> Result<PathBuf, PullbackError> {
        let path = self.output_dir.join(file_name);
        fs::write(&path, content).map_err(|e| PullbackError::Report {
            reason: format!("failed to write {}: {}", path.display(), e),
        })?;
        Ok(path)
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &BatchReport, strategy_id: &str) -> Result<Vec<PathBuf>, PullbackError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| PullbackError::Report {
            reason: format!("failed to create {}: {}", self.output_dir.display(), e),
        })?;

        let mut written = vec![self.save(
            format!("{strategy_id}_results.csv"),
            &export_trades_csv(&report.trades)?,
        )?];

        if let Some(s) = &report.summaries {
            written.push(self.save(format!("{strategy_id}_daily.csv"), &export_daily_csv(&s.daily)?)?);
            written.push(self.save(format!("{strategy_id}_weekly.csv"), &export_weekly_csv(&s.weekly)?)?);
            written.push(self.save(
                format!("{strategy_id}_monthly.csv"),
                &export_monthly_csv(&s.monthly)?,
            )?);
            written.push(self.save(
                format!("{strategy_id}_stats.csv"),
                &export_stats_csv(s, report.trades.len())?,
            )?);
        }
        Ok(written)
    }
}
