//! Batch orchestration across symbols.
//!
//! Auto mode scans every symbol independently (in parallel; results keep input order).
//! Manual mode runs one forced-date pass per listed trigger, looked up by symbol name,
//! and drops repeated (code, trigger date) pairs.

use crate::domain::analytics::verified_return;
use crate::domain::entry_check;
use crate::domain::error::PullbackError;
use crate::domain::params::{ManualTrigger, RunParams, TriggerParams};
use crate::domain::series::{RecordSeries, SeriesSet, SkippedSymbol};
use crate::domain::simulator::simulate;
use crate::domain::summary::Summaries;
use crate::domain::trade::TradeRecord;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// A manual trigger that could not be run.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedTrigger {
    pub name: String,
    pub date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub trades: Vec<TradeRecord>,
    /// `None` when no trade was produced.
    pub summaries: Option<Summaries>,
    pub symbols_scanned: usize,
    pub skipped: Vec<SkippedSymbol>,
    pub unmatched: Vec<UnmatchedTrigger>,
    pub duplicates_removed: usize,
}

impl BatchReport {
    pub fn has_trades(&self) -> bool {
        !self.trades.is_empty()
    }
}

/// Load everything from `data` and run the batch.
pub fn run(data: &dyn DataPort, params: &RunParams) -> Result<BatchReport, PullbackError> {
    let set = data.load_series()?;
    for skipped in &set.skipped {
        warn!(code = %skipped.code, reason = %skipped.reason, "skipping symbol");
    }
    if set.series.is_empty() {
        return Err(PullbackError::NoData {
            symbol: "all".to_string(),
        });
    }
    Ok(run_series(set, params))
}

/// Run the batch over already-loaded series.
pub fn run_series(set: SeriesSet, params: &RunParams) -> BatchReport {
    let SeriesSet {
        mut series,
        skipped,
    } = set;

    if params.derive_entry_check {
        let filled: usize = series
            .par_iter_mut()
            .map(|s| entry_check::derive_missing(&mut s.bars))
            .sum();
        info!(bars = filled, "derived entry checks");
    }

    let symbols_scanned = series.len();
    let (mut trades, unmatched, duplicates_removed) = match &params.manual_triggers {
        None => (scan_all(&series, &params.trigger), Vec::new(), 0),
        Some(list) => {
            let (trades, unmatched) = scan_manual(&series, list, &params.trigger);
            let (trades, removed) = dedup_by_trigger(trades);
            if removed > 0 {
                info!(removed, "removed duplicate manual trades");
            }
            (trades, unmatched, removed)
        }
    };

    for trade in &mut trades {
        trade.verified_return = verified_return(trade.return_pct, trade.entry_check);
    }

    let summaries = Summaries::build(&trades);
    match &summaries {
        Some(s) => info!(
            trades = trades.len(),
            symbols = symbols_scanned,
            max_held = s.max_held,
            "batch complete"
        ),
        None => info!(symbols = symbols_scanned, "no trades"),
    }

    BatchReport {
        trades,
        summaries,
        symbols_scanned,
        skipped,
        unmatched,
        duplicates_removed,
    }
}

fn scan_all(series: &[RecordSeries], params: &TriggerParams) -> Vec<TradeRecord> {
    let per_symbol: Vec<Vec<TradeRecord>> = series
        .par_iter()
        .map(|s| {
            let trades = simulate(s, params, None);
            debug!(code = %s.code, bars = s.len(), trades = trades.len(), "scanned");
            trades
        })
        .collect();
    per_symbol.into_iter().flatten().collect()
}

fn scan_manual(
    series: &[RecordSeries],
    list: &[ManualTrigger],
    params: &TriggerParams,
) -> (Vec<TradeRecord>, Vec<UnmatchedTrigger>) {
    let by_name = index_by_name(series);

    let mut trades = Vec::new();
    let mut unmatched = Vec::new();
    for manual in list {
        let Some(s) = by_name.get(manual.name.trim()) else {
            warn!(name = %manual.name, date = %manual.date, "no data for manual trigger symbol");
            unmatched.push(UnmatchedTrigger {
                name: manual.name.clone(),
                date: manual.date,
                reason: "unknown symbol".to_string(),
            });
            continue;
        };
        if s.index_of(manual.date).is_none() {
            warn!(name = %manual.name, date = %manual.date, "manual trigger date not in series");
            unmatched.push(UnmatchedTrigger {
                name: manual.name.clone(),
                date: manual.date,
                reason: "date not in series".to_string(),
            });
            continue;
        }
        trades.extend(simulate(s, params, Some(manual)));
    }
    (trades, unmatched)
}

/// Name lookup for manual triggers. When two codes share a name the first-seen series
/// wins.
fn index_by_name(series: &[RecordSeries]) -> HashMap<&str, &RecordSeries> {
    let mut by_name: HashMap<&str, &RecordSeries> = HashMap::new();
    for s in series {
        match by_name.entry(s.name.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(s);
            }
            Entry::Occupied(kept) => {
                warn!(
                    name = %s.name,
                    kept = %kept.get().code,
                    ignored = %s.code,
                    "symbol name shared by several codes"
                );
            }
        }
    }
    by_name
}

/// Keep the first record for each (code, trigger date). Returns the survivors and the
/// number removed.
pub fn dedup_by_trigger(trades: Vec<TradeRecord>) -> (Vec<TradeRecord>, usize) {
    let before = trades.len();
    let mut seen = HashSet::new();
    let kept: Vec<TradeRecord> = trades
        .into_iter()
        .filter(|t| seen.insert((t.code.clone(), t.trigger_date)))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}
