//! Per-symbol scan: trigger, entry, exit and the MA20 re-arm gate as one state machine.

use crate::domain::entry::{self, EntryEvent};
use crate::domain::exit;
use crate::domain::params::{ManualTrigger, TriggerParams};
use crate::domain::series::RecordSeries;
use crate::domain::trade::{Stamp, TradeRecord};
use crate::domain::trigger::{self, TriggerEvent};

/// Where one symbol's pass currently stands.
#[derive(Debug, Clone)]
pub enum ScanState {
    /// Evaluating bars as potential triggers.
    Scanning,
    /// A trigger fired; looking for the first pullback into MA5.
    EntrySearch { trigger: TriggerEvent },
    /// Entered; waiting for the target or the MA10 stop.
    PositionOpen {
        trigger: TriggerEvent,
        entry: EntryEvent,
    },
    /// A trade just closed; no trigger counts until a close drops below MA20.
    AwaitingMa20Dip { exit_index: usize },
}

/// Run one pass over `series`.
///
/// With `forced` set only that date is considered as a trigger and its theme is stamped
/// onto the resulting record. A forced date absent from the series yields nothing.
pub fn simulate(
    series: &RecordSeries,
    params: &TriggerParams,
    forced: Option<&ManualTrigger>,
) -> Vec<TradeRecord> {
    let bars = &series.bars;
    let forced_index = match forced {
        Some(manual) => match series.index_of(manual.date) {
            Some(index) => Some(index),
            None => return Vec::new(),
        },
        None => None,
    };
    let stamp = Stamp {
        code: &series.code,
        name: &series.name,
        theme: forced.and_then(|m| m.theme.as_deref()),
        params,
    };

    let mut trades = Vec::new();
    let mut cursor = forced_index.unwrap_or(1);
    let mut state = ScanState::Scanning;

    while cursor < bars.len() {
        state = match state {
            ScanState::Scanning => {
                if forced_index.is_some_and(|forced| forced != cursor) {
                    break;
                }
                match trigger::evaluate(bars, cursor, params) {
                    Some(trigger) => ScanState::EntrySearch { trigger },
                    None => {
                        cursor += 1;
                        ScanState::Scanning
                    }
                }
            }
            ScanState::EntrySearch { trigger } => match entry::resolve(bars, &trigger) {
                Some(entry) => ScanState::PositionOpen { trigger, entry },
                None => {
                    cursor = trigger.index + 1;
                    ScanState::Scanning
                }
            },
            ScanState::PositionOpen { trigger, entry } => match exit::resolve(bars, &entry) {
                Some(exit) => {
                    let record = TradeRecord::assemble(
                        bars,
                        stamp,
                        trades.len() + 1,
                        &trigger,
                        &entry,
                        &exit,
                    );
                    tracing::debug!(
                        code = %record.code,
                        trigger = %record.trigger_date,
                        entry = %record.entry_date,
                        exit = %record.exit_date,
                        return_pct = record.return_pct,
                        outcome = %record.outcome,
                        "trade closed"
                    );
                    trades.push(record);
                    cursor = exit.index;
                    ScanState::AwaitingMa20Dip {
                        exit_index: exit.index,
                    }
                }
                None => {
                    cursor = trigger.index + 1;
                    ScanState::Scanning
                }
            },
            ScanState::AwaitingMa20Dip { exit_index } => {
                let bar = &bars[cursor];
                if bar.close < bar.ma20 {
                    // the exit bar itself can release the gate but is never a trigger
                    if cursor == exit_index {
                        cursor += 1;
                    }
                    ScanState::Scanning
                } else {
                    cursor += 1;
                    ScanState::AwaitingMa20Dip { exit_index }
                }
            }
        };
    }
    trades
}
