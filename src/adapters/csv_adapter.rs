//! CSV file data adapter.
//!
//! Reads daily records from one combined CSV file, or from every `*.csv` file in a
//! directory. Rows are grouped by the `code` column; columns are located by header name.

use crate::domain::bar::{DailyBar, EntryCheck};
use crate::domain::error::PullbackError;
use crate::domain::params::ManualTrigger;
use crate::domain::series::{RecordSeries, SeriesSet, SkippedSymbol};
use crate::ports::data_port::{DataPort, SymbolInfo, TriggerListPort};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const REQUIRED_COLUMNS: [&str; 12] = [
    "date",
    "code",
    "name",
    "open",
    "high",
    "low",
    "close",
    "traded_value",
    "pct_change",
    "ma5",
    "ma10",
    "ma20",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    /// `path` is either a CSV file or a directory of CSV files.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn files(&self) -> Result<Vec<PathBuf>, PullbackError> {
        if !self.path.is_dir() {
            return Ok(vec![self.path.clone()]);
        }
        let entries = fs::read_dir(&self.path).map_err(|e| PullbackError::Input {
            reason: format!("failed to read directory {}: {}", self.path.display(), e),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl DataPort for CsvAdapter {
    fn load_series(&self) -> Result<SeriesSet, PullbackError> {
        let dir_mode = self.path.is_dir();
        let mut groups = Groups::default();
        let mut unreadable = Vec::new();
        for file in self.files()? {
            match read_file(&file, &mut groups) {
                Ok(()) => {}
                // one bad file in a directory only costs its own rows
                Err(PullbackError::Input { reason }) if dir_mode => {
                    warn!(file = %file.display(), reason = %reason, "skipping unreadable file");
                    let code = file
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| file.display().to_string());
                    unreadable.push(SkippedSymbol { code, reason });
                }
                Err(e) => return Err(e),
            }
        }
        let mut set = groups.finish();
        set.skipped.extend(unreadable);
        Ok(set)
    }

    fn list_symbols(&self) -> Result<Vec<SymbolInfo>, PullbackError> {
        let set = self.load_series()?;
        Ok(set
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

/// Header positions. Optional columns may be absent from the file entirely.
struct Columns {
    date: usize,
    code: usize,
    name: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    traded_value: usize,
    pct_change: usize,
    ma5: usize,
    ma10: usize,
    ma20: usize,
    ma60: Option<usize>,
    ma120: Option<usize>,
    foreign_net_buy: Option<usize>,
    institution_net_buy: Option<usize>,
    entry_check: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, PullbackError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
        };
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| find(c).is_none()) {
            return Err(PullbackError::MissingColumn {
                column: missing.to_string(),
            });
        }
        let required = |name: &str| find(name).unwrap_or_default();

        Ok(Self {
            date: required("date"),
            code: required("code"),
            name: required("name"),
            open: required("open"),
            high: required("high"),
            low: required("low"),
            close: required("close"),
            traded_value: required("traded_value"),
            pct_change: required("pct_change"),
            ma5: required("ma5"),
            ma10: required("ma10"),
            ma20: required("ma20"),
            ma60: find("ma60"),
            ma120: find("ma120"),
            foreign_net_buy: find("foreign_net_buy"),
            institution_net_buy: find("institution_net_buy"),
            entry_check: find("entry_check"),
        })
    }

    fn parse_bar(&self, record: &csv::StringRecord) -> Result<DailyBar, String> {
        let date_raw = cell(record, self.date);
        let date = parse_date(date_raw).ok_or_else(|| format!("invalid date '{date_raw}'"))?;

        let entry_check = match self.entry_check.map(|i| cell(record, i)) {
            None | Some("") => None,
            Some(raw) if raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("none") => {
                None
            }
            Some(raw) => match raw.parse::<EntryCheck>() {
                Ok(check) => Some(check),
                Err(reason) => {
                    warn!(date = %date, reason = %reason, "entry check treated as unset");
                    None
                }
            },
        };

        Ok(DailyBar {
            date,
            open: number(record, self.open, "open")?,
            high: number(record, self.high, "high")?,
            low: number(record, self.low, "low")?,
            close: number(record, self.close, "close")?,
            traded_value: number(record, self.traded_value, "traded_value")?,
            pct_change: number(record, self.pct_change, "pct_change")?,
            ma5: optional(record, Some(self.ma5), "ma5")?.unwrap_or(f64::NAN),
            ma10: optional(record, Some(self.ma10), "ma10")?.unwrap_or(f64::NAN),
            ma20: optional(record, Some(self.ma20), "ma20")?.unwrap_or(f64::NAN),
            ma60: optional(record, self.ma60, "ma60")?,
            ma120: optional(record, self.ma120, "ma120")?,
            foreign_net_buy: optional(record, self.foreign_net_buy, "foreign_net_buy")?,
            institution_net_buy: optional(record, self.institution_net_buy, "institution_net_buy")?,
            entry_check,
        })
    }
}

fn cell(record: &csv::StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("").trim()
}

fn number(record: &csv::StringRecord, index: usize, column: &str) -> Result<f64, String> {
    let raw = cell(record, index);
    raw.replace(',', "")
        .parse()
        .map_err(|_| format!("invalid {column} value '{raw}'"))
}

/// Empty cells and absent columns both read as `None`.
fn optional(
    record: &csv::StringRecord,
    index: Option<usize>,
    column: &str,
) -> Result<Option<f64>, String> {
    match index {
        Some(i) if !cell(record, i).is_empty() => number(record, i, column).map(Some),
        _ => Ok(None),
    }
}

#[derive(Default)]
struct Pending {
    name: String,
    bars: Vec<DailyBar>,
    error: Option<String>,
}

/// Rows grouped by code, in first-seen order.
#[derive(Default)]
struct Groups {
    order: Vec<String>,
    by_code: HashMap<String, Pending>,
}

impl Groups {
    fn pending(&mut self, code: &str, name: &str) -> &mut Pending {
        if !self.by_code.contains_key(code) {
            self.order.push(code.to_string());
        }
        self.by_code
            .entry(code.to_string())
            .or_insert_with(|| Pending {
                name: name.to_string(),
                ..Pending::default()
            })
    }

    fn finish(mut self) -> SeriesSet {
        let mut set = SeriesSet::default();
        for code in self.order {
            let Some(pending) = self.by_code.remove(&code) else {
                continue;
            };
            if let Some(reason) = pending.error {
                set.skipped.push(SkippedSymbol { code, reason });
                continue;
            }
            match RecordSeries::from_unsorted(code.clone(), pending.name, pending.bars) {
                Ok(series) => set.series.push(series),
                Err(e) => set.skipped.push(SkippedSymbol {
                    code,
                    reason: e.to_string(),
                }),
            }
        }
        set
    }
}

fn read_file(path: &Path, groups: &mut Groups) -> Result<(), PullbackError> {
    let content = fs::read_to_string(path).map_err(|e| PullbackError::Input {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| PullbackError::Input {
            reason: format!("{}: unreadable header: {}", path.display(), e),
        })?
        .clone();
    let columns = Columns::from_headers(&headers)?;

    for (line, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(file = %path.display(), line = line + 2, error = %e, "unreadable row");
                continue;
            }
        };
        let code = cell(&record, columns.code);
        if code.is_empty() {
            warn!(file = %path.display(), line = line + 2, "row without a code");
            continue;
        }
        let name = cell(&record, columns.name);
        let parsed = columns.parse_bar(&record);
        let pending = groups.pending(code, name);
        if pending.error.is_some() {
            continue;
        }
        match parsed {
            Ok(bar) => pending.bars.push(bar),
            Err(reason) => pending.error = Some(format!("line {}: {}", line + 2, reason)),
        }
    }
    Ok(())
}

/// Reads the manual trigger list: `name`, `date` and an optional `theme` column.
pub struct CsvTriggerListAdapter {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct TriggerRow {
    name: Option<String>,
    date: Option<String>,
    #[serde(default)]
    theme: Option<String>,
}

impl CsvTriggerListAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TriggerListPort for CsvTriggerListAdapter {
    fn load_triggers(&self) -> Result<Vec<ManualTrigger>, PullbackError> {
        let content = fs::read_to_string(&self.path).map_err(|e| PullbackError::Input {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut triggers = Vec::new();
        for (line, result) in rdr.deserialize::<TriggerRow>().enumerate() {
            let row = result.map_err(|e| PullbackError::Input {
                reason: format!("{}: {}", self.path.display(), e),
            })?;
            let name = row.name.filter(|n| !n.is_empty());
            let date = row.date.as_deref().and_then(parse_date);
            let (Some(name), Some(date)) = (name, date) else {
                warn!(
                    file = %self.path.display(),
                    line = line + 2,
                    "manual trigger needs a name and a date"
                );
                continue;
            };
            triggers.push(ManualTrigger {
                name,
                date,
                theme: row.theme.filter(|t| !t.is_empty()),
            });
        }
        Ok(triggers)
    }
}
