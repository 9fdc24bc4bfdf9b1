//! Per-symbol record series.

use crate::domain::bar::DailyBar;
use crate::domain::error::PullbackError;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Ordered daily bars for one symbol.
#[derive(Debug, Clone)]
pub struct RecordSeries {
    pub code: String,
    pub name: String,
    pub bars: Vec<DailyBar>,
    date_index: HashMap<NaiveDate, usize>,
}

impl RecordSeries {
    /// Build a series, rejecting bars that are not strictly ordered by date.
    pub fn new(code: String, name: String, bars: Vec<DailyBar>) -> Result<Self, PullbackError> {
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                let reason = if pair[1].date == pair[0].date {
                    format!("duplicate date {}", pair[1].date)
                } else {
                    format!("date {} follows {}", pair[1].date, pair[0].date)
                };
                return Err(PullbackError::InvalidSeries { code, reason });
            }
        }

        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();

        Ok(Self {
            code,
            name,
            bars,
            date_index,
        })
    }

    /// Sort bars by date first, then build. Duplicate dates are still rejected.
    pub fn from_unsorted(
        code: String,
        name: String,
        mut bars: Vec<DailyBar>,
    ) -> Result<Self, PullbackError> {
        bars.sort_by_key(|b| b.date);
        Self::new(code, name, bars)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}

/// A symbol dropped while loading, and why.
#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub code: String,
    pub reason: String,
}

/// Everything a data source could turn into series, plus what it had to skip.
#[derive(Debug, Clone, Default)]
pub struct SeriesSet {
    pub series: Vec<RecordSeries>,
    pub skipped: Vec<SkippedSymbol>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bar(date: &str, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            traded_value: 0.0,
            pct_change: 0.0,
            ma5: close,
            ma10: close,
            ma20: close,
            ma60: None,
            ma120: None,
            foreign_net_buy: None,
            institution_net_buy: None,
            entry_check: None,
        }
    }

    #[test]
    fn builds_date_index() {
        let series = RecordSeries::new(
            "005930".into(),
            "Samsung".into(),
            vec![
                make_bar("2024-01-02", 100.0),
                make_bar("2024-01-03", 101.0),
                make_bar("2024-01-05", 102.0),
            ],
        )
        .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(
            series.index_of(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
            Some(2)
        );
        assert_eq!(
            series.index_of(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()),
            None
        );
        assert_eq!(
            series.first_date(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );
        assert_eq!(
            series.last_date(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
        );
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = RecordSeries::from_unsorted(
            "A".into(),
            "Alpha".into(),
            vec![make_bar("2024-01-03", 1.0), make_bar("2024-01-03", 2.0)],
        )
        .unwrap_err();
        assert!(matches!(err, PullbackError::InvalidSeries { .. }));
        assert!(err.to_string().contains("duplicate date 2024-01-03"));
    }

    #[test]
    fn rejects_unordered_dates() {
        let result = RecordSeries::new(
            "A".into(),
            "Alpha".into(),
            vec![make_bar("2024-01-04", 1.0), make_bar("2024-01-03", 2.0)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn from_unsorted_orders_bars() {
        let series = RecordSeries::from_unsorted(
            "A".into(),
            "Alpha".into(),
            vec![make_bar("2024-01-04", 1.0), make_bar("2024-01-03", 2.0)],
        )
        .unwrap();
        assert_eq!(series.bars[0].close, 2.0);
        assert_eq!(series.bars[1].close, 1.0);
    }

    #[test]
    fn empty_series_is_valid() {
        let series = RecordSeries::new("A".into(), "Alpha".into(), vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.first_date(), None);
    }
}
