//! Aggregation reader: raw journal records to a tidy day x label table.
//!
//! Records keep their timestamps as strings; this module is the only
//! place that parses them. Rows that lack a parseable date, a label, or
//! a finite score are dropped, matching the format contract that
//! consumers skip malformed entries.

use crate::record::EmotionRecord;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Stored timestamps: ISO-8601 local time, fractional seconds optional.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
/// Bare calendar date, the shortest form the reader accepts.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// One observation reduced to reporting shape: calendar date, emotion
/// label, confidence score. Time of day is discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub date: NaiveDate,
    pub label: String,
    pub score: f64,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RangeError {
    #[error("start {start} is after end {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
}

/// Per-day, per-label reductions consumed by the presentation layer.
///
/// `counts` and `mean_scores` are keyed identically; no weighting or
/// decay is applied.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DailySummary {
    /// Observation count per day per label.
    pub counts: BTreeMap<NaiveDate, BTreeMap<String, u64>>,
    /// Mean score per day per label.
    pub mean_scores: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

/// Build the tidy table, dropping records the reader cannot use.
/// Row order follows record order but is not significant to callers.
pub fn rows_from_records(records: &[EmotionRecord]) -> Vec<Row> {
    let mut rows = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for record in records {
        let Some(date) = parse_observation_date(&record.datetime) else {
            dropped += 1;
            continue;
        };
        let label = record.emotion.trim();
        if label.is_empty() || !record.percentage.is_finite() {
            dropped += 1;
            continue;
        }
        rows.push(Row {
            date,
            label: label.to_string(),
            score: record.percentage,
        });
    }

    if dropped > 0 {
        tracing::warn!(dropped, "dropped records without a usable date, label, or score");
    }
    rows
}

fn parse_observation_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT) {
        return Some(datetime.date());
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Keep rows with dates in `[start, end]` inclusive.
///
/// Both bounds `None` returns the input unchanged. An out-of-order pair
/// is rejected whole; an empty result is "no data in range", not an
/// error.
pub fn filter_range(
    rows: Vec<Row>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<Row>, RangeError> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(RangeError::StartAfterEnd { start, end });
        }
    }
    if start.is_none() && end.is_none() {
        return Ok(rows);
    }

    Ok(rows
        .into_iter()
        .filter(|row| {
            start.map_or(true, |s| row.date >= s) && end.map_or(true, |e| row.date <= e)
        })
        .collect())
}

/// Group by (day, label): observation counts and mean scores.
pub fn aggregate(rows: &[Row]) -> DailySummary {
    let mut counts: BTreeMap<NaiveDate, BTreeMap<String, u64>> = BTreeMap::new();
    let mut sums: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();

    for row in rows {
        *counts
            .entry(row.date)
            .or_default()
            .entry(row.label.clone())
            .or_insert(0) += 1;
        *sums
            .entry(row.date)
            .or_default()
            .entry(row.label.clone())
            .or_insert(0.0) += row.score;
    }

    let mut mean_scores: BTreeMap<NaiveDate, BTreeMap<String, f64>> = BTreeMap::new();
    for (date, labels) in &sums {
        let day = mean_scores.entry(*date).or_default();
        for (label, sum) in labels {
            let count = counts[date][label];
            day.insert(label.clone(), sum / count as f64);
        }
    }

    DailySummary {
        counts,
        mean_scores,
    }
}

/// Overall observation count per label across all rows.
pub fn label_totals(rows: &[Row]) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    for row in rows {
        *totals.entry(row.label.clone()).or_insert(0) += 1;
    }
    totals
}

/// Earliest and latest observation dates, `None` when there are no rows.
pub fn available_range(rows: &[Row]) -> Option<(NaiveDate, NaiveDate)> {
    let first = rows.first()?.date;
    let (min, max) = rows
        .iter()
        .fold((first, first), |(min, max), row| {
            (min.min(row.date), max.max(row.date))
        });
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::EmotionJournal;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn record(datetime: &str, emotion: &str, percentage: f64) -> EmotionRecord {
        EmotionRecord {
            name: "Ann".into(),
            datetime: datetime.into(),
            emotion: emotion.into(),
            percentage,
        }
    }

    fn row(d: &str, label: &str, score: f64) -> Row {
        Row {
            date: date(d),
            label: label.into(),
            score,
        }
    }

    #[test]
    fn test_rows_parse_timestamps_with_and_without_fraction() {
        let records = vec![
            record("2026-08-25T10:00:00.123456", "happy", 80.0),
            record("2026-08-25T11:30:00", "sad", 40.0),
            record("2026-08-24", "neutral", 55.0),
        ];
        let rows = rows_from_records(&records);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, date("2026-08-25"));
        assert_eq!(rows[1].date, date("2026-08-25"));
        assert_eq!(rows[2].date, date("2026-08-24"));
    }

    #[test]
    fn test_rows_drop_unusable_records() {
        let records = vec![
            record("not a date", "happy", 80.0),
            record("2026-08-25T10:00:00", "", 80.0),
            record("2026-08-25T10:00:00", "   ", 80.0),
            record("2026-08-25T10:00:00", "happy", f64::NAN),
            record("2026-08-25T10:00:00", "happy", 80.0),
        ];
        let rows = rows_from_records(&records);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "happy");
    }

    #[test]
    fn test_rows_trim_label_whitespace() {
        let rows = rows_from_records(&[record("2026-08-25T10:00:00", " happy ", 80.0)]);
        assert_eq!(rows[0].label, "happy");
    }

    #[test]
    fn test_filter_no_bounds_returns_input_unchanged() {
        let rows = vec![row("2026-08-24", "happy", 80.0), row("2026-08-25", "sad", 40.0)];
        let filtered = filter_range(rows.clone(), None, None).unwrap();
        assert_eq!(filtered, rows);
    }

    #[test]
    fn test_filter_start_after_end_rejected() {
        let rows = vec![row("2026-08-24", "happy", 80.0)];
        let err = filter_range(rows, Some(date("2026-08-25")), Some(date("2026-08-20"))).unwrap_err();
        assert_eq!(
            err,
            RangeError::StartAfterEnd {
                start: date("2026-08-25"),
                end: date("2026-08-20"),
            }
        );
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let rows = vec![
            row("2026-08-20", "happy", 80.0),
            row("2026-08-22", "sad", 40.0),
            row("2026-08-24", "neutral", 55.0),
        ];
        let filtered =
            filter_range(rows, Some(date("2026-08-20")), Some(date("2026-08-24"))).unwrap();
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_filter_single_bound() {
        let rows = vec![
            row("2026-08-20", "happy", 80.0),
            row("2026-08-22", "sad", 40.0),
            row("2026-08-24", "neutral", 55.0),
        ];
        let from = filter_range(rows.clone(), Some(date("2026-08-22")), None).unwrap();
        assert_eq!(from.len(), 2);
        let until = filter_range(rows, None, Some(date("2026-08-21"))).unwrap();
        assert_eq!(until.len(), 1);
        assert_eq!(until[0].label, "happy");
    }

    #[test]
    fn test_filter_empty_result_is_ok() {
        let rows = vec![row("2026-08-20", "happy", 80.0)];
        let filtered =
            filter_range(rows, Some(date("2030-01-01")), Some(date("2030-01-31"))).unwrap();
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_aggregate_counts_and_means() {
        let rows = vec![
            row("2026-08-24", "happy", 80.0),
            row("2026-08-24", "happy", 60.0),
            row("2026-08-24", "sad", 40.0),
            row("2026-08-25", "happy", 90.0),
        ];
        let summary = aggregate(&rows);

        let day_one = date("2026-08-24");
        assert_eq!(summary.counts[&day_one]["happy"], 2);
        assert_eq!(summary.counts[&day_one]["sad"], 1);
        assert!((summary.mean_scores[&day_one]["happy"] - 70.0).abs() < 1e-9);
        assert!((summary.mean_scores[&day_one]["sad"] - 40.0).abs() < 1e-9);

        let day_two = date("2026-08-25");
        assert_eq!(summary.counts[&day_two]["happy"], 1);
        assert!((summary.mean_scores[&day_two]["happy"] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_empty() {
        let summary = aggregate(&[]);
        assert!(summary.counts.is_empty());
        assert!(summary.mean_scores.is_empty());
    }

    #[test]
    fn test_label_totals() {
        let rows = vec![
            row("2026-08-24", "happy", 80.0),
            row("2026-08-25", "happy", 90.0),
            row("2026-08-25", "sad", 40.0),
        ];
        let totals = label_totals(&rows);
        assert_eq!(totals["happy"], 2);
        assert_eq!(totals["sad"], 1);
    }

    #[test]
    fn test_available_range() {
        assert_eq!(available_range(&[]), None);
        let rows = vec![
            row("2026-08-22", "sad", 40.0),
            row("2026-08-20", "happy", 80.0),
            row("2026-08-25", "neutral", 55.0),
        ];
        assert_eq!(
            available_range(&rows),
            Some((date("2026-08-20"), date("2026-08-25")))
        );
    }

    #[test]
    fn test_summary_serializes_with_date_keys() {
        let summary = aggregate(&[row("2026-08-24", "happy", 80.0)]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["counts"]["2026-08-24"]["happy"], 1);
        assert_eq!(json["mean_scores"]["2026-08-24"]["happy"], 80.0);
    }

    /// End-to-end scenario over a real journal file: two appends, then
    /// the full table + aggregate path.
    #[test]
    fn test_journal_to_summary_scenario() {
        let dir = TempDir::new().unwrap();
        let journal = EmotionJournal::new(dir.path().join("stats.json"));
        journal.append("Ann", "happy", 80.0).unwrap();
        journal.append("Ann", "sad", 40.0).unwrap();

        let records = journal.load();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].emotion, "happy");
        assert_eq!(records[1].emotion, "sad");

        let rows = rows_from_records(&records);
        assert_eq!(rows.len(), 2);
        let today = chrono::Local::now().date_naive();
        assert!(rows.iter().all(|r| r.date == today));

        let summary = aggregate(&rows);
        assert_eq!(summary.counts[&today]["happy"], 1);
        assert_eq!(summary.counts[&today]["sad"], 1);
        assert!((summary.mean_scores[&today]["happy"] - 80.0).abs() < 1e-9);
        assert!((summary.mean_scores[&today]["sad"] - 40.0).abs() < 1e-9);
    }
}
