//! Typed Records
//! Strongly typed rows of the event dataset and the text coercion that builds them.

use crate::data::bucket::{bucket_optional, GamesPlayedBucket};
use crate::data::loader::LoaderError;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

pub const PLATFORM_COLUMN: &str = "platform";
pub const REGION_COLUMN: &str = "region";
pub const GAMES_PLAYED_COLUMN: &str = "games_played";
pub const SKILL_LAST_COLUMN: &str = "skill_last";
pub const ITEMS_CRAFTED_COLUMN: &str = "items_crafted";
pub const DOLLARS_SPENT_COLUMN: &str = "dollars_spent";

/// Accepted timestamp layouts, tried in order.
const DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// One normalized row of the event dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub platform: String,
    pub region: String,
    pub games_played: Option<i64>,
    pub skill_last: Option<f64>,
    pub items_crafted: Option<i64>,
    pub dollars_spent: Option<f64>,
    pub games_played_bucket: GamesPlayedBucket,
}

impl Record {
    /// Build a record, deriving the games-played bucket.
    pub fn new(
        timestamp: NaiveDateTime,
        platform: impl Into<String>,
        region: impl Into<String>,
        games_played: Option<i64>,
        skill_last: Option<f64>,
        items_crafted: Option<i64>,
        dollars_spent: Option<f64>,
    ) -> Self {
        Self {
            timestamp,
            platform: platform.into(),
            region: region.into(),
            games_played,
            skill_last,
            items_crafted,
            dollars_spent,
            games_played_bucket: bucket_optional(games_played),
        }
    }
}

/// Raw text cells of one CSV row, before coercion.
#[derive(Debug, Default)]
pub(crate) struct RawRow<'a> {
    pub timestamp: Option<&'a str>,
    pub platform: Option<&'a str>,
    pub region: Option<&'a str>,
    pub games_played: Option<&'a str>,
    pub skill_last: Option<&'a str>,
    pub items_crafted: Option<&'a str>,
    pub dollars_spent: Option<&'a str>,
}

impl RawRow<'_> {
    /// Coerce text cells into a [`Record`]. `row` is the 1-based data row.
    pub(crate) fn coerce(&self, timestamp_column: &str, row: usize) -> Result<Record, LoaderError> {
        let timestamp = parse_timestamp(self.timestamp, timestamp_column, row)?;
        Ok(Record::new(
            timestamp,
            text(self.platform),
            text(self.region),
            parse_integer(self.games_played, GAMES_PLAYED_COLUMN, row)?,
            parse_float(self.skill_last, SKILL_LAST_COLUMN, row)?,
            parse_integer(self.items_crafted, ITEMS_CRAFTED_COLUMN, row)?,
            parse_float(self.dollars_spent, DOLLARS_SPENT_COLUMN, row)?,
        ))
    }
}

fn non_empty(cell: Option<&str>) -> Option<&str> {
    cell.map(str::trim).filter(|s| !s.is_empty())
}

fn text(cell: Option<&str>) -> String {
    non_empty(cell).unwrap_or_default().to_string()
}

fn coercion_error(column: &str, row: usize, value: &str) -> LoaderError {
    LoaderError::TypeCoercion {
        column: column.to_string(),
        row,
        value: value.to_string(),
    }
}

/// Parse a timestamp cell. Missing timestamps are an error, not a skip.
pub fn parse_timestamp(
    cell: Option<&str>,
    column: &str,
    row: usize,
) -> Result<NaiveDateTime, LoaderError> {
    let value = non_empty(cell).ok_or_else(|| coercion_error(column, row, ""))?;

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|fmt| {
                chrono::NaiveDate::parse_from_str(value, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
        // Offset-qualified stamps are normalized to UTC.
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .ok_or_else(|| coercion_error(column, row, value))
}

fn parse_float(cell: Option<&str>, column: &str, row: usize) -> Result<Option<f64>, LoaderError> {
    let Some(value) = non_empty(cell) else {
        return Ok(None);
    };
    match value.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(coercion_error(column, row, value)),
    }
}

/// Integer columns may arrive as integral floats ("3.0") when the producer
/// wrote them alongside missing values.
fn parse_integer(cell: Option<&str>, column: &str, row: usize) -> Result<Option<i64>, LoaderError> {
    let Some(value) = non_empty(cell) else {
        return Ok(None);
    };
    if let Ok(v) = value.parse::<i64>() {
        return Ok(Some(v));
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(Some(v as i64)),
        _ => Err(coercion_error(column, row, value)),
    }
}

/// The full in-memory collection of records, in source row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records per games-played bucket. Every label is present.
    pub fn bucket_counts(&self) -> BTreeMap<GamesPlayedBucket, usize> {
        let mut counts: BTreeMap<GamesPlayedBucket, usize> =
            GamesPlayedBucket::ALL.iter().map(|&b| (b, 0)).collect();
        for record in &self.records {
            *counts.entry(record.games_played_bucket).or_default() += 1;
        }
        counts
    }
}
