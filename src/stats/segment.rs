//! Event Segments
//! Inclusive date-range windows and the stable filter that cuts a dataset into segments.

use crate::data::Record;
use crate::stats::NumericField;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A named promotional period with inclusive bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWindow {
    pub name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl EventWindow {
    pub fn new(name: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    /// 2017-01-24 through 2017-02-14.
    pub fn event_1() -> Self {
        Self::new("Event 1", midnight(2017, 1, 24), midnight(2017, 2, 14))
    }

    /// 2017-02-28 through 2017-03-21.
    pub fn event_2() -> Self {
        Self::new("Event 2", midnight(2017, 2, 28), midnight(2017, 3, 21))
    }

    /// Both default windows, in order.
    pub fn defaults() -> Vec<Self> {
        vec![Self::event_1(), Self::event_2()]
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// The records of a dataset falling inside one window, in dataset order.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub window: EventWindow,
    records: Vec<Record>,
}

impl Segment {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Non-missing values of a numeric field.
    pub fn values(&self, field: NumericField) -> Vec<f64> {
        self.records.iter().filter_map(|r| field.value(r)).collect()
    }
}

/// Stable filter: every record whose timestamp lies within `window`.
///
/// Windows are applied independently, so a record may belong to several
/// segments when windows overlap.
pub fn segment(records: &[Record], window: &EventWindow) -> Segment {
    Segment {
        window: window.clone(),
        records: records
            .iter()
            .filter(|r| window.contains(r.timestamp))
            .cloned()
            .collect(),
    }
}
