//! Grouped Means
//! Region x platform mean spend table for the heatmap.

use crate::data::Record;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Sparse two-dimensional mean table. Rows are regions, columns platforms,
/// both sorted. Groups without members have no cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeanTable {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    cells: BTreeMap<String, BTreeMap<String, f64>>,
}

impl MeanTable {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        self.cells.get(row).and_then(|r| r.get(column)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of populated cells.
    pub fn cell_count(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    /// Smallest and largest cell values, if any.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.cells
            .values()
            .flat_map(|r| r.values().copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

/// Arithmetic mean of `dollars_spent` per (region, platform).
///
/// Records with a missing spend or a blank region/platform are left out,
/// the same way missing keys and values drop out of a grouped mean.
pub fn mean_by_group(records: &[Record]) -> MeanTable {
    let mut groups: BTreeMap<(&str, &str), Accumulator> = BTreeMap::new();

    for record in records {
        let Some(spent) = record.dollars_spent.filter(|v| v.is_finite()) else {
            continue;
        };
        if record.region.is_empty() || record.platform.is_empty() {
            continue;
        }
        let acc = groups
            .entry((record.region.as_str(), record.platform.as_str()))
            .or_default();
        acc.sum += spent;
        acc.count += 1;
    }

    let mut rows = BTreeSet::new();
    let mut columns = BTreeSet::new();
    let mut cells: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();

    for ((region, platform), acc) in groups {
        rows.insert(region.to_string());
        columns.insert(platform.to_string());
        cells
            .entry(region.to_string())
            .or_default()
            .insert(platform.to_string(), acc.sum / acc.count as f64);
    }

    MeanTable {
        rows: rows.into_iter().collect(),
        columns: columns.into_iter().collect(),
        cells,
    }
}
