//! Event Report
//! Assembles segments, densities, comparisons and the mean spend table from a
//! loaded dataset, and writes them out as charts and a JSON summary.

use crate::charts::{ChartRenderer, DensityPair, RenderError};
use crate::data::{Dataset, GamesPlayedBucket};
use crate::stats::{
    compare_segments, distributions, mean_by_group, segment, DensityEstimate, EventWindow,
    FieldComparison, MeanTable, NumericField,
};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DISTRIBUTIONS_FILE: &str = "distributions.png";
pub const HEATMAP_FILE: &str = "heatmap.png";
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub window: EventWindow,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
struct DensitySummary<'a> {
    field: NumericField,
    window: &'a str,
    #[serde(flatten)]
    estimate: EstimateSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EstimateSummary {
    Empty,
    Degenerate { value: f64, count: usize },
    Curve { count: usize, bandwidth: f64 },
}

impl From<&DensityEstimate> for EstimateSummary {
    fn from(estimate: &DensityEstimate) -> Self {
        match estimate {
            DensityEstimate::Empty => EstimateSummary::Empty,
            DensityEstimate::Degenerate { value, count } => EstimateSummary::Degenerate {
                value: *value,
                count: *count,
            },
            DensityEstimate::Curve(curve) => EstimateSummary::Curve {
                count: curve.count,
                bandwidth: curve.bandwidth,
            },
        }
    }
}

#[derive(Serialize)]
struct ReportSummary<'a> {
    total_rows: usize,
    bucket_counts: &'a BTreeMap<GamesPlayedBucket, usize>,
    segments: &'a [SegmentSummary],
    densities: Vec<DensitySummary<'a>>,
    comparisons: &'a [FieldComparison],
    mean_dollars_spent: &'a MeanTable,
}

/// Everything the presentation layer needs for one pass.
#[derive(Debug, Clone)]
pub struct EventReport {
    pub total_rows: usize,
    pub bucket_counts: BTreeMap<GamesPlayedBucket, usize>,
    pub segments: Vec<SegmentSummary>,
    pub densities: Vec<DensityPair>,
    /// Second window compared against the first.
    pub comparisons: Vec<FieldComparison>,
    pub mean_spend: MeanTable,
}

impl EventReport {
    /// Build the report for two windows over `dataset`. Recomputed on every
    /// call; nothing here is cached.
    pub fn build(dataset: &Dataset, first: &EventWindow, second: &EventWindow) -> Self {
        let seg_a = segment(dataset.records(), first);
        let seg_b = segment(dataset.records(), second);
        info!(
            "Segments: {} = {} rows, {} = {} rows",
            first.name,
            seg_a.len(),
            second.name,
            seg_b.len()
        );
        if seg_a.is_empty() || seg_b.is_empty() {
            warn!("At least one event window captured no rows");
        }

        let dens_a = distributions(&seg_a);
        let dens_b = distributions(&seg_b);
        let densities = dens_a
            .into_iter()
            .zip(dens_b)
            .map(|((field, a), (_, b))| DensityPair {
                field,
                first: (first.name.clone(), a),
                second: (second.name.clone(), b),
            })
            .collect();

        Self {
            total_rows: dataset.len(),
            bucket_counts: dataset.bucket_counts(),
            segments: vec![
                SegmentSummary {
                    window: first.clone(),
                    rows: seg_a.len(),
                },
                SegmentSummary {
                    window: second.clone(),
                    rows: seg_b.len(),
                },
            ],
            densities,
            comparisons: compare_segments(&seg_a, &seg_b),
            mean_spend: mean_by_group(dataset.records()),
        }
    }

    /// JSON summary of the report (no curve points).
    pub fn to_json(&self) -> Result<String, ReportError> {
        let densities = self
            .densities
            .iter()
            .flat_map(|pair| {
                [&pair.first, &pair.second].map(|(window, estimate)| DensitySummary {
                    field: pair.field,
                    window: window.as_str(),
                    estimate: estimate.into(),
                })
            })
            .collect();

        let summary = ReportSummary {
            total_rows: self.total_rows,
            bucket_counts: &self.bucket_counts,
            segments: &self.segments,
            densities,
            comparisons: &self.comparisons,
            mean_dollars_spent: &self.mean_spend,
        };
        Ok(serde_json::to_string_pretty(&summary)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| ReportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!("Wrote summary to {}", path.display());
        Ok(())
    }

    /// Render both charts into `dir`, returning the written paths.
    pub fn render_charts(&self, dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
        ensure_dir(dir)?;
        let distributions = dir.join(DISTRIBUTIONS_FILE);
        let heatmap = dir.join(HEATMAP_FILE);
        ChartRenderer::render_distributions(&self.densities, &distributions)?;
        ChartRenderer::render_heatmap(&self.mean_spend, &heatmap)?;
        Ok(vec![distributions, heatmap])
    }

    /// Write the JSON summary (and charts when `charts` is set) into `dir`.
    pub fn write_all(&self, dir: &Path, charts: bool) -> Result<Vec<PathBuf>, ReportError> {
        ensure_dir(dir)?;
        let summary = dir.join(SUMMARY_FILE);
        self.write_json(&summary)?;

        let mut written = vec![summary];
        if charts {
            written.extend(self.render_charts(dir)?);
        }
        Ok(written)
    }
}

fn ensure_dir(dir: &Path) -> Result<(), ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.display().to_string(),
        source,
    })
}
