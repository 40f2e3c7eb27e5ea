//! Density Estimation
//! Gaussian kernel density estimates of a segment's numeric fields.

use crate::data::Record;
use crate::stats::Segment;
use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

/// Number of evaluation points along each curve.
const GRID_SIZE: usize = 200;
/// Curve extends this many bandwidths beyond the data range.
const CUT: f64 = 3.0;

/// Numeric columns that get a distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    GamesPlayed,
    SkillLast,
    ItemsCrafted,
    DollarsSpent,
}

impl NumericField {
    pub const ALL: [NumericField; 4] = [
        NumericField::GamesPlayed,
        NumericField::SkillLast,
        NumericField::ItemsCrafted,
        NumericField::DollarsSpent,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            NumericField::GamesPlayed => "games_played",
            NumericField::SkillLast => "skill_last",
            NumericField::ItemsCrafted => "items_crafted",
            NumericField::DollarsSpent => "dollars_spent",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            NumericField::GamesPlayed => "Distribution of Games Played",
            NumericField::SkillLast => "Distribution of Skill Last",
            NumericField::ItemsCrafted => "Distribution of Items Crafted",
            NumericField::DollarsSpent => "Distribution of Dollars Spent",
        }
    }

    pub fn value(self, record: &Record) -> Option<f64> {
        match self {
            NumericField::GamesPlayed => record.games_played.map(|v| v as f64),
            NumericField::SkillLast => record.skill_last,
            NumericField::ItemsCrafted => record.items_crafted.map(|v| v as f64),
            NumericField::DollarsSpent => record.dollars_spent,
        }
    }
}

/// A smoothed curve sampled on an even grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    pub bandwidth: f64,
    pub count: usize,
    /// `(x, density)` pairs in ascending `x`.
    pub points: Vec<(f64, f64)>,
}

impl DensityCurve {
    pub fn x_range(&self) -> (f64, f64) {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first.0, last.0),
            _ => (0.0, 0.0),
        }
    }

    pub fn max_density(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(0.0, f64::max)
    }
}

/// Result of estimating one field's distribution. Never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DensityEstimate {
    /// No values to estimate from.
    Empty,
    /// All values identical (including a single value); no spread to smooth.
    Degenerate { value: f64, count: usize },
    Curve(DensityCurve),
}

impl DensityEstimate {
    pub fn is_empty(&self) -> bool {
        matches!(self, DensityEstimate::Empty)
    }

    pub fn curve(&self) -> Option<&DensityCurve> {
        match self {
            DensityEstimate::Curve(curve) => Some(curve),
            _ => None,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            DensityEstimate::Empty => 0,
            DensityEstimate::Degenerate { count, .. } => *count,
            DensityEstimate::Curve(curve) => curve.count,
        }
    }
}

/// Scott's rule: `n^(-1/5) * sample standard deviation`.
pub fn scott_bandwidth(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    values.iter().std_dev() * n.powf(-0.2)
}

/// Gaussian KDE over arbitrary values.
pub fn estimate_density(values: &[f64]) -> DensityEstimate {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(&first) = values.first() else {
        return DensityEstimate::Empty;
    };

    let count = values.len();
    let bandwidth = if count > 1 {
        scott_bandwidth(&values)
    } else {
        0.0
    };

    let kernel = match Normal::new(0.0, bandwidth) {
        Ok(kernel) if bandwidth.is_finite() && bandwidth > 0.0 => kernel,
        _ => {
            return DensityEstimate::Degenerate {
                value: first,
                count,
            }
        }
    };

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lo = min - CUT * bandwidth;
    let hi = max + CUT * bandwidth;
    let step = (hi - lo) / (GRID_SIZE - 1) as f64;
    let norm = count as f64;

    let points = (0..GRID_SIZE)
        .into_par_iter()
        .map(|i| {
            let x = lo + step * i as f64;
            let density = values.iter().map(|&v| kernel.pdf(x - v)).sum::<f64>() / norm;
            (x, density)
        })
        .collect();

    DensityEstimate::Curve(DensityCurve {
        bandwidth,
        count,
        points,
    })
}

/// Density estimate of one numeric field within a segment.
pub fn distribution(segment: &Segment, field: NumericField) -> DensityEstimate {
    estimate_density(&segment.values(field))
}

/// Estimates for every numeric field, computed in parallel.
pub fn distributions(segment: &Segment) -> Vec<(NumericField, DensityEstimate)> {
    NumericField::ALL
        .par_iter()
        .map(|&field| (field, distribution(segment, field)))
        .collect()
}
