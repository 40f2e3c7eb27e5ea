//! Statistics module - event segments, densities, grouped means and comparisons

mod comparison;
mod density;
mod grouping;
mod segment;

pub use comparison::{
    compare_field, compare_segments, summarize, welch_test, FieldComparison, FieldSummary,
    WelchTest, SIGNIFICANCE_LEVEL,
};
pub use density::{
    distribution, distributions, estimate_density, scott_bandwidth, DensityCurve,
    DensityEstimate, NumericField,
};
pub use grouping::{mean_by_group, MeanTable};
pub use segment::{segment, EventWindow, Segment};
