//! Segment Comparison
//! Per-field summaries of two segments and a Welch test on their means.

use crate::stats::{NumericField, Segment};
use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Two-tailed p-value below which a shift counts as significant.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Summary of one field's values inside one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub p05: f64,
    pub p95: f64,
}

/// `None` for an empty sample. A single value has zero spread.
pub fn summarize(values: &[f64]) -> Option<FieldSummary> {
    if values.is_empty() {
        return None;
    }
    let std_dev = if values.len() > 1 {
        values.iter().std_dev()
    } else {
        0.0
    };
    let mut data = Data::new(values.to_vec());

    Some(FieldSummary {
        count: values.len(),
        mean: values.iter().mean(),
        std_dev,
        median: data.median(),
        p05: data.percentile(5),
        p95: data.percentile(95),
    })
}

/// Outcome of Welch's unequal-variance t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WelchTest {
    pub t: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
}

impl WelchTest {
    pub fn is_significant(&self) -> bool {
        self.p_value <= SIGNIFICANCE_LEVEL
    }
}

/// Sample size, mean and squared standard error of one side.
struct Moments {
    n: f64,
    mean: f64,
    sq_err: f64,
}

impl Moments {
    fn of(values: &[f64]) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }
        let n = values.len() as f64;
        Some(Self {
            n,
            mean: values.iter().mean(),
            sq_err: values.iter().variance() / n,
        })
    }
}

/// Test whether `comparison` shifts away from `baseline`. `None` when either
/// side has fewer than two values or neither side varies.
fn welch(baseline: &[f64], comparison: &[f64]) -> Option<WelchTest> {
    let base = Moments::of(baseline)?;
    let other = Moments::of(comparison)?;

    let pooled = base.sq_err + other.sq_err;
    if !(pooled > 0.0) {
        return None;
    }
    let t = (other.mean - base.mean) / pooled.sqrt();
    let dof = pooled.powi(2)
        / (base.sq_err.powi(2) / (base.n - 1.0) + other.sq_err.powi(2) / (other.n - 1.0));

    let dist = StudentsT::new(0.0, 1.0, dof).ok()?;
    Some(WelchTest {
        t,
        degrees_of_freedom: dof,
        p_value: 2.0 * dist.sf(t.abs()),
    })
}

/// Welch test of one field between two segments.
pub fn welch_test(baseline: &Segment, comparison: &Segment, field: NumericField) -> Option<WelchTest> {
    welch(&baseline.values(field), &comparison.values(field))
}

/// One field across a baseline segment and a comparison segment.
#[derive(Debug, Clone, Serialize)]
pub struct FieldComparison {
    pub field: NumericField,
    pub baseline: Option<FieldSummary>,
    pub comparison: Option<FieldSummary>,
    /// Mean shift in baseline standard deviations.
    pub effect_size: Option<f64>,
    pub test: Option<WelchTest>,
    pub significant: bool,
}

pub fn compare_field(baseline: &Segment, comparison: &Segment, field: NumericField) -> FieldComparison {
    let base_values = baseline.values(field);
    let other_values = comparison.values(field);

    let base = summarize(&base_values);
    let other = summarize(&other_values);
    let effect_size = match (&base, &other) {
        (Some(b), Some(o)) if b.std_dev > 0.0 => Some((o.mean - b.mean) / b.std_dev),
        _ => None,
    };
    let test = welch(&base_values, &other_values);

    FieldComparison {
        field,
        baseline: base,
        comparison: other,
        effect_size,
        significant: test.is_some_and(|t| t.is_significant()),
        test,
    }
}

/// Compare every numeric field, in parallel.
pub fn compare_segments(baseline: &Segment, comparison: &Segment) -> Vec<FieldComparison> {
    NumericField::ALL
        .par_iter()
        .map(|&field| compare_field(baseline, comparison, field))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::stats::{segment, EventWindow};
    use chrono::NaiveDate;

    fn spend_on(month: u32, day: u32, dollars: f64) -> Record {
        let ts = NaiveDate::from_ymd_opt(2017, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Record::new(ts, "PC", "NA", Some(4), Some(1500.0), Some(1), Some(dollars))
    }

    #[test]
    fn test_summarize_basic() {
        let s = summarize(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert!((s.median - 2.5).abs() < 1e-12);
        assert!((s.std_dev - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!(s.p05 >= 1.0 && s.p05 < s.median);
        assert!(s.p95 <= 4.0 && s.p95 > s.median);
    }

    #[test]
    fn test_summarize_empty_and_single() {
        assert!(summarize(&[]).is_none());

        let one = summarize(&[7.0]).unwrap();
        assert_eq!(one.count, 1);
        assert_eq!(one.std_dev, 0.0);
        assert!((one.median - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_welch_needs_two_values_and_spread() {
        assert!(welch(&[1.0], &[1.0, 2.0]).is_none());
        assert!(welch(&[2.0, 2.0], &[2.0, 2.0]).is_none());
    }

    #[test]
    fn test_welch_detects_clear_shift() {
        let base: Vec<f64> = (0..30).map(|i| 1.0 + (i % 5) as f64).collect();
        let high: Vec<f64> = (0..30).map(|i| 100.0 + (i % 5) as f64).collect();
        let test = welch(&base, &high).unwrap();
        assert!(test.t > 0.0);
        assert!(test.p_value < 1e-6);
        assert!(test.is_significant());
    }

    #[test]
    fn test_welch_same_distribution_not_significant() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let test = welch(&a, &a).unwrap();
        assert_eq!(test.t, 0.0);
        assert!((test.p_value - 1.0).abs() < 1e-9);
        assert!(!test.is_significant());
    }

    #[test]
    fn test_welch_test_between_segments() {
        let records = vec![
            spend_on(1, 25, 1.0),
            spend_on(2, 1, 2.0),
            spend_on(2, 10, 3.0),
            spend_on(3, 1, 50.0),
            spend_on(3, 5, 52.0),
            spend_on(3, 10, 54.0),
        ];
        let e1 = segment(&records, &EventWindow::event_1());
        let e2 = segment(&records, &EventWindow::event_2());

        let test = welch_test(&e1, &e2, NumericField::DollarsSpent).unwrap();
        assert!(test.t > 0.0);
        assert!(test.is_significant());
        // games_played is constant on both sides
        assert!(welch_test(&e1, &e2, NumericField::GamesPlayed).is_none());
    }

    #[test]
    fn test_compare_segments_with_empty_side() {
        let records = vec![spend_on(2, 1, 1.0), spend_on(2, 2, 3.0)];
        let e1 = segment(&records, &EventWindow::event_1());
        let e2 = segment(&records, &EventWindow::event_2());

        let comparisons = compare_segments(&e1, &e2);
        assert_eq!(comparisons.len(), 4);
        for c in &comparisons {
            assert_eq!(c.baseline.as_ref().map(|s| s.count), Some(2));
            assert!(c.comparison.is_none());
            assert!(c.effect_size.is_none());
            assert!(c.test.is_none());
            assert!(!c.significant);
        }
    }
}
