use serde::Serialize;

use super::model::NormalizedSeries;
use crate::error::{LoaderError, Result};

/// Descriptive statistics of the measured values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

/// Summarise the non-missing values of a series.
pub fn summary(series: &NormalizedSeries) -> Result<Stats> {
    let values: Vec<f64> = series.numeric_values()?.into_iter().flatten().collect();
    describe(&values)
}

/// Compute [`Stats`] for a slice of values.
pub fn describe(values: &[f64]) -> Result<Stats> {
    let n = values.len();
    if n == 0 {
        return Err(LoaderError::EmptySeries);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = values.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    });

    Ok(Stats {
        count: n,
        mean,
        std,
        min: sorted[0],
        p25: percentile(&sorted, 25.0),
        p50: percentile(&sorted, 50.0),
        p75: percentile(&sorted, 75.0),
        max: sorted[n - 1],
    })
}

/// Percentile of sorted, non-empty data with linear interpolation between
/// closest ranks.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(n - 1);
    let frac = rank - lower as f64;

    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}
