use serde::{Deserialize, Serialize};

use super::model::NormalizedSeries;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Filter predicate: an open interval over the measured values
// ---------------------------------------------------------------------------

/// Value range to keep. A missing bound means "unbounded" on that side.
/// Both bounds are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterRange {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl FilterRange {
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self { lower, upper }
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// Whether a single cell passes. Missing cells only pass an unbounded
    /// range, since any comparison with them is false.
    pub fn contains(&self, value: Option<f64>) -> bool {
        match value {
            Some(v) => {
                self.lower.map_or(true, |lo| lo < v) && self.upper.map_or(true, |hi| v < hi)
            }
            None => self.is_unbounded(),
        }
    }
}

/// Non-fatal conditions reported alongside a filter result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterWarning {
    /// Every value equals `value`, so the filter was skipped.
    DegenerateRange { value: f64 },
}

impl std::fmt::Display for FilterWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterWarning::DegenerateRange { value } => {
                write!(f, "All values are equal ({value:.2}), showing every row")
            }
        }
    }
}

/// Result of [`filter_range`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub series: NormalizedSeries,
    pub warning: Option<FilterWarning>,
}

// ---------------------------------------------------------------------------
// Value domain (slider bounds)
// ---------------------------------------------------------------------------

/// Extent of the measured values, used to seed range controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueDomain {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl ValueDomain {
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

/// Min, max and mean of the non-missing values; `None` when there are none.
pub fn value_domain(series: &NormalizedSeries) -> Result<Option<ValueDomain>> {
    let numbers: Vec<f64> = series.numeric_values()?.into_iter().flatten().collect();
    if numbers.is_empty() {
        return Ok(None);
    }
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
    Ok(Some(ValueDomain { min, max, mean }))
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Return indices of rows whose value lies strictly inside `range`.
pub fn filtered_indices(series: &NormalizedSeries, range: &FilterRange) -> Result<Vec<usize>> {
    Ok(series
        .numeric_values()?
        .into_iter()
        .enumerate()
        .filter(|(_, v)| range.contains(*v))
        .map(|(i, _)| i)
        .collect())
}

/// Keep only rows with `lower < value < upper`. The input is not modified.
///
/// When every value is equal the range is meaningless: the full series is
/// returned together with [`FilterWarning::DegenerateRange`].
pub fn filter_range(
    series: &NormalizedSeries,
    lower: Option<f64>,
    upper: Option<f64>,
) -> Result<FilterOutcome> {
    let range = FilterRange::new(lower, upper);

    if let Some(domain) = value_domain(series)? {
        if domain.is_degenerate() {
            let warning = FilterWarning::DegenerateRange { value: domain.min };
            log::warn!("{warning}");
            return Ok(FilterOutcome {
                series: series.clone(),
                warning: Some(warning),
            });
        }
    }

    let rows = filtered_indices(series, &range)?;
    log::debug!(
        "Filter {:?}..{:?} kept {} of {} rows",
        range.lower,
        range.upper,
        rows.len(),
        series.len()
    );
    Ok(FilterOutcome {
        series: series.select_rows(&rows),
        warning: None,
    })
}
