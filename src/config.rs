use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Label every selected measured column is renamed to.
pub const CANONICAL_NAME: &str = "variable";

/// Header that marks the timestamp column (case-sensitive).
pub const TIME_COLUMN: &str = "Time";

/// Default file name offered for the filtered export.
pub const DEFAULT_EXPORT_NAME: &str = "datos_filtrados.csv";

// ---------------------------------------------------------------------------
// Column selection strategy
// ---------------------------------------------------------------------------

/// How the measured column is picked out of the uploaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariableStrategy {
    /// First column after the time column, or the first column overall when
    /// there is no time column. Numeric-ness is not checked.
    #[default]
    FirstColumn,
    /// First column whose values are all numeric.
    FirstNumeric,
    /// A column chosen by the caller.
    Column(String),
}

// ---------------------------------------------------------------------------
// Static site information
// ---------------------------------------------------------------------------

/// Fixed geographic point shown next to the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteLocation {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level.
    pub altitude: Option<f64>,
}

impl Default for SiteLocation {
    fn default() -> Self {
        Self {
            label: "Universidad EAFIT".to_string(),
            latitude: 6.2006,
            longitude: -75.5783,
            altitude: Some(1495.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Loader options
// ---------------------------------------------------------------------------

/// Options for one upload. Every field has a default, so a JSON file only
/// needs to mention what it overrides:
///
/// ```json
/// { "strategy": { "column": "Humidity" }, "delimiter": ";" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    pub canonical_name: String,
    pub time_column: String,
    pub delimiter: char,
    pub strategy: VariableStrategy,
    pub site: SiteLocation,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            canonical_name: CANONICAL_NAME.to_string(),
            time_column: TIME_COLUMN.to_string(),
            delimiter: ',',
            strategy: VariableStrategy::default(),
            site: SiteLocation::default(),
        }
    }
}

impl LoaderOptions {
    /// Read options from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Delimiter as the single byte the CSV reader expects. Non-ASCII
    /// delimiters fall back to a comma.
    pub(crate) fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            log::warn!("Delimiter {:?} is not ASCII, using ','", self.delimiter);
            b','
        }
    }
}
