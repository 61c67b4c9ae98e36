use std::fmt;

use chrono::NaiveDateTime;

use crate::error::{LoaderError, Result};

// ---------------------------------------------------------------------------
// Value – a single cell of the measured column
// ---------------------------------------------------------------------------

/// Cell contents that read as "no value".
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

/// A cell after type inference.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Infer the type of a raw CSV cell.
    pub fn guess(raw: &str) -> Value {
        let s = raw.trim();
        if NA_TOKENS.contains(&s) {
            return Value::Missing;
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_nan() => Value::Missing,
            Ok(f) => Value::Number(f),
            Err(_) => Value::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Missing => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – the parsed CSV, untyped
// ---------------------------------------------------------------------------

/// One column of the parsed CSV, cells kept as text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub values: Vec<String>,
}

impl RawColumn {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Whether every non-missing cell parses as a number and at least one does.
    pub fn is_numeric(&self) -> bool {
        let mut seen_number = false;
        for cell in &self.values {
            match Value::guess(cell) {
                Value::Number(_) => seen_number = true,
                Value::Missing => {}
                Value::Text(_) => return false,
            }
        }
        seen_number
    }
}

/// The uploaded CSV as columns in header order. Names are unique and every
/// column has the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    columns: Vec<RawColumn>,
    height: usize,
}

impl RawTable {
    /// Build a table, checking the column invariants.
    pub fn from_columns(columns: Vec<RawColumn>) -> Result<Self> {
        let height = columns.first().map(|c| c.values.len()).unwrap_or(0);
        for (i, col) in columns.iter().enumerate() {
            if col.values.len() != height {
                return Err(LoaderError::Parse(format!(
                    "column '{}' has {} rows, expected {height}",
                    col.name,
                    col.values.len()
                )));
            }
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(LoaderError::Parse(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }
        Ok(Self { columns, height })
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<RawColumn> {
        self.columns
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

// ---------------------------------------------------------------------------
// NormalizedSeries – the loader's output
// ---------------------------------------------------------------------------

/// A single-variable series, optionally keyed by timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    /// Canonical label of the measured column. `None` when the file had only
    /// a time column.
    pub variable_name: Option<String>,
    /// Header the measured column had in the upload.
    pub source_column: Option<String>,
    /// One value per row, aligned with `time_index`.
    pub values: Vec<Value>,
    /// Parsed timestamps in file order, when a time column was present.
    pub time_index: Option<Vec<NaiveDateTime>>,
    /// Columns that were neither the time column nor the measured one.
    /// Kept row-aligned but ignored by statistics and filtering.
    pub extra_columns: Vec<RawColumn>,
}

impl NormalizedSeries {
    /// Number of rows.
    pub fn len(&self) -> usize {
        match &self.time_index {
            Some(index) => index.len(),
            None => self.values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_variable(&self) -> bool {
        self.variable_name.is_some()
    }

    /// The measured values as numbers, `None` for missing cells.
    ///
    /// This is where numeric coercion actually happens: the loader accepts
    /// any column, only numeric views require this to succeed.
    pub fn numeric_values(&self) -> Result<Vec<Option<f64>>> {
        if !self.has_variable() {
            return Err(LoaderError::NoNumericColumn);
        }
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Value::Number(f) => Ok(Some(*f)),
                Value::Missing => Ok(None),
                Value::Text(s) => Err(LoaderError::TypeCoercion {
                    row: i + 1,
                    value: s.clone(),
                }),
            })
            .collect()
    }

    /// A new series holding only the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> NormalizedSeries {
        let values = if self.has_variable() {
            rows.iter().map(|&i| self.values[i].clone()).collect()
        } else {
            Vec::new()
        };
        NormalizedSeries {
            variable_name: self.variable_name.clone(),
            source_column: self.source_column.clone(),
            values,
            time_index: self
                .time_index
                .as_ref()
                .map(|index| rows.iter().map(|&i| index[i]).collect()),
            extra_columns: self
                .extra_columns
                .iter()
                .map(|c| {
                    let values = rows.iter().map(|&i| c.values[i].clone()).collect();
                    RawColumn::new(c.name.clone(), values)
                })
                .collect(),
        }
    }
}
