use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Everything that can go wrong between an upload and the derived views.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Malformed CSV: {0}")]
    Parse(String),

    #[error("CSV payload has no header row")]
    MissingHeader,

    #[error("Row {row}: '{value}' in the time column is not a valid date/time")]
    TimeParse { row: usize, value: String },

    #[error("No numeric column found in the uploaded data")]
    NoNumericColumn,

    #[error("Row {row}: '{value}' is not numeric")]
    TypeCoercion { row: usize, value: String },

    #[error("Series has no values to summarise")]
    EmptySeries,

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for LoaderError {
    fn from(e: csv::Error) -> Self {
        LoaderError::Parse(e.to_string())
    }
}

/// How the presentation layer should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Show the message, nothing derived from this upload is available.
    Blocking,
    /// Nothing can be charted or summarised until a new file is uploaded.
    Terminal,
    /// Only the requested numeric view fails, the loaded series stays usable.
    View,
}

impl LoaderError {
    pub fn severity(&self) -> Severity {
        match self {
            LoaderError::NoNumericColumn => Severity::Terminal,
            LoaderError::TypeCoercion { .. } | LoaderError::EmptySeries => Severity::View,
            _ => Severity::Blocking,
        }
    }
}

pub type Result<T, E = LoaderError> = std::result::Result<T, E>;
