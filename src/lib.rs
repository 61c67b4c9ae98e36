//! Tidy time-series loader for uploaded sensor CSV files.
//!
//! An upload is parsed into a [`RawTable`], then normalized into a
//! [`NormalizedSeries`]: an optional `Time` index plus one measured column
//! relabelled `variable`. Statistics, range filtering and CSV export work on
//! that series. [`Session`] holds the most recent upload for one user.

pub mod config;
pub mod data;
pub mod error;
pub mod state;

pub use config::{LoaderOptions, SiteLocation, VariableStrategy};
pub use data::export::{to_csv_bytes, write_csv, write_csv_file};
pub use data::filter::{
    filter_range, value_domain, FilterOutcome, FilterRange, FilterWarning, ValueDomain,
};
pub use data::loader::{
    load_bytes, load_file, normalize, normalize_with, parse, parse_with, select_variable,
    select_variable_with,
};
pub use data::model::{NormalizedSeries, RawColumn, RawTable, Value};
pub use data::stats::{summary, Stats};
pub use error::{LoaderError, Severity};
pub use state::{Session, UploadTicket};
