use crate::config::LoaderOptions;
use crate::data::export::to_csv_bytes;
use crate::data::filter::{
    filter_range, value_domain, FilterOutcome, FilterRange, FilterWarning, ValueDomain,
};
use crate::data::loader::load_bytes;
use crate::data::model::NormalizedSeries;
use crate::data::stats::{summary, Stats};
use crate::error::{LoaderError, Result, Severity};

// ---------------------------------------------------------------------------
// Upload tickets
// ---------------------------------------------------------------------------

/// Handle for an upload in flight. Only the newest ticket may install its
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Everything one user session holds between uploads.
pub struct Session {
    pub options: LoaderOptions,

    /// The most recently loaded series (None until an upload succeeds).
    pub series: Option<NormalizedSeries>,

    /// Active value filter.
    pub filter: FilterRange,

    /// Warning produced by the last filter run, if any.
    pub filter_warning: Option<FilterWarning>,

    /// Status / error message for the presentation layer.
    pub status_message: Option<String>,

    /// Severity of the error behind `status_message`.
    pub status_severity: Option<Severity>,

    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(LoaderOptions::default())
    }
}

impl Session {
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            options,
            series: None,
            filter: FilterRange::default(),
            filter_warning: None,
            status_message: None,
            status_severity: None,
            generation: 0,
        }
    }

    /// Start a new upload. Any ticket handed out earlier becomes stale.
    pub fn begin_upload(&mut self) -> UploadTicket {
        self.generation += 1;
        UploadTicket {
            generation: self.generation,
        }
    }

    /// Install the result of an upload. Returns `false` and drops the result
    /// when a newer upload has started since `ticket` was issued.
    pub fn complete_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<NormalizedSeries>,
    ) -> bool {
        if ticket.generation != self.generation {
            log::debug!(
                "Discarding stale upload {} (current is {})",
                ticket.generation,
                self.generation
            );
            return false;
        }

        match result {
            Ok(series) => {
                self.set_series(series);
            }
            Err(e) => self.fail_upload(&e),
        }
        true
    }

    /// Parse and normalize an upload synchronously, replacing the current
    /// series. On failure the series is cleared, the status is set and the
    /// typed error is handed back.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<&NormalizedSeries> {
        self.begin_upload();
        match load_bytes(bytes, &self.options) {
            Ok(series) => Ok(self.set_series(series)),
            Err(e) => {
                self.fail_upload(&e);
                Err(e)
            }
        }
    }

    /// Replace the current series wholesale and reset the filter.
    pub fn set_series(&mut self, series: NormalizedSeries) -> &NormalizedSeries {
        log::info!(
            "Loaded {} rows from column {:?}",
            series.len(),
            series.source_column
        );
        self.filter = FilterRange::default();
        self.filter_warning = None;
        self.status_message = None;
        self.status_severity = None;
        self.series.insert(series)
    }

    fn fail_upload(&mut self, error: &LoaderError) {
        self.series = None;
        self.filter = FilterRange::default();
        self.filter_warning = None;
        self.report(error);
    }

    /// Turn an error into the message shown to the user.
    pub fn report(&mut self, error: &LoaderError) {
        log::error!("Failed to process upload: {error}");
        self.status_message = Some(format!("Error processing the file: {error}"));
        self.status_severity = Some(error.severity());
    }

    fn current(&self) -> Result<&NormalizedSeries> {
        self.series.as_ref().ok_or(LoaderError::NoNumericColumn)
    }

    /// Statistics of the loaded series.
    pub fn summary(&self) -> Result<Stats> {
        summary(self.current()?)
    }

    /// Slider bounds for the loaded series.
    pub fn value_domain(&self) -> Result<Option<ValueDomain>> {
        value_domain(self.current()?)
    }

    /// Set the active filter range.
    pub fn set_filter(&mut self, lower: Option<f64>, upper: Option<f64>) {
        self.filter = FilterRange::new(lower, upper);
    }

    /// Apply the active filter to the loaded series.
    pub fn filtered(&mut self) -> Result<FilterOutcome> {
        let outcome = filter_range(self.current()?, self.filter.lower, self.filter.upper)?;
        self.filter_warning = outcome.warning;
        Ok(outcome)
    }

    /// The filtered series as CSV bytes, ready for download.
    pub fn export_filtered(&mut self) -> Result<Vec<u8>> {
        let outcome = self.filtered()?;
        to_csv_bytes(&outcome.series, &self.options.time_column)
    }
}
