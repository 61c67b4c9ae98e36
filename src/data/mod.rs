/// Data layer: core types, loading, filtering and summaries.
///
/// Architecture:
/// ```text
///   uploaded .csv bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse → RawTable → normalize → NormalizedSeries
///   └──────────┘       (time column via `time`)
///        │
///        ▼
///   ┌──────────────────┐
///   │ NormalizedSeries  │  values, optional time index, ignored extras
///   └──────────────────┘
///        │
///   ┌────┴─────┬──────────┐
///   ▼          ▼          ▼
///  filter     stats     export
///  (range)  (describe)  (CSV out)
/// ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
pub mod time;
