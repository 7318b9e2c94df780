/// Data layer: record-file types, loading, writing and event selection.
///
/// Architecture:
/// ```text
///  dir/*.parquet  (one row per event)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read file → EventFile, append → FieldSet + RunTotals
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ LoadedDataset │  per-field chunks, totals, load report
///   └───────────────┘
///
///   test file ── loader::load_modes ──▶ filter::group_by_mode ──▶ per-mode indices
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;
