//! In-memory transformations applied to every decoded upload.
//!
//! The processing layer operates on the [`polars::prelude::DataFrame`] produced by ingestion.
//! Stages run strictly in this order:
//!
//! 1. [`normalize_columns`]: canonical column labels
//! 2. [`apply_mapping`]: optional caller-supplied renames
//! 3. [`drop_empty_rows`]: remove rows where every cell is null
//! 4. [`preview()`]: shape, dtypes and leading rows as JSON scalars
//!
//! [`run_pipeline`] chains all four.
//!
//! ## Example
//!
//! ```rust
//! use polars::prelude::*;
//! use sheet_preview::processing::{run_pipeline, ColumnMapping};
//!
//! # fn main() -> PolarsResult<()> {
//! let df = df!("Zeit" => [1i64, 2], "Wert" => [3.5f64, 4.1])?;
//!
//! let mapping: ColumnMapping = [("zeit", "timestamp")].into_iter().collect();
//! let report = run_pipeline(df, &mapping)?;
//! assert_eq!(report.rows, 2);
//! assert_eq!(report.columns, vec!["timestamp", "wert"]);
//! assert_eq!(report.dtypes["wert"], "f64");
//! # Ok(())
//! # }
//! ```

pub mod clean;
pub mod mapping;
pub mod normalize;
pub mod preview;

pub use clean::drop_empty_rows;
pub use mapping::{apply_mapping, resolve_mapping, ColumnMapping, MappingDirection, RenamePlan};
pub use normalize::{normalize_column_name, normalize_columns};
pub use preview::{preview, to_json_scalar, PreviewReport, PREVIEW_ROWS};

use polars::prelude::{DataFrame, PolarsResult};

/// Normalize -> map -> clean -> project, with a [`PREVIEW_ROWS`]-row preview.
pub fn run_pipeline(df: DataFrame, mapping: &ColumnMapping) -> PolarsResult<PreviewReport> {
    let df = normalize_columns(df)?;
    let df = apply_mapping(df, mapping)?;
    let decoded_rows = df.height();
    let df = drop_empty_rows(df)?;
    tracing::debug!(
        decoded_rows,
        kept_rows = df.height(),
        columns = df.width(),
        "pipeline finished"
    );
    preview(&df, PREVIEW_ROWS)
}
