//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_from_bytes`] (from [`unified`]) which:
//!
//! - validates the upload's filename extension against the requested format
//! - decodes the bytes into an [`polars::prelude::DataFrame`], inferring column types
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`excel`]

pub mod csv;
pub mod excel;
pub mod observability;
pub mod unified;

pub use self::csv::CsvOptions;
pub use excel::{ExcelOptions, ExcelSheetSelection};
pub use observability::{
    FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, TracingObserver,
};
pub use unified::{ensure_extension, ingest_from_bytes, IngestionFormat, IngestionOptions, IngestionRequest};

use crate::types::mangle_duplicate_names;

/// Turn raw header cells into unique column labels.
///
/// Blank cells become `Unnamed: {index}`; repeated labels get `.1`, `.2`, ... suffixes.
pub(crate) fn header_labels(raw: Vec<String>) -> Vec<String> {
    let named = raw
        .into_iter()
        .enumerate()
        .map(|(idx, label)| {
            if label.trim().is_empty() {
                format!("Unnamed: {idx}")
            } else {
                label
            }
        })
        .collect();
    mangle_duplicate_names(named)
}
