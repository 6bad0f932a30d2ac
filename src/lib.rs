//! `sheet-preview` turns an uploaded spreadsheet or CSV file into a small JSON preview: the row
//! count, normalized column names, an inferred dtype per column, and the first rows.
//!
//! The crate is split the same way a request flows through it:
//!
//! - [`ingestion`]: decode uploaded bytes (CSV with a caller-chosen separator and encoding, or an
//!   Excel/ODS workbook with a chosen sheet and header row) into a polars
//!   [`DataFrame`](polars::prelude::DataFrame) with inferred column types
//! - [`processing`]: normalize column names, apply an optional column mapping, drop fully-empty
//!   rows, and build the [`processing::PreviewReport`]
//! - [`service`]: the actix-web HTTP surface (`/health`, `/parse-excel`, `/parse-csv`)
//! - [`types`]: column labels and dtype names of the decoded frame
//! - [`error`]: error types shared by ingestion and processing
//!
//! ## Decoding and previewing without HTTP
//!
//! ```rust
//! use sheet_preview::ingestion::{ingest_from_bytes, IngestionOptions};
//! use sheet_preview::processing::{run_pipeline, ColumnMapping};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let csv = b"Sample ID,Mass (g)\nA-1,1.5\n,\nA-2,2.25\n";
//! let df = ingest_from_bytes("masses.csv", csv, &IngestionOptions::default())?;
//!
//! let mapping = ColumnMapping::from_json_str(r#"{"sample_id": "id"}"#)?;
//! let report = run_pipeline(df, &mapping)?;
//! assert_eq!(report.rows, 2);
//! assert_eq!(report.columns, vec!["id", "mass_(g)"]);
//! assert_eq!(report.dtypes["mass_(g)"], "f64");
//! # Ok(())
//! # }
//! ```
//!
//! ## Missing values
//!
//! Empty cells and the usual missing-value markers in text (`NA`, `N/A`, `NaN`, `null`, ...)
//! decode to nulls and are rendered as JSON `null`.

pub mod error;
pub mod ingestion;
pub mod processing;
pub mod service;
pub mod types;

pub use error::{ConfigError, IngestionError, IngestionResult, MappingError};
