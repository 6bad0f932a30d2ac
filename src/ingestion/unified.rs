//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_bytes`], which decodes an uploaded file into a
//! [`polars::prelude::DataFrame`].
//!
//! - If [`IngestionOptions::format`] is `None`, the ingestion format is inferred from the
//!   filename extension; otherwise the extension must match the requested format.
//! - If an [`super::observability::IngestionObserver`] is provided, success/failure/alerts are
//!   reported to it.

use std::error::Error as StdError;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use polars::prelude::DataFrame;
use serde::Serialize;

use crate::error::{IngestionError, IngestionResult};

use super::csv::{ingest_csv_from_bytes, CsvOptions};
use super::excel::{ingest_excel_from_bytes, ExcelOptions};
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionFormat {
    /// Delimited text.
    Csv,
    /// Spreadsheet/workbook formats.
    Excel,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        [Self::Csv, Self::Excel]
            .into_iter()
            .find(|f| f.extensions().contains(&ext.as_str()))
    }

    /// Infer the format from an upload's filename.
    pub fn from_filename(filename: &str) -> Option<Self> {
        extension_of(filename).and_then(Self::from_extension)
    }

    /// Extensions accepted for this format (lowercase, without the dot).
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Csv => &["csv"],
            Self::Excel => &["xlsx", "xls", "xlsm", "xlsb", "ods"],
        }
    }

    /// Returns true if `filename` carries one of [`Self::extensions`].
    pub fn accepts(&self, filename: &str) -> bool {
        extension_of(filename)
            .map(|ext| self.extensions().contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    fn expected_list(&self) -> String {
        self.extensions()
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn extension_of(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|s| s.to_str())
}

/// Check an upload's filename against the allow-list of `format`.
///
/// Runs before any decoding is attempted.
pub fn ensure_extension(filename: &str, format: IngestionFormat) -> IngestionResult<()> {
    if format.accepts(filename) {
        Ok(())
    } else {
        Err(IngestionError::UnsupportedExtension {
            filename: filename.to_string(),
            expected: format.expected_list(),
        })
    }
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, infer the format from the filename extension.
    pub format: Option<IngestionFormat>,
    /// CSV-specific options.
    pub csv: CsvOptions,
    /// Excel-specific options.
    pub excel: ExcelOptions,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("csv", &self.csv)
            .field("excel", &self.excel)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            csv: CsvOptions::default(),
            excel: ExcelOptions::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Unified ingestion entry point for uploaded content.
///
/// `filename` is only used for the extension check and for observer context.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row/column count stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```
/// use sheet_preview::ingestion::{ingest_from_bytes, IngestionOptions};
///
/// # fn main() -> Result<(), sheet_preview::IngestionError> {
/// let df = ingest_from_bytes("data.csv", b"Zeit,Wert\n1,3.5\n2,4.1\n", &IngestionOptions::default())?;
/// assert_eq!(df.shape(), (2, 2));
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_bytes(filename: &str, bytes: &[u8], options: &IngestionOptions) -> IngestionResult<DataFrame> {
    let fmt = match options.format {
        Some(f) => f,
        None => IngestionFormat::from_filename(filename).ok_or_else(|| IngestionError::UnsupportedExtension {
            filename: filename.to_string(),
            expected: [IngestionFormat::Csv, IngestionFormat::Excel]
                .iter()
                .map(IngestionFormat::expected_list)
                .collect::<Vec<_>>()
                .join(", "),
        })?,
    };

    let ctx = IngestionContext {
        filename: filename.to_string(),
        format: fmt,
        bytes: bytes.len(),
    };

    let result = ensure_extension(filename, fmt).and_then(|()| match fmt {
        IngestionFormat::Csv => ingest_csv_from_bytes(bytes, &options.csv),
        IngestionFormat::Excel => ingest_excel_from_bytes(bytes, &options.excel),
    });

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(df) => obs.on_success(
                &ctx,
                IngestionStats {
                    rows: df.height(),
                    columns: df.width(),
                },
            ),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::UnsupportedExtension { .. } => IngestionSeverity::Warning,
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        IngestionError::Excel(err) => {
            // Workbook readers wrap I/O errors at different depths.
            if error_chain_contains_io(err) {
                IngestionSeverity::Critical
            } else {
                IngestionSeverity::Error
            }
        }
        IngestionError::Polars(_) => IngestionSeverity::Error,
        IngestionError::Encoding { .. } => IngestionSeverity::Error,
        IngestionError::InvalidLayout { .. } => IngestionSeverity::Error,
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

/// An owned ingestion job: upload content plus the options to decode it with.
///
/// Request handlers build one of these on the async side and run it on a blocking thread.
#[derive(Clone)]
pub struct IngestionRequest {
    /// Filename supplied with the upload.
    pub filename: String,
    /// Uploaded content.
    pub bytes: Vec<u8>,
    /// Options controlling ingestion.
    pub options: IngestionOptions,
}

impl fmt::Debug for IngestionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionRequest")
            .field("filename", &self.filename)
            .field("bytes", &self.bytes.len())
            .field("options", &self.options)
            .finish()
    }
}

impl IngestionRequest {
    /// Execute the request by calling [`ingest_from_bytes`].
    pub fn run(&self) -> IngestionResult<DataFrame> {
        ingest_from_bytes(&self.filename, &self.bytes, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_filename_is_case_insensitive() {
        assert_eq!(IngestionFormat::from_filename("a.CSV"), Some(IngestionFormat::Csv));
        assert_eq!(IngestionFormat::from_filename("report.Xlsx"), Some(IngestionFormat::Excel));
        assert_eq!(IngestionFormat::from_filename("legacy.xls"), Some(IngestionFormat::Excel));
        assert_eq!(IngestionFormat::from_filename("data.txt"), None);
        assert_eq!(IngestionFormat::from_filename("noext"), None);
    }

    #[test]
    fn ensure_extension_rejects_other_formats() {
        let err = ensure_extension("data.txt", IngestionFormat::Excel).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("data.txt"));
        assert!(msg.contains(".xlsx, .xls"));
        assert!(ensure_extension("data.csv", IngestionFormat::Excel).is_err());
        assert!(ensure_extension("data.xlsx", IngestionFormat::Excel).is_ok());
    }

    #[test]
    fn forced_format_still_checks_extension() {
        let opts = IngestionOptions {
            format: Some(IngestionFormat::Excel),
            ..Default::default()
        };
        let err = ingest_from_bytes("data.txt", b"irrelevant", &opts).unwrap_err();
        assert!(matches!(err, IngestionError::UnsupportedExtension { .. }));
    }

    #[test]
    fn unsupported_extension_is_a_warning() {
        let err = IngestionError::UnsupportedExtension {
            filename: "x".to_string(),
            expected: ".csv".to_string(),
        };
        assert_eq!(severity_for_error(&err), IngestionSeverity::Warning);
    }
}
