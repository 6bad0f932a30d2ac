use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::IngestionError;

use super::unified::IngestionFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (rejected before decoding, e.g. wrong file type).
    Warning,
    /// Error-level event (decoding failed).
    Error,
    /// Critical error (I/O failures inside the decoders).
    Critical,
}

/// Context about an ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Filename supplied with the upload.
    pub filename: String,
    /// Format used for ingestion.
    pub format: IngestionFormat,
    /// Size of the uploaded content.
    pub bytes: usize,
}

/// Minimal stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of decoded rows (before cleaning).
    pub rows: usize,
    /// Number of decoded columns.
    pub columns: usize,
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when ingestion succeeds.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when ingestion fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when an ingestion failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Every observer in the list receives every callback, in order.
impl IngestionObserver for Vec<Arc<dyn IngestionObserver>> {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.iter().for_each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.iter().for_each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.iter().for_each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Emits ingestion events as `tracing` events under the `ingest` target.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        tracing::info!(
            target: "ingest",
            format = ?ctx.format,
            filename = %ctx.filename,
            bytes = ctx.bytes,
            rows = stats.rows,
            columns = stats.columns,
            "decoded upload"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::warn!(
            target: "ingest",
            ?severity,
            format = ?ctx.format,
            filename = %ctx.filename,
            bytes = ctx.bytes,
            %error,
            "upload rejected"
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(
            target: "ingest",
            ?severity,
            format = ?ctx.format,
            filename = %ctx.filename,
            bytes = ctx.bytes,
            %error,
            "ingestion alert"
        );
    }
}

/// One line of the ingest log.
#[derive(Debug, Serialize)]
struct LogRecord<'a> {
    at: String,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<IngestionSeverity>,
    format: IngestionFormat,
    filename: &'a str,
    bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> LogRecord<'a> {
    fn new(outcome: &'static str, ctx: &'a IngestionContext) -> Self {
        Self {
            at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            outcome,
            severity: None,
            format: ctx.format,
            filename: &ctx.filename,
            bytes: ctx.bytes,
            rows: None,
            columns: None,
            error: None,
        }
    }

    fn failed(mut self, severity: IngestionSeverity, error: &IngestionError) -> Self {
        self.severity = Some(severity);
        self.error = Some(error.to_string());
        self
    }
}

/// Appends ingestion events to a local file, one JSON object per line.
///
/// `outcome` is `decoded`, `rejected` or `alert`; failures carry `severity` and `error`.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Append events to `path`, creating it on first write.
    ///
    /// Writes are best-effort; an unwritable log never fails an upload.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append(&self, record: &LogRecord<'_>) {
        let Ok(line) = serde_json::to_string(record) else {
            return;
        };
        let _guard = self.lock.lock().ok();
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| writeln!(f, "{line}"));
        if let Err(err) = written {
            tracing::debug!(target: "ingest", path = %self.path.display(), %err, "ingest log not written");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append(&LogRecord {
            rows: Some(stats.rows),
            columns: Some(stats.columns),
            ..LogRecord::new("decoded", ctx)
        });
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append(&LogRecord::new("rejected", ctx).failed(severity, error));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append(&LogRecord::new("alert", ctx).failed(severity, error));
    }
}
