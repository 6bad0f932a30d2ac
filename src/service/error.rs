use actix_multipart::MultipartError;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use polars::prelude::PolarsError;
use serde::Serialize;
use thiserror::Error;

use crate::error::{IngestionError, MappingError};
use crate::ingestion::IngestionFormat;

/// Errors surfaced to HTTP clients.
///
/// Everything caused by the request (file type, file content, parameters) is a 4xx with a
/// human-readable `detail`; there are no partial results.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The upload's filename is not on the allow-list for the endpoint.
    #[error("{0}")]
    UnsupportedFile(IngestionError),

    /// The upload could not be decoded into a table.
    #[error("could not read {kind} file: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: IngestionError,
    },

    /// The mapping parameter is unusable.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// The query string could not be deserialized.
    #[error("invalid query parameters: {0}")]
    InvalidQuery(String),

    /// A query parameter has an unusable value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: &'static str, message: String },

    /// The multipart body has no file field.
    #[error("missing file upload: send the file in multipart field '{field}'")]
    MissingFile { field: &'static str },

    /// The multipart body is malformed.
    #[error("malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    /// The uploaded file exceeds the configured ceiling.
    #[error("upload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// A processing stage failed on a table that decoded fine.
    #[error("processing failed: {0}")]
    Engine(PolarsError),

    /// The blocking worker running decode and pipeline went away.
    #[error("processing was interrupted")]
    Blocking(#[from] BlockingError),
}

impl ServiceError {
    /// Classify an ingestion failure for `format`: extension problems are rejections, anything
    /// else is a decode failure.
    pub fn from_ingestion(format: IngestionFormat, err: IngestionError) -> Self {
        match err {
            IngestionError::UnsupportedExtension { .. } => Self::UnsupportedFile(err),
            source => Self::Decode {
                kind: match format {
                    IngestionFormat::Csv => "CSV",
                    IngestionFormat::Excel => "Excel",
                },
                source,
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Engine(_) | Self::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::info!(status = status.as_u16(), error = %self, "request rejected");
        }
        HttpResponse::build(status).json(ErrorBody {
            detail: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_errors_are_rejections() {
        let err = ServiceError::from_ingestion(
            IngestionFormat::Excel,
            IngestionError::UnsupportedExtension {
                filename: "data.txt".to_string(),
                expected: ".xlsx".to_string(),
            },
        );
        assert!(matches!(err, ServiceError::UnsupportedFile(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn decode_errors_name_the_format() {
        let err = ServiceError::from_ingestion(
            IngestionFormat::Csv,
            IngestionError::Encoding {
                message: "unknown encoding 'x'".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "could not read CSV file: encoding error: unknown encoding 'x'"
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engine_failures_are_server_errors() {
        let err = ServiceError::Engine(PolarsError::ComputeError("boom".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let msg = err.to_string();
        assert!(msg.starts_with("processing failed: ") && msg.contains("boom"), "{msg}");
    }

    #[test]
    fn oversized_uploads_are_413() {
        let err = ServiceError::PayloadTooLarge { limit: 10 };
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
