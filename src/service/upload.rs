//! Reading the uploaded file out of a `multipart/form-data` body.

use actix_multipart::Multipart;
use futures::StreamExt;

use super::error::ServiceError;

/// Multipart field that carries the file.
pub const FILE_FIELD: &str = "file";

/// An uploaded file, read fully into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Client-supplied filename; empty if none was sent.
    pub filename: String,
    /// File content.
    pub bytes: Vec<u8>,
}

/// Read the first [`FILE_FIELD`] part of `payload`, rejecting files larger than `limit` bytes.
///
/// Other parts are drained and ignored.
pub async fn read_upload(mut payload: Multipart, limit: usize) -> Result<Upload, ServiceError> {
    let mut upload: Option<Upload> = None;

    while let Some(field) = payload.next().await {
        let mut field = field?;
        let wanted = upload.is_none() && field.name() == Some(FILE_FIELD);
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if !wanted {
                continue;
            }
            if bytes.len() + chunk.len() > limit {
                return Err(ServiceError::PayloadTooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        if wanted {
            upload = Some(Upload { filename, bytes });
        }
    }

    upload.ok_or(ServiceError::MissingFile { field: FILE_FIELD })
}
