use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::ingestion::{
    ensure_extension, CsvOptions, ExcelOptions, ExcelSheetSelection, IngestionFormat, IngestionOptions,
    IngestionRequest,
};
use crate::processing::{run_pipeline, ColumnMapping};

use super::error::ServiceError;
use super::upload::read_upload;
use super::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthStatus { status: "ok" })
}

/// Query parameters of `POST /parse-excel`.
#[derive(Debug, Deserialize)]
pub struct ExcelParams {
    /// Optional JSON object of column renames.
    pub mapping: Option<String>,
    /// 1-based header row.
    #[serde(rename = "headerRow", default = "default_header_row")]
    pub header_row: i64,
    /// Sheet to read instead of the first one.
    pub sheet: Option<String>,
}

fn default_header_row() -> i64 {
    1
}

impl ExcelParams {
    fn header_row(&self) -> Result<usize, ServiceError> {
        usize::try_from(self.header_row)
            .ok()
            .filter(|row| *row >= 1)
            .ok_or_else(|| ServiceError::InvalidParameter {
                name: "headerRow",
                message: format!("must be at least 1, got {}", self.header_row),
            })
    }
}

/// Query parameters of `POST /parse-csv`.
#[derive(Debug, Deserialize)]
pub struct CsvParams {
    /// Field separator, a single ASCII character.
    #[serde(default = "default_sep")]
    pub sep: String,
    /// Optional JSON object of column renames.
    pub mapping: Option<String>,
    /// Text encoding label.
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_sep() -> String {
    ",".to_string()
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

impl CsvParams {
    fn delimiter(&self) -> Result<u8, ServiceError> {
        match self.sep.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(ServiceError::InvalidParameter {
                name: "sep",
                message: format!("must be a single ASCII character, got {:?}", self.sep),
            }),
        }
    }
}

/// An absent or empty `mapping` parameter means "no mapping".
fn parse_mapping(raw: Option<&str>) -> Result<ColumnMapping, ServiceError> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => Ok(ColumnMapping::from_json_str(raw)?),
        _ => Ok(ColumnMapping::default()),
    }
}

#[post("/parse-excel")]
pub async fn parse_excel(
    state: web::Data<AppState>,
    params: web::Query<ExcelParams>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let params = params.into_inner();
    let upload = read_upload(payload, state.config.max_upload_bytes).await?;
    ensure_extension(&upload.filename, IngestionFormat::Excel).map_err(ServiceError::UnsupportedFile)?;
    let header_row = params.header_row()?;
    let mapping = parse_mapping(params.mapping.as_deref())?;

    let request = IngestionRequest {
        filename: upload.filename,
        bytes: upload.bytes,
        options: IngestionOptions {
            format: Some(IngestionFormat::Excel),
            excel: ExcelOptions {
                sheet: params
                    .sheet
                    .map_or(ExcelSheetSelection::First, ExcelSheetSelection::Sheet),
                header_row,
            },
            observer: Some(state.observer.clone()),
            ..Default::default()
        },
    };
    preview_upload(IngestionFormat::Excel, request, mapping).await
}

#[post("/parse-csv")]
pub async fn parse_csv(
    state: web::Data<AppState>,
    params: web::Query<CsvParams>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let params = params.into_inner();
    let upload = read_upload(payload, state.config.max_upload_bytes).await?;
    ensure_extension(&upload.filename, IngestionFormat::Csv).map_err(ServiceError::UnsupportedFile)?;
    let delimiter = params.delimiter()?;
    let mapping = parse_mapping(params.mapping.as_deref())?;

    let request = IngestionRequest {
        filename: upload.filename,
        bytes: upload.bytes,
        options: IngestionOptions {
            format: Some(IngestionFormat::Csv),
            csv: CsvOptions {
                delimiter,
                encoding: params.encoding,
            },
            observer: Some(state.observer.clone()),
            ..Default::default()
        },
    };
    preview_upload(IngestionFormat::Csv, request, mapping).await
}

/// Decode and run the pipeline on the blocking pool.
async fn preview_upload(
    format: IngestionFormat,
    request: IngestionRequest,
    mapping: ColumnMapping,
) -> Result<HttpResponse, ServiceError> {
    let filename = request.filename.clone();
    let report = web::block(move || request.run().map(|df| run_pipeline(df, &mapping)))
        .await?
        .map_err(|e| ServiceError::from_ingestion(format, e))?
        .map_err(ServiceError::Engine)?;

    tracing::info!(
        %filename,
        format = ?format,
        rows = report.rows,
        columns = report.columns.len(),
        "parsed upload"
    );
    Ok(HttpResponse::Ok().json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_params(sep: &str) -> CsvParams {
        CsvParams {
            sep: sep.to_string(),
            mapping: None,
            encoding: default_encoding(),
        }
    }

    #[test]
    fn delimiter_must_be_one_ascii_char() {
        assert_eq!(csv_params(";").delimiter().unwrap(), b';');
        assert_eq!(csv_params("\t").delimiter().unwrap(), b'\t');
        assert!(csv_params("").delimiter().is_err());
        assert!(csv_params(";;").delimiter().is_err());
        assert!(csv_params("§").delimiter().is_err());
    }

    #[test]
    fn header_row_is_one_based() {
        let params = |header_row| ExcelParams {
            mapping: None,
            header_row,
            sheet: None,
        };
        assert_eq!(params(1).header_row().unwrap(), 1);
        assert_eq!(params(3).header_row().unwrap(), 3);
        assert!(params(0).header_row().is_err());
        assert!(params(-2).header_row().is_err());
    }

    #[test]
    fn blank_mapping_is_no_mapping() {
        assert!(parse_mapping(None).unwrap().is_empty());
        assert!(parse_mapping(Some("")).unwrap().is_empty());
        assert!(parse_mapping(Some("not-json")).is_err());
    }
}
