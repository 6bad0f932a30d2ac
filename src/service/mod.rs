//! HTTP surface: upload endpoints, health check and CORS.
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /health` | liveness, always `{"status":"ok"}` |
//! | `POST /parse-excel?mapping=&headerRow=&sheet=` | preview a workbook |
//! | `POST /parse-csv?sep=&encoding=&mapping=` | preview delimited text |
//!
//! Uploads are `multipart/form-data` with the file in the `file` field. Each request is handled
//! on its own; nothing is shared between requests except the read-only [`AppState`].

pub mod config;
mod error;
mod routes;
mod upload;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use crate::ingestion::{FileObserver, IngestionObserver, TracingObserver};

pub use config::{CorsOrigins, ServerConfig};
pub use error::ServiceError;
pub use routes::{CsvParams, ExcelParams};
pub use upload::{read_upload, Upload, FILE_FIELD};

/// Read-only state shared by all workers.
pub struct AppState {
    /// Startup configuration.
    pub config: ServerConfig,
    /// Observer attached to every ingestion.
    pub observer: Arc<dyn IngestionObserver>,
}

impl AppState {
    /// Build the state, attaching a [`FileObserver`] when `ingest_log_path` is configured.
    pub fn new(config: ServerConfig) -> Self {
        let mut observers: Vec<Arc<dyn IngestionObserver>> = vec![Arc::new(TracingObserver)];
        if let Some(path) = &config.ingest_log_path {
            observers.push(Arc::new(FileObserver::new(path)));
        }
        Self {
            config,
            observer: Arc::new(observers),
        }
    }
}

/// Register state, extractor config and routes on an app.
///
/// ```no_run
/// use actix_web::{web, App};
/// use sheet_preview::service::{configure, AppState, ServerConfig};
///
/// let state = web::Data::new(AppState::new(ServerConfig::default()));
/// let app = App::new().configure(configure(state));
/// ```
pub fn configure(state: web::Data<AppState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(state)
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                ServiceError::InvalidQuery(err.to_string()).into()
            }))
            .service(routes::health)
            .service(routes::parse_excel)
            .service(routes::parse_csv);
    }
}

/// CORS policy for the configured origins.
pub fn cors(origins: &CorsOrigins) -> Cors {
    match origins {
        CorsOrigins::Any => Cors::permissive(),
        CorsOrigins::List(list) => list.iter().fold(
            Cors::default()
                .allow_any_method()
                .allow_any_header()
                .supports_credentials()
                .max_age(3600),
            |cors, origin| cors.allowed_origin(origin),
        ),
    }
}

/// Bind and serve until shutdown.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let addr = (config.host.clone(), config.port);
    tracing::info!(
        host = %addr.0,
        port = addr.1,
        cors = ?config.cors_origins,
        max_upload_bytes = config.max_upload_bytes,
        "starting server"
    );

    let state = web::Data::new(AppState::new(config));
    HttpServer::new(move || {
        App::new()
            .wrap(cors(&state.config.cors_origins))
            .configure(configure(state.clone()))
    })
    .bind(addr)?
    .run()
    .await
}
