//! Process-wide service configuration, read once at startup.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 8000;
/// Default upload ceiling (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Origins allowed to call the service from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// Any origin.
    Any,
    /// Only the listed origins.
    List(Vec<String>),
}

impl CorsOrigins {
    /// Parse a comma-separated origin list. Blank entries are ignored; an empty list or a `*`
    /// entry allows any origin.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_owned)
            .collect();
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            Self::Any
        } else {
            Self::List(origins)
        }
    }
}

/// Configuration handed to [`super::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host/interface to bind (`HOST`).
    pub host: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Allowed CORS origins (`CORS_ORIGINS`).
    pub cors_origins: CorsOrigins,
    /// Largest accepted upload in bytes (`MAX_UPLOAD_BYTES`).
    pub max_upload_bytes: usize,
    /// If set, ingestion events are also appended to this file (`INGEST_LOG_PATH`).
    pub ingest_log_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origins: CorsOrigins::Any,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ingest_log_path: None,
        }
    }
}

impl ServerConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup. Unset or blank variables take
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_upload_bytes = parse_var(get("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        if max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_UPLOAD_BYTES",
                value: "0".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            host: get("HOST").map_or_else(|| DEFAULT_HOST.to_string(), |h| h.trim().to_string()),
            port: parse_var(get("PORT"), "PORT", DEFAULT_PORT)?,
            cors_origins: CorsOrigins::parse(get("CORS_ORIGINS").as_deref().unwrap_or("")),
            max_upload_bytes,
            ingest_log_path: get("INGEST_LOG_PATH").map(PathBuf::from),
        })
    }
}

fn parse_var<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::InvalidValue {
                key,
                message: e.to_string(),
                value,
            })
        }
    }
}
