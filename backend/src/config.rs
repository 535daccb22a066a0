//! Runtime settings read from the process environment.
//!
//! | variable        | default          |
//! |-----------------|------------------|
//! | `STORAGE_PATH`  | working dir      |
//! | `DATABASE_URL`  | `docgen.sqlite`  |
//! | `HOST`          | `127.0.0.1`      |
//! | `PORT`          | `8080`           |
//! | `APP_ENV`       | `development`    |
//! | `ALLOW_REFILL`  | `true`           |
//! | `MAX_UPLOAD_MB` | `10`             |

use crate::error::{AppError, Result};
use std::env;
use std::path::PathBuf;

const DEFAULT_DATABASE: &str = "docgen.sqlite";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_MB: usize = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root holding `templates/` and `documents/`.
    pub storage_root: PathBuf,
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub app_env: String,
    /// Whether a `filled` document may be filled again.
    pub allow_refill: bool,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage_root = match get("STORAGE_PATH") {
            Some(path) => PathBuf::from(path),
            None => env::current_dir()
                .map_err(|e| AppError::io("resolve working directory", e))?,
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| AppError::InvalidInput(format!("PORT is not a valid port: {}", raw)))?,
            None => DEFAULT_PORT,
        };

        let allow_refill = match get("ALLOW_REFILL") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                AppError::InvalidInput(format!("ALLOW_REFILL must be true or false, got {}", raw))
            })?,
            None => true,
        };

        let max_upload_mb = match get("MAX_UPLOAD_MB") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                AppError::InvalidInput(format!("MAX_UPLOAD_MB is not a number: {}", raw))
            })?,
            None => DEFAULT_MAX_UPLOAD_MB,
        };

        let max_upload_bytes = max_upload_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            AppError::InvalidInput(format!("MAX_UPLOAD_MB is too large: {}", max_upload_mb))
        })?;

        Ok(Self {
            storage_root,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            app_env: get("APP_ENV").unwrap_or_else(|| "development".to_string()),
            allow_refill,
            max_upload_bytes,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.storage_root, env::current_dir().unwrap());
        assert_eq!(config.database_url, "docgen.sqlite");
        assert_eq!(config.port, 8080);
        assert!(config.allow_refill);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn storage_path_overrides_working_dir() {
        let config = AppConfig::from_lookup(lookup(&[
            ("STORAGE_PATH", "/srv/shared"),
            ("PORT", "3000"),
            ("ALLOW_REFILL", "off"),
        ]))
        .unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/srv/shared"));
        assert_eq!(config.port, 3000);
        assert!(!config.allow_refill);
    }

    #[test]
    fn empty_storage_path_counts_as_unset() {
        let config = AppConfig::from_lookup(lookup(&[("STORAGE_PATH", "")])).unwrap();
        assert_eq!(config.storage_root, env::current_dir().unwrap());
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn bad_refill_flag_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("ALLOW_REFILL", "maybe")])).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(err.to_string().contains("ALLOW_REFILL"));
    }

    #[test]
    fn bad_upload_limit_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("MAX_UPLOAD_MB", "ten")])).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");

        let huge = usize::MAX.to_string();
        let err = AppConfig::from_lookup(lookup(&[("MAX_UPLOAD_MB", huge.as_str())])).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn upload_limit_is_given_in_megabytes() {
        let config = AppConfig::from_lookup(lookup(&[("MAX_UPLOAD_MB", "2")])).unwrap();
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
    }
}
