//! HTTP surface of the backend.
//!
//! - `templates`: listing and uploading master templates (`/api/templates`).
//! - `documents`: init, fill, details and file download (`/api/documents`).
//!
//! Handlers stay thin: they decode the request, run the blocking file and
//! registry work on tokio's blocking pool and encode the result. Failures are
//! returned as `AppError`, which renders itself as a JSON error response.

pub mod documents;
pub mod templates;

use crate::error::{AppError, Result};
use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;

/// JSON body limit used until the server installs its configured one.
const DEFAULT_JSON_LIMIT: usize = 10 * 1024 * 1024;

/// Registers every route of the backend, plus extractor settings that turn
/// malformed bodies, paths and queries into `InvalidInput`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config(DEFAULT_JSON_LIMIT))
        .app_data(web::PathConfig::default().error_handler(|err, _| {
            AppError::InvalidInput(err.to_string()).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _| {
            AppError::InvalidInput(err.to_string()).into()
        }))
        .route("/", web::get().to(home))
        .service(templates::configure_routes())
        .service(documents::configure_routes());
}

/// JSON extractor settings with a body limit of `limit` bytes.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _| AppError::InvalidInput(err.to_string()).into())
}

async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "docgen",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Parses an id received from a client.
pub(crate) fn parse_id(raw: &str, field: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidInput(format!("'{}' is not a valid id: {}", field, raw)))
}

/// Runs synchronous file/registry work off the async workers.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}
