//! # Document Service Module
//!
//! Routes under `/api/documents` covering the life of a generated document:
//! created as a byte copy of a template, filled with field values, read back
//! as JSON or downloaded as a file.
//!
//! ## Sub-modules:
//! - `init`: copies a template into a new `draft` document.
//! - `generate`: substitutes the six fields and marks the document `filled`.
//! - `details`: returns the stored document record.
//! - `file`: streams the `.docx` itself.
//!
//! Each sub-module pairs an Actix handler (`process`) with a plain function
//! holding the logic, which the handler runs on the blocking pool.

mod details;
mod file;
mod generate;
mod init;

pub use details::get_document;
pub use file::locate_file;
pub use generate::fill_document;
pub use init::init_document;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/documents";

/// Configures and returns the Actix `Scope` for all document-related routes.
///
/// *   **`POST /init`**: `{"template_id"}` → `{"document_id"}`.
/// *   **`POST /{document_id}/generate`**: six optional fields → `{"status": "success"}`.
/// *   **`GET /{document_id}`**: the document record.
/// *   **`GET /{document_id}/file`**: the `.docx` as an attachment.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/init", post().to(init::process))
        .route("/{document_id}/generate", post().to(generate::process))
        .route("/{document_id}/file", get().to(file::process))
        .route("/{document_id}", get().to(details::process))
}
