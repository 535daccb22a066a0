//! # Template Service Module
//!
//! Routes under `/api/templates` for managing master templates.
//!
//! ## Sub-modules:
//! - `list`: returns every registered template.
//! - `create`: accepts a multipart upload, stores the file and registers it.

mod create;
mod list;

pub use create::register_template;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/api/templates";

/// Configures and returns the Actix `Scope` for all template-related routes.
///
/// # Registered Routes:
///
/// *   **`GET /`**:
///     - **Handler**: `list::process`
///     - **Description**: Lists all templates ordered by name, newest version
///       first, as a JSON array.
///
/// *   **`POST /`**:
///     - **Handler**: `create::process`
///     - **Description**: Uploads a new template. Expects a multipart body with a
///       `name` text field and a `template_file` file field holding a `.docx`.
///       The file is validated, written to the template store as
///       `<file_id>.docx` and registered with version 1. Responds `201 Created`
///       with the template JSON.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("", post().to(create::process))
}
