//! Metadata store for templates and documents.
//!
//! The file store holds content, the registry holds everything else. Each call
//! is consistent on its own; no call spans a file operation, so callers pair
//! registry writes with file writes and compensate when the second step fails.
//!
//! Handlers receive the registry as an injected `Arc<dyn Registry>`, which
//! keeps them testable against in-memory SQLite or a purpose-built double.

mod sqlite;

pub use sqlite::SqliteRegistry;

use crate::error::Result;
use common::model::document::Document;
use common::model::template::Template;
use uuid::Uuid;

pub trait Registry: Send + Sync {
    /// `AppError::NotFound` when no template has this id.
    fn find_template(&self, id: Uuid) -> Result<Template>;

    fn create_template(&self, template: &Template) -> Result<()>;

    /// All templates, by name ascending then version descending.
    fn list_templates(&self) -> Result<Vec<Template>>;

    /// `AppError::NotFound` when no document has this id.
    fn find_document(&self, id: Uuid) -> Result<Document>;

    fn create_document(&self, document: &Document) -> Result<()>;

    /// Overwrites status, fields and `updated_at` of an existing document.
    fn update_document(&self, document: &Document) -> Result<()>;
}
