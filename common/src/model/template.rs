use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Extension shared by every stored template and generated document.
pub const DOCX_EXTENSION: &str = "docx";

/// Metadata of a master template.
///
/// The bytes live in the template store under `<file_id>.docx`; the record
/// never points at a document copy and the file is never rewritten once
/// uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub file_id: Uuid,
    /// Starts at 1. Nothing in the backend bumps it.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    pub fn new(name: impl Into<String>, file_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            file_id,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name of the backing file inside the template store.
    pub fn filename(&self) -> String {
        format!("{}.{}", self.file_id, DOCX_EXTENSION)
    }
}
