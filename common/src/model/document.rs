use crate::model::template::DOCX_EXTENSION;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Placeholder keys a template may reference, in the order they are stored.
pub const FIELD_KEYS: [&str; 6] = ["fio", "lavozim", "oylik", "stavka", "username", "order_type"];

/// Lifecycle of a generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Fresh byte copy of the template.
    Draft,
    /// At least one substitution has been committed.
    Filled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Filled => "filled",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DocumentStatus::Draft),
            "filled" => Ok(DocumentStatus::Filled),
            other => Err(format!("unknown document status '{}'", other)),
        }
    }
}

/// The six free-text values a document can be filled with.
///
/// Every field is optional on input; a missing field is the empty string and
/// is left out when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFields {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fio: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lavozim: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub oylik: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stavka: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub order_type: String,
}

impl DocumentFields {
    /// Builds the placeholder map used for substitution. All six keys are
    /// always present so an omitted field blanks its placeholder.
    pub fn to_replacements(&self) -> BTreeMap<String, String> {
        FIELD_KEYS
            .iter()
            .zip(self.values())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    /// Field values in `FIELD_KEYS` order.
    pub fn values(&self) -> [&str; 6] {
        [
            self.fio.as_str(),
            self.lavozim.as_str(),
            self.oylik.as_str(),
            self.stavka.as_str(),
            self.username.as_str(),
            self.order_type.as_str(),
        ]
    }
}

/// A per-request copy of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub template_id: Uuid,
    pub filename: String,
    pub status: DocumentStatus,
    #[serde(flatten)]
    pub fields: DocumentFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// A new draft owned by `template_id`. The filename derives from the
    /// document id only and never changes afterwards.
    pub fn draft(template_id: Uuid) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Self {
            id,
            template_id,
            filename: format!("{}.{}", id, DOCX_EXTENSION),
            status: DocumentStatus::Draft,
            fields: DocumentFields::default(),
            created_at: now,
            updated_at: now,
        }
    }
}
