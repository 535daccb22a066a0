use crate::model::document::DocumentFields;
use serde::{Deserialize, Serialize};

/// Request payload for `POST /api/documents/init`.
#[derive(Debug, Deserialize, Serialize)]
pub struct InitDocumentRequest {
    pub template_id: String,
}

/// Request payload for `POST /api/documents/{document_id}/generate`.
pub type FillDocumentRequest = DocumentFields;

/// Response of `POST /api/documents/init`.
#[derive(Debug, Deserialize, Serialize)]
pub struct InitDocumentResponse {
    pub document_id: String,
}
