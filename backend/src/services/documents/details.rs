use crate::error::Result;
use crate::services::{blocking, parse_id};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::document::Document;
use uuid::Uuid;

/// Actix web handler for `GET /api/documents/{document_id}`.
pub async fn process(
    state: web::Data<AppState>,
    document_id: web::Path<String>,
) -> Result<HttpResponse> {
    let document_id = parse_id(&document_id, "document_id")?;
    let state = state.get_ref().clone();
    let document = blocking(move || get_document(&state, document_id)).await?;
    Ok(HttpResponse::Ok().json(document))
}

pub fn get_document(state: &AppState, document_id: Uuid) -> Result<Document> {
    state.registry.find_document(document_id)
}
