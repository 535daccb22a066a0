use crate::error::Result;
use crate::services::{blocking, parse_id};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::document::Document;
use common::requests::{InitDocumentRequest, InitDocumentResponse};
use log::{error, info, warn};
use uuid::Uuid;

/// Actix web handler for `POST /api/documents/init`.
pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<InitDocumentRequest>,
) -> Result<HttpResponse> {
    let template_id = parse_id(&payload.template_id, "template_id")?;
    let state = state.get_ref().clone();
    let document = blocking(move || init_document(&state, template_id)).await?;
    Ok(HttpResponse::Ok().json(InitDocumentResponse {
        document_id: document.id.to_string(),
    }))
}

/// Creates a `draft` document as a byte copy of the template's file.
///
/// The copy happens first, then the registry insert. When the insert fails
/// the copy is deleted so no unregistered file is left behind.
pub fn init_document(state: &AppState, template_id: Uuid) -> Result<Document> {
    let template = state.registry.find_template(template_id)?;
    let document = Document::draft(template.id);

    if let Err(err) = state
        .docs
        .copy_template(&template.filename(), &document.filename)
    {
        warn!(
            "copying template {} into {} failed, discarding partial copy: {}",
            template.id, document.filename, err
        );
        discard(state, &document);
        return Err(err);
    }

    if let Err(err) = state.registry.create_document(&document) {
        warn!(
            "registering document {} failed, removing its file: {}",
            document.id, err
        );
        discard(state, &document);
        return Err(err);
    }

    info!(
        "initialized document {} from template {} ({})",
        document.id, template.id, template.name
    );
    Ok(document)
}

fn discard(state: &AppState, document: &Document) {
    if let Err(err) = state.docs.remove_document(&document.filename) {
        error!("could not remove {}: {}", document.filename, err);
    }
}
