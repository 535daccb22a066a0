use crate::error::{AppError, Result};
use crate::services::{blocking, parse_id};
use crate::state::AppState;
use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse};
use common::model::document::Document;
use log::warn;
use std::path::PathBuf;
use uuid::Uuid;

/// Actix web handler for `GET /api/documents/{document_id}/file`.
///
/// Serves the stored `.docx` as an attachment. `NamedFile` takes care of
/// `Last-Modified`, conditional requests and ranges.
pub async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    document_id: web::Path<String>,
) -> Result<HttpResponse> {
    let document_id = parse_id(&document_id, "document_id")?;
    let state = state.get_ref().clone();
    let (document, path) = blocking(move || locate_file(&state, document_id)).await?;

    let file = NamedFile::open_async(&path)
        .await
        .map_err(|e| AppError::io_at("file open error", &path, e))?;
    let response = file
        .set_content_type(mime_guess::from_path(&path).first_or_octet_stream())
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(document.filename)],
        })
        .into_response(&req);
    Ok(response)
}

/// Looks the document up in the registry, then checks its file exists.
///
/// An unknown id fails before the filesystem is touched.
pub fn locate_file(state: &AppState, document_id: Uuid) -> Result<(Document, PathBuf)> {
    let document = state.registry.find_document(document_id)?;
    let path = state.docs.document_path(&document.filename).inspect_err(|err| {
        if let AppError::NotFound(_) = err {
            warn!(
                "file for document {} not found at: {}",
                document_id,
                state.docs.paths().doc_path(&document.filename).display()
            );
        }
    })?;
    Ok((document, path))
}
