//! # Document Fill Service
//!
//! Backend logic for `POST /api/documents/{document_id}/generate`.
//!
//! ## Workflow
//!
//! 1.  **Lock**: the per-document lock is taken, so two fills of the same
//!     document never interleave inside this process.
//! 2.  **Render**: a `draft` document is substituted from its own copy. A
//!     `filled` document has no placeholders left, so it is rendered again from
//!     the master template (or rejected with `409` when refills are disabled).
//! 3.  **Commit**: the new bytes replace the document file atomically.
//! 4.  **Register**: status becomes `filled` and the six values are stored. If
//!     this update fails, the previous file bytes are committed back before the
//!     error is returned.

use crate::error::{AppError, Result};
use crate::services::{blocking, parse_id};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use common::model::document::{Document, DocumentFields, DocumentStatus};
use common::requests::FillDocumentRequest;
use log::{error, info, warn};
use uuid::Uuid;

/// Actix web handler for `POST /api/documents/{document_id}/generate`.
pub async fn process(
    state: web::Data<AppState>,
    document_id: web::Path<String>,
    payload: web::Json<FillDocumentRequest>,
) -> Result<HttpResponse> {
    let document_id = parse_id(&document_id, "document_id")?;
    let fields = payload.into_inner();
    let state = state.get_ref().clone();
    blocking(move || fill_document(&state, document_id, fields)).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "success" })))
}

/// Fills the document with `fields` and records them as its snapshot.
pub fn fill_document(state: &AppState, document_id: Uuid, fields: DocumentFields) -> Result<Document> {
    state.locks.run(document_id, || {
        let mut document = state.registry.find_document(document_id)?;
        let replacements = fields.to_replacements();

        let rewrite = match document.status {
            DocumentStatus::Draft => state.docs.replace_in_doc(&document.filename, &replacements)?,
            DocumentStatus::Filled if state.allow_refill => {
                let template = state.registry.find_template(document.template_id)?;
                state
                    .docs
                    .regenerate(&template.filename(), &document.filename, &replacements)?
            }
            DocumentStatus::Filled => {
                return Err(AppError::Conflict(format!(
                    "document {} is already filled",
                    document_id
                )));
            }
        };

        document.status = DocumentStatus::Filled;
        document.fields = fields;
        document.updated_at = Utc::now();

        if let Err(err) = state.registry.update_document(&document) {
            match state.docs.restore(&document.filename, &rewrite.previous) {
                Ok(()) => warn!(
                    "registry update for document {} failed, file content restored: {}",
                    document_id, err
                ),
                Err(restore_err) => error!(
                    "registry update for document {} failed ({}) and restoring its file failed too: {}",
                    document_id, err, restore_err
                ),
            }
            return Err(err);
        }

        info!(
            "filled document {} ({} placeholder(s) replaced)",
            document_id, rewrite.replaced
        );
        Ok(document)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_service::placeholders::extract_text;
    use crate::services::documents::fixtures::Fixture;
    use crate::services::documents::init_document;
    use std::fs;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::thread;

    fn fields(fio: &str, lavozim: &str) -> DocumentFields {
        DocumentFields {
            fio: fio.into(),
            lavozim: lavozim.into(),
            ..Default::default()
        }
    }

    #[test]
    fn fill_substitutes_and_marks_filled() {
        let fx = Fixture::new();
        let template = fx.template(&[&["Hello {fio}"]]);
        let document = init_document(&fx.state, template.id).unwrap();

        let filled = fill_document(&fx.state, document.id, fields("Alice", "")).unwrap();

        assert_eq!(filled.status, DocumentStatus::Filled);
        assert_eq!(extract_text(&fx.doc_bytes(&document)).unwrap(), "Hello Alice");
        let stored = fx.state.registry.find_document(document.id).unwrap();
        assert_eq!(stored.status, DocumentStatus::Filled);
        assert_eq!(stored.fields.fio, "Alice");
        assert_eq!(stored.filename, document.filename);
    }

    #[test]
    fn missing_fields_blank_their_placeholders() {
        let fx = Fixture::new();
        let template = fx.template(&[&["{fio}|{oylik}|{username}"]]);
        let document = init_document(&fx.state, template.id).unwrap();

        fill_document(&fx.state, document.id, fields("Alice", "")).unwrap();

        assert_eq!(extract_text(&fx.doc_bytes(&document)).unwrap(), "Alice||");
    }

    #[test]
    fn last_fill_wins_for_snapshot_and_file() {
        let fx = Fixture::new();
        let template = fx.template(&[&["{fio} works as {lavozim}"]]);
        let document = init_document(&fx.state, template.id).unwrap();

        fill_document(&fx.state, document.id, fields("Alice", "engineer")).unwrap();
        fill_document(&fx.state, document.id, fields("Bob", "")).unwrap();

        assert_eq!(extract_text(&fx.doc_bytes(&document)).unwrap(), "Bob works as ");
        let stored = fx.state.registry.find_document(document.id).unwrap();
        assert_eq!(stored.fields.fio, "Bob");
        assert_eq!(stored.fields.lavozim, "");
    }

    #[test]
    fn refill_can_be_disabled() {
        let mut fx = Fixture::new();
        fx.state.allow_refill = false;
        let template = fx.template(&[&["{fio}"]]);
        let document = init_document(&fx.state, template.id).unwrap();
        fill_document(&fx.state, document.id, fields("Alice", "")).unwrap();
        let before = fx.doc_bytes(&document);

        let err = fill_document(&fx.state, document.id, fields("Bob", "")).unwrap_err();

        assert_eq!(err.kind(), "conflict");
        assert_eq!(fx.doc_bytes(&document), before);
        assert_eq!(fx.state.registry.find_document(document.id).unwrap().fields.fio, "Alice");
    }

    #[test]
    fn unknown_document_is_not_found() {
        let fx = Fixture::new();
        let err = fill_document(&fx.state, Uuid::new_v4(), fields("A", "")).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn failed_registry_update_restores_the_file() {
        let fx = Fixture::new();
        let template = fx.template(&[&["Hello {fio}"]]);
        let document = init_document(&fx.state, template.id).unwrap();
        let before = fx.doc_bytes(&document);
        fx.registry.fail_update.store(true, Ordering::SeqCst);

        let err = fill_document(&fx.state, document.id, fields("Alice", "")).unwrap_err();

        assert_eq!(err.kind(), "persistence");
        assert_eq!(fx.doc_bytes(&document), before);
        let stored = fx.state.registry.find_document(document.id).unwrap();
        assert_eq!(stored.status, DocumentStatus::Draft);
    }

    #[test]
    fn corrupt_document_fails_without_touching_registry() {
        let fx = Fixture::new();
        let template = fx.template(&[&["Hello {fio}"]]);
        let document = init_document(&fx.state, template.id).unwrap();
        let path = fx.state.docs.paths().doc_path(&document.filename);
        fs::write(&path, b"truncated").unwrap();

        let err = fill_document(&fx.state, document.id, fields("Alice", "")).unwrap_err();

        assert_eq!(err.kind(), "parse");
        assert_eq!(fs::read(&path).unwrap(), b"truncated");
        let stored = fx.state.registry.find_document(document.id).unwrap();
        assert_eq!(stored.status, DocumentStatus::Draft);
    }

    #[test]
    fn values_a_document_cannot_hold_are_rejected() {
        let fx = Fixture::new();
        let template = fx.template(&[&["Hello {fio}"]]);
        let document = init_document(&fx.state, template.id).unwrap();
        let before = fx.doc_bytes(&document);

        let err = fill_document(&fx.state, document.id, fields("Ali\u{7}ce", "")).unwrap_err();

        assert_eq!(err.kind(), "invalid_input");
        assert_eq!(fx.doc_bytes(&document), before);
        let stored = fx.state.registry.find_document(document.id).unwrap();
        assert_eq!(stored.status, DocumentStatus::Draft);
    }

    #[test]
    fn concurrent_fills_leave_one_consistent_result() {
        let fx = Fixture::new();
        let template = fx.template(&[&["{fio}"]]);
        let document = init_document(&fx.state, template.id).unwrap();
        let state = Arc::new(fx.state.clone());

        let handles: Vec<_> = ["Alice", "Bob", "Carol", "Dave"]
            .into_iter()
            .map(|name| {
                let state = Arc::clone(&state);
                let id = document.id;
                thread::spawn(move || fill_document(&state, id, fields(name, "")).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = fx.state.registry.find_document(document.id).unwrap();
        let text = extract_text(&fx.doc_bytes(&document)).unwrap();
        assert_eq!(text, stored.fields.fio);
        assert_eq!(fx.state.locks.active(), 0);
    }
}
