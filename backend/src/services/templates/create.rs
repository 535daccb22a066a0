//! # Template Upload Service
//!
//! Backend logic for `POST /api/templates`.
//!
//! ## Workflow
//!
//! 1.  **Multipart parsing**: `process` walks the multipart fields. `name`
//!     carries the human name (a `?name=` query parameter is accepted as a
//!     fallback), `template_file` carries the document bytes. The upload is
//!     buffered up to the configured size limit.
//!
//! 2.  **Validation**: an empty name or missing file is rejected with `400`.
//!
//! 3.  **Storage**: `register_template` checks that the bytes are a readable
//!     `.docx`, then writes them atomically to `templates/<file_id>.docx`.
//!
//! 4.  **Registration**: the template row is inserted with version 1. If the
//!     insert fails, the stored file is deleted again before the error is
//!     returned.

use crate::error::{AppError, Result};
use crate::services::blocking;
use crate::state::AppState;
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use common::model::template::Template;
use futures_util::StreamExt;
use log::{error, info};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateTemplateQuery {
    pub name: Option<String>,
}

/// Actix web handler for `POST /api/templates`.
///
/// # Returns
/// - `201 Created` with the registered `Template` as JSON.
/// - `400 Bad Request` if the name or the file is missing, the upload is too
///   large, or the file is not a `.docx`.
pub async fn process(
    state: web::Data<AppState>,
    query: web::Query<CreateTemplateQuery>,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let mut name = query.into_inner().name;
    let mut content: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::InvalidInput(e.to_string()))?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match field_name.as_deref() {
            Some("name") => {
                let bytes = read_field(&mut field, state.max_upload_bytes).await?;
                let text = String::from_utf8(bytes)
                    .map_err(|_| AppError::InvalidInput("'name' must be UTF-8 text".into()))?;
                name = Some(text);
            }
            Some("template_file") => {
                content = Some(read_field(&mut field, state.max_upload_bytes).await?);
            }
            _ => {}
        }
    }

    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::InvalidInput("'name' field is required".into()))?;
    let content =
        content.ok_or_else(|| AppError::InvalidInput("'template_file' field is required".into()))?;

    let state = state.get_ref().clone();
    let template = blocking(move || register_template(&state, &name, &content)).await?;
    Ok(HttpResponse::Created().json(template))
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::InvalidInput(e.to_string()))?;
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::InvalidInput(format!(
                "upload exceeds the limit of {} bytes",
                limit
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Stores `content` as a new master template and registers it.
pub fn register_template(state: &AppState, name: &str, content: &[u8]) -> Result<Template> {
    let template = Template::new(name, Uuid::new_v4());
    let filename = template.filename();

    let placeholders = state
        .docs
        .store_template(&filename, content)
        .map_err(|e| match e {
            AppError::Parse(msg) => {
                AppError::InvalidInput(format!("template_file is not a valid .docx: {}", msg))
            }
            other => other,
        })?;

    if let Err(err) = state.registry.create_template(&template) {
        if let Err(cleanup) = state.docs.remove_template(&filename) {
            error!(
                "template {} could not be registered and its file {} was not removed: {}",
                template.id, filename, cleanup
            );
        }
        return Err(err);
    }

    info!(
        "registered template '{}' ({}) as {} with placeholders {:?}",
        template.name, template.id, filename, placeholders
    );
    Ok(template)
}
