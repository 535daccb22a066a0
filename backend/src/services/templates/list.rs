use crate::error::Result;
use crate::services::blocking;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// Actix web handler for `GET /api/templates`.
pub async fn process(state: web::Data<AppState>) -> Result<HttpResponse> {
    let state = state.get_ref().clone();
    let templates = blocking(move || state.registry.list_templates()).await?;
    Ok(HttpResponse::Ok().json(templates))
}
