//! Error taxonomy shared by the document pipeline, the registry and the HTTP
//! handlers.
//!
//! Every failure is terminal for the request that produced it: nothing is
//! retried. Handlers return `AppError` directly; the `ResponseError` impl maps
//! each classification to a status code and a JSON body of the form
//! `{"error": "...", "kind": "...", "status": 404}`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse document: {0}")]
    Parse(String),

    #[error("registry error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Wraps an I/O error with the operation and path it came from.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        AppError::Io {
            context: context.into(),
            source,
        }
    }

    /// Like [`AppError::io`], but a missing file becomes `NotFound`.
    pub fn io_at(action: &str, path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            AppError::NotFound(format!("{} {}: file not found", action, path.display()))
        } else {
            AppError::io(format!("{} {}", action, path.display()), source)
        }
    }

    /// Stable snake_case name of the classification.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Conflict(_) => "conflict",
            AppError::Io { .. } => "io",
            AppError::Parse(_) => "parse",
            AppError::Persistence(_) => "persistence",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => AppError::io("document archive", e),
            other => AppError::Parse(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("task join error: {}", err))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Io { .. }
            | AppError::Parse(_)
            | AppError::Persistence(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "status": status.as_u16(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_classified_as_not_found() {
        let err = AppError::io_at(
            "open",
            Path::new("/tmp/missing.docx"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.kind(), "not_found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_io_failures_stay_io() {
        let err = AppError::io_at(
            "create",
            Path::new("/tmp/x.docx"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), "io");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("create /tmp/x.docx"));
    }

    #[test]
    fn invalid_zip_is_a_parse_failure() {
        let err: AppError = zip::result::ZipError::InvalidArchive("bad").into();
        assert_eq!(err.kind(), "parse");
    }
}
