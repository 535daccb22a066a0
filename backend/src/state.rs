//! Shared application state injected into every handler as `web::Data`.

use crate::config::AppConfig;
use crate::doc_service::locks::DocumentLocks;
use crate::doc_service::DocService;
use crate::registry::Registry;
use std::sync::Arc;

/// Cheap to clone: every member is a handle.
#[derive(Clone)]
pub struct AppState {
    /// Metadata store. Injected rather than global so tests can swap it.
    pub registry: Arc<dyn Registry>,
    /// Template and document files.
    pub docs: DocService,
    /// Serializes fill operations per document.
    pub locks: DocumentLocks,
    pub allow_refill: bool,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(registry: Arc<dyn Registry>, docs: DocService) -> Self {
        Self {
            registry,
            docs,
            locks: DocumentLocks::new(),
            allow_refill: true,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }

    pub fn from_config(registry: Arc<dyn Registry>, config: &AppConfig) -> Self {
        Self {
            allow_refill: config.allow_refill,
            max_upload_bytes: config.max_upload_bytes,
            ..Self::new(registry, DocService::new(&config.storage_root))
        }
    }
}
