//! Document generation backend.
//!
//! Master `.docx` templates are uploaded once; each request gets its own copy
//! (`draft`), which is then filled by `{key}` placeholder substitution
//! (`filled`) and served back as a file.
//!
//! - `doc_service`: template copies, placeholder substitution and atomic writes.
//! - `registry`: template and document metadata (SQLite).
//! - `services`: the Actix routes.
//! - `config`, `error`, `state`: settings, error taxonomy and shared state.

pub mod config;
pub mod doc_service;
pub mod error;
pub mod registry;
pub mod services;
pub mod state;
