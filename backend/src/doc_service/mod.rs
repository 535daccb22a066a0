//! # Document Service
//!
//! File-side half of the backend: everything that reads or writes template
//! and document bytes. Registry bookkeeping lives in `services::documents`,
//! which calls into this module.
//!
//! ## Sub-modules:
//! - `paths`: resolves the template and document directories under the storage root.
//! - `copy`: duplicates a master template into the document store.
//! - `placeholders`: `{key}` substitution over `.docx` packages.
//! - `atomic`: temp-file-then-rename commits.
//! - `locks`: per-document mutual exclusion for fill operations.

pub mod atomic;
pub mod copy;
pub mod locks;
pub mod paths;
pub mod placeholders;

use crate::error::{AppError, Result};
use paths::StoragePaths;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of rewriting a document in place.
#[derive(Debug)]
pub struct Rewrite {
    /// Bytes the document had before the commit, kept for compensation.
    pub previous: Vec<u8>,
    pub replaced: usize,
}

#[derive(Debug, Clone)]
pub struct DocService {
    paths: StoragePaths,
}

impl DocService {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            paths: StoragePaths::new(root),
        }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Copies a master template into the document store under `new_filename`.
    pub fn copy_template(&self, template_filename: &str, new_filename: &str) -> Result<PathBuf> {
        copy::copy_template(&self.paths, template_filename, new_filename)
    }

    /// Substitutes placeholders in the stored document and atomically replaces
    /// it with the result.
    pub fn replace_in_doc(
        &self,
        filename: &str,
        replacements: &BTreeMap<String, String>,
    ) -> Result<Rewrite> {
        let doc_path = self.paths.doc_path(filename);
        let previous = read(&doc_path)?;
        let rendered = placeholders::render(&previous, replacements)?;
        atomic::commit(&doc_path, &rendered.bytes)?;
        Ok(Rewrite {
            previous,
            replaced: rendered.replaced,
        })
    }

    /// Renders the master template with `replacements` and atomically writes
    /// the result over the stored document. Used to fill a document whose own
    /// placeholders were already consumed.
    pub fn regenerate(
        &self,
        template_filename: &str,
        filename: &str,
        replacements: &BTreeMap<String, String>,
    ) -> Result<Rewrite> {
        let template = read(&self.paths.template_path(template_filename))?;
        let doc_path = self.paths.doc_path(filename);
        let previous = read(&doc_path)?;
        let rendered = placeholders::render(&template, replacements)?;
        atomic::commit(&doc_path, &rendered.bytes)?;
        Ok(Rewrite {
            previous,
            replaced: rendered.replaced,
        })
    }

    /// Puts earlier document bytes back, atomically.
    pub fn restore(&self, filename: &str, previous: &[u8]) -> Result<()> {
        atomic::commit(&self.paths.doc_path(filename), previous)
    }

    /// Validates an uploaded template and stores it as `filename` in the
    /// template store. Returns the placeholder keys found in it.
    pub fn store_template(&self, filename: &str, content: &[u8]) -> Result<Vec<String>> {
        let keys = placeholders::find_placeholders(content)?;
        let dir = self.paths.ensure_template_dir()?;
        atomic::commit(&dir.join(filename), content)?;
        Ok(keys)
    }

    /// Deletes a generated document. A file that is already gone is fine.
    pub fn remove_document(&self, filename: &str) -> Result<()> {
        remove(&self.paths.doc_path(filename))
    }

    /// Deletes a stored template file. Only used to undo a failed upload.
    pub fn remove_template(&self, filename: &str) -> Result<()> {
        remove(&self.paths.template_path(filename))
    }

    /// Path of a stored document, checked to exist and be a regular file.
    pub fn document_path(&self, filename: &str) -> Result<PathBuf> {
        let path = self.paths.doc_path(filename);
        let meta = fs::metadata(&path).map_err(|e| AppError::io_at("stat", &path, e))?;
        if !meta.is_file() {
            return Err(AppError::NotFound(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        Ok(path)
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| AppError::io_at("failed to open doc", path, e))
}

fn remove(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::io(format!("failed to remove {}", path.display()), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::placeholders::tests::docx;
    use super::*;

    fn service_with_template(name: &str, bytes: &[u8]) -> (tempfile::TempDir, DocService) {
        let root = tempfile::tempdir().unwrap();
        let service = DocService::new(root.path());
        let dir = service.paths().ensure_template_dir().unwrap();
        fs::write(dir.join(name), bytes).unwrap();
        (root, service)
    }

    fn fio(value: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("fio".to_string(), value.to_string())])
    }

    #[test]
    fn copy_then_fill_produces_expected_text() {
        let (_root, service) = service_with_template("t.docx", &docx(&[&["Hello {fio}"]]));

        service.copy_template("t.docx", "d.docx").unwrap();
        let rewrite = service.replace_in_doc("d.docx", &fio("Alice")).unwrap();

        assert_eq!(rewrite.replaced, 1);
        let bytes = fs::read(service.paths().doc_path("d.docx")).unwrap();
        assert_eq!(placeholders::extract_text(&bytes).unwrap(), "Hello Alice");
        // The master keeps its token.
        let master = fs::read(service.paths().template_path("t.docx")).unwrap();
        assert_eq!(placeholders::extract_text(&master).unwrap(), "Hello {fio}");
    }

    #[test]
    fn failed_parse_leaves_document_untouched() {
        let (_root, service) = service_with_template("t.docx", b"not a package");
        service.copy_template("t.docx", "d.docx").unwrap();

        let err = service.replace_in_doc("d.docx", &fio("Alice")).unwrap_err();

        assert_eq!(err.kind(), "parse");
        assert_eq!(
            fs::read(service.paths().doc_path("d.docx")).unwrap(),
            b"not a package"
        );
    }

    #[test]
    fn missing_document_is_not_found() {
        let (_root, service) = service_with_template("t.docx", b"x");
        let err = service.replace_in_doc("ghost.docx", &fio("A")).unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(service.document_path("ghost.docx").unwrap_err().kind(), "not_found");
    }

    #[test]
    fn regenerate_starts_from_the_master() {
        let (_root, service) = service_with_template("t.docx", &docx(&[&["Hello {fio}"]]));
        service.copy_template("t.docx", "d.docx").unwrap();
        service.replace_in_doc("d.docx", &fio("Alice")).unwrap();

        let rewrite = service.regenerate("t.docx", "d.docx", &fio("Bob")).unwrap();

        assert_eq!(placeholders::extract_text(&rewrite.previous).unwrap(), "Hello Alice");
        let bytes = fs::read(service.paths().doc_path("d.docx")).unwrap();
        assert_eq!(placeholders::extract_text(&bytes).unwrap(), "Hello Bob");
    }

    #[test]
    fn restore_puts_previous_bytes_back() {
        let (_root, service) = service_with_template("t.docx", &docx(&[&["Hello {fio}"]]));
        service.copy_template("t.docx", "d.docx").unwrap();
        let original = fs::read(service.paths().doc_path("d.docx")).unwrap();

        let rewrite = service.replace_in_doc("d.docx", &fio("Alice")).unwrap();
        service.restore("d.docx", &rewrite.previous).unwrap();

        assert_eq!(fs::read(service.paths().doc_path("d.docx")).unwrap(), original);
    }

    #[test]
    fn store_template_rejects_non_documents() {
        let root = tempfile::tempdir().unwrap();
        let service = DocService::new(root.path());

        let err = service.store_template("x.docx", b"plain text").unwrap_err();

        assert_eq!(err.kind(), "parse");
        assert!(!service.paths().template_path("x.docx").exists());
    }

    #[test]
    fn store_template_reports_placeholders() {
        let root = tempfile::tempdir().unwrap();
        let service = DocService::new(root.path());
        let bytes = docx(&[&["{fio} {stavka}"]]);

        let keys = service.store_template("x.docx", &bytes).unwrap();

        assert_eq!(keys, vec!["fio".to_string(), "stavka".to_string()]);
        assert_eq!(fs::read(service.paths().template_path("x.docx")).unwrap(), bytes);
    }

    #[test]
    fn remove_document_tolerates_missing_files() {
        let (_root, service) = service_with_template("t.docx", b"x");
        service.copy_template("t.docx", "d.docx").unwrap();
        service.remove_document("d.docx").unwrap();
        service.remove_document("d.docx").unwrap();
        assert!(!service.paths().doc_path("d.docx").exists());
    }
}
