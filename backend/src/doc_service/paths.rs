use crate::error::{AppError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const TEMPLATES_DIR: &str = "templates";
const DOCUMENTS_DIR: &str = "documents";

/// The two storage directories, both children of one configured root.
///
/// Resolving does not touch the filesystem; the `ensure_*` methods create a
/// directory on demand and are safe to call repeatedly.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    template_dir: PathBuf,
    doc_dir: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            template_dir: root.join(TEMPLATES_DIR),
            doc_dir: root.join(DOCUMENTS_DIR),
        }
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    pub fn doc_dir(&self) -> &Path {
        &self.doc_dir
    }

    pub fn template_path(&self, filename: &str) -> PathBuf {
        self.template_dir.join(filename)
    }

    pub fn doc_path(&self, filename: &str) -> PathBuf {
        self.doc_dir.join(filename)
    }

    pub fn ensure_template_dir(&self) -> Result<&Path> {
        ensure_dir(&self.template_dir)?;
        Ok(&self.template_dir)
    }

    pub fn ensure_doc_dir(&self) -> Result<&Path> {
        ensure_dir(&self.doc_dir)?;
        Ok(&self.doc_dir)
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    // create_dir_all already succeeds when the directory exists.
    fs::create_dir_all(dir)
        .map_err(|e| AppError::io(format!("could not create directory {}", dir.display()), e))
}
