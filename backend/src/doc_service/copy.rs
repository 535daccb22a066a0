use crate::doc_service::paths::StoragePaths;
use crate::error::{AppError, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;

/// Copies `template_filename` from the template store to `new_filename` in the
/// document store and returns the destination path.
///
/// The destination is created or truncated. If the copy fails midway the
/// partial destination is left behind; the caller owns cleanup.
pub fn copy_template(
    paths: &StoragePaths,
    template_filename: &str,
    new_filename: &str,
) -> Result<PathBuf> {
    let source_path = paths.template_path(template_filename);
    let destination_path = paths.doc_path(new_filename);

    paths.ensure_doc_dir()?;

    let mut source = File::open(&source_path)
        .map_err(|e| AppError::io_at("could not open source template", &source_path, e))?;
    let mut destination = File::create(&destination_path).map_err(|e| {
        AppError::io(
            format!("could not create destination document {}", destination_path.display()),
            e,
        )
    })?;

    let copied = io::copy(&mut source, &mut destination)
        .map_err(|e| AppError::io("failed to copy template content", e))?;
    log::debug!(
        "copied {} bytes from {} to {}",
        copied,
        source_path.display(),
        destination_path.display()
    );

    Ok(destination_path)
}
