//! Replace-by-rename writes.
//!
//! Content goes to a temp file created next to the target (same filesystem),
//! which is synced and then renamed over the target in one step. Readers see
//! either the old or the new file, never a partial one. `NamedTempFile`
//! deletes the temp file on drop, so every early return cleans up after
//! itself.

use crate::error::{AppError, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tempfile::Builder;

const TEMP_PREFIX: &str = "doc-";
const TEMP_SUFFIX: &str = ".docx";

/// Atomically replaces (or creates) `target` with `content`.
pub fn commit(target: &Path, content: &[u8]) -> Result<()> {
    commit_with(target, |file| file.write_all(content))
}

/// Atomically replaces `target` with whatever `write` puts into the temp file.
///
/// If `write` fails the temp file is removed and `target` is not touched.
pub fn commit_with<F>(target: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| AppError::io(format!("failed to create temp file in {}", dir.display()), e))?;

    write(temp.as_file_mut()).map_err(|e| AppError::io("failed to write to temp file", e))?;
    temp.as_file_mut()
        .flush()
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| AppError::io("failed to flush temp file", e))?;

    // On failure the PersistError hands the temp file back; dropping it
    // removes it from disk.
    temp.persist(target).map_err(|e| {
        AppError::io(
            format!("failed to replace {} with temp file", target.display()),
            e.error,
        )
    })?;

    Ok(())
}
