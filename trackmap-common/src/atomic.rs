//! Atomic file replacement (temp file + rename)
//!
//! Output files are written to a temporary file in the destination directory
//! and renamed over the target, so readers never observe a torn file.

use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with the bytes produced by `write`
///
/// The closure writes into a temporary file created next to `path`. The
/// target is only replaced once the closure succeeds and the data is flushed.
pub fn replace_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };

    let mut temp = NamedTempFile::new_in(&dir)?;
    write(temp.as_file_mut())?;
    temp.as_file_mut().flush()?;
    temp.as_file().sync_all()?;

    temp.persist(path)
        .map_err(|e| Error::Io(e.error))?;

    Ok(())
}
