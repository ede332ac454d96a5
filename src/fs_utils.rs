use crate::error::{Result, ScaffoldError};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolves a rendered relative path under the output root
///
/// The root is made absolute without touching the filesystem, so it does not
/// have to exist yet.
///
/// # Errors
///
/// - `ScaffoldError::PathTraversal` if `rel` is absolute or contains `..`.
/// - `ScaffoldError::Io` if the current directory cannot be determined.
pub fn resolve_output_path(root: &Path, rel: &str) -> Result<PathBuf> {
    let rel_path = Path::new(rel);

    let escapes = rel_path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(ScaffoldError::PathTraversal {
            path: rel_path.to_path_buf(),
        });
    }

    Ok(std::path::absolute(root)?.join(rel_path))
}

/// Reads an existing output file
///
/// Returns `None` if the file does not exist.
///
/// # Errors
///
/// - `ScaffoldError::Io` for any read error other than not-found.
pub fn read_existing(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Creates the parent directories of `path`
///
/// # Errors
///
/// - `ScaffoldError::Io` if a directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Removes a file, returning whether there was one to remove
///
/// # Errors
///
/// - `ScaffoldError::Io` for any removal error other than not-found.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
