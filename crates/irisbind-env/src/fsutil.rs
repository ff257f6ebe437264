//! Small filesystem helpers: atomic replace and tolerant read/remove.

use irisbind_core::error::{BindError, IoResultExt, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Write `content` to `path` via a temp file in the same directory and a rename,
/// so readers see either the old file or the new one.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".irisbind")
        .suffix(".tmp")
        .tempfile_in(dir)
        .at_path(dir)?;
    tmp.write_all(content.as_bytes()).at_path(tmp.path())?;
    tmp.as_file().sync_all().at_path(tmp.path())?;

    // NamedTempFile is created 0600; the record must be readable by every user of the venv.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o644)).at_path(tmp.path())?;
    }

    tmp.persist(path).map_err(|e| BindError::io(path, e.error))?;
    Ok(())
}

/// `Ok(None)` when the file does not exist.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BindError::io(path, e)),
    }
}

/// Returns whether a file was removed; a missing file is not an error.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BindError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_replaces_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.pth");
        write_atomic(&path, "one\n").unwrap();
        write_atomic(&path, "two\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two\n");
        // no temp files left behind
        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().flatten().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_sets_readable_mode() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.pth");
        write_atomic(&path, "x\n").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_missing_file_is_tolerated() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing");
        assert_eq!(read_optional(&path).unwrap(), None);
        assert!(!remove_if_exists(&path).unwrap());
    }

    #[test]
    fn test_write_into_missing_dir_is_filesystem_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nope").join("a.pth");
        let err = write_atomic(&path, "x").unwrap_err();
        assert_eq!(err.kind(), irisbind_core::ErrorKind::Filesystem);
    }
}
