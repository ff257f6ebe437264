//! Error types shared by the binder and the CLI.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Broad failure class; decides the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid environment variable, installation or venv layout.
    Configuration,
    /// Permission denied, path not writable, write/remove failure.
    Filesystem,
}

#[derive(Debug, Error)]
pub enum BindError {
    #[error("{0} environment variable must be set")]
    MissingVariable(&'static str),

    #[error("IRIS installation directory does not exist or is not a directory: {}", .0.display())]
    InstallDirNotFound(PathBuf),

    #[error("unrecognised IRIS installation layout at {}: missing {missing}", path.display())]
    InstallLayout { path: PathBuf, missing: &'static str },

    #[error("not a Python virtual environment (no pyvenv.cfg): {}", .0.display())]
    NotAVirtualEnv(PathBuf),

    #[error("cannot locate site-packages in virtual environment {}", .0.display())]
    SitePackagesNotFound(PathBuf),

    #[error("IRIS version must be 2024.1 or higher (found {found})")]
    UnsupportedIrisVersion { found: String },

    #[error("IRIS configuration file not found or has no Version entry: {}", .0.display())]
    CpfUnreadable(PathBuf),

    #[error("{} has no {key} entry in its [config] section", path.display())]
    CpfMissingKey { path: PathBuf, key: &'static str },

    #[error("libpython not found for the interpreter at {}", .0.display())]
    LibPythonNotFound(PathBuf),

    #[error("permission denied: {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BindError {
    /// Wrap an I/O error with the path it happened on, classifying permission failures.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == io::ErrorKind::PermissionDenied {
            BindError::PermissionDenied { path, source }
        } else {
            BindError::Filesystem { path, source }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BindError::PermissionDenied { .. } | BindError::Filesystem { .. } => {
                ErrorKind::Filesystem
            }
            _ => ErrorKind::Configuration,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// 2 for configuration problems, 3 for filesystem failures.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Configuration => 2,
            ErrorKind::Filesystem => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, BindError>;

/// Attach a path to an `io::Result`.
pub trait IoResultExt<T> {
    fn at_path(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| BindError::io(path, e))
    }
}
