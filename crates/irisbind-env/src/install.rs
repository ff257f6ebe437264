//! Locate and validate the IRIS installation directory.

use irisbind_core::config::env_keys::install as install_keys;
use irisbind_core::config::BindConfig;
use irisbind_core::error::{BindError, IoResultExt, Result};
use irisbind_core::iris_version::IrisVersion;
use std::fs;
use std::path::{Path, PathBuf};

/// Package directories the embedded runtime ships, in import priority order.
/// `lib/python` carries the `iris` module (2024.1+), `mgr/python` holds packages
/// installed with `irispip`.
const PYTHON_DIRS: &[&str] = &["lib/python", "mgr/python"];

pub const CPF_FILE_NAME: &str = "iris.cpf";

#[derive(Debug, Clone)]
pub struct IrisInstall {
    pub root: PathBuf,
}

impl IrisInstall {
    /// Resolve the installation from config. Fails with a configuration error when the
    /// variable is unset, the directory is missing, or it has no `bin/`.
    pub fn locate(cfg: &BindConfig) -> Result<Self> {
        let root = cfg
            .install_dir
            .clone()
            .ok_or(BindError::MissingVariable(install_keys::IRISINSTALLDIR))?;
        Self::open(&root)
    }

    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(BindError::InstallDirNotFound(root.to_path_buf()));
        }
        if !root.join("bin").is_dir() {
            return Err(BindError::InstallLayout {
                path: root.to_path_buf(),
                missing: "bin/",
            });
        }
        // site.py resolves relative .pth lines against site-packages, so the root must
        // be absolute. Symlinks are kept: the record names what the user configured.
        Ok(Self {
            root: std::path::absolute(root).at_path(root)?,
        })
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Existing package directories of the embedded runtime.
    pub fn python_dirs(&self) -> Vec<PathBuf> {
        PYTHON_DIRS
            .iter()
            .map(|rel| rel.split('/').fold(self.root.clone(), |p, seg| p.join(seg)))
            .filter(|p| p.is_dir())
            .collect()
    }

    pub fn cpf_path(&self) -> PathBuf {
        self.root.join(CPF_FILE_NAME)
    }

    /// Version from `iris.cpf`; `None` when the file is unreadable or has no Version line.
    pub fn version(&self) -> Option<IrisVersion> {
        fs::read_to_string(self.cpf_path())
            .ok()
            .and_then(|c| IrisVersion::from_cpf(&c))
    }

    /// Whether `bin/` appears on the platform library-path variable.
    pub fn bin_on_library_path(&self, cfg: &BindConfig) -> bool {
        let bin = self.bin_dir();
        let bin_canon = bin.canonicalize().ok();
        cfg.library_path_dirs().iter().any(|d| {
            d == &bin
                || match (&bin_canon, d.canonicalize().ok()) {
                    (Some(a), Some(b)) => *a == b,
                    _ => false,
                }
        })
    }
}
