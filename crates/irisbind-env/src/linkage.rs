//! The linkage record: a `.pth` file in the venv's site-packages that puts the
//! embedded runtime's package directories on `sys.path` at interpreter startup.
//!
//! `site.py` treats `#` lines as comments, adds every other existing directory
//! line to `sys.path`, and executes lines starting with `import`.

use irisbind_core::error::Result;
use irisbind_core::Platform;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::fsutil;
use crate::install::IrisInstall;

pub const LINKAGE_FILE_NAME: &str = "iris_embedded.pth";

const HEADER: &str = "# Managed by irisbind; remove with `irisbind unbind`.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    NotBound,
    /// Present and identical to what `bind` would write now.
    Bound,
    /// Present but written for a different installation or layout.
    Stale,
}

#[derive(Debug, Clone)]
pub struct LinkageRecord {
    path: PathBuf,
    content: String,
}

impl LinkageRecord {
    /// Record location for a site-packages directory.
    pub fn path_in(site_packages: &Path) -> PathBuf {
        site_packages.join(LINKAGE_FILE_NAME)
    }

    /// The record `bind` writes for `install` into `site_packages`.
    pub fn for_install(install: &IrisInstall, platform: Platform, site_packages: &Path) -> Self {
        Self {
            path: Self::path_in(site_packages),
            content: render(install, platform),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Current on-disk content, `None` when unbound.
    pub fn read_current(&self) -> Result<Option<String>> {
        fsutil::read_optional(&self.path)
    }

    pub fn state(&self) -> Result<RecordState> {
        Ok(match self.read_current()? {
            None => RecordState::NotBound,
            Some(c) if c == self.content => RecordState::Bound,
            Some(_) => RecordState::Stale,
        })
    }

    pub fn write(&self) -> Result<()> {
        fsutil::write_atomic(&self.path, &self.content)
    }

    /// Put `previous` back: rewrite the old content, or remove the record if there was none.
    pub fn restore(&self, previous: Option<&str>) -> Result<()> {
        match previous {
            Some(old) => fsutil::write_atomic(&self.path, old),
            None => fsutil::remove_if_exists(&self.path).map(|_| ()),
        }
    }

    /// Remove the record from `site_packages`; `false` when there was none.
    pub fn remove_from(site_packages: &Path) -> Result<bool> {
        fsutil::remove_if_exists(&Self::path_in(site_packages))
    }
}

fn render(install: &IrisInstall, platform: Platform) -> String {
    let mut lines = vec![HEADER.to_string()];
    for dir in install.python_dirs() {
        lines.push(dir.to_string_lossy().into_owned());
    }
    let bin = install.bin_dir();
    lines.push(bin.to_string_lossy().into_owned());
    if platform.is_windows() {
        // Python 3.8+ on Windows ignores PATH when resolving extension-module DLLs.
        lines.push(format!(
            "import os; hasattr(os, \"add_dll_directory\") and os.add_dll_directory(r\"{}\")",
            bin.display()
        ));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
