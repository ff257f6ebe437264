//! Host platform model: library-path variable names, shared-library suffixes
//! and virtual environment directory layout differ between Linux, macOS and Windows.

use serde::Serialize;
use std::path::PathBuf;

use crate::config::env_keys::library_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    /// Platform this binary was compiled for. Any non-macOS Unix is treated as Linux.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Name of the variable the dynamic loader searches for shared libraries.
    pub fn library_path_var(self) -> &'static str {
        match self {
            Platform::Linux => library_path::LINUX,
            Platform::MacOs => library_path::MACOS,
            Platform::Windows => library_path::WINDOWS,
        }
    }

    pub fn path_list_separator(self) -> char {
        match self {
            Platform::Windows => ';',
            _ => ':',
        }
    }

    pub fn shlib_suffix(self) -> &'static str {
        match self {
            Platform::Linux => ".so",
            Platform::MacOs => ".dylib",
            Platform::Windows => ".dll",
        }
    }

    pub fn is_windows(self) -> bool {
        self == Platform::Windows
    }

    /// Split a library-path value into its non-empty entries.
    pub fn split_path_list(self, value: &str) -> Vec<PathBuf> {
        value
            .split(self.path_list_separator())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    /// Shell line that prepends `dir` to the library-path variable.
    pub fn export_hint(self, dir: &str) -> String {
        let var = self.library_path_var();
        match self {
            Platform::Windows => format!("set {var}={dir};%{var}%"),
            _ => format!("export {var}={dir}:${var}"),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
        };
        f.write_str(s)
    }
}
