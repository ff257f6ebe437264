//! Virtual environment discovery: `pyvenv.cfg`, interpreter version and site-packages.

use irisbind_core::config::env_keys::venv as venv_keys;
use irisbind_core::config::BindConfig;
use irisbind_core::error::{BindError, IoResultExt, Result};
use irisbind_core::Platform;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const PYVENV_CFG: &str = "pyvenv.cfg";

/// `major.minor` of a CPython interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PyVersion {
    pub major: u32,
    pub minor: u32,
}

impl PyVersion {
    /// Parse the leading `X.Y` of strings like `3.11.4` or `3.12.1.final.0`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('.');
        let major = parts.next()?.trim().parse().ok()?;
        let minor = parts
            .next()?
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .ok()?;
        Some(Self { major, minor })
    }

    /// From a `lib/pythonX.Y` directory name.
    pub fn from_lib_dir_name(name: &str) -> Option<Self> {
        Self::parse(name.strip_prefix("python")?)
    }
}

impl std::fmt::Display for PyVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Parsed `pyvenv.cfg` (`key = value` lines).
#[derive(Debug, Clone, Default)]
pub struct PyvenvCfg {
    values: HashMap<String, String>,
}

impl PyvenvCfg {
    pub fn parse(content: &str) -> Self {
        let values = content
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    return None;
                }
                let (k, v) = line.split_once('=')?;
                Some((k.trim().to_lowercase(), v.trim().to_string()))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Directory of the base interpreter the venv was created from.
    pub fn home(&self) -> Option<PathBuf> {
        self.get("home").map(PathBuf::from)
    }

    /// `version_info` (uv, virtualenv) or `version` (stdlib venv).
    pub fn version(&self) -> Option<PyVersion> {
        self.get("version_info")
            .or_else(|| self.get("version"))
            .and_then(PyVersion::parse)
    }
}

#[derive(Debug, Clone)]
pub struct VirtualEnv {
    pub root: PathBuf,
    pub cfg: PyvenvCfg,
    pub platform: Platform,
}

impl VirtualEnv {
    pub fn locate(cfg: &BindConfig) -> Result<Self> {
        let root = cfg
            .virtual_env
            .clone()
            .ok_or(BindError::MissingVariable(venv_keys::VIRTUAL_ENV))?;
        Self::open(&root, cfg.platform)
    }

    pub fn open(root: &Path, platform: Platform) -> Result<Self> {
        let cfg_path = root.join(PYVENV_CFG);
        if !cfg_path.is_file() {
            return Err(BindError::NotAVirtualEnv(root.to_path_buf()));
        }
        let content = fs::read_to_string(&cfg_path).at_path(&cfg_path)?;
        Ok(Self {
            root: std::path::absolute(root).at_path(root)?,
            cfg: PyvenvCfg::parse(&content),
            platform,
        })
    }

    /// The venv's own interpreter.
    pub fn interpreter(&self) -> PathBuf {
        if self.platform.is_windows() {
            self.root.join("Scripts").join("python.exe")
        } else {
            self.root.join("bin").join("python")
        }
    }

    /// Interpreter version: `pyvenv.cfg` first, then the `lib/pythonX.Y` directory name.
    pub fn python_version(&self) -> Option<PyVersion> {
        self.cfg
            .version()
            .or_else(|| self.scan_lib_dirs().into_iter().next().map(|(v, _)| v))
    }

    /// Resolve the site-packages directory the interpreter puts on `sys.path`.
    pub fn site_packages(&self) -> Result<PathBuf> {
        if self.platform.is_windows() {
            let sp = self.root.join("Lib").join("site-packages");
            if sp.is_dir() {
                return Ok(sp);
            }
        } else {
            if let Some(v) = self.cfg.version() {
                let sp = self
                    .root
                    .join("lib")
                    .join(format!("python{}", v))
                    .join("site-packages");
                if sp.is_dir() {
                    return Ok(sp);
                }
            }
            if let Some((_, sp)) = self.scan_lib_dirs().into_iter().next() {
                return Ok(sp);
            }
        }
        if let Some(sp) = self.query_interpreter() {
            return Ok(sp);
        }
        Err(BindError::SitePackagesNotFound(self.root.clone()))
    }

    /// `lib/pythonX.Y/site-packages` directories, highest version first.
    fn scan_lib_dirs(&self) -> Vec<(PyVersion, PathBuf)> {
        let lib = self.root.join("lib");
        let mut found: Vec<(PyVersion, PathBuf)> = fs::read_dir(&lib)
            .map(|entries| {
                entries
                    .flatten()
                    .filter_map(|e| {
                        let name = e.file_name();
                        let v = PyVersion::from_lib_dir_name(&name.to_string_lossy())?;
                        let sp = e.path().join("site-packages");
                        sp.is_dir().then_some((v, sp))
                    })
                    .collect()
            })
            .unwrap_or_default();
        found.sort_by(|a, b| b.0.cmp(&a.0));
        found
    }

    /// Ask the venv's interpreter for its purelib path.
    fn query_interpreter(&self) -> Option<PathBuf> {
        let python = self.interpreter();
        if !python.exists() {
            return None;
        }
        let out = Command::new(&python)
            .args([
                "-c",
                "import sysconfig; print(sysconfig.get_path('purelib'))",
            ])
            .output()
            .ok()?;
        if !out.status.success() {
            tracing::debug!(
                "{} failed: {}",
                python.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            );
            return None;
        }
        let sp = PathBuf::from(String::from_utf8_lossy(&out.stdout).trim());
        (sp.is_dir() && sp.starts_with(&self.root)).then_some(sp)
    }
}
