//! Point the IRIS instance at the venv's interpreter.
//!
//! `iris.cpf` holds `PythonRuntimeLibrary`, `PythonPath` and
//! `PythonRuntimeLibraryVersion` under `[config]`. On Linux and macOS those are
//! changed with an `[Actions]` merge file; when the file is ours (no
//! `ISC_CPF_MERGE_FILE`) it is handed to `iris merge` for the instance running
//! from the installation. On Windows `iris.cpf` is edited in place and the
//! instance picks it up on restart.
//!
//! Before the first change the CPF is backed up as `iris.cpf.<md5(site-packages)>`
//! so `unbind` can restore the original values.

use irisbind_core::config::BindConfig;
use irisbind_core::error::{BindError, IoResultExt, Result};
use irisbind_core::iris_version::IrisVersion;
use md5::{Digest, Md5};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::fsutil;
use crate::install::IrisInstall;
use crate::instance::{self, MergeStatus};
use crate::libpython;
use crate::venv::VirtualEnv;

/// Default merge file when `ISC_CPF_MERGE_FILE` is not set.
pub const MERGE_FILE_NAME: &str = "iris_python_merge.cpf";

const ACTIONS_HEADER: &str = "[Actions]";
const MODIFY_PREFIX: &str = "ModifyConfig:PythonRuntimeLibrary=";

const KEY_LIBRARY: &str = "PythonRuntimeLibrary";
const KEY_PATH: &str = "PythonPath";
const KEY_VERSION: &str = "PythonRuntimeLibraryVersion";

/// The three `[config]` values that select the instance's Python.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PythonSettings {
    pub runtime_library: String,
    pub python_path: String,
    pub runtime_version: String,
}

impl PythonSettings {
    /// Read the values from the `[config]` section of CPF text. Missing keys are empty.
    pub fn from_cpf(content: &str) -> Self {
        let mut settings = Self::default();
        for_config_entries(content, |key, value| match key {
            KEY_VERSION => settings.runtime_version = value.to_string(),
            KEY_LIBRARY => settings.runtime_library = value.to_string(),
            KEY_PATH => settings.python_path = value.to_string(),
            _ => {}
        });
        settings
    }

    fn value_of(&self, key: &str) -> Option<&str> {
        match key {
            KEY_LIBRARY => Some(self.runtime_library.as_str()),
            KEY_PATH => Some(self.python_path.as_str()),
            KEY_VERSION => Some(self.runtime_version.as_str()),
            _ => None,
        }
    }

    fn action_line(&self) -> String {
        format!(
            "{}{},PythonPath={},PythonRuntimeLibraryVersion={}",
            MODIFY_PREFIX, self.runtime_library, self.python_path, self.runtime_version
        )
    }
}

/// Calls `f(key, value)` for every `key=value` line of the `[config]` section.
fn for_config_entries(content: &str, mut f: impl FnMut(&str, &str)) {
    let mut in_config = false;
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_config = line.eq_ignore_ascii_case("[config]");
            continue;
        }
        if in_config {
            if let Some((k, v)) = line.split_once('=') {
                f(k, v);
            }
        }
    }
}

/// Rewrite the Python keys of the `[config]` section in place, keeping every
/// other line and the file's line endings. `PythonRuntimeLibrary` and
/// `PythonPath` must already be present; `Err` names the first missing key.
pub fn update_config_section(
    content: &str,
    settings: &PythonSettings,
) -> std::result::Result<String, &'static str> {
    let mut out = String::with_capacity(content.len());
    let mut in_config = false;
    let (mut has_library, mut has_path) = (false, false);
    for raw in content.split_inclusive('\n') {
        let body = raw.trim_end_matches(['\r', '\n']);
        let ending = &raw[body.len()..];
        let trimmed = body.trim();
        if trimmed.starts_with('[') {
            in_config = trimmed.eq_ignore_ascii_case("[config]");
        } else if in_config {
            if let Some((key, _)) = trimmed.split_once('=') {
                if let Some(value) = settings.value_of(key) {
                    has_library |= key == KEY_LIBRARY;
                    has_path |= key == KEY_PATH;
                    out.push_str(&format!("{}={}{}", key, value, ending));
                    continue;
                }
            }
        }
        out.push_str(raw);
    }
    if !has_library {
        return Err(KEY_LIBRARY);
    }
    if !has_path {
        return Err(KEY_PATH);
    }
    Ok(out)
}

/// Insert (or replace) our `ModifyConfig` action in existing merge-file text,
/// keeping every other line the user put there.
pub fn merge_actions(existing: &str, settings: &PythonSettings) -> String {
    let mut lines: Vec<String> = existing
        .lines()
        .filter(|l| !l.trim_start().starts_with(MODIFY_PREFIX))
        .map(str::to_string)
        .collect();
    let action = settings.action_line();
    match lines
        .iter()
        .position(|l| l.trim().eq_ignore_ascii_case(ACTIONS_HEADER))
    {
        Some(i) => lines.insert(i + 1, action),
        None => {
            lines.push(ACTIONS_HEADER.to_string());
            lines.push(action);
        }
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// `iris.cpf.<md5 hex of the site-packages path>`
pub fn backup_path(cpf_path: &Path, site_packages: &Path) -> PathBuf {
    let digest = hex::encode(Md5::digest(site_packages.to_string_lossy().as_bytes()));
    let mut name = cpf_path.as_os_str().to_os_string();
    name.push(".");
    name.push(digest);
    PathBuf::from(name)
}

pub fn merge_file_path(install: &IrisInstall, cfg: &BindConfig) -> PathBuf {
    cfg.merge_file
        .clone()
        .unwrap_or_else(|| install.root.join(MERGE_FILE_NAME))
}

/// How the settings reach the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigMode {
    /// `[Actions]` merge file (Linux, macOS).
    MergeFile,
    /// `iris.cpf` rewritten directly (Windows); needs an instance restart.
    CpfInPlace,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeConfigReport {
    pub mode: ConfigMode,
    /// The merge file, or `iris.cpf` itself.
    pub target: PathBuf,
    pub backup: PathBuf,
    pub backup_created: bool,
    pub settings: PythonSettings,
    /// `None` when the merge was left to whoever owns `ISC_CPF_MERGE_FILE`.
    pub merge: Option<MergeStatus>,
}

#[derive(Debug, Clone)]
enum Target {
    MergeFile { path: PathBuf, auto_merge: bool },
    CpfInPlace { content: String },
}

/// Everything `bind --runtime-config` will write, validated up front.
#[derive(Debug, Clone)]
pub struct RuntimeConfigPlan {
    install: IrisInstall,
    cpf_path: PathBuf,
    backup_path: PathBuf,
    target: Target,
    settings: PythonSettings,
}

impl RuntimeConfigPlan {
    /// Validate the instance version, find libpython and render the new
    /// configuration. Performs no writes.
    pub fn prepare(
        install: &IrisInstall,
        venv: &VirtualEnv,
        site_packages: &Path,
        cfg: &BindConfig,
    ) -> Result<Self> {
        let cpf_path = install.cpf_path();
        let version = install
            .version()
            .ok_or_else(|| BindError::CpfUnreadable(cpf_path.clone()))?;
        if !version.supports_runtime_config() {
            return Err(BindError::UnsupportedIrisVersion {
                found: version.to_string(),
            });
        }
        tracing::debug!("IRIS version {} (minimum {})", version, IrisVersion::MIN_RUNTIME_CONFIG);

        let runtime_library = libpython::find_for_venv(venv)
            .ok_or_else(|| BindError::LibPythonNotFound(venv.interpreter()))?;
        let settings = PythonSettings {
            runtime_library: runtime_library.to_string_lossy().into_owned(),
            python_path: site_packages.to_string_lossy().into_owned(),
            runtime_version: venv
                .python_version()
                .map(|v| v.to_string())
                .unwrap_or_default(),
        };

        let target = if cfg.platform.is_windows() {
            let current = fs::read_to_string(&cpf_path).at_path(&cpf_path)?;
            let content = update_config_section(&current, &settings).map_err(|key| {
                BindError::CpfMissingKey {
                    path: cpf_path.clone(),
                    key,
                }
            })?;
            Target::CpfInPlace { content }
        } else {
            Target::MergeFile {
                path: merge_file_path(install, cfg),
                auto_merge: cfg.merge_file.is_none(),
            }
        };

        Ok(Self {
            install: install.clone(),
            backup_path: backup_path(&cpf_path, site_packages),
            cpf_path,
            target,
            settings,
        })
    }

    pub fn apply(&self) -> Result<RuntimeConfigReport> {
        // An existing backup already holds the pre-bind values; never overwrite it.
        let backup_created = if self.backup_path.exists() {
            false
        } else {
            fs::copy(&self.cpf_path, &self.backup_path).at_path(&self.backup_path)?;
            tracing::info!("Created backup at {}", self.backup_path.display());
            true
        };

        let (mode, target, merge) = match self.target {
            Target::MergeFile {
                ref path,
                auto_merge,
            } => {
                write_merge(path, &self.settings)?;
                let merge = auto_merge.then(|| instance::merge(&self.install, path));
                (ConfigMode::MergeFile, path.clone(), merge)
            }
            Target::CpfInPlace { ref content } => {
                fsutil::write_atomic(&self.cpf_path, content)?;
                tracing::warn!("Updated {}; restart the IRIS instance to apply", self.cpf_path.display());
                (ConfigMode::CpfInPlace, self.cpf_path.clone(), None)
            }
        };
        tracing::info!("PythonRuntimeLibrary set to {}", self.settings.runtime_library);
        tracing::info!("PythonPath set to {}", self.settings.python_path);

        Ok(RuntimeConfigReport {
            mode,
            target,
            backup: self.backup_path.clone(),
            backup_created,
            settings: self.settings.clone(),
            merge,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RestoreOutcome {
    Restored {
        mode: ConfigMode,
        target: PathBuf,
        settings: PythonSettings,
        merge: Option<MergeStatus>,
    },
    NoBackup,
}

/// Put back the values saved at bind time, then drop the backup.
///
/// Windows copies the backup over `iris.cpf`; elsewhere a merge file carrying
/// the backed-up values is written (and merged when it is ours).
pub fn restore(install: &IrisInstall, site_packages: &Path, cfg: &BindConfig) -> Result<RestoreOutcome> {
    let cpf_path = install.cpf_path();
    let backup = backup_path(&cpf_path, site_packages);
    let Some(content) = fsutil::read_optional(&backup)? else {
        return Ok(RestoreOutcome::NoBackup);
    };
    let settings = PythonSettings::from_cpf(&content);

    let (mode, target, auto_merge) = if cfg.platform.is_windows() {
        fsutil::write_atomic(&cpf_path, &content)?;
        tracing::info!("Restored {} from backup", cpf_path.display());
        tracing::warn!("Restart the IRIS instance to apply");
        (ConfigMode::CpfInPlace, cpf_path, false)
    } else {
        let merge_file = merge_file_path(install, cfg);
        write_merge(&merge_file, &settings)?;
        (ConfigMode::MergeFile, merge_file, cfg.merge_file.is_none())
    };
    fsutil::remove_if_exists(&backup)?;

    let merge = auto_merge.then(|| instance::merge(install, &target));
    Ok(RestoreOutcome::Restored {
        mode,
        target,
        settings,
        merge,
    })
}

fn write_merge(path: &Path, settings: &PythonSettings) -> Result<()> {
    let existing = fsutil::read_optional(path)?.unwrap_or_default();
    fsutil::write_atomic(path, &merge_actions(&existing, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPF: &str = "[ConfigFile]\nVersion=2024.1\n\n[config]\nLibPath=\nPythonRuntimeLibrary=/usr/lib/libpython3.10.so\nPythonRuntimeLibraryVersion=3.10\nPythonPath=/old/site-packages\n";

    #[test]
    fn test_settings_from_cpf_config_section() {
        let s = PythonSettings::from_cpf(CPF);
        assert_eq!(s.runtime_library, "/usr/lib/libpython3.10.so");
        assert_eq!(s.runtime_version, "3.10");
        assert_eq!(s.python_path, "/old/site-packages");
    }

    #[test]
    fn test_settings_ignore_other_sections() {
        let s = PythonSettings::from_cpf("[Startup]\nPythonPath=/nope\n[config]\n");
        assert_eq!(s, PythonSettings::default());
    }

    #[test]
    fn test_merge_actions_new_file() {
        let s = PythonSettings {
            runtime_library: "/lib/libpython3.11.so".into(),
            python_path: "/venv/lib/python3.11/site-packages".into(),
            runtime_version: "3.11".into(),
        };
        let out = merge_actions("", &s);
        assert_eq!(
            out,
            "[Actions]\nModifyConfig:PythonRuntimeLibrary=/lib/libpython3.11.so,PythonPath=/venv/lib/python3.11/site-packages,PythonRuntimeLibraryVersion=3.11\n"
        );
    }

    #[test]
    fn test_merge_actions_replaces_and_keeps_user_lines() {
        let existing = "[Startup]\nWebServer=1\n[Actions]\nCreateDatabase:Name=APP\nModifyConfig:PythonRuntimeLibrary=/old,PythonPath=/old,PythonRuntimeLibraryVersion=3.9\n";
        let s = PythonSettings {
            runtime_library: "/new".into(),
            python_path: "/sp".into(),
            runtime_version: "3.12".into(),
        };
        let once = merge_actions(existing, &s);
        let twice = merge_actions(&once, &s);
        assert_eq!(once, twice);
        assert!(once.contains("WebServer=1"));
        assert!(once.contains("CreateDatabase:Name=APP"));
        assert!(!once.contains("/old"));
        assert_eq!(once.matches("ModifyConfig:PythonRuntimeLibrary=").count(), 1);
    }

    #[test]
    fn test_backup_path_is_deterministic() {
        let cpf = Path::new("/usr/irissys/iris.cpf");
        let a = backup_path(cpf, Path::new("/venv/lib/python3.11/site-packages"));
        let b = backup_path(cpf, Path::new("/venv/lib/python3.11/site-packages"));
        let c = backup_path(cpf, Path::new("/other/site-packages"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        let name = a.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, "iris.cpf.50ba3385280f726bb96ef48aed16706e");
    }

    #[test]
    fn test_update_config_section_in_place() {
        let cpf = "[ConfigFile]\r\nVersion=2024.1\r\n[config]\r\nLibPath=\r\nPythonRuntimeLibrary=C:\\old\\python39.dll\r\nPythonPath=C:\\old\\sp\r\n[Startup]\r\nPythonPath=keep\r\n";
        let s = PythonSettings {
            runtime_library: "C:\\Python311\\python311.dll".into(),
            python_path: "C:\\venv\\Lib\\site-packages".into(),
            runtime_version: "3.11".into(),
        };
        let out = update_config_section(cpf, &s).unwrap();
        assert_eq!(
            out,
            "[ConfigFile]\r\nVersion=2024.1\r\n[config]\r\nLibPath=\r\nPythonRuntimeLibrary=C:\\Python311\\python311.dll\r\nPythonPath=C:\\venv\\Lib\\site-packages\r\n[Startup]\r\nPythonPath=keep\r\n"
        );
        assert_eq!(PythonSettings::from_cpf(&out).python_path, s.python_path);
    }

    #[test]
    fn test_update_config_section_requires_keys() {
        let s = PythonSettings::default();
        assert_eq!(
            update_config_section("[config]\nPythonPath=x\n", &s),
            Err("PythonRuntimeLibrary")
        );
        assert_eq!(
            update_config_section("[config]\nPythonRuntimeLibrary=x\n", &s),
            Err("PythonPath")
        );
    }
}
