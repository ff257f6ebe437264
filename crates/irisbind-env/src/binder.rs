//! Bind / unbind / status: the operations behind the CLI.
//!
//! Every check that can fail with a configuration error runs before the first
//! write. If a later write fails, the linkage record is put back the way it was,
//! so an environment is always either fully bound or fully unbound.

use irisbind_core::config::BindConfig;
use irisbind_core::error::Result;
use irisbind_core::iris_version::IrisVersion;
use irisbind_core::Platform;
use serde::Serialize;
use std::path::PathBuf;

use crate::cpf::{self, RestoreOutcome, RuntimeConfigPlan, RuntimeConfigReport};
use crate::fsutil;
use crate::install::IrisInstall;
use crate::libpython;
use crate::linkage::{LinkageRecord, RecordState};
use crate::venv::VirtualEnv;

#[derive(Debug, Clone, Copy, Default)]
pub struct BindOptions {
    /// Also write the CPF merge file that points IRIS at this venv's interpreter.
    pub runtime_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindOutcome {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct BindReport {
    pub outcome: BindOutcome,
    pub record: PathBuf,
    pub install_dir: PathBuf,
    pub site_packages: PathBuf,
    /// `false` when `<install>/bin` is missing from the platform library path.
    pub library_path_ok: bool,
    pub library_path_hint: Option<String>,
    pub runtime_config: Option<RuntimeConfigReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnbindOutcome {
    Removed,
    NotBound,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnbindReport {
    pub outcome: UnbindOutcome,
    pub record: Option<PathBuf>,
    pub runtime_config: Option<RestoreOutcome>,
}

/// Write the linkage record into the configured venv.
pub fn bind(cfg: &BindConfig, opts: &BindOptions) -> Result<BindReport> {
    let install = IrisInstall::locate(cfg)?;
    let venv = VirtualEnv::locate(cfg)?;
    let site_packages = venv.site_packages()?;
    let record = LinkageRecord::for_install(&install, cfg.platform, &site_packages);
    let plan = if opts.runtime_config {
        Some(RuntimeConfigPlan::prepare(&install, &venv, &site_packages, cfg)?)
    } else {
        None
    };

    let previous = record.read_current()?;
    let outcome = match previous.as_deref() {
        Some(old) if old == record.content() => BindOutcome::Unchanged,
        Some(_) => BindOutcome::Updated,
        None => BindOutcome::Created,
    };
    if outcome != BindOutcome::Unchanged {
        record.write()?;
        tracing::info!("Wrote {}", record.path().display());
    } else {
        tracing::debug!("{} already up to date", record.path().display());
    }

    let runtime_config = match plan {
        Some(plan) => match plan.apply() {
            Ok(report) => Some(report),
            Err(e) => {
                if outcome != BindOutcome::Unchanged {
                    if let Err(rollback) = record.restore(previous.as_deref()) {
                        tracing::error!(
                            "Failed to roll back {}: {}",
                            record.path().display(),
                            rollback
                        );
                    }
                }
                return Err(e);
            }
        },
        None => None,
    };

    let library_path_ok = install.bin_on_library_path(cfg);
    let library_path_hint = if library_path_ok {
        None
    } else {
        let hint = cfg
            .platform
            .export_hint(&install.bin_dir().to_string_lossy());
        tracing::warn!(
            "{} does not include {}; the iris module will fail to load its native library. Run: {}",
            cfg.platform.library_path_var(),
            install.bin_dir().display(),
            hint
        );
        Some(hint)
    };

    Ok(BindReport {
        outcome,
        record: record.path().to_path_buf(),
        install_dir: install.root.clone(),
        site_packages,
        library_path_ok,
        library_path_hint,
        runtime_config,
    })
}

/// Remove the linkage record. Absence of a record, or of any configured venv,
/// is the goal state and not an error.
pub fn unbind(cfg: &BindConfig, opts: &BindOptions) -> Result<UnbindReport> {
    let site_packages = match VirtualEnv::locate(cfg).and_then(|v| v.site_packages()) {
        Ok(sp) => sp,
        Err(e) if e.is_configuration() && !opts.runtime_config => {
            tracing::warn!("Nothing to unbind: {}", e);
            return Ok(UnbindReport {
                outcome: UnbindOutcome::NotBound,
                record: None,
                runtime_config: None,
            });
        }
        Err(e) => return Err(e),
    };

    // Validate before removing anything.
    let install = if opts.runtime_config {
        Some(IrisInstall::locate(cfg)?)
    } else {
        None
    };

    let record = LinkageRecord::path_in(&site_packages);
    let previous = fsutil::read_optional(&record)?;
    let outcome = if LinkageRecord::remove_from(&site_packages)? {
        tracing::info!("Removed {}", record.display());
        UnbindOutcome::Removed
    } else {
        tracing::debug!("No linkage record at {}", record.display());
        UnbindOutcome::NotBound
    };

    let runtime_config = match install {
        Some(install) => match cpf::restore(&install, &site_packages, cfg) {
            Ok(restored) => {
                if matches!(restored, RestoreOutcome::NoBackup) {
                    tracing::warn!("Backup file not found; IRIS Python settings left unchanged");
                }
                Some(restored)
            }
            Err(e) => {
                if let Some(ref old) = previous {
                    if let Err(rollback) = fsutil::write_atomic(&record, old) {
                        tracing::error!(
                            "Failed to put back {}: {}",
                            record.display(),
                            rollback
                        );
                    }
                }
                return Err(e);
            }
        },
        None => None,
    };

    Ok(UnbindReport {
        outcome,
        record: Some(record),
        runtime_config,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallStatus {
    pub root: PathBuf,
    pub version: Option<IrisVersion>,
    pub python_dirs: Vec<PathBuf>,
    pub bin_on_library_path: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VenvStatus {
    pub root: PathBuf,
    pub python_version: Option<String>,
    pub site_packages: Option<PathBuf>,
    pub libpython: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub platform: Platform,
    pub library_path_var: &'static str,
    pub install: Option<InstallStatus>,
    pub venv: Option<VenvStatus>,
    pub record: Option<PathBuf>,
    pub state: RecordState,
    /// Configuration problems found while inspecting; status itself never fails on them.
    pub problems: Vec<String>,
}

impl StatusReport {
    pub fn is_bound(&self) -> bool {
        self.state == RecordState::Bound
    }
}

/// Read-only inspection. Configuration problems are collected, filesystem errors propagate.
pub fn status(cfg: &BindConfig) -> Result<StatusReport> {
    let mut problems = Vec::new();

    let install = match IrisInstall::locate(cfg) {
        Ok(i) => Some(i),
        Err(e) if e.is_configuration() => {
            problems.push(e.to_string());
            None
        }
        Err(e) => return Err(e),
    };

    let venv = match VirtualEnv::locate(cfg) {
        Ok(v) => Some(v),
        Err(e) if e.is_configuration() => {
            problems.push(e.to_string());
            None
        }
        Err(e) => return Err(e),
    };

    let site_packages = match venv.as_ref().map(VirtualEnv::site_packages) {
        Some(Ok(sp)) => Some(sp),
        Some(Err(e)) if e.is_configuration() => {
            problems.push(e.to_string());
            None
        }
        Some(Err(e)) => return Err(e),
        None => None,
    };

    let state = match (&install, &site_packages) {
        (Some(i), Some(sp)) => LinkageRecord::for_install(i, cfg.platform, sp).state()?,
        // Without an installation we cannot tell stale from current; presence is enough.
        (None, Some(sp)) => {
            if LinkageRecord::path_in(sp).exists() {
                RecordState::Stale
            } else {
                RecordState::NotBound
            }
        }
        _ => RecordState::NotBound,
    };

    Ok(StatusReport {
        platform: cfg.platform,
        library_path_var: cfg.platform.library_path_var(),
        install: install.as_ref().map(|i| InstallStatus {
            root: i.root.clone(),
            version: i.version(),
            python_dirs: i.python_dirs(),
            bin_on_library_path: i.bin_on_library_path(cfg),
        }),
        venv: venv.as_ref().map(|v| VenvStatus {
            root: v.root.clone(),
            python_version: v.python_version().map(|pv| pv.to_string()),
            site_packages: site_packages.clone(),
            libpython: libpython::find_for_venv(v),
        }),
        record: site_packages.as_deref().map(LinkageRecord::path_in),
        state,
        problems,
    })
}
