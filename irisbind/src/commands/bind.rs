//! `irisbind bind` / `irisbind unbind`

use anyhow::{Context, Result};
use irisbind_core::config::BindConfig;
use irisbind_core::observability::is_quiet;
use irisbind_env::binder::{self, BindOptions, BindOutcome, BindReport, UnbindOutcome, UnbindReport};
use irisbind_env::cpf::{ConfigMode, RestoreOutcome};
use irisbind_env::instance::MergeStatus;
use std::path::Path;

pub fn cmd_bind(cfg: &BindConfig, opts: &BindOptions, json: bool) -> Result<()> {
    let report = binder::bind(cfg, opts)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize bind report")?
        );
    } else if !is_quiet() {
        print_bind(&report);
    }
    Ok(())
}

pub fn cmd_unbind(cfg: &BindConfig, opts: &BindOptions, json: bool) -> Result<()> {
    let report = binder::unbind(cfg, opts)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize unbind report")?
        );
    } else if !is_quiet() {
        print_unbind(&report);
    }
    Ok(())
}

fn print_bind(report: &BindReport) {
    match report.outcome {
        BindOutcome::Created => eprintln!("✓ Bound {}", report.site_packages.display()),
        BindOutcome::Updated => eprintln!(
            "✓ Re-bound {} (previous linkage replaced)",
            report.site_packages.display()
        ),
        BindOutcome::Unchanged => eprintln!("✓ Already bound: {}", report.site_packages.display()),
    }
    eprintln!("  IRIS:   {}", report.install_dir.display());
    eprintln!("  Record: {}", report.record.display());
    if let Some(ref hint) = report.library_path_hint {
        eprintln!();
        eprintln!("⚠ Native libraries are not on the library path. Before importing iris, run:");
        eprintln!("    {}", hint);
    }
    if let Some(ref rc) = report.runtime_config {
        eprintln!();
        eprintln!("  PythonRuntimeLibrary = {}", rc.settings.runtime_library);
        eprintln!("  PythonPath           = {}", rc.settings.python_path);
        if rc.backup_created {
            eprintln!("  Backup of iris.cpf:    {}", rc.backup.display());
        }
        print_applied(rc.mode, &rc.target, rc.merge.as_ref());
    }
}

fn print_applied(mode: ConfigMode, target: &Path, merge: Option<&MergeStatus>) {
    match (mode, merge) {
        (ConfigMode::CpfInPlace, _) => {
            eprintln!("✓ Updated {}; restart the IRIS instance to apply", target.display())
        }
        (ConfigMode::MergeFile, Some(MergeStatus::Applied { instance })) => {
            eprintln!("✓ Merged {} into instance {}", target.display(), instance)
        }
        (ConfigMode::MergeFile, Some(MergeStatus::Failed { instance, detail })) => {
            eprintln!("⚠ iris merge {} failed: {}", instance, detail);
            eprintln!("  Apply with: iris merge {} {}", instance, target.display());
        }
        (ConfigMode::MergeFile, Some(MergeStatus::NoInstance)) => {
            eprintln!("⚠ No running IRIS instance found for this installation.");
            eprintln!("  Apply with: iris merge <instance> {}", target.display());
        }
        (ConfigMode::MergeFile, None) => {
            eprintln!("  Wrote {} (applied when the instance merges it)", target.display())
        }
    }
}

fn print_unbind(report: &UnbindReport) {
    match (report.outcome, &report.record) {
        (UnbindOutcome::Removed, Some(record)) => eprintln!("✓ Removed {}", record.display()),
        _ => eprintln!("Nothing to unbind."),
    }
    match report.runtime_config {
        Some(RestoreOutcome::Restored {
            mode,
            ref target,
            ref merge,
            ..
        }) => print_applied(mode, target, merge.as_ref()),
        Some(RestoreOutcome::NoBackup) => {
            eprintln!("⚠ No iris.cpf backup for this environment; IRIS settings left as they are.")
        }
        None => {}
    }
}
