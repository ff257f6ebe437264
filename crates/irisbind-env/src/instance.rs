//! Find the IRIS instance running from an installation and feed it a merge file.
//!
//! `iris all` prints one line per instance, e.g.
//! `up >IRIS   2024.1.0.267.2  1972  /usr/irissys`; the name follows `>` and the
//! installation directory is the last column.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::install::IrisInstall;

/// Result of handing a merge file to `iris merge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeStatus {
    Applied { instance: String },
    Failed { instance: String, detail: String },
    /// No `iris` command, or no instance runs from this installation.
    NoInstance,
}

/// Instance name for `install_root` in `iris all` output.
pub fn parse_instance(iris_all: &str, install_root: &Path) -> Option<String> {
    let canon_root = install_root.canonicalize().ok();
    iris_all.lines().find_map(|line| {
        let (_, rest) = line.split_once('>')?;
        let dir = Path::new(line.split_whitespace().last()?);
        let same = dir == install_root
            || matches!((&canon_root, dir.canonicalize().ok()), (Some(a), Some(b)) if *a == b);
        if !same {
            return None;
        }
        rest.split_whitespace().next().map(str::to_string)
    })
}

/// The installation's own `bin/iris`, else the first `iris` on `PATH`.
pub fn iris_command(install: &IrisInstall) -> Option<PathBuf> {
    let own = install.bin_dir().join("iris");
    if own.is_file() {
        return Some(own);
    }
    which::which("iris").ok()
}

pub fn find_instance(install: &IrisInstall) -> Option<String> {
    let iris = iris_command(install)?;
    let out = Command::new(&iris).arg("all").output().ok()?;
    if !out.status.success() {
        tracing::debug!(
            "{} all failed: {}",
            iris.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        );
        return None;
    }
    parse_instance(&String::from_utf8_lossy(&out.stdout), &install.root)
}

/// Run `iris merge <instance> <merge_file>` for the instance of `install`.
pub fn merge(install: &IrisInstall, merge_file: &Path) -> MergeStatus {
    let (Some(iris), Some(instance)) = (iris_command(install), find_instance(install)) else {
        tracing::warn!(
            "No IRIS instance found for {}; apply with: iris merge <instance> {}",
            install.root.display(),
            merge_file.display()
        );
        return MergeStatus::NoInstance;
    };
    let out = Command::new(&iris)
        .arg("merge")
        .arg(&instance)
        .arg(merge_file)
        .output();
    match out {
        Ok(out) if out.status.success() => {
            tracing::info!("Merged {} into instance {}", merge_file.display(), instance);
            MergeStatus::Applied { instance }
        }
        Ok(out) => {
            let detail = String::from_utf8_lossy(&out.stderr).trim().to_string();
            let detail = if detail.is_empty() {
                out.status.to_string()
            } else {
                detail
            };
            tracing::warn!("iris merge {} failed: {}", instance, detail);
            MergeStatus::Failed { instance, detail }
        }
        Err(e) => {
            tracing::warn!("Could not run {}: {}", iris.display(), e);
            MergeStatus::Failed {
                instance,
                detail: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;

    const IRIS_ALL: &str = "
    Instance Name     Version ID        Port   Directory
    -------------     ----------        ----   ---------
dn  >IRISHEALTH       2023.1.0.229.0    1973   /opt/irishealth
up  >IRIS             2024.1.0.267.2    1972   /usr/irissys
";

    #[test]
    fn test_parse_instance_matches_directory_column() {
        assert_eq!(
            parse_instance(IRIS_ALL, Path::new("/usr/irissys")),
            Some("IRIS".to_string())
        );
        assert_eq!(
            parse_instance(IRIS_ALL, Path::new("/opt/irishealth/")),
            Some("IRISHEALTH".to_string())
        );
    }

    #[test]
    fn test_parse_instance_requires_exact_directory() {
        assert_eq!(parse_instance(IRIS_ALL, Path::new("/usr/iris")), None);
        assert_eq!(parse_instance("", Path::new("/usr/irissys")), None);
    }

    /// Installation whose `bin/iris` answers `all` with one instance and logs `merge` calls.
    #[cfg(unix)]
    pub(crate) fn install_with_fake_iris(root: &Path, merge_exit: i32) -> IrisInstall {
        use std::os::unix::fs::PermissionsExt;
        fs::create_dir_all(root.join("bin")).unwrap();
        let script = root.join("bin").join("iris");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\nif [ \"$1\" = all ]; then\n  echo 'up  >TESTINST  2024.1.0.267.2  1972  {root}'\n  exit 0\nfi\necho \"$@\" >> '{root}/merge.log'\nexit {merge_exit}\n",
                root = root.display(),
                merge_exit = merge_exit
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        IrisInstall::open(root).unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn test_merge_runs_iris_merge_for_instance() {
        let tmp = tempfile::tempdir().unwrap();
        let install = install_with_fake_iris(tmp.path(), 0);
        assert_eq!(find_instance(&install), Some("TESTINST".to_string()));

        let merge_file = tmp.path().join("iris_python_merge.cpf");
        let status = merge(&install, &merge_file);
        assert_eq!(
            status,
            MergeStatus::Applied {
                instance: "TESTINST".into()
            }
        );
        let log = fs::read_to_string(tmp.path().join("merge.log")).unwrap();
        assert_eq!(log.trim(), format!("merge TESTINST {}", merge_file.display()));
    }

    #[cfg(unix)]
    #[test]
    fn test_merge_failure_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let install = install_with_fake_iris(tmp.path(), 1);
        let status = merge(&install, &tmp.path().join("m.cpf"));
        assert!(matches!(status, MergeStatus::Failed { ref instance, .. } if instance == "TESTINST"));
    }
}
