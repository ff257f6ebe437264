//! `irisbind status`

use anyhow::{Context, Result};
use irisbind_core::config::BindConfig;
use irisbind_env::binder::{self, StatusReport};
use irisbind_env::linkage::RecordState;

pub fn cmd_status(cfg: &BindConfig, json: bool) -> Result<()> {
    let report = binder::status(cfg)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize status report")?
        );
    } else {
        print!("{}", render(&report));
    }
    Ok(())
}

fn render(report: &StatusReport) -> String {
    let mut out = String::new();
    let state = match report.state {
        RecordState::Bound => "bound",
        RecordState::Stale => "stale (run `irisbind bind` to refresh)",
        RecordState::NotBound => "not bound",
    };
    out.push_str(&format!("Linkage:   {}\n", state));
    if let Some(ref record) = report.record {
        out.push_str(&format!("Record:    {}\n", record.display()));
    }

    match report.install {
        Some(ref i) => {
            out.push_str(&format!("IRIS:      {}", i.root.display()));
            if let Some(v) = i.version {
                out.push_str(&format!(" ({})", v));
            }
            out.push('\n');
            out.push_str(&format!(
                "{}: {}\n",
                report.library_path_var,
                if i.bin_on_library_path {
                    "includes bin/"
                } else {
                    "missing bin/"
                }
            ));
        }
        None => out.push_str("IRIS:      -\n"),
    }

    match report.venv {
        Some(ref v) => {
            out.push_str(&format!("Venv:      {}", v.root.display()));
            if let Some(ref pv) = v.python_version {
                out.push_str(&format!(" (Python {})", pv));
            }
            out.push('\n');
            if let Some(ref sp) = v.site_packages {
                out.push_str(&format!("Packages:  {}\n", sp.display()));
            }
            if let Some(ref lib) = v.libpython {
                out.push_str(&format!("libpython: {}\n", lib.display()));
            }
        }
        None => out.push_str("Venv:      -\n"),
    }

    for p in &report.problems {
        out.push_str(&format!("⚠ {}\n", p));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use irisbind_core::Platform;
    use std::path::PathBuf;

    #[test]
    fn test_render_unconfigured() {
        let report = StatusReport {
            platform: Platform::Linux,
            library_path_var: "LD_LIBRARY_PATH",
            install: None,
            venv: None,
            record: None,
            state: RecordState::NotBound,
            problems: vec!["IRISINSTALLDIR environment variable must be set".into()],
        };
        let text = render(&report);
        assert!(text.starts_with("Linkage:   not bound\n"));
        assert!(text.contains("IRIS:      -"));
        assert!(text.contains("⚠ IRISINSTALLDIR environment variable must be set"));
    }

    #[test]
    fn test_render_stale_record() {
        let report = StatusReport {
            platform: Platform::Linux,
            library_path_var: "LD_LIBRARY_PATH",
            install: None,
            venv: None,
            record: Some(PathBuf::from("/v/lib/python3.11/site-packages/iris_embedded.pth")),
            state: RecordState::Stale,
            problems: vec![],
        };
        let text = render(&report);
        assert!(text.contains("stale"));
        assert!(text.contains("iris_embedded.pth"));
    }
}
