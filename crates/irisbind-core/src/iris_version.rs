//! IRIS product version as recorded in `iris.cpf` (`Version=2024.1`).

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// `major.minor`; derives `Ord` so `>=` compares release order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct IrisVersion {
    pub major: u32,
    pub minor: u32,
}

impl IrisVersion {
    /// First release whose CPF accepts `[Actions] ModifyConfig:PythonRuntimeLibrary`.
    pub const MIN_RUNTIME_CONFIG: IrisVersion = IrisVersion {
        major: 2024,
        minor: 1,
    };

    /// Find the first `Version=<major>.<minor>` line in CPF text.
    pub fn from_cpf(content: &str) -> Option<Self> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"(?m)^\s*Version\s*=\s*(\d+)\.(\d+)").expect("static regex")
        });
        let caps = re.captures(content)?;
        Some(Self {
            major: caps[1].parse().ok()?,
            minor: caps[2].parse().ok()?,
        })
    }

    pub fn supports_runtime_config(self) -> bool {
        self >= Self::MIN_RUNTIME_CONFIG
    }
}

impl std::fmt::Display for IrisVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
