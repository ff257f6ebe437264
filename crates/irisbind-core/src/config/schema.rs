//! 按领域分组的配置结构体
//!
//! 进程启动时构造一次，显式传入 binder，业务代码不再直接读取 `std::env::var`。

use super::env_keys::{install, observability as obv_keys, venv};
use super::loader::{lookup_bool, lookup_optional, lookup_or, process_env};
use crate::platform::Platform;
use std::path::PathBuf;

/// bind / unbind / status 所需的全部输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindConfig {
    /// `IRISINSTALLDIR`（或 `ISC_PACKAGE_INSTALLDIR`）
    pub install_dir: Option<PathBuf>,
    /// `VIRTUAL_ENV` 或 `--venv`
    pub virtual_env: Option<PathBuf>,
    /// 平台相关的共享库搜索路径变量的原始值
    pub library_path: Option<String>,
    /// `ISC_CPF_MERGE_FILE`
    pub merge_file: Option<PathBuf>,
    pub platform: Platform,
}

impl BindConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> Self {
        Self::from_lookup(Platform::current(), &process_env)
    }

    /// 从任意 lookup 加载（测试中传入 HashMap）
    pub fn from_lookup<L>(platform: Platform, lookup: &L) -> Self
    where
        L: Fn(&str) -> Option<String> + ?Sized,
    {
        Self {
            install_dir: lookup_optional(
                lookup,
                install::IRISINSTALLDIR,
                install::INSTALLDIR_ALIASES,
            )
            .map(PathBuf::from),
            virtual_env: lookup_optional(lookup, venv::VIRTUAL_ENV, &[]).map(PathBuf::from),
            library_path: lookup_optional(lookup, platform.library_path_var(), &[]),
            merge_file: lookup_optional(lookup, install::ISC_CPF_MERGE_FILE, &[])
                .map(PathBuf::from),
            platform,
        }
    }

    /// CLI 参数覆盖环境变量
    pub fn with_cli_overrides(mut self, virtual_env: Option<PathBuf>) -> Self {
        if let Some(v) = virtual_env {
            self.virtual_env = Some(v);
        }
        self
    }

    /// 共享库搜索路径中的目录列表
    pub fn library_path_dirs(&self) -> Vec<PathBuf> {
        self.library_path
            .as_deref()
            .map(|v| self.platform.split_path_list(v))
            .unwrap_or_default()
    }
}

/// 可观测性配置：quiet、log_level、log_json
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| Self::from_lookup(&process_env))
    }

    pub fn from_lookup<L>(lookup: &L) -> Self
    where
        L: Fn(&str) -> Option<String> + ?Sized,
    {
        Self {
            quiet: lookup_bool(lookup, obv_keys::IRISBIND_QUIET, &[], false),
            log_level: lookup_or(lookup, obv_keys::IRISBIND_LOG_LEVEL, &[], || {
                "irisbind=info".to_string()
            }),
            log_json: lookup_bool(lookup, obv_keys::IRISBIND_LOG_JSON, &[], false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_bind_config_reads_primary_install_var() {
        let m = lookup_from(&[
            ("IRISINSTALLDIR", "/usr/irissys"),
            ("ISC_PACKAGE_INSTALLDIR", "/opt/other"),
            ("VIRTUAL_ENV", "/home/me/.venv"),
            ("LD_LIBRARY_PATH", "/usr/irissys/bin"),
        ]);
        let cfg = BindConfig::from_lookup(Platform::Linux, &|k: &str| m.get(k).cloned());
        assert_eq!(cfg.install_dir, Some(PathBuf::from("/usr/irissys")));
        assert_eq!(cfg.virtual_env, Some(PathBuf::from("/home/me/.venv")));
        assert_eq!(cfg.library_path_dirs(), vec![PathBuf::from("/usr/irissys/bin")]);
        assert!(cfg.merge_file.is_none());
    }

    #[test]
    fn test_bind_config_container_alias() {
        let m = lookup_from(&[("ISC_PACKAGE_INSTALLDIR", "/usr/irissys")]);
        let cfg = BindConfig::from_lookup(Platform::Linux, &|k: &str| m.get(k).cloned());
        assert_eq!(cfg.install_dir, Some(PathBuf::from("/usr/irissys")));
        assert!(cfg.virtual_env.is_none());
    }

    #[test]
    fn test_library_path_var_follows_platform() {
        let m = lookup_from(&[
            ("LD_LIBRARY_PATH", "/linux"),
            ("DYLD_LIBRARY_PATH", "/mac"),
        ]);
        let cfg = BindConfig::from_lookup(Platform::MacOs, &|k: &str| m.get(k).cloned());
        assert_eq!(cfg.library_path.as_deref(), Some("/mac"));
    }

    #[test]
    fn test_cli_override_replaces_virtual_env() {
        let m = lookup_from(&[("VIRTUAL_ENV", "/from/env")]);
        let cfg = BindConfig::from_lookup(Platform::Linux, &|k: &str| m.get(k).cloned())
            .with_cli_overrides(Some(PathBuf::from("/from/cli")));
        assert_eq!(cfg.virtual_env, Some(PathBuf::from("/from/cli")));
    }

    #[test]
    fn test_observability_defaults() {
        let cfg = ObservabilityConfig::from_lookup(&|_: &str| None);
        assert!(!cfg.quiet);
        assert!(!cfg.log_json);
        assert_eq!(cfg.log_level, "irisbind=info");
    }
}
