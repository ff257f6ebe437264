//! 环境变量 key 常量与别名定义
//!
//! IRIS 相关变量沿用 InterSystems 官方名称（`IRISINSTALLDIR`、`ISC_*`），
//! 本工具自身的日志开关使用 `IRISBIND_*`。

/// IRIS 安装目录
pub mod install {
    /// 主变量
    pub const IRISINSTALLDIR: &str = "IRISINSTALLDIR";
    /// 容器镜像中由安装脚本设置的别名
    pub const INSTALLDIR_ALIASES: &[&str] = &["ISC_PACKAGE_INSTALLDIR"];

    /// CPF merge 文件路径（IRIS 启动时读取）
    pub const ISC_CPF_MERGE_FILE: &str = "ISC_CPF_MERGE_FILE";
}

/// Python 虚拟环境
pub mod venv {
    /// `python -m venv` 的 activate 脚本写入的变量
    pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";
}

/// 共享库搜索路径（按平台区分变量名）
pub mod library_path {
    pub const LINUX: &str = "LD_LIBRARY_PATH";
    pub const MACOS: &str = "DYLD_LIBRARY_PATH";
    pub const WINDOWS: &str = "PATH";
}

/// 可观测性与日志
pub mod observability {
    pub const IRISBIND_QUIET: &str = "IRISBIND_QUIET";
    pub const IRISBIND_LOG_LEVEL: &str = "IRISBIND_LOG_LEVEL";
    pub const IRISBIND_LOG_JSON: &str = "IRISBIND_LOG_JSON";
}
