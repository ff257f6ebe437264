//! 统一环境变量加载逻辑
//!
//! 集中维护 fallback 链，避免在业务代码中重复 `or_else` 调用。
//! 所有函数都接受一个 lookup 闭包，`*_env` 版本直接读取进程环境，
//! 测试中可传入 HashMap 以避免修改全局环境变量。

use std::env;

/// 进程环境变量 lookup
pub fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// 从主变量或别名链读取，返回 Option（空值视为未设置）
pub fn lookup_optional<L>(lookup: &L, primary: &str, aliases: &[&str]) -> Option<String>
where
    L: Fn(&str) -> Option<String> + ?Sized,
{
    std::iter::once(primary)
        .chain(aliases.iter().copied())
        .find_map(|key| {
            lookup(key).and_then(|s| {
                let s = s.trim().to_string();
                if s.is_empty() {
                    None
                } else {
                    Some(s)
                }
            })
        })
}

/// 从主变量或别名链读取，失败时使用默认值
pub fn lookup_or<L, F>(lookup: &L, primary: &str, aliases: &[&str], default: F) -> String
where
    L: Fn(&str) -> Option<String> + ?Sized,
    F: FnOnce() -> String,
{
    lookup_optional(lookup, primary, aliases).unwrap_or_else(default)
}

/// 解析布尔型变量：0/false/no/off 为 false，其他已设置的值为 true
pub fn lookup_bool<L>(lookup: &L, primary: &str, aliases: &[&str], default: bool) -> bool
where
    L: Fn(&str) -> Option<String> + ?Sized,
{
    match lookup_optional(lookup, primary, aliases) {
        Some(s) => !matches!(
            s.to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}

/// 从进程环境读取（主变量或别名）
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    lookup_optional(&process_env, primary, aliases)
}

/// 从进程环境读取，失败时使用默认值
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    lookup_or(&process_env, primary, aliases, default)
}

/// 从进程环境解析布尔值
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    lookup_bool(&process_env, primary, aliases, default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn map(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| m.get(k).cloned()
    }

    #[test]
    fn test_primary_wins_over_alias() {
        let lookup = map(&[("A", "primary"), ("B", "alias")]);
        assert_eq!(
            lookup_optional(&lookup, "A", &["B"]),
            Some("primary".to_string())
        );
    }

    #[test]
    fn test_empty_primary_falls_back_to_alias() {
        let lookup = map(&[("A", "  "), ("B", "/usr/irissys")]);
        assert_eq!(
            lookup_optional(&lookup, "A", &["B"]),
            Some("/usr/irissys".to_string())
        );
    }

    #[test]
    fn test_lookup_bool() {
        let lookup = map(&[("Q", "off"), ("R", "1")]);
        assert!(!lookup_bool(&lookup, "Q", &[], true));
        assert!(lookup_bool(&lookup, "R", &[], false));
        assert!(lookup_bool(&lookup, "MISSING", &[], true));
    }

    #[test]
    fn test_lookup_or_default() {
        let lookup = map(&[]);
        assert_eq!(
            lookup_or(&lookup, "X", &[], || "irisbind=info".to_string()),
            "irisbind=info"
        );
    }
}
