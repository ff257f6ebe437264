//! Locate the shared libpython of a venv's base interpreter.
//!
//! IRIS loads Python in-process through `PythonRuntimeLibrary`, so it needs the
//! shared library, not the executable. Candidates are generated from the base
//! interpreter's directory (`home` in `pyvenv.cfg`) and its `major.minor`; the
//! first one that exists wins.

use irisbind_core::Platform;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::venv::{PyVersion, VirtualEnv};

/// Candidate file names, most specific first.
pub fn candidate_names(platform: Platform, v: PyVersion) -> Vec<String> {
    let suffix = platform.shlib_suffix();
    let names = match platform {
        Platform::Windows => vec![
            format!("python{}{}{}", v.major, v.minor, suffix),
            format!("python{}{}", v.major, suffix),
        ],
        Platform::Linux => vec![
            format!("libpython{}{}.1.0", v, suffix),
            format!("libpython{}{}", v, suffix),
            format!("libpython{}{}", v.major, suffix),
            format!("libpython{}", suffix),
        ],
        Platform::MacOs => vec![
            format!("libpython{}{}", v, suffix),
            format!("libpython{}{}", v.major, suffix),
            format!("libpython{}", suffix),
        ],
    };
    uniquified(names)
}

/// Directories that may hold libpython for an interpreter living in `home`.
pub fn candidate_dirs(platform: Platform, home: &Path) -> Vec<PathBuf> {
    let mut dirs = vec![home.to_path_buf()];
    if !platform.is_windows() {
        if let Some(prefix) = home.parent() {
            let lib = prefix.join("lib");
            if platform == Platform::Linux {
                // Debian/Ubuntu multiarch layout.
                dirs.push(lib.join(format!("{}-linux-gnu", std::env::consts::ARCH)));
            }
            dirs.push(lib);
            dirs.push(prefix.join("lib64"));
            dirs.push(prefix.to_path_buf());
        }
    }
    uniquified(dirs)
}

/// First existing candidate, canonicalised.
pub fn find_libpython(platform: Platform, home: &Path, v: PyVersion) -> Option<PathBuf> {
    let names = candidate_names(platform, v);
    for dir in candidate_dirs(platform, home) {
        for name in &names {
            let candidate = dir.join(name);
            tracing::debug!("libpython candidate: {}", candidate.display());
            if let Some(found) = normalize(&candidate) {
                tracing::debug!("libpython found: {}", found.display());
                return Some(found);
            }
        }
    }
    None
}

/// libpython for the interpreter a venv was created from. Falls back to the
/// `python3` on `PATH` when `pyvenv.cfg` has no `home`.
pub fn find_for_venv(venv: &VirtualEnv) -> Option<PathBuf> {
    let version = venv.python_version()?;
    let home = venv.cfg.home().or_else(|| {
        which::which("python3")
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
    })?;
    find_libpython(venv.platform, &home, version)
}

fn normalize(path: &Path) -> Option<PathBuf> {
    if !path.is_absolute() || !path.is_file() {
        return None;
    }
    path.canonicalize().ok()
}

fn uniquified<T: Clone + Eq + std::hash::Hash>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|x| seen.insert(x.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const V311: PyVersion = PyVersion {
        major: 3,
        minor: 11,
    };

    #[test]
    fn test_candidate_names_linux() {
        let names = candidate_names(Platform::Linux, V311);
        assert_eq!(names[0], "libpython3.11.so.1.0");
        assert_eq!(names[1], "libpython3.11.so");
        assert!(names.contains(&"libpython3.so".to_string()));
    }

    #[test]
    fn test_candidate_names_windows() {
        let names = candidate_names(Platform::Windows, V311);
        assert_eq!(names, vec!["python311.dll", "python3.dll"]);
    }

    #[test]
    fn test_candidate_dirs_unix_include_prefix_lib() {
        let dirs = candidate_dirs(Platform::MacOs, Path::new("/opt/py/bin"));
        assert_eq!(dirs[0], PathBuf::from("/opt/py/bin"));
        assert!(dirs.contains(&PathBuf::from("/opt/py/lib")));
        let dirs = candidate_dirs(Platform::Windows, Path::new("/opt/py"));
        assert_eq!(dirs, vec![PathBuf::from("/opt/py")]);
    }

    #[test]
    fn test_find_libpython_in_prefix_lib() {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path().join("bin");
        let lib = tmp.path().join("lib");
        fs::create_dir_all(&home).unwrap();
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("libpython3.11.so"), b"").unwrap();

        let found = find_libpython(Platform::Linux, &home, V311).unwrap();
        assert_eq!(found, lib.join("libpython3.11.so").canonicalize().unwrap());
    }

    #[test]
    fn test_find_libpython_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(find_libpython(Platform::Linux, tmp.path(), V311).is_none());
    }

    #[test]
    fn test_uniquified_keeps_order() {
        assert_eq!(uniquified(vec![1, 2, 1, 2, 3]), vec![1, 2, 3]);
    }
}
