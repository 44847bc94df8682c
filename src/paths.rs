//! Path helpers for extracted OIV packages
//!
//! OIV archives are usually built on Windows, so entry names may use
//! backslashes. This module handles:
//! - Converting `\` to `/` before entry names touch the filesystem
//! - Rejecting entry names that would land outside the extraction directory
//! - Resolving the default per-user extraction root
//! - Creating directories while remembering which ones were new

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Directory under the per-user data dir that holds extracted packages.
pub const EXTRACTION_DIR_NAME: &str = "oiv";

/// Convert Windows path separators to `/`
/// `content\dlcpacks\x.rpf` -> `content/dlcpacks/x.rpf`
pub fn to_unix_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Resolve an archive entry name against `dest`.
///
/// The name is normalized lexically: `.` is dropped and `..` pops the previous
/// component. Anything that would climb above `dest`, absolute names, drive
/// prefixes and names containing NUL are rejected with `SecurityViolation`.
pub fn sanitize_entry_path(entry_name: &str, dest: &Path) -> Result<PathBuf> {
    let violation = || Error::SecurityViolation {
        entry: entry_name.to_string(),
    };

    if entry_name.contains('\0') {
        return Err(violation());
    }

    let normalized = to_unix_separators(entry_name);
    let mut relative = PathBuf::new();

    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => {
                // "C:" is a plain component on unix but a drive prefix on Windows
                if part.to_string_lossy().contains(':') {
                    return Err(violation());
                }
                relative.push(part);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return Err(violation());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(violation()),
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(violation());
    }

    Ok(dest.join(relative))
}

/// Default extraction root for an archive: `<base>/<archive stem>`.
///
/// When `base` is `None` the per-user data directory is used, i.e.
/// `~/.local/share/oiv/<stem>` on Linux or `%APPDATA%\oiv\<stem>` on Windows.
pub fn default_extraction_root(archive_path: &Path, base: Option<&Path>) -> Result<PathBuf> {
    let base = match base {
        Some(base) => base.to_path_buf(),
        None => dirs::data_dir()
            .ok_or(Error::NoDataDir)?
            .join(EXTRACTION_DIR_NAME),
    };

    let stem = archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "package".to_string());

    Ok(base.join(stem))
}

/// Create `dir` and any missing ancestors, recording each directory created.
///
/// `created` receives parents before children. Directories that already
/// exist are not recorded.
pub fn create_dir_recorded(dir: &Path, created: &mut Vec<PathBuf>) -> Result<()> {
    let mut missing = Vec::new();
    let mut current = Some(dir);
    while let Some(path) = current {
        if path.as_os_str().is_empty() || path.is_dir() {
            break;
        }
        missing.push(path);
        current = path.parent();
    }

    for path in missing.into_iter().rev() {
        match std::fs::create_dir(path) {
            Ok(()) => created.push(path.to_path_buf()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => {}
            Err(e) => return Err(Error::io(path, e)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_unix_separators() {
        assert_eq!(to_unix_separators("content\\dlc\\x.rpf"), "content/dlc/x.rpf");
        assert_eq!(to_unix_separators("already/unix"), "already/unix");
    }

    #[test]
    fn test_sanitize_plain_and_nested() {
        let dest = Path::new("/tmp/out");
        assert_eq!(
            sanitize_entry_path("assembly.xml", dest).unwrap(),
            dest.join("assembly.xml")
        );
        assert_eq!(
            sanitize_entry_path("Pkg\\content\\a.txt", dest).unwrap(),
            dest.join("Pkg").join("content").join("a.txt")
        );
        assert_eq!(
            sanitize_entry_path("./a/../b.txt", dest).unwrap(),
            dest.join("b.txt")
        );
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        let dest = Path::new("/tmp/out");
        for name in ["../evil.txt", "a/../../evil.txt", "..\\evil.txt", "/etc/passwd", "C:/evil.txt", "a\0b"] {
            let err = sanitize_entry_path(name, dest).unwrap_err();
            assert!(
                matches!(err, Error::SecurityViolation { .. }),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_sanitize_rejects_empty() {
        assert!(sanitize_entry_path("./", Path::new("/tmp/out")).is_err());
    }

    #[test]
    fn test_default_extraction_root_with_base() {
        let root = default_extraction_root(Path::new("/downloads/MyMod.oiv"), Some(Path::new("/cache"))).unwrap();
        assert_eq!(root, PathBuf::from("/cache/MyMod"));
    }

    #[test]
    fn test_create_dir_recorded_lists_new_dirs_only() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp.path().join("existing")).unwrap();
        let target = temp.path().join("existing").join("a").join("b");

        let mut created = Vec::new();
        create_dir_recorded(&target, &mut created).unwrap();
        assert!(target.is_dir());
        assert_eq!(
            created,
            vec![temp.path().join("existing").join("a"), target.clone()]
        );

        created.clear();
        create_dir_recorded(&target, &mut created).unwrap();
        assert!(created.is_empty());
    }

    #[test]
    fn test_default_extraction_root_uses_data_dir() {
        if let Some(data) = dirs::data_dir() {
            let root = default_extraction_root(Path::new("pkg.zip"), None).unwrap();
            assert_eq!(root, data.join("oiv").join("pkg"));
        }
    }
}
