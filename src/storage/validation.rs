//! Path validation
//!
//! Resolves caller-supplied relative paths against the base directory and
//! rejects anything that would escape it.

use log::debug;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::FsError;

/// The sandbox root every operation is confined to.
///
/// Always holds a canonical absolute path, so containment can be checked
/// with a plain `starts_with` on canonicalized targets.
#[derive(Debug, Clone)]
pub struct BaseDir {
    root: PathBuf,
}

impl BaseDir {
    /// Create the directory (recursively) if needed and pin its canonical path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FsError> {
        let path = path.as_ref();
        fs::create_dir_all(path)?;
        let root = fs::canonicalize(path)?;
        if !root.is_dir() {
            return Err(FsError::not_a_directory(&path.to_string_lossy()));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` to an absolute path inside the base directory.
    ///
    /// Fails with `AccessDenied` when the input has a `..` segment, is
    /// absolute, or resolves (through symlinks) outside the base.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, FsError> {
        if has_parent_segment(relative) {
            return Err(FsError::access_denied(relative));
        }

        let mut joined = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => joined.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(FsError::access_denied(relative));
                }
            }
        }

        let resolved = canonicalize_existing_prefix(&joined, relative)?;
        if !resolved.starts_with(&self.root) {
            debug!(
                "Rejected {}: resolves to {} outside {}",
                relative,
                resolved.display(),
                self.root.display()
            );
            return Err(FsError::access_denied(relative));
        }

        Ok(resolved)
    }
}

/// Lexical check for `..` segments, done before any normalization.
pub fn has_parent_segment(relative: &str) -> bool {
    relative.split(['/', '\\']).any(|segment| segment == "..")
}

/// True for errors meaning "nothing at this path", including a path that
/// runs through a regular file (`a.txt/child`).
pub fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the
/// missing tail. Existing entries are followed through symlinks.
fn canonicalize_existing_prefix(path: &Path, relative: &str) -> Result<PathBuf, FsError> {
    let mut existing = path;
    let mut tail: Vec<&OsStr> = Vec::new();

    loop {
        match fs::symlink_metadata(existing) {
            Ok(_) => break,
            // A regular file in the middle of the path means the target is missing too
            Err(e) if is_missing(&e) => {
                let (Some(name), Some(parent)) = (existing.file_name(), existing.parent()) else {
                    return Err(FsError::access_denied(relative));
                };
                tail.push(name);
                existing = parent;
            }
            Err(e) => return Err(FsError::from(e)),
        }
    }

    let mut resolved = match fs::canonicalize(existing) {
        Ok(canonical) => canonical,
        // The entry exists but its target does not: a dangling symlink.
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(FsError::access_denied(relative));
        }
        Err(e) => return Err(FsError::from(e)),
    };

    for name in tail.iter().rev() {
        resolved.push(name);
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, BaseDir) {
        let dir = TempDir::new().unwrap();
        let base = BaseDir::open(dir.path().join("sandbox")).unwrap();
        (dir, base)
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let base = BaseDir::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert!(base.root().is_absolute());
    }

    #[test]
    fn test_parent_segment_detection() {
        assert!(has_parent_segment(".."));
        assert!(has_parent_segment("a/../b"));
        assert!(has_parent_segment("a\\..\\b"));
        assert!(!has_parent_segment("a/..b/c"));
        assert!(!has_parent_segment("..hidden"));
    }

    #[test]
    fn test_parent_segment_rejected_even_when_contained() {
        let (_dir, base) = sandbox();
        fs::create_dir(base.root().join("a")).unwrap();
        assert!(matches!(
            base.resolve("a/../b.txt"),
            Err(FsError::AccessDenied(_))
        ));
        assert!(matches!(
            base.resolve("../escape.txt"),
            Err(FsError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_absolute_path_rejected() {
        let (_dir, base) = sandbox();
        assert!(matches!(
            base.resolve("/etc/passwd"),
            Err(FsError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_empty_and_dot_resolve_to_root() {
        let (_dir, base) = sandbox();
        assert_eq!(base.resolve("").unwrap(), base.root());
        assert_eq!(base.resolve(".").unwrap(), base.root());
        assert_eq!(base.resolve("./").unwrap(), base.root());
    }

    #[test]
    fn test_missing_target_resolves_under_root() {
        let (_dir, base) = sandbox();
        let resolved = base.resolve("new/dir/file.txt").unwrap();
        assert_eq!(resolved, base.root().join("new").join("dir").join("file.txt"));
    }

    #[test]
    fn test_path_through_regular_file_resolves() {
        let (_dir, base) = sandbox();
        fs::write(base.root().join("a.txt"), "x").unwrap();

        let resolved = base.resolve("a.txt/child").unwrap();
        assert_eq!(resolved, base.root().join("a.txt").join("child"));
        assert!(is_missing(&fs::metadata(&resolved).unwrap_err()));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (dir, base) = sandbox();
        let outside = dir.path().join("outside");
        fs::create_dir(&outside).unwrap();
        fs::write(outside.join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(&outside, base.root().join("link")).unwrap();

        assert!(matches!(
            base.resolve("link/secret.txt"),
            Err(FsError::AccessDenied(_))
        ));
        assert!(matches!(
            base.resolve("link/new.txt"),
            Err(FsError::AccessDenied(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_allowed() {
        let (_dir, base) = sandbox();
        fs::create_dir(base.root().join("real")).unwrap();
        std::os::unix::fs::symlink(base.root().join("real"), base.root().join("alias")).unwrap();

        let resolved = base.resolve("alias/file.txt").unwrap();
        assert_eq!(resolved, base.root().join("real").join("file.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_rejected() {
        let (dir, base) = sandbox();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), base.root().join("dangling"))
            .unwrap();
        assert!(matches!(
            base.resolve("dangling"),
            Err(FsError::AccessDenied(_))
        ));
    }
}
