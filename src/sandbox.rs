use crate::error::ExecError;
use log::debug;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

/// Confines path resolution to a single root directory. With no root set,
/// resolution is unconfined.
#[derive(Default)]
pub struct Sandbox {
    root: RwLock<Option<PathBuf>>,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the confinement root. The root itself must exist; it is
    /// canonicalized once here so later checks are plain prefix
    /// comparisons.
    pub fn set_root(&self, path: &Path) -> Result<(), ExecError> {
        let canon = path.canonicalize()?;
        debug!("sandbox root set to {}", canon.display());
        *self.root.write().unwrap() = Some(canon);
        Ok(())
    }

    /// Lifts confinement.
    pub fn clear_root(&self) {
        *self.root.write().unwrap() = None;
    }

    pub fn root(&self) -> Option<PathBuf> {
        self.root.read().unwrap().clone()
    }

    pub fn is_confined(&self) -> bool {
        self.root.read().unwrap().is_some()
    }

    /// Resolves `candidate` against `cwd` and verifies the result stays
    /// under the root. The candidate does not need to exist; the check is
    /// lexical so creation targets can be validated too.
    pub fn resolve(&self, candidate: &str, cwd: &Path) -> Result<PathBuf, ExecError> {
        let joined = if Path::new(candidate).is_absolute() {
            PathBuf::from(candidate)
        } else {
            cwd.join(candidate)
        };
        let normalized = normalize(&joined);

        if let Some(root) = self.root.read().unwrap().as_ref() {
            if !normalized.starts_with(root) {
                debug!("denied path outside sandbox: {}", normalized.display());
                return Err(ExecError::SandboxViolation(normalized));
            }
        }
        Ok(normalized)
    }
}

/// Lexical normalization: drops `.`, folds `..` into its parent. `..` at
/// the filesystem root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(out.components().next_back(), None | Some(Component::RootDir)) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cove-sandbox-{name}"));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        dir.canonicalize().unwrap()
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn unconfined_resolution_passes_through() {
        let sandbox = Sandbox::new();
        let p = sandbox.resolve("../etc", Path::new("/home/user")).unwrap();
        assert_eq!(p, PathBuf::from("/home/etc"));
    }

    #[test]
    fn relative_paths_stay_inside() {
        let root = scratch("inside");
        let sandbox = Sandbox::new();
        sandbox.set_root(&root).unwrap();

        let p = sandbox.resolve("sub/file.txt", &root).unwrap();
        assert!(p.starts_with(&root));
    }

    #[test]
    fn parent_escape_is_denied() {
        let root = scratch("escape");
        let sandbox = Sandbox::new();
        sandbox.set_root(&root).unwrap();

        let err = sandbox.resolve("..", &root).unwrap_err();
        assert!(matches!(err, ExecError::SandboxViolation(_)));

        let err = sandbox.resolve("a/../../b", &root).unwrap_err();
        assert!(matches!(err, ExecError::SandboxViolation(_)));
    }

    #[test]
    fn absolute_path_outside_root_is_denied() {
        let root = scratch("absolute");
        let sandbox = Sandbox::new();
        sandbox.set_root(&root).unwrap();

        let err = sandbox.resolve("/etc/passwd", &root).unwrap_err();
        assert!(matches!(err, ExecError::SandboxViolation(_)));
    }

    #[test]
    fn clear_root_lifts_confinement() {
        let root = scratch("clear");
        let sandbox = Sandbox::new();
        sandbox.set_root(&root).unwrap();
        assert!(sandbox.resolve("/etc", &root).is_err());

        sandbox.clear_root();
        assert!(sandbox.resolve("/etc", &root).is_ok());
    }
}
