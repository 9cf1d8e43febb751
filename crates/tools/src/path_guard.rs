//! Path validation for the filesystem tools.
//!
//! File tools may only access paths within the allowed roots (when any are
//! configured) and never touch a forbidden prefix such as `~/.ssh`.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PathValidationError {
    #[error("Path '{path}' is outside allowed roots")]
    OutsideAllowedRoots { path: String },

    #[error("Path '{path}' matches forbidden pattern '{pattern}'")]
    ForbiddenPath { path: String, pattern: String },

    #[error("Path traversal detected in '{path}'")]
    PathTraversal { path: String },

    #[error("Failed to canonicalize path '{path}': {reason}")]
    CanonicalizeFailed { path: String, reason: String },
}

/// Allowed roots and forbidden prefixes shared by the file tools.
#[derive(Debug, Clone, Default)]
pub struct PathGuard {
    allowed_roots: Vec<String>,
    forbidden_paths: Vec<String>,
}

impl PathGuard {
    pub fn new(allowed_roots: Vec<String>, forbidden_paths: Vec<String>) -> Self {
        Self {
            allowed_roots,
            forbidden_paths,
        }
    }

    /// A guard that permits every path without `..` components.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Validate a path and return its resolved form.
    ///
    /// Rejects `..` traversal in the raw string, resolves symlinks where the
    /// path (or its parent, for files about to be created) exists, then
    /// checks forbidden prefixes before allowed roots.
    pub fn check(&self, path: &str) -> Result<PathBuf, PathValidationError> {
        let input_path = Path::new(path);

        let path_str = path.replace('\\', "/");
        if path_str.contains("../") || path_str.contains("/..") || path_str == ".." {
            return Err(PathValidationError::PathTraversal { path: path.into() });
        }

        let canonical = if input_path.exists() {
            input_path
                .canonicalize()
                .map_err(|e| PathValidationError::CanonicalizeFailed {
                    path: path.into(),
                    reason: e.to_string(),
                })?
        } else if let Some(parent) = input_path.parent()
            && !parent.as_os_str().is_empty()
            && parent.exists()
        {
            let canonical_parent =
                parent
                    .canonicalize()
                    .map_err(|e| PathValidationError::CanonicalizeFailed {
                        path: path.into(),
                        reason: format!("Parent dir: {e}"),
                    })?;
            canonical_parent.join(input_path.file_name().unwrap_or_default())
        } else {
            input_path.to_path_buf()
        };

        let canonical_str = normalize(&canonical.to_string_lossy());

        for forbidden in &self.forbidden_paths {
            if is_within(&canonical_str, &normalize(&expand_tilde(forbidden))) {
                return Err(PathValidationError::ForbiddenPath {
                    path: path.into(),
                    pattern: forbidden.clone(),
                });
            }
        }

        if !self.allowed_roots.is_empty() {
            let is_allowed = self.allowed_roots.iter().any(|root| {
                let root = Path::new(&expand_tilde(root))
                    .canonicalize()
                    .map(|p| normalize(&p.to_string_lossy()))
                    .unwrap_or_else(|_| normalize(&expand_tilde(root)));
                is_within(&canonical_str, &root)
            });

            if !is_allowed {
                return Err(PathValidationError::OutsideAllowedRoots { path: path.into() });
            }
        }

        Ok(canonical)
    }
}

/// Whole-component prefix match: `/x/docs` contains `/x/docs/a` but not `/x/docs-private`.
fn is_within(path: &str, prefix: &str) -> bool {
    Path::new(path).starts_with(Path::new(prefix))
}

/// Forward slashes, lowercase, no Windows `\\?\` prefix.
fn normalize(path: &str) -> String {
    let normalized = path.replace('\\', "/").to_lowercase();
    normalized
        .strip_prefix("//?/")
        .map(str::to_string)
        .unwrap_or(normalized)
}

/// Expand ~ to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if (path.starts_with("~/") || path == "~")
        && let Some(home) = home_dir()
    {
        return path.replacen('~', &home, 1);
    }
    path.to_string()
}

fn home_dir() -> Option<String> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE").ok()
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(allowed: &[&str], forbidden: &[&str]) -> PathGuard {
        PathGuard::new(
            allowed.iter().map(|s| s.to_string()).collect(),
            forbidden.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn valid_path_no_restrictions() {
        assert!(PathGuard::unrestricted().check("/home/user/project/file.txt").is_ok());
    }

    #[test]
    fn path_traversal_blocked() {
        let err = PathGuard::unrestricted().check("../../../etc/passwd").unwrap_err();
        assert!(matches!(err, PathValidationError::PathTraversal { .. }));

        assert!(PathGuard::unrestricted()
            .check("/home/user/../../../etc/passwd")
            .is_err());
    }

    #[test]
    fn forbidden_path_blocked() {
        match guard(&[], &["/etc"]).check("/etc/passwd").unwrap_err() {
            PathValidationError::ForbiddenPath { pattern, .. } => assert_eq!(pattern, "/etc"),
            other => panic!("Expected ForbiddenPath, got: {other}"),
        }
    }

    #[test]
    fn allowed_roots_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().to_string();
        let inside = dir.path().join("notes.txt");
        std::fs::write(&inside, "x").unwrap();

        let g = guard(&[&root], &[]);
        assert!(g.check(&inside.to_string_lossy()).is_ok());
        // File that does not exist yet, parent inside the root
        assert!(g.check(&dir.path().join("new.txt").to_string_lossy()).is_ok());

        let err = g.check("/definitely/not/inside.txt").unwrap_err();
        assert!(matches!(err, PathValidationError::OutsideAllowedRoots { .. }));
    }

    #[test]
    fn forbidden_takes_precedence_over_allowed() {
        let g = guard(&["/home/user"], &["/home/user/.ssh"]);
        assert!(g.check("/home/user/.ssh/id_rsa").is_err());
    }

    #[test]
    fn forbidden_with_tilde_expansion() {
        if let Some(home) = home_dir() {
            let g = guard(&[], &["~/.ssh"]);
            assert!(g.check(&format!("{home}/.ssh/id_rsa")).is_err());
        }
    }

    #[test]
    fn sibling_sharing_root_prefix_is_outside() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        let private = dir.path().join("docs-private");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::create_dir_all(&private).unwrap();
        std::fs::write(private.join("secret.txt"), "x").unwrap();

        let g = guard(&[&docs.to_string_lossy()], &[]);
        let err = g
            .check(&private.join("secret.txt").to_string_lossy())
            .unwrap_err();
        assert!(matches!(err, PathValidationError::OutsideAllowedRoots { .. }));
        assert!(g.check(&docs.join("a.txt").to_string_lossy()).is_ok());
    }

    #[test]
    fn forbidden_prefix_matches_whole_components() {
        let g = guard(&[], &["/etc"]);
        assert!(g.check("/etcetera/notes.txt").is_ok());
        assert!(g.check("/etc").is_err());
    }

    #[test]
    fn comparison_is_case_insensitive() {
        assert!(guard(&[], &["/etc"]).check("/ETC/passwd").is_err());
    }
}
