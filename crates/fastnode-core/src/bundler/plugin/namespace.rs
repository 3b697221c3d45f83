//! Per-namespace checks on `onResolve` output.
//!
//! - every match needs a non-empty `path`
//! - `file` paths must be absolute and free of `..` segments
//! - `dataurl` paths must start with `data:`
//! - any other namespace needs a registered loader
//!
//! Everything except the `path` presence check is skipped for externals.

use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::types::{DATAURL_NAMESPACE, FILE_NAMESPACE};

/// Which absolute-path rules apply to `file` namespace results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathConvention {
    /// Absolute paths start with `/`.
    Posix,
    /// Drive-letter paths. The separator check is not enforced.
    Windows,
}

impl PathConvention {
    #[must_use]
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    fn is_separator(self, c: char) -> bool {
        match self {
            Self::Posix => c == '/',
            Self::Windows => c == '/' || c == '\\',
        }
    }
}

impl Default for PathConvention {
    fn default() -> Self {
        Self::host()
    }
}

/// Answers whether a namespace has an `onLoad` handler.
pub trait LoaderSet {
    fn has_loader(&self, namespace: &str) -> bool;
}

/// Validate a candidate resolution.
pub fn validate(
    path: &str,
    namespace: &str,
    external: bool,
    loaders: &(impl LoaderSet + ?Sized),
    convention: PathConvention,
) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::MissingPath);
    }

    if external {
        return Ok(());
    }

    match namespace {
        "" | FILE_NAMESPACE => {
            if convention == PathConvention::Posix && !path.starts_with('/') {
                return Err(ValidationError::NotAbsolute {
                    path: path.to_string(),
                });
            }
            if path.split(|c| convention.is_separator(c)).any(|seg| seg == "..") {
                return Err(ValidationError::ParentTraversal {
                    path: path.to_string(),
                });
            }
        }
        DATAURL_NAMESPACE => {
            if !path.starts_with("data:") {
                return Err(ValidationError::NotDataUrl {
                    path: path.to_string(),
                });
            }
        }
        other => {
            if !loaders.has_loader(other) {
                return Err(ValidationError::MissingLoader {
                    namespace: other.to_string(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Loaders(&'static [&'static str]);

    impl LoaderSet for Loaders {
        fn has_loader(&self, namespace: &str) -> bool {
            self.0.contains(&namespace)
        }
    }

    const NONE: Loaders = Loaders(&[]);

    fn posix(path: &str, namespace: &str, external: bool) -> Result<(), ValidationError> {
        validate(path, namespace, external, &NONE, PathConvention::Posix)
    }

    #[test]
    fn test_empty_path_rejected_even_when_external() {
        assert_eq!(posix("", "file", false), Err(ValidationError::MissingPath));
        assert_eq!(posix("", "file", true), Err(ValidationError::MissingPath));
        assert_eq!(posix("", "anything", true), Err(ValidationError::MissingPath));
    }

    #[test]
    fn test_file_requires_absolute_posix_path() {
        assert!(posix("/src/a.js", "file", false).is_ok());
        assert!(matches!(
            posix("relative/file.js", "file", false),
            Err(ValidationError::NotAbsolute { .. })
        ));
    }

    #[test]
    fn test_file_rejects_parent_segments() {
        assert!(matches!(
            posix("/src/../etc/passwd", "file", false),
            Err(ValidationError::ParentTraversal { .. })
        ));
        // A dotted file name is not a traversal segment.
        assert!(posix("/src/..hidden/a.js", "file", false).is_ok());
    }

    #[test]
    fn test_empty_namespace_gets_file_rules() {
        assert!(posix("/src/a.js", "", false).is_ok());
        assert!(matches!(
            posix("relative/a.js", "", false),
            Err(ValidationError::NotAbsolute { .. })
        ));
        assert!(matches!(
            posix("/src/../a.js", "", false),
            Err(ValidationError::ParentTraversal { .. })
        ));
    }

    #[test]
    fn test_external_skips_namespace_rules() {
        assert!(posix("rel.js", "file", true).is_ok());
        assert!(posix("notdata", "dataurl", true).is_ok());
        assert!(posix("x", "custom-ns", true).is_ok());
    }

    #[test]
    fn test_windows_skips_separator_check_only() {
        let win = |p: &str| validate(p, "file", false, &NONE, PathConvention::Windows);
        assert!(win("C:\\src\\a.js").is_ok());
        assert!(win("relative.js").is_ok());
        assert!(matches!(
            win("C:\\src\\..\\a.js"),
            Err(ValidationError::ParentTraversal { .. })
        ));
    }

    #[test]
    fn test_dataurl_requires_prefix() {
        assert!(posix("data:text/javascript,export default 1", "dataurl", false).is_ok());
        assert!(matches!(
            posix("notdata", "dataurl", false),
            Err(ValidationError::NotDataUrl { .. })
        ));
    }

    #[test]
    fn test_custom_namespace_needs_loader() {
        assert_eq!(
            posix("x", "custom-ns", false),
            Err(ValidationError::MissingLoader {
                namespace: "custom-ns".to_string()
            })
        );
        let loaders = Loaders(&["custom-ns"]);
        assert!(validate("x", "custom-ns", false, &loaders, PathConvention::Posix).is_ok());
    }
}
