//! Error taxonomy shared by every modspace crate.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModspaceError {
    #[error("Unable to find file '{}'", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dependency '{expected}' cannot be updated from dependency '{found}'")]
    NameMismatch { expected: String, found: String },

    #[error("Library '{name}' is {expected} and cannot be updated from {found} library")]
    KindMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unexpected include continuation: {line}")]
    ParseAnomaly { line: String },

    #[error("Module '{name}' is not part of the workspace manifest")]
    ModuleNotFound { name: String },

    #[error("Failed to parse workspace manifest '{}': {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Workspace manifest '{}' already exists", path.display())]
    ManifestExists { path: PathBuf },
}

impl ModspaceError {
    /// Builds an error from an I/O failure, folding `ErrorKind::NotFound`
    /// into [`ModspaceError::NotFound`].
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Errors that are recorded on a node or adapter instead of aborting
    /// a multi-module operation.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Io { .. })
    }
}

pub type Result<T> = std::result::Result<T, ModspaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ModspaceError::NotFound {
            path: PathBuf::from("/ws/lib/build.gradle"),
        };
        assert_eq!(
            err.to_string(),
            "Unable to find file '/ws/lib/build.gradle'"
        );
    }

    #[test]
    fn test_from_io_not_found() {
        let io_err = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err = ModspaceError::from_io("/missing", io_err);
        assert!(matches!(err, ModspaceError::NotFound { .. }));
        assert!(err.is_io());
    }

    #[test]
    fn test_from_io_other() {
        let io_err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let err = ModspaceError::from_io("/locked", io_err);
        assert!(matches!(err, ModspaceError::Io { .. }));
        assert!(err.is_io());
    }

    #[test]
    fn test_contract_violations_are_not_io() {
        let err = ModspaceError::NameMismatch {
            expected: "core".into(),
            found: "ui".into(),
        };
        assert!(!err.is_io());
        assert!(err.to_string().contains("'core'"));
        assert!(err.to_string().contains("'ui'"));

        let err = ModspaceError::KindMismatch {
            name: "app".into(),
            expected: "internal",
            found: "external",
        };
        assert!(!err.is_io());
        assert!(err.to_string().contains("internal"));
    }

    #[test]
    fn test_module_not_found_display() {
        let err = ModspaceError::ModuleNotFound {
            name: "networking".into(),
        };
        assert!(err.to_string().contains("networking"));
    }
}
