//! Error types for registry lookups and document persistence.

use std::fmt;
use std::path::PathBuf;

/// Record category a lookup or registration was made against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Chain,
    Witness,
    /// Union of chains and witnesses
    Server,
    Bridge,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Chain => "chain",
            Category::Witness => "witness",
            Category::Server => "server",
            Category::Bridge => "bridge",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while loading, querying or persisting the registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("No {category} with name {name}.")]
    NotFound { name: String, category: Category },

    #[error("A {category} named {name} already exists.")]
    Duplicate { name: String, category: Category },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid registry document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed entry {index} in \"{section}\": {reason}")]
    Malformed {
        section: &'static str,
        index: usize,
        reason: String,
    },

    #[error("Cannot determine home directory")]
    NoHomeDir,
}

impl RegistryError {
    pub(crate) fn not_found(name: &str, category: Category) -> Self {
        RegistryError::NotFound {
            name: name.to_string(),
            category,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RegistryError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for a failed lookup, as opposed to a persistence failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
