//! Error types for roleperm

use thiserror::Error;

/// The main error type for roleperm operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermError {
    #[error("unknown module: {0}")]
    UnknownModule(String),

    #[error("unknown leaf {leaf:?} in module {module}")]
    UnknownLeaf { module: String, leaf: String },

    #[error("unknown sub-module {sub_module:?} in module {module}")]
    UnknownSubModule { module: String, sub_module: String },

    #[error("module {module} is a {actual} module, expected {expected}")]
    WrongShape {
        module: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("role {0} not found")]
    RoleNotFound(String),

    #[error("invalid role name: {0:?}")]
    InvalidRoleName(String),

    #[error("role {0} already exists")]
    DuplicateRole(String),

    #[error("failed to load permissions for role {role}: {source}")]
    LoadFailed { role: u64, source: Box<PermError> },

    #[error("failed to save permissions for role {role}: {source}")]
    SaveFailed { role: u64, source: Box<PermError> },

    #[error("session is {0}")]
    Busy(&'static str),

    #[error("store error: {0}")]
    Store(String),
}

impl PermError {
    /// True for errors that indicate a caller bug rather than a runtime condition
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            PermError::UnknownModule(_)
                | PermError::UnknownLeaf { .. }
                | PermError::UnknownSubModule { .. }
                | PermError::WrongShape { .. }
        )
    }

    /// The store error behind a load or save failure, or self
    pub fn root(&self) -> &PermError {
        match self {
            PermError::LoadFailed { source, .. } | PermError::SaveFailed { source, .. } => source.root(),
            e => e,
        }
    }
}

/// Result type alias for roleperm operations
pub type Result<T> = std::result::Result<T, PermError>;

/// Convert any error to PermError::Store
pub(crate) fn err<E: std::error::Error>(e: E) -> PermError {
    PermError::Store(e.to_string())
}
