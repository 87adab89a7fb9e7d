use std::path::PathBuf;

use chest_schema::SchemaError;
use chest_types::IdentityError;

/// Errors from registry operations.
///
/// Structural outcomes (duplicate id, unknown link target, missing chest)
/// are not errors; they come back as `bool` or `Option` values.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The data file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Load {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The data file could not be parsed.
    #[error("corrupt data file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The document could not be written. The cache still holds the
    /// unflushed state.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file could not be read or parsed.
    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// A world could not be resolved while deriving a chest id.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Decoding or migrating the document failed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// I/O error preparing the data directory or marker file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A previous holder of the registry lock panicked.
    #[error("registry lock poisoned")]
    LockPoisoned,
}

impl RegistryError {
    /// Returns `true` for failures of durable storage.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Load { .. } | Self::Corrupt { .. } | Self::Write { .. } | Self::Io(_)
        )
    }
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
