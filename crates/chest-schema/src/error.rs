//! Error types for document and migration operations.

use chest_types::IdentityError;

/// Errors that can occur while decoding or migrating a registry document.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The document is not valid JSON or does not match the schema.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The document was written by a newer build.
    #[error("unsupported document version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// No registered step upgrades documents at this version.
    #[error("no migration step registered for version {0}")]
    MissingStep(u32),

    /// A step returned without raising the document version.
    #[error("migration step {step} did not advance version {version}")]
    StalledStep { step: &'static str, version: u32 },

    /// A chest id could not be derived during migration.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
}

/// Convenience alias for schema results.
pub type SchemaResult<T> = Result<T, SchemaError>;
