//! Persisted document schema and migrations for the chest registry.
//!
//! The registry is stored as one JSON document. Version 1 nested receivers
//! inside sender records. Version 2 flattens everything into a single chest
//! list with symmetric id-based links. This crate owns both shapes and the
//! ordered chain of steps that upgrades one into the other.
//!
//! # Modules
//!
//! - [`document`]: [`RegistryDocument`], the persisted root
//! - [`legacy`]: v1 [`LegacySender`] / [`LegacyReceiver`] records
//! - [`migration`]: [`Migrator`] and the [`MigrationStep`] chain
//! - [`error`]: [`SchemaError`]

pub mod document;
pub mod error;
pub mod legacy;
pub mod migration;

pub use document::{RegistryDocument, CURRENT_VERSION, LEGACY_VERSION};
pub use error::{SchemaError, SchemaResult};
pub use legacy::{LegacyReceiver, LegacySender};
pub use migration::{
    FailedLink, FlattenLegacySenders, MigrationContext, MigrationReport, MigrationStep, Migrator,
};
