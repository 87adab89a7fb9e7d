//! File-backed chest registry.
//!
//! [`ChestRegistry`] is the single entry point embedders use. It owns the
//! cached [`RegistryDocument`](chest_schema::RegistryDocument) for the life
//! of the process and mediates every read and write through the
//! [`ChestGraph`](chest_graph::ChestGraph).
//!
//! # Lifecycle
//!
//! 1. [`ChestRegistry::open`] creates the data directory and rewrites the
//!    do-not-edit marker file. If the config names a default world, pending
//!    migrations run immediately.
//! 2. The first operation loads `chests.json`, or creates and persists an
//!    empty v1 document if the file is missing or blank.
//! 3. Mutations change the cache, then follow the [`WritePolicy`]:
//!    `Immediate` flushes every change, `Deferred` (performance mode)
//!    waits for an explicit [`ChestRegistry::flush`].
//! 4. [`ChestRegistry::shutdown`] performs the final flush.
//!
//! # Design Rules
//!
//! 1. Lookups that find nothing return `None`, never an error.
//! 2. Duplicate inserts and links to unknown chests return `false` and
//!    change nothing.
//! 3. Load failures are fatal; write failures are returned and the cache
//!    stays authoritative so the next flush can retry.
//! 4. The data file is replaced atomically: it holds either the previous or
//!    the new document, never a mix.
//! 5. All access goes through one mutex scoped to the registry instance.

pub mod config;
pub mod error;
pub mod persist;
pub mod registry;
pub mod sink;

pub use config::{RegistryConfig, WritePolicy};
pub use error::{RegistryError, RegistryResult};
pub use registry::ChestRegistry;
pub use sink::MessageSink;

pub use chest_graph::{ChestGraph, ItemChest, ValidationReport};
pub use chest_schema::{MigrationReport, RegistryDocument, CURRENT_VERSION};
pub use chest_types::{
    ChestId, ChestLocation, Coordinate, StaticWorldResolver, WorldRef, WorldResolver,
};
