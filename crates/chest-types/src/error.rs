use thiserror::Error;

use crate::coordinate::WorldRef;

/// Errors produced while deriving a chest identity.
///
/// Both variants are fatal to the operation that triggered them: a chest
/// cannot be created or migrated without a resolvable world.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("coordinate ({x}, {y}, {z}) has no world reference")]
    MissingWorld { x: i32, y: i32, z: i32 },

    #[error("world {0} could not be resolved to a name")]
    UnresolvedWorld(WorldRef),
}
