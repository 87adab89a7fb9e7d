//! Foundation types for the chest registry.
//!
//! Every other registry crate depends on `chest-types`. It defines where a
//! chest is and how its identity is derived from that position.
//!
//! # Key Types
//!
//! - [`Coordinate`]: integer block position with an optional [`WorldRef`]
//! - [`ChestLocation`]: primary coordinate plus an optional second half
//! - [`ChestId`]: stable identity derived from a location and world name
//! - [`WorldResolver`]: host-supplied lookup from world id to world name

pub mod coordinate;
pub mod error;
pub mod identity;

pub use coordinate::{ChestLocation, Coordinate, WorldRef};
pub use error::IdentityError;
pub use identity::{ChestId, StaticWorldResolver, WorldResolver};
