//! In-memory chest graph for the chest registry.
//!
//! A [`ChestGraph`] holds every tracked [`ItemChest`] in document order and
//! maintains the link invariants between them:
//!
//! 1. If chest A lists B as a receiver, B exists and lists A as a sender,
//!    and vice versa.
//! 2. No two chests share an id.
//! 3. Removing a chest removes every reference to it.
//!
//! Links are plain id-set membership, never object references, so the graph
//! serializes as a flat list.
//!
//! # Modules
//!
//! - [`chest`]: the [`ItemChest`] entity
//! - [`graph`]: [`ChestGraph`] and its mutation rules
//! - [`validation`]: [`ValidationReport`] for documents loaded from disk

pub mod chest;
pub mod graph;
pub mod validation;

pub use chest::ItemChest;
pub use graph::ChestGraph;
pub use validation::{ValidationReport, Violation, ViolationKind};
