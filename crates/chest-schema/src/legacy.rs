//! Version 1 records.
//!
//! Before the chest list existed, each sender carried its receivers inline.
//! These types only exist to be read and flattened by the migration chain;
//! nothing writes them.

use serde::{Deserialize, Serialize};

use chest_types::{ChestLocation, WorldRef};

/// A v1 sender with its receivers nested inside it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySender {
    /// Old per-record id. Not carried over: v2 ids are derived from the
    /// location.
    #[serde(rename = "sid", default)]
    pub legacy_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "cords")]
    pub location: ChestLocation,
    #[serde(rename = "receiver", default)]
    pub receivers: Vec<LegacyReceiver>,
    #[serde(rename = "playerID", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// A v1 receiver nested under a [`LegacySender`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyReceiver {
    #[serde(rename = "rid", default)]
    pub legacy_id: String,
    #[serde(rename = "cords")]
    pub location: ChestLocation,
    #[serde(rename = "playerID", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl LegacySender {
    /// Fill in `world` on this sender and all of its receivers where the
    /// primary coordinate has none. Returns the number of locations changed.
    pub fn backfill_world(&mut self, world: &WorldRef) -> usize {
        let own = usize::from(self.location.backfill_world(world));
        let nested = self
            .receivers
            .iter_mut()
            .map(|receiver| receiver.location.backfill_world(world))
            .filter(|changed| *changed)
            .count();
        own + nested
    }
}
