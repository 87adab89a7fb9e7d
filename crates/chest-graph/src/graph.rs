use serde::{Deserialize, Serialize};
use tracing::debug;

use chest_types::{Coordinate, WorldRef};

use crate::chest::ItemChest;
use crate::validation::ValidationReport;

/// All tracked chests, in insertion order, with symmetric link bookkeeping.
///
/// Lookups are linear scans. The registry is sized for a few thousand
/// chests held in one document, which keeps the serialized form a plain
/// list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChestGraph {
    chests: Vec<ItemChest>,
}

impl ChestGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chests.is_empty()
    }

    /// Iterate over all chests in document order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemChest> {
        self.chests.iter()
    }

    // ---------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------

    pub fn get_by_id(&self, id: &str) -> Option<&ItemChest> {
        self.chests.iter().find(|chest| chest.id().as_str() == id)
    }

    /// Find the chest occupying `coordinate` with either of its halves.
    pub fn get_by_location(&self, coordinate: &Coordinate) -> Option<&ItemChest> {
        self.chests
            .iter()
            .find(|chest| chest.location().contains(coordinate))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Returns `true` if the chest exists and has at least one receiver.
    pub fn is_sender(&self, id: &str) -> bool {
        self.get_by_id(id).is_some_and(ItemChest::is_sender)
    }

    /// Returns `true` if `sender_id` currently sends to `receiver_id`.
    pub fn is_linked(&self, receiver_id: &str, sender_id: &str) -> bool {
        self.get_by_id(sender_id)
            .is_some_and(|sender| sender.receivers().contains(receiver_id))
    }

    /// All chests with at least one receiver, in document order.
    pub fn senders(&self) -> Vec<&ItemChest> {
        self.chests.iter().filter(|chest| chest.is_sender()).collect()
    }

    /// Number of chests owned by `player`, whatever role they play.
    pub fn count_by_owner(&self, player: &str) -> usize {
        self.chests
            .iter()
            .filter(|chest| chest.is_owned_by(player))
            .count()
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Insert `chest` unless a chest with the same id is already tracked.
    ///
    /// Never overwrites. Returns `true` if the chest was inserted. The chest
    /// goes in unlinked: any sender or receiver ids it carries are dropped,
    /// since links only exist through [`link`](Self::link).
    pub fn add_chest(&mut self, mut chest: ItemChest) -> bool {
        if self.contains(chest.id().as_str()) {
            return false;
        }
        let dropped = chest.senders().len() + chest.receivers().len();
        chest.senders_mut().clear();
        chest.receivers_mut().clear();
        debug!(id = %chest.id(), dropped_links = dropped, "chest added");
        self.chests.push(chest);
        true
    }

    /// Make `sender_id` send to `receiver_id`.
    ///
    /// Records the receiver on the sender and the sender on the receiver.
    /// Linking an existing pair again changes nothing and still returns
    /// `true`. Returns `false`, without touching either chest, if either id
    /// is unknown.
    pub fn link(&mut self, receiver_id: &str, sender_id: &str) -> bool {
        let (Some(receiver), Some(sender)) = (self.position(receiver_id), self.position(sender_id))
        else {
            return false;
        };

        let receiver_key = self.chests[receiver].id().clone();
        let sender_key = self.chests[sender].id().clone();
        self.chests[sender].receivers_mut().insert(receiver_key);
        self.chests[receiver].senders_mut().insert(sender_key);
        true
    }

    /// Remove the link from `sender_id` to `receiver_id`.
    ///
    /// Returns `true` if a link existed on either end and was removed.
    pub fn unlink(&mut self, receiver_id: &str, sender_id: &str) -> bool {
        let (Some(receiver), Some(sender)) = (self.position(receiver_id), self.position(sender_id))
        else {
            return false;
        };

        let dropped_receiver = self.chests[sender].receivers_mut().remove(receiver_id);
        let dropped_sender = self.chests[receiver].senders_mut().remove(sender_id);
        dropped_receiver || dropped_sender
    }

    /// Remove a chest and every reference to it.
    ///
    /// All other chests are scrubbed in one pass before the chest itself is
    /// dropped. Returns `true` if the chest was tracked.
    pub fn remove_chest(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };

        for chest in &mut self.chests {
            chest.senders_mut().remove(id);
            chest.receivers_mut().remove(id);
        }
        self.chests.remove(index);
        debug!(id, "chest removed");
        true
    }

    /// Give every chest whose primary coordinate lacks a world the given
    /// one. Returns the number of chests changed.
    pub fn backfill_world(&mut self, world: &WorldRef) -> usize {
        self.chests
            .iter_mut()
            .map(|chest| chest.location_mut().backfill_world(world))
            .filter(|changed| *changed)
            .count()
    }

    /// Check the link invariants without modifying anything.
    pub fn validate(&self) -> ValidationReport {
        ValidationReport::build(self)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.chests
            .iter()
            .position(|chest| chest.id().as_str() == id)
    }
}

impl<'a> IntoIterator for &'a ChestGraph {
    type Item = &'a ItemChest;
    type IntoIter = std::slice::Iter<'a, ItemChest>;

    fn into_iter(self) -> Self::IntoIter {
        self.chests.iter()
    }
}
