use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use chest_types::{ChestId, ChestLocation, IdentityError, WorldResolver};

/// A tracked chest.
///
/// The id and location are fixed at construction. The sender and receiver
/// sets are only changed through [`ChestGraph`](crate::ChestGraph), which
/// keeps both ends of every link in step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChest {
    id: ChestId,
    /// Display name. Empty means unnamed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "cords")]
    location: ChestLocation,
    /// Owning player identifier.
    #[serde(rename = "playerID", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Chests that send to this one.
    #[serde(default)]
    senders: BTreeSet<ChestId>,
    /// Chests this one sends to.
    #[serde(default)]
    receivers: BTreeSet<ChestId>,
}

impl ItemChest {
    /// Create an unlinked chest at `location`, deriving its id.
    pub fn new(
        location: ChestLocation,
        resolver: &dyn WorldResolver,
    ) -> Result<Self, IdentityError> {
        let id = ChestId::generate(&location, resolver)?;
        Ok(Self {
            id,
            name: String::new(),
            location,
            owner: None,
            senders: BTreeSet::new(),
            receivers: BTreeSet::new(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn id(&self) -> &ChestId {
        &self.id
    }

    /// Display name, or `None` if the chest is unnamed.
    pub fn name(&self) -> Option<&str> {
        (!self.name.is_empty()).then_some(self.name.as_str())
    }

    pub fn location(&self) -> &ChestLocation {
        &self.location
    }

    pub fn senders(&self) -> &BTreeSet<ChestId> {
        &self.senders
    }

    pub fn receivers(&self) -> &BTreeSet<ChestId> {
        &self.receivers
    }

    /// A sender has at least one receiver.
    pub fn is_sender(&self) -> bool {
        !self.receivers.is_empty()
    }

    /// A receiver has at least one sender.
    pub fn is_receiver(&self) -> bool {
        !self.senders.is_empty()
    }

    pub fn is_owned_by(&self, player: &str) -> bool {
        self.owner.as_deref() == Some(player)
    }

    pub(crate) fn location_mut(&mut self) -> &mut ChestLocation {
        &mut self.location
    }

    pub(crate) fn senders_mut(&mut self) -> &mut BTreeSet<ChestId> {
        &mut self.senders
    }

    pub(crate) fn receivers_mut(&mut self) -> &mut BTreeSet<ChestId> {
        &mut self.receivers
    }
}
