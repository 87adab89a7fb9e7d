use serde::{Deserialize, Serialize};

use chest_graph::ChestGraph;

use crate::error::{SchemaError, SchemaResult};
use crate::legacy::LegacySender;

/// Version of freshly created documents, and of the nested sender format.
pub const LEGACY_VERSION: u32 = 1;

/// Newest document version this build reads and writes.
pub const CURRENT_VERSION: u32 = 2;

/// The persisted root of the registry.
///
/// `sender` is only populated in v1 documents. It is omitted from the
/// output once empty, so migrated documents carry no legacy fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    /// Files written before versioning carry no `version` key and read as v1.
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default)]
    pub chests: ChestGraph,
    #[serde(
        rename = "sender",
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub legacy_senders: Vec<LegacySender>,
}

impl RegistryDocument {
    /// An empty document at [`LEGACY_VERSION`], as created on first use.
    pub fn new() -> Self {
        Self {
            version: LEGACY_VERSION,
            chests: ChestGraph::new(),
            legacy_senders: Vec::new(),
        }
    }

    pub fn is_current(&self) -> bool {
        self.version >= CURRENT_VERSION
    }

    /// Decode a document, rejecting versions newer than this build.
    pub fn from_json(text: &str) -> SchemaResult<Self> {
        let document: Self =
            serde_json::from_str(text).map_err(|e| SchemaError::Serialization(e.to_string()))?;
        if document.version > CURRENT_VERSION {
            return Err(SchemaError::UnsupportedVersion {
                found: document.version,
                supported: CURRENT_VERSION,
            });
        }
        Ok(document)
    }

    pub fn to_json_pretty(&self) -> SchemaResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SchemaError::Serialization(e.to_string()))
    }
}

impl Default for RegistryDocument {
    fn default() -> Self {
        Self::new()
    }
}

fn legacy_version() -> u32 {
    LEGACY_VERSION
}

/// v1 files may carry `"sender": null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<LegacySender>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<LegacySender>>::deserialize(deserializer)?.unwrap_or_default())
}
