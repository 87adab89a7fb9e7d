use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use chest_types::{StaticWorldResolver, WorldRef};

use crate::error::{RegistryError, RegistryResult};

/// Name of the data file inside the data directory.
pub const DEFAULT_DATA_FILE: &str = "chests.json";

/// Name of the marker file placed next to the data file.
pub const DEFAULT_MARKER_FILE: &str =
    "README (don't touch the json file if you don't know what you are doing)";

/// When mutations reach durable storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// Flush after every mutation that changed the document.
    #[default]
    Immediate,
    /// Performance mode: keep changes in the cache until `flush()`.
    Deferred,
}

impl WritePolicy {
    pub fn from_performance_mode(performance_mode: bool) -> Self {
        if performance_mode {
            Self::Deferred
        } else {
            Self::Immediate
        }
    }

    pub fn is_deferred(self) -> bool {
        matches!(self, Self::Deferred)
    }
}

/// Registry configuration, usually read from a TOML file.
///
/// Every key is optional:
///
/// ```toml
/// data_dir = "plugins/ItemChestSorter"
/// performance_mode = true
/// default_world = "2d4e6a1c-0000-4000-8000-000000000000"
///
/// [worlds]
/// "2d4e6a1c-0000-4000-8000-000000000000" = "world"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub data_dir: PathBuf,
    pub data_file: String,
    pub marker_file: String,
    pub performance_mode: bool,
    /// World assigned to legacy coordinates. When set, migrations run as
    /// soon as the registry is opened.
    pub default_world: Option<WorldRef>,
    /// World id to world name table for [`StaticWorldResolver`].
    pub worlds: BTreeMap<WorldRef, String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("plugins/ItemChestSorter"),
            data_file: DEFAULT_DATA_FILE.to_string(),
            marker_file: DEFAULT_MARKER_FILE.to_string(),
            performance_mode: false,
            default_world: None,
            worlds: BTreeMap::new(),
        }
    }
}

impl RegistryConfig {
    /// Default configuration rooted at `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> RegistryResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| RegistryError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text).map_err(|e| RegistryError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn data_path(&self) -> PathBuf {
        self.data_dir.join(&self.data_file)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.data_dir.join(&self.marker_file)
    }

    pub fn write_policy(&self) -> WritePolicy {
        WritePolicy::from_performance_mode(self.performance_mode)
    }

    /// A resolver for the `worlds` table.
    pub fn world_resolver(&self) -> StaticWorldResolver {
        self.worlds
            .iter()
            .map(|(world, name)| (world.clone(), name.clone()))
            .collect()
    }
}
