//! Durable storage for the registry document.
//!
//! Writes go to a temporary file in the data directory which is synced and
//! then renamed over the data file, so a crash mid-write leaves the previous
//! document in place.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use chest_schema::{RegistryDocument, SchemaError};

use crate::error::{RegistryError, RegistryResult};

/// Static content of the marker file.
pub const MARKER_TEXT: &str = "Don't touch the json file if you don't know what you are doing! \
Really. Don't do it. Change the registry through the plugin, or edit the config file instead.";

/// Read the document at `path`.
///
/// Returns `Ok(None)` if the file does not exist or is blank.
pub fn read_document(path: &Path) -> RegistryResult<Option<RegistryDocument>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(RegistryError::Load {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if text.trim().is_empty() {
        return Ok(None);
    }

    let document = RegistryDocument::from_json(&text).map_err(|e| match e {
        SchemaError::Serialization(reason) => RegistryError::Corrupt {
            path: path.to_path_buf(),
            reason,
        },
        other => RegistryError::Schema(other),
    })?;
    debug!(
        path = %path.display(),
        version = document.version,
        chests = document.chests.len(),
        "registry document loaded"
    );
    Ok(Some(document))
}

/// Atomically replace the document at `path`.
pub fn write_document(path: &Path, document: &RegistryDocument) -> RegistryResult<()> {
    let json = document.to_json_pretty()?;
    let write_err = |source: io::Error| RegistryError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!(path = %path.display(), bytes = json.len(), "registry document written");
    Ok(())
}

/// Rewrite the do-not-edit marker file.
pub fn write_marker(path: &Path) -> io::Result<()> {
    fs::write(path, MARKER_TEXT)
}
