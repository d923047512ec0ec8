//! Whole-store snapshots persisted as JSON files.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use docvc_types::{Branch, DocumentVersion, RestorePoint};

use crate::error::StoreResult;

/// Every record held by a store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub versions: Vec<DocumentVersion>,
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub restore_points: Vec<RestorePoint>,
}

impl StoreSnapshot {
    /// Read a snapshot file. A missing file is an empty snapshot.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no state file, starting empty");
            return Ok(Self::default());
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write the snapshot atomically: a temp file in the same directory is
    /// filled, flushed, then renamed over `path`.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        debug!(
            path = %path.display(),
            versions = self.versions.len(),
            branches = self.branches.len(),
            "state saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = StoreSnapshot::load(&dir.path().join("state.json")).unwrap();
        assert_eq!(snapshot, StoreSnapshot::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let snapshot = StoreSnapshot::default();
        snapshot.save(&path).unwrap();
        assert_eq!(StoreSnapshot::load(&path).unwrap(), snapshot);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(StoreSnapshot::load(&path).is_err());
    }
}
