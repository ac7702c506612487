//! Local state file
//!
//! The CLI remembers which resource it manages and what the server last
//! reported, as a small JSON document next to the desired configuration.
//! A resource the server accepted but never returned is stored by
//! identifier alone.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::convert::ObservedTree;
use crate::lifecycle::ManagedResource;

/// Persisted form of a managed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed: Option<ObservedTree>,
}

impl StoredState {
    pub fn into_resource(self) -> ManagedResource {
        match self.observed {
            Some(observed) => ManagedResource::tracked(self.id, observed),
            None => ManagedResource::unread(self.id),
        }
    }

    /// `None` when the resource holds no identifier
    pub fn from_resource(resource: &ManagedResource) -> Option<Self> {
        Some(Self {
            id: resource.id()?.to_string(),
            observed: resource.observed().cloned(),
        })
    }
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when no state file exists yet
    pub fn load(&self) -> Result<Option<StoredState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {:?}", self.path))?;
        let state = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse state file: {:?}", self.path))?;
        Ok(Some(state))
    }

    pub fn save(&self, state: &StoredState) -> Result<()> {
        let raw = serde_json::to_string_pretty(state).context("Failed to serialize state")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write state file: {:?}", self.path))?;
        debug!("Saved state for {} to {:?}", state.id, self.path);
        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove state file: {:?}", self.path))?;
            debug!("Removed state file {:?}", self.path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn stored() -> StoredState {
        StoredState {
            id: "42".to_string(),
            observed: Some(ObservedTree::new(json!({"id": "42", "name": "site", "cache": {}}))),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_load_remove() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        store.save(&stored()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, stored());
        assert_eq!(loaded.observed.as_ref().unwrap().as_value()["cache"], json!({}));

        store.remove().unwrap();
        assert!(!store.path().exists());
        store.remove().unwrap();
    }

    #[test]
    fn test_corrupt_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();

        let err = StateStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse state file"));
    }

    #[test]
    fn test_resource_conversion() {
        let resource = stored().into_resource();
        assert_eq!(resource.id(), Some("42"));
        assert_eq!(StoredState::from_resource(&resource), Some(stored()));
        assert_eq!(StoredState::from_resource(&ManagedResource::new()), None);
    }

    #[test]
    fn test_identifier_only_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"id": "77"}"#).unwrap();
        let store = StateStore::new(&path);

        let resource = store.load().unwrap().unwrap().into_resource();
        assert_eq!(resource.id(), Some("77"));
        assert!(resource.observed().is_none());

        let state = StoredState::from_resource(&resource).unwrap();
        store.save(&state).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("observed"));
    }
}
