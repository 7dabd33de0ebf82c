//! Per-module conversation state.
//!
//! One live session per module. A session starts at `launch`, advances
//! with every accepted reply and is reset by the next `launch`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use cityapp_protocol::ModuleKind;

use crate::error::{ModuleError, Result};

/// Stored form of one module's session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Step of the last message sent; replies must answer this step.
    pub step: u32,
    /// Module-specific fields.
    #[serde(default)]
    pub state: Value,
}

/// Sessions of every launched module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStore {
    #[serde(default)]
    sessions: BTreeMap<ModuleKind, StoredSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, module: ModuleKind) -> Option<&StoredSession> {
        self.sessions.get(&module)
    }

    pub fn current_step(&self, module: ModuleKind) -> Option<u32> {
        self.get(module).map(|s| s.step)
    }

    pub fn put(&mut self, module: ModuleKind, session: StoredSession) {
        self.sessions.insert(module, session);
    }

    pub fn remove(&mut self, module: ModuleKind) -> Option<StoredSession> {
        self.sessions.remove(&module)
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Read a store written by [`save`](Self::save); a missing file is an
    /// empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| ModuleError::io(format!("read {}", path.display()), e))?;
        serde_json::from_str(&raw).map_err(|source| ModuleError::Session {
            module: path.display().to_string(),
            source,
        })
    }

    /// Write the store as pretty JSON, replacing the file in one rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ModuleError::Session {
            module: path.display().to_string(),
            source,
        })?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, json)
            .map_err(|e| ModuleError::io(format!("write {}", Path::new(&tmp).display()), e))?;
        fs::rename(&tmp, path).map_err(|e| ModuleError::io(format!("write {}", path.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");

        let mut store = SessionStore::new();
        store.put(
            ModuleKind::AddMap,
            StoredSession {
                step: 3,
                state: json!({ "file": "/upload/parks.geojson", "kind": "vector" }),
            },
        );
        store.save(&path).unwrap();

        let loaded = SessionStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.current_step(ModuleKind::AddMap), Some(3));
        assert_eq!(loaded.current_step(ModuleKind::AttributeQuery), None);
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn keys_use_module_wire_names() {
        let mut store = SessionStore::new();
        store.put(
            ModuleKind::AttributeQuery,
            StoredSession { step: 1, state: Value::Null },
        );
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["sessions"]["attribute_query"]["step"], 1);
    }

    #[test]
    fn corrupt_file_is_a_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SessionStore::load(&path),
            Err(ModuleError::Session { .. })
        ));
    }
}
