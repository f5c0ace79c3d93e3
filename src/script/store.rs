use crate::error::{DispatchError, StoreError};
use crate::script::types::Script;
use std::collections::HashSet;
use std::path::Path;
use std::sync::RwLock;
use tracing::info;

/// Storage collaborator. Must reflect committed state at call time.
pub trait ScriptStore: Send + Sync {
    fn get_all(&self) -> Result<Vec<Script>, StoreError>;
    fn get_by_id(&self, id: &str) -> Result<Option<Script>, StoreError>;
}

/// In-memory catalog, preserving insertion order.
#[derive(Debug, Default)]
pub struct InMemoryScriptStore {
    scripts: RwLock<Vec<Script>>,
}

impl InMemoryScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scripts(scripts: Vec<Script>) -> Self {
        Self {
            scripts: RwLock::new(scripts),
        }
    }

    /// Loads a JSON array of scripts. Ids must be unique.
    pub fn from_json(json: &str) -> Result<Self, DispatchError> {
        let scripts: Vec<Script> = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        for script in &scripts {
            if !seen.insert(script.id.as_str()) {
                return Err(StoreError::Malformed(format!("duplicate script id '{}'", script.id)).into());
            }
        }
        Ok(Self::with_scripts(scripts))
    }

    pub fn load(path: &Path) -> Result<Self, DispatchError> {
        let raw = std::fs::read_to_string(path)?;
        let store = Self::from_json(&raw)?;
        info!(path = %path.display(), scripts = store.len(), "Loaded script catalog");
        Ok(store)
    }

    /// Replaces a script with the same id, or appends it.
    pub fn upsert(&self, script: Script) -> Result<(), StoreError> {
        let mut scripts = self
            .scripts
            .write()
            .map_err(|_| StoreError::Unavailable("catalog lock poisoned".to_string()))?;
        match scripts.iter_mut().find(|s| s.id == script.id) {
            Some(existing) => *existing = script,
            None => scripts.push(script),
        }
        Ok(())
    }

    pub fn remove(&self, id: &str) -> Result<Option<Script>, StoreError> {
        let mut scripts = self
            .scripts
            .write()
            .map_err(|_| StoreError::Unavailable("catalog lock poisoned".to_string()))?;
        let position = scripts.iter().position(|s| s.id == id);
        Ok(position.map(|i| scripts.remove(i)))
    }

    pub fn len(&self) -> usize {
        self.scripts.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScriptStore for InMemoryScriptStore {
    fn get_all(&self) -> Result<Vec<Script>, StoreError> {
        self.scripts
            .read()
            .map(|scripts| scripts.clone())
            .map_err(|_| StoreError::Unavailable("catalog lock poisoned".to_string()))
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Script>, StoreError> {
        let scripts = self
            .scripts
            .read()
            .map_err(|_| StoreError::Unavailable("catalog lock poisoned".to_string()))?;
        Ok(scripts.iter().find(|s| s.id == id).cloned())
    }
}
