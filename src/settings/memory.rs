use std::collections::HashMap;

use async_trait::async_trait;

use super::KeyValueStore;

/// Process-local store, used where nothing has to survive a restart.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    async fn set(&mut self, entries: &[(&str, String)]) -> anyhow::Result<()> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}
