use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs;

use super::KeyValueStore;

/// A flat JSON object of string values kept in one file. The file is
/// re-read on every access so edits from another process are picked up.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> anyhow::Result<BTreeMap<String, String>> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading settings {}", self.path.display()))
            }
        };

        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&text)
            .with_context(|| format!("parsing settings {}", self.path.display()))
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }

        let tmp = self.path.with_extension("tmp");
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp, json)
            .await
            .with_context(|| format!("writing settings {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing settings {}", self.path.display()))?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&mut self, entries: &[(&str, String)]) -> anyhow::Result<()> {
        let mut all = self.read_all().await?;
        for (key, value) in entries {
            all.insert((*key).to_string(), value.clone());
        }
        self.write_all(&all).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Settings, StoredParameters};
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("settings.json"));

        assert_eq!(store.get("factor").await.unwrap(), None);
    }

    #[tokio::test]
    async fn values_survive_a_new_store_instance() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::new(JsonFileStore::new(&path));
        let stored = StoredParameters {
            interest_rate: 3.2,
            clearance_rate: 1.5,
            factor: 22.0,
        };
        settings.save(&stored).await.unwrap();

        let reopened = Settings::new(JsonFileStore::new(&path));
        assert_eq!(reopened.load().await.unwrap(), stored);

        let raw = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["interestRate"], "3.2");
        assert_eq!(json["factor"], "22");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn unrelated_keys_are_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let mut store = JsonFileStore::new(&path);
        store.set(&[("factor", "30".to_string())]).await.unwrap();

        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("dark"));
        assert_eq!(store.get("factor").await.unwrap().as_deref(), Some("30"));
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.get("factor").await.is_err());
    }
}
