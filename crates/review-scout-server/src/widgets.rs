//! Widget configuration store.
//!
//! A widget is a named pointer at a place URL; embedded widgets look up
//! their URL by id and then ask `/api/reviews` for it. Records live in one
//! JSON document keyed by id and are rewritten in full on every save.
//! Read failures degrade to an empty store and write failures are logged,
//! mirroring the review cache.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A stored widget, as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// On-disk form of one record; the id is the document key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WidgetRecord {
    name: String,
    url: String,
}

type WidgetDocument = BTreeMap<String, WidgetRecord>;

#[derive(Debug, thiserror::Error)]
enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// File-backed widget store.
#[derive(Debug, Clone)]
pub struct WidgetStore {
    path: PathBuf,
}

impl WidgetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a widget under a fresh UUID v4.
    pub async fn save(&self, name: &str, url: &str) -> WidgetConfig {
        let mut document = self.load().await;
        let id = uuid::Uuid::new_v4().to_string();
        document.insert(
            id.clone(),
            WidgetRecord {
                name: name.to_string(),
                url: url.to_string(),
            },
        );
        if let Err(e) = self.store(&document).await {
            tracing::warn!(path = %self.path.display(), "failed to write widget configs: {e}");
        }
        tracing::info!(%id, name, "saved widget");
        WidgetConfig {
            id,
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    pub async fn get(&self, id: &str) -> Option<WidgetConfig> {
        let mut document = self.load().await;
        document.remove(id).map(|record| WidgetConfig {
            id: id.to_string(),
            name: record.name,
            url: record.url,
        })
    }

    /// Every widget, ordered by id.
    pub async fn list(&self) -> Vec<WidgetConfig> {
        self.load()
            .await
            .into_iter()
            .map(|(id, record)| WidgetConfig {
                id,
                name: record.name,
                url: record.url,
            })
            .collect()
    }

    async fn load(&self) -> WidgetDocument {
        match self.try_load().await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to read widget configs: {e}");
                WidgetDocument::new()
            }
        }
    }

    async fn try_load(&self) -> Result<WidgetDocument, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(WidgetDocument::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, document: &WidgetDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(document)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = WidgetStore::new(dir.path().join("widgets.json"));
        assert!(store.list().await.is_empty());
        assert!(store.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_save_then_get_and_list() {
        let dir = TempDir::new().unwrap();
        let store = WidgetStore::new(dir.path().join("widgets.json"));

        let cafe = store.save("Cafe", "https://maps.example.com/cafe").await;
        let bar = store.save("Bar", "https://maps.example.com/bar").await;
        assert_ne!(cafe.id, bar.id);
        assert!(uuid::Uuid::parse_str(&cafe.id).is_ok());

        assert_eq!(store.get(&cafe.id).await, Some(cafe.clone()));
        let listed = store.list().await;
        assert_eq!(listed.len(), 2);
        assert!(listed.contains(&bar));
    }

    #[tokio::test]
    async fn test_document_is_keyed_by_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("widgets.json");
        let store = WidgetStore::new(&path);
        let saved = store.save("Cafe", "https://maps.example.com/cafe").await;

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[&saved.id]["name"], "Cafe");
        assert_eq!(raw[&saved.id]["url"], "https://maps.example.com/cafe");
        assert!(raw[&saved.id].get("id").is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("widgets.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = WidgetStore::new(&path);
        assert!(store.list().await.is_empty());

        // A save replaces the unreadable document.
        let saved = store.save("Cafe", "https://maps.example.com/cafe").await;
        assert_eq!(store.list().await, vec![saved]);
    }
}
