//! JSON-file state store. One document per conversation under a state directory.
//!
//! `set` only touches the cached document. `save_changes` writes it back via a
//! temp file and rename, so a document on disk is never half-written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::StateStore;
use crate::error::StoreError;
use crate::types::ConversationKey;

#[derive(Default)]
struct Document {
    values: Map<String, Value>,
    dirty: bool,
}

pub struct FileStateStore {
    dir: PathBuf,
    cache: Mutex<HashMap<ConversationKey, Document>>,
}

impl FileStateStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        info!("File state store at {}", dir.display());
        Ok(Self {
            dir,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, key: &ConversationKey) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }

    async fn load(&self, key: &ConversationKey) -> Result<Document, StoreError> {
        let path = self.document_path(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let values: Map<String, Value> = serde_json::from_str(&content)?;
                debug!("Loaded state for {} from {}", key, path.display());
                Ok(Document { values, dirty: false })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, key: &ConversationKey, content: &[u8]) -> Result<(), StoreError> {
        let path = self.document_path(key);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", file_stem(key), uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, content).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Escape a conversation id into a file stem. Only `[A-Za-z0-9_-]` pass
/// through; every other byte becomes `%XX`, so distinct ids never collide.
fn file_stem(key: &ConversationKey) -> String {
    let mut stem = String::with_capacity(key.as_str().len());
    for byte in key.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, key: &ConversationKey, name: &str) -> Result<Option<Value>, StoreError> {
        let mut cache = self.cache.lock().await;
        if !cache.contains_key(key) {
            let doc = self.load(key).await?;
            cache.insert(key.clone(), doc);
        }
        Ok(cache.get(key).and_then(|doc| doc.values.get(name)).cloned())
    }

    async fn set(&self, key: &ConversationKey, name: &str, value: Value) -> Result<(), StoreError> {
        let mut cache = self.cache.lock().await;
        if !cache.contains_key(key) {
            let doc = self.load(key).await?;
            cache.insert(key.clone(), doc);
        }
        if let Some(doc) = cache.get_mut(key) {
            doc.values.insert(name.to_string(), value);
            doc.dirty = true;
        }
        Ok(())
    }

    async fn save_changes(&self, key: &ConversationKey) -> Result<(), StoreError> {
        let mut cache = self.cache.lock().await;
        let content = match cache.get(key) {
            Some(doc) if doc.dirty => serde_json::to_vec_pretty(&doc.values)?,
            _ => return Ok(()),
        };

        if let Err(e) = self.write_document(key, &content).await {
            // Staged values go with the failed write; the next access reloads from disk.
            cache.remove(key);
            warn!("Discarded unsaved state for {}: {}", key, e);
            return Err(e);
        }
        if let Some(doc) = cache.get_mut(key) {
            doc.dirty = false;
        }
        Ok(())
    }
}
