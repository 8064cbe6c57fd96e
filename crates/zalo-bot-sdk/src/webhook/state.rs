//! # Node State Storage
//!
//! Small key-value store scoped by node identity. The webhook lifecycle keeps
//! the registered secret token here and the receiver reads it on every call.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::StateError;

/// Key under which the registered secret token is stored.
pub const SECRET_TOKEN_KEY: &str = "secretToken";

/// Stable identity of the node owning a piece of state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-node persistent string values.
#[async_trait]
pub trait NodeStateStore: Send + Sync {
    async fn get(&self, node: &NodeId, key: &str) -> Result<Option<String>, StateError>;

    async fn put(&self, node: &NodeId, key: &str, value: String) -> Result<(), StateError>;

    /// Remove a value. Removing an absent key is not an error.
    async fn remove(&self, node: &NodeId, key: &str) -> Result<(), StateError>;
}

type StateDocument = HashMap<String, HashMap<String, String>>;

/// In-memory store for tests and single-process development.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNodeStateStore {
    values: Arc<RwLock<StateDocument>>,
}

impl InMemoryNodeStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NodeStateStore for InMemoryNodeStateStore {
    async fn get(&self, node: &NodeId, key: &str) -> Result<Option<String>, StateError> {
        let values = self.values.read().await;
        Ok(values
            .get(node.as_str())
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(&self, node: &NodeId, key: &str, value: String) -> Result<(), StateError> {
        let mut values = self.values.write().await;
        values
            .entry(node.as_str().to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, node: &NodeId, key: &str) -> Result<(), StateError> {
        let mut values = self.values.write().await;
        if let Some(entries) = values.get_mut(node.as_str()) {
            entries.remove(key);
            if entries.is_empty() {
                values.remove(node.as_str());
            }
        }
        Ok(())
    }
}

/// Store backed by a single JSON document on disk.
///
/// Every mutation is a read-modify-write of the whole document under an
/// async lock, written to a temporary file and renamed into place.
#[derive(Debug, Clone)]
pub struct FileNodeStateStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileNodeStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn load(&self) -> Result<StateDocument, StateError> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(StateDocument::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateDocument::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, document: &StateDocument) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(document)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&json).await?;
        file.flush().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;

        debug!(path = %self.path.display(), "Node state written");
        Ok(())
    }
}

#[async_trait]
impl NodeStateStore for FileNodeStateStore {
    async fn get(&self, node: &NodeId, key: &str) -> Result<Option<String>, StateError> {
        let _guard = self.lock.lock().await;
        let document = self.load().await?;
        Ok(document
            .get(node.as_str())
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(&self, node: &NodeId, key: &str, value: String) -> Result<(), StateError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        document
            .entry(node.as_str().to_string())
            .or_default()
            .insert(key.to_string(), value);
        self.save(&document).await
    }

    async fn remove(&self, node: &NodeId, key: &str) -> Result<(), StateError> {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;

        let Some(entries) = document.get_mut(node.as_str()) else {
            return Ok(());
        };
        if entries.remove(key).is_none() {
            return Ok(());
        }
        if entries.is_empty() {
            document.remove(node.as_str());
        }

        self.save(&document).await
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
