//! Per-conversation target-language preferences.
//!
//! A flat mapping from Telegram chat id to a target-language code. Backing is
//! either in-memory only, or a JSON object file that is fully rewritten on
//! every set. One mutex serializes the load-mutate-save cycle; last writer
//! wins on a race, which matches the low-traffic access pattern here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read preferences file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write preferences file: {0}")]
    Write(#[source] std::io::Error),

    #[error("preferences file is not a valid JSON object: {0}")]
    Format(#[source] serde_json::Error),
}

/// Chat id → target-language code. No eviction, no TTL; entries live for the
/// life of the store (or the file).
pub struct PreferenceStore {
    inner: Mutex<HashMap<String, String>>,
    path: Option<PathBuf>,
}

impl PreferenceStore {
    /// In-memory store with no durable backing.
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            path: None,
        }
    }

    /// File-backed store. Loads the existing snapshot if the file exists;
    /// a missing file starts empty and is created on the first set.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let map = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(StoreError::Read)?;
            let map: HashMap<String, String> =
                serde_json::from_str(&contents).map_err(StoreError::Format)?;
            info!("Loaded {} language preferences from {}", map.len(), path.display());
            map
        } else {
            HashMap::new()
        };

        Ok(Self {
            inner: Mutex::new(map),
            path: Some(path),
        })
    }

    /// The stored target-language code for a conversation, if any.
    pub fn get(&self, conversation_id: i64) -> Option<String> {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.get(&conversation_id.to_string()).cloned()
    }

    /// Overwrite the preference for a conversation. Visible to subsequent
    /// `get` calls immediately; the whole snapshot is rewritten when a file
    /// backing is configured.
    pub fn set(&self, conversation_id: i64, code: &str) -> Result<(), StoreError> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(conversation_id.to_string(), code.to_string());

        if let Some(path) = &self.path {
            let json = serde_json::to_string_pretty(&*map)
                .expect("string map always serializes");
            std::fs::write(path, json).map_err(StoreError::Write)?;
        }

        Ok(())
    }

    /// Best-effort set: logs instead of propagating, for the auto-learn path
    /// where a persistence failure must not abort the translation.
    pub fn set_best_effort(&self, conversation_id: i64, code: &str) {
        if let Err(e) = self.set(conversation_id, code) {
            warn!("Failed to persist language preference for {}: {}", conversation_id, e);
        }
    }
}
