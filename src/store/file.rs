//! Filesystem response store
//!
//! Layout of the storage directory:
//! - `v<label>_<hash>_<timestamp>.json`: one file per successful response,
//!   pretty-printed when the body is JSON and written verbatim otherwise
//! - `index.json`: every execution grouped by command hash

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use super::{ContentLocator, ResponseStore};
use crate::common::{Error, Result};

const INDEX_FILE: &str = "index.json";
const MAX_NAME_LEN: usize = 50;

/// Execution history grouped by command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    pub commands: Vec<CommandEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEntry {
    pub command_hash: String,
    pub command_raw: String,
    pub executions: Vec<ExecutionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_file: Option<String>,
    /// "success" or "error"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Index {
    fn record(&mut self, command: &str, hash: &str, record: ExecutionRecord) {
        match self.commands.iter_mut().find(|e| e.command_hash == hash) {
            Some(entry) => entry.executions.push(record),
            None => self.commands.push(CommandEntry {
                command_hash: hash.to_string(),
                command_raw: command.to_string(),
                executions: vec![record],
            }),
        }
    }
}

/// Stores responses as files under a base directory
#[derive(Debug)]
pub struct FileStore {
    base_dir: PathBuf,
    /// Serializes file creation and index updates
    index: Mutex<Index>,
}

impl FileStore {
    /// Open a store, loading an existing index if there is one
    ///
    /// An unreadable index is logged and replaced by an empty one.
    pub fn open(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let index = match load_index(&base_dir) {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!("Could not load existing index: {}", e);
                Index::default()
            }
        };

        Self {
            base_dir,
            index: Mutex::new(index),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Snapshot of the execution index
    pub async fn index(&self) -> Index {
        self.index.lock().await.clone()
    }

    /// Remove response files last modified more than `max_age` ago
    ///
    /// The index itself is never removed. Returns the number of files deleted.
    pub async fn prune(&self, max_age: Duration) -> Result<usize> {
        let _guard = self.index.lock().await;
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut entries = tokio::fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| Error::storage("failed to read storage directory", e))?;

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name() == INDEX_FILE {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if metadata.is_dir() {
                continue;
            }
            let stale = metadata.modified().map(|m| m < cutoff).unwrap_or(false);
            if stale && tokio::fs::remove_file(entry.path()).await.is_ok() {
                tracing::debug!(file = %entry.path().display(), "Pruned response");
                removed += 1;
            }
        }

        Ok(removed)
    }

    async fn save_index(&self, index: &Index) {
        let path = self.base_dir.join(INDEX_FILE);
        let result = match serde_json::to_vec_pretty(index) {
            Ok(data) => tokio::fs::write(&path, data).await.map_err(Error::from),
            Err(e) => Err(Error::from(e)),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to save index: {}", e);
        }
    }

    async fn unique_file_name(&self, version: &str, hash: &str, now: DateTime<Utc>) -> String {
        let stem = format!(
            "v{}_{}_{}",
            sanitize_filename(version),
            &hash[..8],
            now.format("%Y%m%dT%H%M%S%3f")
        );
        let mut name = format!("{stem}.json");
        let mut n = 1;
        while tokio::fs::try_exists(self.base_dir.join(&name))
            .await
            .unwrap_or(false)
        {
            name = format!("{stem}_{n}.json");
            n += 1;
        }
        name
    }
}

#[async_trait]
impl ResponseStore for FileStore {
    async fn save(&self, command: &str, version: &str, body: &[u8]) -> Result<ContentLocator> {
        let mut index = self.index.lock().await;

        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| Error::storage("failed to create storage directory", e))?;

        let hash = hash_command(command);
        let now = Utc::now();
        let file_name = self.unique_file_name(version, &hash, now).await;

        let contents = match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value) => serde_json::to_vec_pretty(&value)?,
            Err(_) => body.to_vec(),
        };
        tokio::fs::write(self.base_dir.join(&file_name), contents)
            .await
            .map_err(|e| Error::storage("failed to write response file", e))?;

        index.record(
            command,
            &hash,
            ExecutionRecord {
                version: version.to_string(),
                timestamp: now,
                response_file: Some(file_name.clone()),
                status: "success".to_string(),
                error: None,
            },
        );
        self.save_index(&index).await;

        Ok(ContentLocator::new(file_name))
    }

    async fn record_failure(&self, command: &str, version: &str, error: &str) -> Result<()> {
        let mut index = self.index.lock().await;

        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| Error::storage("failed to create storage directory", e))?;

        let hash = hash_command(command);
        index.record(
            command,
            &hash,
            ExecutionRecord {
                version: version.to_string(),
                timestamp: Utc::now(),
                response_file: None,
                status: "error".to_string(),
                error: Some(error.to_string()),
            },
        );
        self.save_index(&index).await;
        Ok(())
    }

    async fn load(&self, locator: &ContentLocator) -> Result<Vec<u8>> {
        let path = self.base_dir.join(locator.as_str());
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::ResponseNotFound(locator.to_string()))
            }
            Err(e) => Err(Error::file_read(&path, e)),
        }
    }
}

fn load_index(base_dir: &Path) -> Result<Index> {
    let path = base_dir.join(INDEX_FILE);
    match std::fs::read(&path) {
        Ok(data) => serde_json::from_slice(&data)
            .map_err(|e| Error::storage("failed to parse index", e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Index::default()),
        Err(e) => Err(Error::storage("failed to read index", e)),
    }
}

fn hash_command(command: &str) -> String {
    hex::encode(Sha256::digest(command.as_bytes()))
}

/// Make a version label safe to embed in a file name
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect();

    let mut collapsed = String::with_capacity(replaced.len());
    for c in replaced.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }

    let trimmed = collapsed.trim_matches('_');
    if trimmed.is_empty() {
        return "unnamed".to_string();
    }
    trimmed.chars().take(MAX_NAME_LEN).collect()
}
