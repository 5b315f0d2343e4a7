//! FileQueue - JSON-lines spool standing in for the organizations queue

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use contracts::{ContractError, QueueMessage, RetryQueue};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, instrument};

/// One spooled message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoolRecord {
    pub enqueued_at: DateTime<Utc>,
    #[serde(flatten)]
    pub message: QueueMessage,
}

/// Queue appending one `SpoolRecord` per line to `{root}/{name}.jsonl`
pub struct FileQueue {
    name: String,
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileQueue {
    pub fn new(root: impl AsRef<Path>, name: impl Into<String>) -> std::io::Result<Self> {
        let name = name.into();
        fs::create_dir_all(root.as_ref())?;
        let path = root.as_ref().join(format!("{name}.jsonl"));

        Ok(Self {
            name,
            path,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every spooled record
    pub fn read_all(&self) -> std::io::Result<Vec<SpoolRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        fs::read_to_string(&self.path)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })
            .collect()
    }

    async fn append(&self, line: String) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await
    }
}

impl RetryQueue for FileQueue {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_queue_publish",
        skip(self, message),
        fields(queue = %self.name, retry = message.body.retry)
    )]
    async fn publish(&self, message: &QueueMessage) -> Result<(), ContractError> {
        let record = SpoolRecord {
            enqueued_at: Utc::now(),
            message: message.clone(),
        };
        let line = serde_json::to_string(&record).map_err(|e| ContractError::MessageEncode {
            message: e.to_string(),
        })?;

        self.append(line).await.map_err(|e| {
            error!(queue = %self.name, error = %e, "Spool write failed");
            ContractError::queue_publish(&self.name, e.to_string())
        })?;

        debug!(path = %self.path.display(), "Message spooled");
        Ok(())
    }
}
