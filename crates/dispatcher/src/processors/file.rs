//! FileFlowProcessor - spools handoffs for the flows queue and table
//!
//! Each handoff becomes one line in `{root}/{queue}.jsonl`, and each flow one
//! row in `{root}/{table}.table.jsonl` keyed by organization and flow id.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use contracts::{ContractError, FlowHandoff, FlowProcessor};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, instrument, warn};

/// One row of the flows table spool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRow {
    /// Organization id
    pub partition_key: String,
    /// Flow id
    pub row_key: String,
    pub retrieved_at: DateTime<Utc>,
}

pub struct FileFlowProcessor {
    name: String,
    queue_path: PathBuf,
    table_path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileFlowProcessor {
    pub fn new(
        root: impl AsRef<Path>,
        queue: &str,
        table: &str,
    ) -> std::io::Result<Self> {
        fs::create_dir_all(root.as_ref())?;

        Ok(Self {
            name: format!("file:{queue}"),
            queue_path: root.as_ref().join(format!("{queue}.jsonl")),
            table_path: root.as_ref().join(format!("{table}.table.jsonl")),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn queue_path(&self) -> &Path {
        &self.queue_path
    }

    pub fn table_path(&self) -> &Path {
        &self.table_path
    }

    fn table_rows(handoff: &FlowHandoff) -> std::io::Result<String> {
        let now = Utc::now();
        let mut rows = String::new();
        for flow_id in &handoff.flow_ids {
            let row = FlowRow {
                partition_key: handoff.organization_id.clone(),
                row_key: flow_id.clone(),
                retrieved_at: now,
            };
            rows.push_str(&serde_json::to_string(&row).map_err(std::io::Error::other)?);
            rows.push('\n');
        }
        Ok(rows)
    }
}

async fn append(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await
}

impl FlowProcessor for FileFlowProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_processor_process",
        skip(self, handoff),
        fields(
            processor = %self.name,
            organization_id = %handoff.organization_id,
            flows = handoff.flow_ids.len()
        )
    )]
    async fn process(&self, handoff: &FlowHandoff) -> Result<(), ContractError> {
        let spool_error = |e: std::io::Error| {
            error!(processor = %self.name, error = %e, "Spool write failed");
            ContractError::handoff(&self.name, &handoff.organization_id, e.to_string())
        };
        let mut message = serde_json::to_string(handoff)
            .map_err(|e| spool_error(std::io::Error::other(e)))?;
        message.push('\n');
        let rows = Self::table_rows(handoff).map_err(spool_error)?;

        // The queue line is the handoff; table rows are written only after it lands.
        let _guard = self.write_lock.lock().await;
        append(&self.queue_path, message.as_bytes())
            .await
            .map_err(spool_error)?;
        if !rows.is_empty() {
            if let Err(e) = append(&self.table_path, rows.as_bytes()).await {
                warn!(processor = %self.name, error = %e, "Flow table rows not written");
            }
        }
        debug!("Handoff spooled");
        Ok(())
    }
}
