use chrono::{DateTime, Utc};
use conductor_core::Finding;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// One audit trail entry, attributed to a single request.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// When the entry was produced.
    pub timestamp: DateTime<Utc>,
    /// The request this entry belongs to.
    pub request_id: Uuid,
    /// Guardrail findings recorded at this stage.
    pub findings: Vec<Finding>,
    /// Sanitized request content, when the entry covers the pre stage.
    pub request_snapshot: Option<String>,
    /// Sanitized response content, when the entry covers the post stage.
    pub response_snapshot: Option<String>,
    /// Whether downstream storage must encrypt this entry at rest.
    pub encryption_required: bool,
}

impl AuditRecord {
    /// Create an entry stamped with the current time.
    pub fn new(request_id: Uuid, findings: Vec<Finding>) -> Self {
        Self {
            timestamp: Utc::now(),
            request_id,
            findings,
            request_snapshot: None,
            response_snapshot: None,
            encryption_required: false,
        }
    }

    /// Attach the sanitized request content.
    pub fn with_request_snapshot(mut self, snapshot: impl Into<String>) -> Self {
        self.request_snapshot = Some(snapshot.into());
        self
    }

    /// Attach the sanitized response content.
    pub fn with_response_snapshot(mut self, snapshot: impl Into<String>) -> Self {
        self.response_snapshot = Some(snapshot.into());
        self
    }

    /// Flag the entry for encryption at rest.
    pub fn with_encryption_required(mut self, required: bool) -> Self {
        self.encryption_required = required;
        self
    }
}

/// Destination for audit entries.
///
/// Fire-and-forget from the pipeline's perspective: implementations must
/// tolerate concurrent writers and swallow their own failures — a lost audit
/// write never fails the task it belongs to.
pub trait AuditSink: Send + Sync {
    /// Record one entry.
    fn record(&self, record: AuditRecord);
}

/// Append-only JSONL audit trail on disk.
///
/// Entries are handed to a background task over an unbounded channel and
/// appended to `audit.jsonl` in the given directory, so recording never
/// blocks task processing. Must be created inside a tokio runtime.
pub struct JsonlAuditSink {
    tx: mpsc::UnboundedSender<AuditRecord>,
}

impl JsonlAuditSink {
    /// Create the sink and spawn its writer task.
    pub fn new(log_dir: PathBuf) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditRecord>();

        tokio::spawn(async move {
            let _ = tokio::fs::create_dir_all(&log_dir).await;
            let path = log_dir.join("audit.jsonl");

            while let Some(record) = rx.recv().await {
                let Ok(line) = serde_json::to_string(&record) else {
                    continue;
                };
                let open = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await;
                if let Ok(mut file) = open {
                    use tokio::io::AsyncWriteExt;
                    let _ = file.write_all(format!("{line}\n").as_bytes()).await;
                }
            }
        });

        Self { tx }
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, record: AuditRecord) {
        info!(
            request_id = %record.request_id,
            findings = record.findings.len(),
            "audit"
        );
        let _ = self.tx.send(record);
    }
}

/// In-memory sink for tests and embedding.
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out everything recorded so far.
    pub fn snapshot(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

/// Discards every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _record: AuditRecord) {}
}
