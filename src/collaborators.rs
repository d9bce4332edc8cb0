//! Interfaces to the host platform services this crate relies on but does not implement.
//!
//! - [`AttachmentService`]: resolves attachment records and materializes files locally.
//! - [`IngestionTrigger`]: hands records to the bulk-ingestion playbook pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Record;

/// Error reported by a platform collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The referenced resource does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The collaborator answered, but not in the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Local I/O failed (e.g. while writing a download).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other collaborator failure.
    #[error("{0}")]
    Failed(String),
}

/// File entry of an attachment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// File IRI, e.g. `/api/3/files/<uuid>`.
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Attachment record as returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    pub file: FileMetadata,
}

/// Attachment resolution and file download.
pub trait AttachmentService: Send + Sync {
    /// Fetch the attachment record addressed by `iri` (e.g. `/api/3/attachments/<uuid>`).
    fn resolve(&self, iri: &str) -> Result<AttachmentMetadata, CollaboratorError>;

    /// Materialize the file addressed by `file_iri` inside `dest_dir`, returning its path.
    fn download(&self, file_iri: &str, dest_dir: &Path) -> Result<PathBuf, CollaboratorError>;
}

/// Caller environment forwarded untouched to the ingestion pipeline.
pub type Environment = serde_json::Map<String, serde_json::Value>;

/// Bulk record ingestion.
pub trait IngestionTrigger: Send + Sync {
    /// Queue `records` for the playbook `playbook_id`, split into batches of `batch_size`.
    fn trigger(
        &self,
        records: &[Record],
        playbook_id: Option<&str>,
        batch_size: usize,
        env: &Environment,
    ) -> Result<(), CollaboratorError>;
}
