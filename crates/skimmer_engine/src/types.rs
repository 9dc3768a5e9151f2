use thiserror::Error;

use crate::storage::StorageError;

/// One detected downloadable item, before naming resolution.
///
/// `url` is absolute and unique within a scan; candidates are never mutated
/// after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Collapsed text of the source element; may be empty.
    pub display_text: String,
    /// Absolute locator used to fetch the content.
    pub url: String,
}

/// A candidate annotated with its resolved, batch-unique local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedFile {
    /// Name used when persisting; unique across the batch by construction.
    pub name: String,
    /// Carried over unchanged from the candidate.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Success { bytes: u64 },
    Failed(String),
}

/// Result of attempting one file's transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub file: FinalizedFile,
    pub status: TransferStatus,
}

/// Aggregate of the full run. The two counts always sum to the number of
/// finalized files attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchResult {
    pub success_count: usize,
    pub fail_count: usize,
}

/// Side-channel events observed by the reporting sink.
///
/// The scan and destination phases are emitted by the caller around
/// extraction; the transfer phases are emitted by the pipeline itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    ScanStarted,
    ScanComplete { candidates: usize },
    AwaitingDestination,
    TransferStarted { total: usize },
    ItemStarted { index: usize, name: String },
    ItemSucceeded { name: String, bytes: u64 },
    ItemFailed { name: String, reason: String },
    BatchComplete { succeeded: usize, failed: usize },
}

/// Per-item transfer failure. Captured at the item boundary and recorded as
/// a `Failed` outcome; never aborts the batch.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Non-success response status. Renders as `HTTP <status> - <statusText>`.
    #[error("HTTP {status} - {reason}")]
    HttpStatus { status: u16, reason: String },
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TransferError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransferError::Timeout(err.to_string());
        }
        TransferError::Network(err.to_string())
    }
}
