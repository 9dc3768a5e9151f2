//! Skimmer engine: listing extraction, naming and the transfer pipeline.
mod extract;
mod fetch;
mod naming;
mod pipeline;
mod storage;
mod types;

pub use extract::{
    extract_candidates, CandidateStrategy, DocumentStrategy, ExtractSettings, RowStrategy,
};
pub use fetch::{FetchSettings, FetchedBody, Fetcher, ReqwestFetcher};
pub use naming::finalize_names;
pub use pipeline::{PipelineSettings, ProgressSink, TransferPipeline, DEFAULT_RAW_FETCH_PARAM};
pub use storage::{
    ensure_output_dir, DirStorageTarget, StorageError, StorageTarget, WritableResource,
};
pub use types::{
    BatchResult, FileCandidate, FinalizedFile, PipelineEvent, TransferError, TransferOutcome,
    TransferStatus,
};
