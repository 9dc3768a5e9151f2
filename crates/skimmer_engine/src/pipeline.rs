use std::time::Duration;

use crate::fetch::{FetchedBody, Fetcher};
use crate::storage::{StorageTarget, WritableResource};
use crate::types::{
    BatchResult, FinalizedFile, PipelineEvent, TransferError, TransferOutcome, TransferStatus,
};

/// Biases the remote server toward returning raw bytes instead of an
/// interactive view. A heuristic for the observed service; configurable
/// because other endpoints may ignore or dislike it.
pub const DEFAULT_RAW_FETCH_PARAM: &str = "download=1";

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Pause between completing one item and starting the next; zero = none.
    pub delay_between_files: Duration,
    /// Query parameter appended to every file locator; `None` or empty
    /// disables the forced-download hint.
    pub raw_fetch_param: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            delay_between_files: Duration::ZERO,
            raw_fetch_param: Some(DEFAULT_RAW_FETCH_PARAM.to_string()),
        }
    }
}

/// Strictly ordered, one-in-flight transfer loop.
///
/// Item *i+1* never starts before item *i* has reached a terminal outcome
/// including full stream closure; a failed item is recorded and skipped,
/// never retried, and never aborts the batch.
pub struct TransferPipeline<F: Fetcher> {
    fetcher: F,
    settings: PipelineSettings,
}

impl<F: Fetcher> TransferPipeline<F> {
    pub fn new(fetcher: F, settings: PipelineSettings) -> Self {
        Self { fetcher, settings }
    }

    pub async fn run(
        &self,
        files: &[FinalizedFile],
        storage: &dyn StorageTarget,
        sink: &dyn ProgressSink,
    ) -> BatchResult {
        let mut result = BatchResult::default();
        sink.emit(PipelineEvent::TransferStarted { total: files.len() });

        for (index, file) in files.iter().enumerate() {
            sink.emit(PipelineEvent::ItemStarted {
                index,
                name: file.name.clone(),
            });

            let status = match self.transfer_one(file, storage).await {
                Ok(bytes) => {
                    result.success_count += 1;
                    TransferStatus::Success { bytes }
                }
                Err(err) => {
                    result.fail_count += 1;
                    TransferStatus::Failed(err.to_string())
                }
            };
            let outcome = TransferOutcome {
                file: file.clone(),
                status,
            };
            sink.emit(item_event(outcome));

            // No delay after the last item.
            if index + 1 < files.len() && !self.settings.delay_between_files.is_zero() {
                tokio::time::sleep(self.settings.delay_between_files).await;
            }
        }

        sink.emit(PipelineEvent::BatchComplete {
            succeeded: result.success_count,
            failed: result.fail_count,
        });
        result
    }

    /// One item end to end: fetch, create, stream, close. The writable
    /// resource is only created once the response status is a success.
    async fn transfer_one(
        &self,
        file: &FinalizedFile,
        storage: &dyn StorageTarget,
    ) -> Result<u64, TransferError> {
        let url = forced_fetch_url(&file.url, self.settings.raw_fetch_param.as_deref());
        let mut body = self.fetcher.fetch(&url).await?;

        let mut writable = storage.create(&file.name).await?;
        match drain_body(&mut body, writable.as_mut()).await {
            Ok(bytes) => {
                writable.finish().await?;
                Ok(bytes)
            }
            Err(err) => {
                writable.abort().await;
                Err(err)
            }
        }
    }
}

async fn drain_body(
    body: &mut FetchedBody,
    writable: &mut dyn WritableResource,
) -> Result<u64, TransferError> {
    let mut written = 0u64;
    while let Some(chunk) = body.next_chunk().await? {
        writable.write_chunk(&chunk).await?;
        written += chunk.len() as u64;
    }
    Ok(written)
}

fn item_event(outcome: TransferOutcome) -> PipelineEvent {
    match outcome.status {
        TransferStatus::Success { bytes } => PipelineEvent::ItemSucceeded {
            name: outcome.file.name,
            bytes,
        },
        TransferStatus::Failed(reason) => PipelineEvent::ItemFailed {
            name: outcome.file.name,
            reason,
        },
    }
}

/// Appends the forcing parameter with `&` when a query string is already
/// present, `?` otherwise.
fn forced_fetch_url(url: &str, param: Option<&str>) -> String {
    match param {
        None | Some("") => url.to_string(),
        Some(param) if url.contains('?') => format!("{url}&{param}"),
        Some(param) => format!("{url}?{param}"),
    }
}
