use std::sync::Mutex;

use batch_logging::{batch_info, batch_warn};
use skimmer_core::{update, BatchState, BatchViewModel, Msg};
use skimmer_engine::{PipelineEvent, ProgressSink};

/// Mirrors every pipeline event into the log and folds it into the pure
/// batch state, from which the end-of-run summary is rendered.
pub struct ConsoleReporter {
    state: Mutex<BatchState>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BatchState::new()),
        }
    }

    pub fn view(&self) -> BatchViewModel {
        self.state.lock().expect("reporter state poisoned").view()
    }

    fn apply(&self, msg: Msg) {
        let mut guard = self.state.lock().expect("reporter state poisoned");
        let state = std::mem::take(&mut *guard);
        *guard = update(state, msg);
    }
}

impl ProgressSink for ConsoleReporter {
    fn emit(&self, event: PipelineEvent) {
        match &event {
            PipelineEvent::ScanStarted => {
                batch_info!("Scanning the listing for downloadable entries");
            }
            PipelineEvent::ScanComplete { candidates } => {
                batch_info!("Scan complete: {} candidate(s)", candidates);
            }
            PipelineEvent::AwaitingDestination => {
                batch_info!("Preparing the destination directory");
            }
            PipelineEvent::TransferStarted { total } => {
                batch_info!("Transferring {} file(s), one at a time", total);
            }
            PipelineEvent::ItemStarted { index, name } => {
                batch_info!("[{}] {} ...", index + 1, name);
            }
            PipelineEvent::ItemSucceeded { name, bytes } => {
                batch_info!("{}: done ({} bytes)", name, bytes);
            }
            PipelineEvent::ItemFailed { name, reason } => {
                batch_warn!("{}: {}", name, reason);
            }
            PipelineEvent::BatchComplete { succeeded, failed } => {
                batch_info!("Batch complete: {} succeeded, {} failed", succeeded, failed);
            }
        }

        self.apply(msg_from_event(event));
    }
}

fn msg_from_event(event: PipelineEvent) -> Msg {
    match event {
        PipelineEvent::ScanStarted => Msg::ScanStarted,
        PipelineEvent::ScanComplete { candidates } => Msg::ScanComplete { candidates },
        PipelineEvent::AwaitingDestination => Msg::AwaitingDestination,
        PipelineEvent::TransferStarted { total } => Msg::TransferStarted { total },
        PipelineEvent::ItemStarted { index, name } => Msg::ItemStarted { index, name },
        PipelineEvent::ItemSucceeded { name, bytes } => Msg::ItemSucceeded { name, bytes },
        PipelineEvent::ItemFailed { name, reason } => Msg::ItemFailed { name, reason },
        PipelineEvent::BatchComplete { succeeded, failed } => {
            Msg::BatchComplete { succeeded, failed }
        }
    }
}
