use crate::{ItemOutcome, Phase};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchViewModel {
    pub phase: Phase,
    pub candidate_count: usize,
    pub total: usize,
    pub rows: Vec<ItemRowView>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchViewModel {
    /// One-line tally for the end-of-run report.
    pub fn summary(&self) -> String {
        format!("{} succeeded, {} failed", self.succeeded, self.failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRowView {
    pub index: usize,
    pub name: String,
    pub status: String,
}

impl ItemRowView {
    pub(crate) fn status_label(outcome: Option<&ItemOutcome>) -> String {
        match outcome {
            None => "in flight".to_string(),
            Some(ItemOutcome::Success { bytes }) => format!("ok ({bytes} bytes)"),
            Some(ItemOutcome::Failed { reason }) => format!("failed: {reason}"),
        }
    }
}
