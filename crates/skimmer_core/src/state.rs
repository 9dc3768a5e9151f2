use std::collections::BTreeMap;

use crate::view_model::{BatchViewModel, ItemRowView};

/// Lifecycle of one run. Transitions only move forward; a terminal outcome
/// for the whole batch is always `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Scanning,
    AwaitingDestination,
    Transferring,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Success { bytes: u64 },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    pub index: usize,
    pub name: String,
    pub outcome: Option<ItemOutcome>,
}

/// Observed state of one batch run, folded from [`crate::Msg`] values.
///
/// Rows are keyed by transfer index in a `BTreeMap` so iteration always
/// yields the pipeline's attempt order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchState {
    phase: Phase,
    candidate_count: usize,
    total: usize,
    rows: BTreeMap<usize, ItemRow>,
    current: Option<usize>,
    succeeded: usize,
    failed: usize,
    dirty: bool,
}

impl BatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Returns whether the state changed since the last call, and clears
    /// the flag. Used by the reporter to coalesce rendering.
    pub fn consume_dirty(&mut self) -> bool {
        let was = self.dirty;
        self.dirty = false;
        was
    }

    pub fn view(&self) -> BatchViewModel {
        BatchViewModel {
            phase: self.phase,
            candidate_count: self.candidate_count,
            total: self.total,
            rows: self
                .rows
                .values()
                .map(|row| ItemRowView {
                    index: row.index,
                    name: row.name.clone(),
                    status: ItemRowView::status_label(row.outcome.as_ref()),
                })
                .collect(),
            succeeded: self.succeeded,
            failed: self.failed,
        }
    }

    pub(crate) fn begin_scan(&mut self) {
        self.phase = Phase::Scanning;
        self.mark_dirty();
    }

    pub(crate) fn finish_scan(&mut self, candidates: usize) {
        self.candidate_count = candidates;
        self.mark_dirty();
    }

    pub(crate) fn await_destination(&mut self) {
        self.phase = Phase::AwaitingDestination;
        self.mark_dirty();
    }

    pub(crate) fn begin_transfer(&mut self, total: usize) {
        self.phase = Phase::Transferring;
        self.total = total;
        self.mark_dirty();
    }

    pub(crate) fn start_item(&mut self, index: usize, name: String) {
        self.rows.insert(
            index,
            ItemRow {
                index,
                name,
                outcome: None,
            },
        );
        self.current = Some(index);
        self.mark_dirty();
    }

    /// Applies a terminal outcome to the in-flight row. The pipeline is
    /// strictly sequential, so the outcome always belongs to `current`.
    pub(crate) fn finish_item(&mut self, outcome: ItemOutcome) {
        let Some(index) = self.current.take() else {
            return;
        };
        if let Some(row) = self.rows.get_mut(&index) {
            match outcome {
                ItemOutcome::Success { .. } => self.succeeded += 1,
                ItemOutcome::Failed { .. } => self.failed += 1,
            }
            row.outcome = Some(outcome);
            self.mark_dirty();
        }
    }

    pub(crate) fn complete(&mut self) {
        self.phase = Phase::Complete;
        self.current = None;
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
