use crate::{BatchState, ItemOutcome, Msg};

/// Pure update function: applies a run event to the batch state.
///
/// The reporter only observes the run, so unlike a full Elm loop there are
/// no effects to return; every message folds directly into state.
pub fn update(mut state: BatchState, msg: Msg) -> BatchState {
    match msg {
        Msg::ScanStarted => state.begin_scan(),
        Msg::ScanComplete { candidates } => state.finish_scan(candidates),
        Msg::AwaitingDestination => state.await_destination(),
        Msg::TransferStarted { total } => state.begin_transfer(total),
        Msg::ItemStarted { index, name } => state.start_item(index, name),
        Msg::ItemSucceeded { bytes, .. } => state.finish_item(ItemOutcome::Success { bytes }),
        Msg::ItemFailed { reason, .. } => state.finish_item(ItemOutcome::Failed { reason }),
        Msg::BatchComplete { .. } => state.complete(),
        Msg::NoOp => {}
    }

    state
}
