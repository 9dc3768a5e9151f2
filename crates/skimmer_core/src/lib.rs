//! Skimmer core: pure batch-run state machine and view-model helpers.
mod msg;
mod state;
mod update;
mod view_model;

pub use msg::Msg;
pub use state::{BatchState, ItemOutcome, ItemRow, Phase};
pub use update::update;
pub use view_model::{BatchViewModel, ItemRowView};
