#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Extraction over the listing document has begun.
    ScanStarted,
    /// Extraction finished with the given number of candidates.
    ScanComplete { candidates: usize },
    /// Candidates are named; the destination is being prepared.
    AwaitingDestination,
    /// The transfer loop has started over `total` finalized files.
    TransferStarted { total: usize },
    /// One file's transfer has begun.
    ItemStarted { index: usize, name: String },
    /// The in-flight file was fully written and closed.
    ItemSucceeded { name: String, bytes: u64 },
    /// The in-flight file failed; the loop moves on to the next item.
    ItemFailed { name: String, reason: String },
    /// The whole batch finished with the given tallies.
    BatchComplete { succeeded: usize, failed: usize },
    /// Fallback for placeholder wiring.
    NoOp,
}
