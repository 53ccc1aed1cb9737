//! Node lifecycle.

/// Lifecycle phase of a node.
///
/// `Open -> Ending -> Ended` when ended with a final message, `Open -> Ended`
/// otherwise. `Failed` is entered from `Open` or `Ending` when a transform step
/// fails. There is no transition back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Accepting writes and producing records.
    Open,
    /// A final message is queued; the node closes once it has passed the transform.
    Ending,
    /// No further writes; outgoing edges severed.
    Ended,
    /// A transform step failed; the node no longer processes items.
    Failed,
}

impl Phase {
    /// True while writes are accepted.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::Open)
    }

    /// True once the node can never accept writes again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Failed)
    }
}
