/// Where a resolver request is in its lifecycle.
///
/// A request only ever moves forward through these states; none is revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    /// Created by the caller, not yet handed to a resolver.
    #[default]
    Unsubmitted,

    /// Sitting in the resolver's pending queue.
    Pending,

    /// Being resolved on the worker thread.
    InFlight,

    /// Resolved, waiting for the next event loop tick.
    Completed,

    /// Completion handler has run; the caller owns the request again.
    Dispatched,
}

impl RequestState {
    /// Whether the resolver currently owns the request.
    pub fn is_owned_by_resolver(&self) -> bool {
        matches!(self, Self::Pending | Self::InFlight | Self::Completed)
    }

    /// Whether a result (success or failure) has been recorded.
    pub fn has_result(&self) -> bool {
        matches!(self, Self::Completed | Self::Dispatched)
    }
}
