//! Batched job submission.
//!
//! Issuing a cadence group is a two-pass walk (prepare everything, then
//! trigger everything) followed by exactly one submission call. Backends
//! that queue triggered work until an explicit kick implement
//! [`JobDispatcher`] to receive that kick; backends that start work the
//! moment it is triggered use [`EagerDispatch`] and ignore it.

/// Strategy invoked once at the end of every group issue pass.
pub trait JobDispatcher: Send + Sync {
    /// Kicks off every job triggered since the last submission.
    fn submit_batch(&self);
}

/// Dispatcher for backends that start work as soon as it is triggered.
///
/// There is nothing left to kick, so submission is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct EagerDispatch;

impl JobDispatcher for EagerDispatch {
    #[inline]
    fn submit_batch(&self) {}
}
