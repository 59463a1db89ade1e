//! Work unit contract.
//!
//! A work unit is an independently schedulable, stateful entity whose
//! expensive computation runs off the main execution path each cycle. The
//! scheduler drives every registered unit through the same protocol
//! (prepare, trigger, await, apply) and finalizes results at the frame
//! phase selected by the unit's [`Cadence`].

use serde::{Deserialize, Serialize};

/// Update-frequency class of a work unit.
///
/// Fixed for the unit's registered lifetime: the cadence is read once, when
/// a pending registration is folded into its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cadence {
    /// Results are finalized at the start of the *next* frame's early phase.
    #[default]
    Default,
    /// Results are finalized in the late phase of the frame that issued them.
    Immediate,
}

/// Contract every schedulable work unit implements.
///
/// The scheduler holds registered units as non-owning [`Weak`] references,
/// so the creator keeps ownership and a unit that is dropped without being
/// unregistered is pruned instead of called. All calls arrive on the host's
/// frame thread; implementations guard their own interior state.
///
/// Units are assumed independent. No unit's prepare, trigger, await, or
/// apply step may touch another unit's state; that independence is what
/// permits unordered group iteration and batched submission.
///
/// # Call protocol
///
/// Per issued cycle the scheduler calls, in order: [`prepare_schedule`],
/// [`schedule`], [`complete`], [`apply_data`]. Calling [`complete`] on a
/// unit that was never scheduled is a caller bug and should panic loudly;
/// calling it again after the work already finished must be a harmless
/// no-op, because the teardown path re-completes groups that may have been
/// completed earlier the same frame.
///
/// [`Weak`]: std::sync::Weak
/// [`prepare_schedule`]: WorkUnit::prepare_schedule
/// [`schedule`]: WorkUnit::schedule
/// [`complete`]: WorkUnit::complete
/// [`apply_data`]: WorkUnit::apply_data
pub trait WorkUnit: Send + Sync {
    /// Update-frequency class. Must stay constant while registered.
    fn cadence(&self) -> Cadence;

    /// Stages the next computation by reading current external state.
    ///
    /// Runs for every unit in a group before any unit's [`schedule`] call,
    /// so it must not mutate state other units might read while staging.
    ///
    /// [`schedule`]: WorkUnit::schedule
    fn prepare_schedule(&self);

    /// Triggers the computation staged by the preceding prepare pass.
    ///
    /// Must not block on the computation itself; the await happens later in
    /// [`complete`].
    ///
    /// [`complete`]: WorkUnit::complete
    fn schedule(&self);

    /// Blocks until the most recently triggered computation has finished.
    ///
    /// A repeat call after the work finished is a no-op. Implementations
    /// should panic if no work was ever scheduled.
    fn complete(&self);

    /// Publishes the completed results to externally visible state.
    ///
    /// Only called directly after [`complete`] returns.
    ///
    /// [`complete`]: WorkUnit::complete
    fn apply_data(&self);

    /// Synchronously produces a valid result without the asynchronous path.
    ///
    /// Invoked once at registration so the unit is never externally visible
    /// in an uninitialized state, even if scheduling never runs afterwards.
    fn force_immediate_update(&self);
}
