//! Mirror bridge.
//!
//! Hosts that maintain a second representation of registered units (an
//! entity world, a render graph, a physics mirror) inject a [`MirrorBridge`]
//! to observe registration traffic. Bridge failures are logged and skipped;
//! they never abort an add or remove.

use std::sync::Arc;

use thiserror::Error;

use crate::unit::WorkUnit;

/// Errors a mirror bridge may report. Non-fatal to the registry.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The unit lacks a capability the mirror requires.
    #[error("unit is missing a capability the mirror requires: {0}")]
    MissingCapability(String),

    /// The mirror has no record of the unit.
    #[error("mirror has no entry for the unit")]
    NotMirrored,

    /// Any other bridge-specific failure.
    #[error("mirror rejected the unit: {0}")]
    Rejected(String),
}

/// Observer for add/remove traffic on the unit registry.
///
/// `attach` runs after a newly added unit's synchronous registration pass
/// and `detach` runs before a removed unit leaves the membership sets, so a
/// mirror always sees units in a valid state.
pub trait MirrorBridge: Send + Sync {
    /// Called when a unit is registered.
    fn attach(&self, unit: &Arc<dyn WorkUnit>) -> Result<(), BridgeError>;

    /// Called when a unit is unregistered.
    fn detach(&self, unit: &Arc<dyn WorkUnit>) -> Result<(), BridgeError>;
}

/// Default bridge: no parallel representation, every notification succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMirror;

impl MirrorBridge for NoMirror {
    #[inline]
    fn attach(&self, _unit: &Arc<dyn WorkUnit>) -> Result<(), BridgeError> {
        Ok(())
    }

    #[inline]
    fn detach(&self, _unit: &Arc<dyn WorkUnit>) -> Result<(), BridgeError> {
        Ok(())
    }
}
