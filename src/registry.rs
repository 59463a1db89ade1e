//! Unit registry.
//!
//! Tracks every work unit the scheduler knows about across three
//! identity-keyed sets: a pending queue for units added since the last
//! frame, and one set per [`Cadence`] group. New units always land in
//! pending and are folded into their group at a single well-defined point
//! per frame, so a group is never mutated while a phase iterates it.
//!
//! Membership is non-owning. The registry stores [`Weak`] references and
//! prunes entries whose unit was dropped without being removed.

use std::fmt;
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::bridge::{MirrorBridge, NoMirror};
use crate::unit::{Cadence, WorkUnit};

/// Identity key for a registered unit: the address of its shared allocation.
///
/// Compared and hashed only, never dereferenced, so a stale key for a
/// dropped unit is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct UnitKey(usize);

impl UnitKey {
    fn of(unit: &Arc<dyn WorkUnit>) -> Self {
        Self(Arc::as_ptr(unit) as *const () as usize)
    }
}

/// Identity-keyed set of non-owning unit references, in insertion order.
type UnitSet = IndexMap<UnitKey, Weak<dyn WorkUnit>>;

/// Upgraded view of one cadence group, captured for a single phase pass.
pub(crate) type UnitSnapshot = SmallVec<[Arc<dyn WorkUnit>; 8]>;

/// Registry of every work unit the scheduler currently tracks.
pub struct UnitRegistry {
    /// Units added since the last drain, not yet classified by cadence.
    pending: Mutex<UnitSet>,
    /// Units whose results are finalized at the next frame's early phase.
    default_group: Mutex<UnitSet>,
    /// Units whose results are finalized in the issuing frame's late phase.
    immediate_group: Mutex<UnitSet>,
    /// Incremental add/remove counter. Diagnostic only: unbalanced adds and
    /// removes make it drift from the live population.
    registered: AtomicIsize,
    /// Dead references discarded during drains and snapshots.
    pruned: AtomicUsize,
    /// Parallel-representation observer, `NoMirror` unless injected.
    bridge: Arc<dyn MirrorBridge>,
}

impl UnitRegistry {
    /// Creates an empty registry with no mirror.
    pub fn new() -> Self {
        Self::with_bridge(Arc::new(NoMirror))
    }

    /// Creates an empty registry that notifies `bridge` on add and remove.
    pub fn with_bridge(bridge: Arc<dyn MirrorBridge>) -> Self {
        Self {
            pending: Mutex::new(UnitSet::new()),
            default_group: Mutex::new(UnitSet::new()),
            immediate_group: Mutex::new(UnitSet::new()),
            registered: AtomicIsize::new(0),
            pruned: AtomicUsize::new(0),
            bridge,
        }
    }

    pub(crate) fn set_bridge(&mut self, bridge: Arc<dyn MirrorBridge>) {
        self.bridge = bridge;
    }

    /// Registers a work unit.
    ///
    /// The unit lands in the pending queue and joins its cadence group at
    /// the next drain. Registration runs the unit's synchronous pass first:
    /// a forced update so the unit is externally valid right away, then a
    /// staged cycle so the first deferred apply consumes real work instead
    /// of re-publishing the baseline.
    ///
    /// Re-adding a registered unit moves it back to pending; it is never a
    /// member of two sets. The diagnostic counter still counts every call.
    pub fn add(&self, unit: &Arc<dyn WorkUnit>) {
        let key = UnitKey::of(unit);
        self.default_group.lock().shift_remove(&key);
        self.immediate_group.lock().shift_remove(&key);
        self.pending.lock().insert(key, Arc::downgrade(unit));

        unit.force_immediate_update();
        // Results apply one frame deferred. Staging a cycle now means the
        // next completion consumes real work, not the forced baseline.
        unit.prepare_schedule();
        unit.schedule();

        if let Err(err) = self.bridge.attach(unit) {
            warn!("mirror bridge refused unit {:?}: {}", key, err);
        }

        self.registered.fetch_add(1, Ordering::SeqCst);
        debug!("registered unit {:?} with {:?} cadence", key, unit.cadence());
    }

    /// Unregisters a work unit from whichever sets hold it.
    ///
    /// Returns whether the unit was actually tracked. The diagnostic
    /// counter decrements either way.
    pub fn remove(&self, unit: &Arc<dyn WorkUnit>) -> bool {
        let key = UnitKey::of(unit);
        if let Err(err) = self.bridge.detach(unit) {
            warn!("mirror bridge failed to detach unit {:?}: {}", key, err);
        }

        let in_pending = self.pending.lock().shift_remove(&key).is_some();
        let in_default = self.default_group.lock().shift_remove(&key).is_some();
        let in_immediate = self.immediate_group.lock().shift_remove(&key).is_some();
        let found = in_pending || in_default || in_immediate;

        self.registered.fetch_sub(1, Ordering::SeqCst);
        if !found {
            warn!("removed unit {:?} was not registered", key);
        }
        found
    }

    /// Folds pending registrations into their cadence group and returns how
    /// many units were classified.
    ///
    /// Units dropped before classification are skipped and counted as
    /// pruned.
    pub(crate) fn drain_pending(&self) -> usize {
        let drained = std::mem::take(&mut *self.pending.lock());
        if drained.is_empty() {
            return 0;
        }

        let mut folded = 0;
        for (key, weak) in drained {
            let Some(unit) = weak.upgrade() else {
                debug!("pending unit {:?} dropped before classification", key);
                self.pruned.fetch_add(1, Ordering::SeqCst);
                continue;
            };
            match unit.cadence() {
                Cadence::Default => self.default_group.lock().insert(key, weak),
                Cadence::Immediate => self.immediate_group.lock().insert(key, weak),
            };
            folded += 1;
        }
        folded
    }

    /// Upgrades one cadence group for a phase pass, pruning dead entries.
    ///
    /// The returned snapshot holds strong references, so the group lock is
    /// released before the scheduler calls into any unit.
    pub(crate) fn snapshot(&self, cadence: Cadence) -> UnitSnapshot {
        let mut snapshot = UnitSnapshot::new();
        self.group(cadence).lock().retain(|key, weak| match weak.upgrade() {
            Some(unit) => {
                snapshot.push(unit);
                true
            }
            None => {
                debug!("unit {:?} dropped without removal; pruning", key);
                self.pruned.fetch_add(1, Ordering::SeqCst);
                false
            }
        });
        snapshot
    }

    fn group(&self, cadence: Cadence) -> &Mutex<UnitSet> {
        match cadence {
            Cadence::Default => &self.default_group,
            Cadence::Immediate => &self.immediate_group,
        }
    }

    /// Best-effort registration counter. See the note on drift in [`add`]
    /// and [`remove`]; [`population`] is the authoritative size.
    ///
    /// [`add`]: UnitRegistry::add
    /// [`remove`]: UnitRegistry::remove
    /// [`population`]: UnitRegistry::population
    #[inline]
    pub fn unit_count(&self) -> isize {
        self.registered.load(Ordering::SeqCst)
    }

    /// Tracked units across pending and both cadence groups.
    pub fn population(&self) -> usize {
        self.pending.lock().len()
            + self.default_group.lock().len()
            + self.immediate_group.lock().len()
    }

    /// Units awaiting cadence classification.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Units currently classified into `cadence`'s group.
    #[inline]
    pub fn group_len(&self, cadence: Cadence) -> usize {
        self.group(cadence).lock().len()
    }

    /// Dead references discarded so far.
    #[inline]
    pub fn pruned_count(&self) -> usize {
        self.pruned.load(Ordering::SeqCst)
    }

    /// Whether the unit is tracked in any of the three sets.
    pub fn contains(&self, unit: &Arc<dyn WorkUnit>) -> bool {
        let key = UnitKey::of(unit);
        self.pending.lock().contains_key(&key)
            || self.default_group.lock().contains_key(&key)
            || self.immediate_group.lock().contains_key(&key)
    }

    /// Strong references to every unit currently in a cadence group.
    ///
    /// Pending registrations are excluded; they join a group at the next
    /// early phase.
    pub fn active_units(&self) -> Vec<Arc<dyn WorkUnit>> {
        let mut units = Vec::new();
        for cadence in [Cadence::Default, Cadence::Immediate] {
            for weak in self.group(cadence).lock().values() {
                if let Some(unit) = weak.upgrade() {
                    units.push(unit);
                }
            }
        }
        units
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitRegistry")
            .field("pending", &self.pending.lock().len())
            .field("default_group", &self.default_group.lock().len())
            .field("immediate_group", &self.immediate_group.lock().len())
            .field("registered", &self.unit_count())
            .field("pruned", &self.pruned_count())
            .finish()
    }
}
