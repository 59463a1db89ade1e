//! Frame scheduler.
//!
//! Coordinates asynchronous work units inside a real-time frame loop. Each
//! frame the host calls [`run_early_phase`] once at the start and
//! [`run_late_phase`] once near the end:
//!
//! - The early phase completes default-cadence work issued the previous
//!   frame, issues fresh work for both cadence groups, then folds pending
//!   registrations into their group. The fold runs even while updates are
//!   disabled, so registrations are never lost.
//! - The late phase completes immediate-cadence work issued earlier the
//!   same frame.
//!
//! Issuing a group is batched: every unit is prepared, then every unit is
//! triggered, then the [`JobDispatcher`] is kicked exactly once. Completing
//! a group awaits each unit and immediately applies its results.
//!
//! [`teardown`] completes both groups unconditionally and also runs on
//! drop, so in-flight work never outlives the scheduler.
//!
//! [`run_early_phase`]: FrameScheduler::run_early_phase
//! [`run_late_phase`]: FrameScheduler::run_late_phase
//! [`teardown`]: FrameScheduler::teardown

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bridge::MirrorBridge;
use crate::dispatch::{EagerDispatch, JobDispatcher};
use crate::registry::{UnitRegistry, UnitSnapshot};
use crate::unit::{Cadence, WorkUnit};


/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Label used in diagnostics.
    #[serde(default = "default_name")]
    pub name: String,
    /// Initial state of the update gate. The pending fold is never gated.
    #[serde(default = "default_updates_enabled")]
    pub updates_enabled: bool,
}

fn default_name() -> String {
    "frame-scheduler".to_string()
}

fn default_updates_enabled() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            updates_enabled: default_updates_enabled(),
        }
    }
}

/// Scheduler statistics.
#[derive(Debug, Default)]
pub struct FrameStats {
    /// Early phases run.
    pub early_phases: AtomicUsize,
    /// Late phases run.
    pub late_phases: AtomicUsize,
    /// Units issued through the batched path.
    pub units_issued: AtomicUsize,
    /// Units awaited and applied.
    pub units_completed: AtomicUsize,
    /// Pending registrations folded into a cadence group.
    pub units_folded: AtomicUsize,
    /// Batched submissions handed to the dispatcher.
    pub batches_submitted: AtomicUsize,
}

impl FrameStats {
    /// Record one early phase.
    #[inline]
    pub fn record_early_phase(&self) {
        self.early_phases.fetch_add(1, Ordering::SeqCst);
    }

    /// Record one late phase.
    #[inline]
    pub fn record_late_phase(&self) {
        self.late_phases.fetch_add(1, Ordering::SeqCst);
    }

    /// Record one batched group issue of `units` units.
    #[inline]
    pub fn record_issued(&self, units: usize) {
        self.units_issued.fetch_add(units, Ordering::SeqCst);
        self.batches_submitted.fetch_add(1, Ordering::SeqCst);
    }

    /// Record `units` completed (awaited and applied) units.
    #[inline]
    pub fn record_completed(&self, units: usize) {
        self.units_completed.fetch_add(units, Ordering::SeqCst);
    }

    /// Record `units` pending registrations folded into their group.
    #[inline]
    pub fn record_folded(&self, units: usize) {
        self.units_folded.fetch_add(units, Ordering::SeqCst);
    }
}

/// Per-frame scheduler for batched asynchronous work units.
///
/// The scheduler is an explicitly constructed object; create one, share it
/// with `Arc`, and drive it from the host loop. Nothing is created behind
/// the host's back: the optional process-wide instance in
/// [`default_scheduler`] only exists once somebody asks for it.
///
/// All methods take `&self` and are callable from unit callbacks; a unit
/// may add or remove units (itself included) while a phase is running.
pub struct FrameScheduler {
    /// Configuration, kept for the diagnostic label.
    config: SchedulerConfig,
    /// Gates the early and late phase bodies.
    updates_enabled: AtomicBool,
    /// Unit membership and the registration protocol.
    registry: UnitRegistry,
    /// Batched-submission hook, kicked once per group issue.
    dispatcher: Arc<dyn JobDispatcher>,
    /// Counters.
    stats: FrameStats,
}

impl FrameScheduler {
    /// Creates a scheduler with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Creates a scheduler from `config`.
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            updates_enabled: AtomicBool::new(config.updates_enabled),
            registry: UnitRegistry::new(),
            dispatcher: Arc::new(EagerDispatch),
            stats: FrameStats::default(),
            config,
        }
    }

    /// Replaces the batched-submission hook. Builder style, used at
    /// construction time.
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn JobDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Replaces the mirror bridge notified on add and remove. Builder
    /// style, used at construction time.
    pub fn with_bridge(mut self, bridge: Arc<dyn MirrorBridge>) -> Self {
        self.registry.set_bridge(bridge);
        self
    }

    /// Early frame phase. Call once per frame, before frame work that
    /// consumes default-cadence results.
    ///
    /// Completes default-cadence work issued last frame, issues new work
    /// for both cadence groups, then folds pending registrations. Disabling
    /// updates skips everything except the fold.
    pub fn run_early_phase(&self) {
        if self.updates_enabled() {
            let defaults = self.registry.snapshot(Cadence::Default);
            self.complete_group(&defaults);
            self.issue_group(&defaults);

            let immediates = self.registry.snapshot(Cadence::Immediate);
            self.issue_group(&immediates);
        }

        let folded = self.registry.drain_pending();
        if folded > 0 {
            self.stats.record_folded(folded);
            trace!("{}: folded {} pending unit(s)", self.config.name, folded);
        }
        self.stats.record_early_phase();
    }

    /// Late frame phase. Call once per frame, after frame work that feeds
    /// immediate-cadence units.
    ///
    /// Completes immediate-cadence work issued in this frame's early phase.
    pub fn run_late_phase(&self) {
        if self.updates_enabled() {
            let immediates = self.registry.snapshot(Cadence::Immediate);
            self.complete_group(&immediates);
        }
        self.stats.record_late_phase();
    }

    /// Completes both cadence groups, ignoring the update gate.
    ///
    /// Shutdown path. Safe to call at any point in the frame; units whose
    /// work already completed treat the repeat await as a no-op. Also runs
    /// when the scheduler is dropped.
    pub fn teardown(&self) {
        let defaults = self.registry.snapshot(Cadence::Default);
        self.complete_group(&defaults);
        let immediates = self.registry.snapshot(Cadence::Immediate);
        self.complete_group(&immediates);
        debug!(
            "{}: teardown completed {} unit(s)",
            self.config.name,
            defaults.len() + immediates.len()
        );
    }

    /// Issues one group: prepare every unit, trigger every unit, then kick
    /// the dispatcher once.
    ///
    /// The two passes keep every unit's prepare ahead of any unit's
    /// trigger, so staging may still read state that triggering consumes.
    fn issue_group(&self, units: &UnitSnapshot) {
        for unit in units {
            unit.prepare_schedule();
        }
        for unit in units {
            unit.schedule();
        }
        self.dispatcher.submit_batch();
        self.stats.record_issued(units.len());
    }

    /// Completes one group: await each unit, then apply its results.
    fn complete_group(&self, units: &UnitSnapshot) {
        for unit in units {
            unit.complete();
            unit.apply_data();
        }
        self.stats.record_completed(units.len());
    }

    /// Registers a work unit. See [`UnitRegistry::add`] for the
    /// registration protocol.
    pub fn add(&self, unit: &Arc<dyn WorkUnit>) {
        self.registry.add(unit);
    }

    /// Unregisters a work unit. Returns whether it was tracked.
    pub fn remove(&self, unit: &Arc<dyn WorkUnit>) -> bool {
        self.registry.remove(unit)
    }

    /// Membership sets and counters.
    #[inline]
    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// Strong references to every unit currently in a cadence group.
    pub fn active_units(&self) -> Vec<Arc<dyn WorkUnit>> {
        self.registry.active_units()
    }

    /// Best-effort registration counter, see [`UnitRegistry::unit_count`].
    #[inline]
    pub fn unit_count(&self) -> isize {
        self.registry.unit_count()
    }

    /// Opens or closes the update gate. Takes effect at the next phase.
    pub fn set_updates_enabled(&self, enabled: bool) {
        self.updates_enabled.store(enabled, Ordering::SeqCst);
        debug!("{}: updates enabled = {}", self.config.name, enabled);
    }

    /// Whether the early and late phase bodies currently run.
    #[inline]
    pub fn updates_enabled(&self) -> bool {
        self.updates_enabled.load(Ordering::SeqCst)
    }

    /// Scheduler statistics.
    #[inline]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Diagnostic label from the configuration.
    #[inline]
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("name", &self.config.name)
            .field("updates_enabled", &self.updates_enabled())
            .field("registry", &self.registry)
            .finish()
    }
}

/// Process-wide default scheduler slot.
static DEFAULT_SCHEDULER: Lazy<Mutex<Option<Arc<FrameScheduler>>>> =
    Lazy::new(|| Mutex::new(None));

/// Name carried by the scheduler that [`default_scheduler`] creates.
pub const DEFAULT_SCHEDULER_NAME: &str = "default-frame-scheduler";

/// Returns the process-wide default scheduler.
///
/// Nothing exists until the first call with `create_if_missing` set; until
/// then, and again after [`teardown_default_scheduler`], this returns
/// `None`. The host stays in charge of driving the returned scheduler's
/// phases.
pub fn default_scheduler(create_if_missing: bool) -> Option<Arc<FrameScheduler>> {
    let mut slot = DEFAULT_SCHEDULER.lock();
    if slot.is_none() && create_if_missing {
        debug!("creating the process-wide default scheduler");
        let config = SchedulerConfig {
            name: DEFAULT_SCHEDULER_NAME.to_string(),
            ..SchedulerConfig::default()
        };
        *slot = Some(Arc::new(FrameScheduler::with_config(config)));
    }
    slot.clone()
}

/// Tears down and releases the process-wide default scheduler.
///
/// Completes both cadence groups first. Returns whether an instance
/// existed. Outstanding handles keep the instance alive, but it is no
/// longer the process default.
pub fn teardown_default_scheduler() -> bool {
    let taken = DEFAULT_SCHEDULER.lock().take();
    match taken {
        Some(scheduler) => {
            scheduler.teardown();
            true
        }
        None => false,
    }
}
