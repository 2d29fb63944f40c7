//! Area change detection.
//!
//! Every entity, registry and cached capability belongs to exactly one area
//! instance. When the area hash changes, the whole instance is dropped in
//! one go and a fresh one takes its place.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use lookout_core::config::LookoutConfig;
use lookout_core::metrics::{spans, LookoutCounters, TickBudgetMonitor};
use lookout_core::{RemoteMemory, COUNTERS};

use crate::area::{AreaInstance, AreaSnapshot, TickReport};

/// Owns the current [`AreaInstance`] and replaces it on area change.
pub struct AreaManager {
    memory: Arc<dyn RemoteMemory>,
    current: Option<AreaInstance>,
    monitor: TickBudgetMonitor,
    resets: u64,
}

impl AreaManager {
    /// A manager with no area yet.
    #[must_use]
    pub fn new(memory: Arc<dyn RemoteMemory>, config: &LookoutConfig) -> Self {
        Self {
            memory,
            current: None,
            monitor: TickBudgetMonitor::new(f64::from(config.performance.tick_budget_ms)),
            resets: 0,
        }
    }

    /// Drop the current area and start a fresh one for `area_hash`.
    pub fn on_area_change(&mut self, area_hash: u64) {
        self.current = Some(fresh_area(&self.memory, self.current.as_ref(), area_hash));
        self.resets += 1;
    }

    /// Run one tick, switching areas first if the snapshot's hash differs.
    pub fn tick(&mut self, config: &LookoutConfig, snapshot: &AreaSnapshot) -> TickReport {
        let _timing = self.monitor.begin_tick();
        let stale = self.current.as_ref().map(AreaInstance::area_hash) != Some(snapshot.area_hash);
        if stale {
            self.current = Some(fresh_area(&self.memory, self.current.as_ref(), snapshot.area_hash));
            self.resets += 1;
        }
        match self.current.as_mut() {
            Some(area) => area.tick(config, snapshot),
            None => TickReport::default(),
        }
    }

    /// The current area, if any.
    #[must_use]
    pub fn current(&self) -> Option<&AreaInstance> {
        self.current.as_ref()
    }

    /// Areas installed since creation, the first one included.
    #[must_use]
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Tick timing history.
    #[must_use]
    pub fn monitor(&self) -> &TickBudgetMonitor {
        &self.monitor
    }
}

impl fmt::Debug for AreaManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AreaManager")
            .field("current", &self.current)
            .field("resets", &self.resets)
            .finish_non_exhaustive()
    }
}

fn fresh_area(memory: &Arc<dyn RemoteMemory>, previous: Option<&AreaInstance>, area_hash: u64) -> AreaInstance {
    let _span = tracing::info_span!(spans::AREA_CHANGE, area = area_hash).entered();
    LookoutCounters::bump(&COUNTERS.area_resets);
    info!(
        from = previous.map(AreaInstance::area_hash),
        to = area_hash,
        dropped = previous.map_or(0, AreaInstance::len),
        "area changed"
    );
    AreaInstance::new(area_hash, memory.clone())
}
