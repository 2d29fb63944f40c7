//! Runtime counters and tick timing.
//!
//! Counters are plain `AtomicU64`s bumped on the refresh hot path and read
//! when someone asks for a snapshot. The [`TickBudgetMonitor`] keeps a short
//! ring of refresh-pass timings behind a `parking_lot::Mutex`; it is written
//! once per tick and read rarely.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Global Counters (lock-free)
// ---------------------------------------------------------------------------

/// Process-wide counters, see [`crate::COUNTERS`].
pub struct LookoutCounters {
    /// Entity refresh calls.
    pub entities_refreshed: AtomicU64,
    /// Full component address table rebuilds.
    pub registry_rebuilds: AtomicU64,
    /// Cached-component revalidations that found a stale or foreign component.
    pub revalidation_breaks: AtomicU64,
    /// Remote structures that failed to decode.
    pub decode_failures: AtomicU64,
    /// Entities that received a type.
    pub types_resolved: AtomicU64,
    /// Entities that received a subtype.
    pub subtypes_resolved: AtomicU64,
    /// Entities marked unclassifiable.
    pub classification_misses: AtomicU64,
    /// Classification attempts deferred to a later tick.
    pub classification_retries: AtomicU64,
    /// Monsters whose displayed subtype was overridden by a user filter.
    pub poi_overrides: AtomicU64,
    /// Area instances discarded on area change.
    pub area_resets: AtomicU64,
    /// Entities dropped from the live pool.
    pub entities_pruned: AtomicU64,
}

impl LookoutCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entities_refreshed: AtomicU64::new(0),
            registry_rebuilds: AtomicU64::new(0),
            revalidation_breaks: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            types_resolved: AtomicU64::new(0),
            subtypes_resolved: AtomicU64::new(0),
            classification_misses: AtomicU64::new(0),
            classification_retries: AtomicU64::new(0),
            poi_overrides: AtomicU64::new(0),
            area_resets: AtomicU64::new(0),
            entities_pruned: AtomicU64::new(0),
        }
    }

    /// Add one to `counter`.
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CounterSnapshot {
            entities_refreshed: load(&self.entities_refreshed),
            registry_rebuilds: load(&self.registry_rebuilds),
            revalidation_breaks: load(&self.revalidation_breaks),
            decode_failures: load(&self.decode_failures),
            types_resolved: load(&self.types_resolved),
            subtypes_resolved: load(&self.subtypes_resolved),
            classification_misses: load(&self.classification_misses),
            classification_retries: load(&self.classification_retries),
            poi_overrides: load(&self.poi_overrides),
            area_resets: load(&self.area_resets),
            entities_pruned: load(&self.entities_pruned),
        }
    }
}

impl Default for LookoutCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Entity refresh calls.
    pub entities_refreshed: u64,
    /// Address table rebuilds.
    pub registry_rebuilds: u64,
    /// Revalidation breaks.
    pub revalidation_breaks: u64,
    /// Decode failures.
    pub decode_failures: u64,
    /// Types resolved.
    pub types_resolved: u64,
    /// Subtypes resolved.
    pub subtypes_resolved: u64,
    /// Entities marked unclassifiable.
    pub classification_misses: u64,
    /// Deferred classification attempts.
    pub classification_retries: u64,
    /// Point-of-interest overrides.
    pub poi_overrides: u64,
    /// Area resets.
    pub area_resets: u64,
    /// Entities pruned.
    pub entities_pruned: u64,
}

impl CounterSnapshot {
    /// Counter-wise difference `self - earlier`, saturating at zero.
    #[must_use]
    pub fn since(&self, earlier: &Self) -> Self {
        Self {
            entities_refreshed: self.entities_refreshed.saturating_sub(earlier.entities_refreshed),
            registry_rebuilds: self.registry_rebuilds.saturating_sub(earlier.registry_rebuilds),
            revalidation_breaks: self.revalidation_breaks.saturating_sub(earlier.revalidation_breaks),
            decode_failures: self.decode_failures.saturating_sub(earlier.decode_failures),
            types_resolved: self.types_resolved.saturating_sub(earlier.types_resolved),
            subtypes_resolved: self.subtypes_resolved.saturating_sub(earlier.subtypes_resolved),
            classification_misses: self
                .classification_misses
                .saturating_sub(earlier.classification_misses),
            classification_retries: self
                .classification_retries
                .saturating_sub(earlier.classification_retries),
            poi_overrides: self.poi_overrides.saturating_sub(earlier.poi_overrides),
            area_resets: self.area_resets.saturating_sub(earlier.area_resets),
            entities_pruned: self.entities_pruned.saturating_sub(earlier.entities_pruned),
        }
    }

    fn rows(&self) -> [(&'static str, &'static str, u64); 11] {
        [
            ("entities_refreshed", "Entity refresh calls", self.entities_refreshed),
            ("registry_rebuilds", "Component address table rebuilds", self.registry_rebuilds),
            ("revalidation_breaks", "Cached component revalidation failures", self.revalidation_breaks),
            ("decode_failures", "Remote structures that failed to decode", self.decode_failures),
            ("types_resolved", "Entity types resolved", self.types_resolved),
            ("subtypes_resolved", "Entity subtypes resolved", self.subtypes_resolved),
            ("classification_misses", "Entities marked unclassifiable", self.classification_misses),
            ("classification_retries", "Classification attempts deferred", self.classification_retries),
            ("poi_overrides", "Point-of-interest subtype overrides", self.poi_overrides),
            ("area_resets", "Area instances discarded", self.area_resets),
            ("entities_pruned", "Entities dropped from the live pool", self.entities_pruned),
        ]
    }

    /// Format as Prometheus text exposition.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let mut out = String::new();
        for (name, help, value) in self.rows() {
            let _ = write!(
                out,
                "# HELP lookout_{name}_total {help}\n\
                 # TYPE lookout_{name}_total counter\n\
                 lookout_{name}_total {value}\n"
            );
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tick Budget Monitor
// ---------------------------------------------------------------------------

const HISTORY_LEN: usize = 256;

/// Timing of recent refresh passes against a per-tick budget.
///
/// ```rust
/// # use lookout_core::metrics::TickBudgetMonitor;
/// let monitor = TickBudgetMonitor::new(4.0);
/// {
///     let _tick = monitor.begin_tick();
///     // refresh every entity
/// }
/// assert_eq!(monitor.tick_count(), 1);
/// ```
pub struct TickBudgetMonitor {
    budget_ms: f64,
    history: Mutex<TickHistory>,
}

struct TickHistory {
    timings: Vec<f64>,
    write_idx: usize,
    count: u64,
    last_over_budget: bool,
}

impl TickBudgetMonitor {
    /// A monitor with the given budget in milliseconds.
    #[must_use]
    pub fn new(budget_ms: f64) -> Self {
        Self {
            budget_ms,
            history: Mutex::new(TickHistory {
                timings: vec![0.0; HISTORY_LEN],
                write_idx: 0,
                count: 0,
                last_over_budget: false,
            }),
        }
    }

    /// Start timing a tick; the elapsed time is recorded when the guard drops.
    pub fn begin_tick(&self) -> TickGuard<'_> {
        TickGuard {
            monitor: self,
            start: Instant::now(),
        }
    }

    /// Record one tick's duration. Returns whether it was over budget.
    pub fn record(&self, ms: f64) -> bool {
        let mut h = self.history.lock();
        let idx = h.write_idx;
        h.timings[idx] = ms;
        h.write_idx = (idx + 1) % HISTORY_LEN;
        h.count += 1;
        h.last_over_budget = ms > self.budget_ms;
        h.last_over_budget
    }

    /// Duration of the most recent tick, or 0 before the first one.
    #[must_use]
    pub fn last_tick_ms(&self) -> f64 {
        let h = self.history.lock();
        if h.count == 0 {
            return 0.0;
        }
        h.timings[(h.write_idx + HISTORY_LEN - 1) % HISTORY_LEN]
    }

    /// Whether the most recent tick exceeded the budget.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.history.lock().last_over_budget
    }

    /// Ticks recorded so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.history.lock().count
    }

    /// The configured budget.
    #[must_use]
    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }

    /// P50/P95/P99/max over the retained history.
    #[must_use]
    pub fn percentiles(&self) -> TickPercentiles {
        let h = self.history.lock();
        let n = usize::try_from(h.count).map_or(HISTORY_LEN, |c| c.min(HISTORY_LEN));
        if n == 0 {
            return TickPercentiles::default();
        }
        let mut sorted = h.timings[..n].to_vec();
        drop(h);
        sorted.sort_by(f64::total_cmp);

        let at = |q: f64| sorted[((n as f64 * q) as usize).min(n - 1)];
        let over = sorted.iter().filter(|&&t| t > self.budget_ms).count();
        TickPercentiles {
            p50: at(0.50),
            p95: at(0.95),
            p99: at(0.99),
            max: sorted[n - 1],
            over_budget_ratio: over as f64 / n as f64,
        }
    }
}

/// Records elapsed time into its monitor on drop.
pub struct TickGuard<'a> {
    monitor: &'a TickBudgetMonitor,
    start: Instant,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        let ms = self.start.elapsed().as_secs_f64() * 1000.0;
        if self.monitor.record(ms) {
            tracing::debug!(
                elapsed_ms = ms,
                budget_ms = self.monitor.budget_ms,
                "refresh pass over budget"
            );
        }
    }
}

/// Percentile statistics for tick timings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickPercentiles {
    /// Median, milliseconds.
    pub p50: f64,
    /// 95th percentile, milliseconds.
    pub p95: f64,
    /// 99th percentile, milliseconds.
    pub p99: f64,
    /// Slowest retained tick.
    pub max: f64,
    /// Share of retained ticks over budget (0.0 to 1.0).
    pub over_budget_ratio: f64,
}

impl TickPercentiles {
    /// One-line human-readable summary.
    #[must_use]
    pub fn summary(&self, budget_ms: f64) -> String {
        format!(
            "P50={:.2}ms  P95={:.2}ms  P99={:.2}ms  Max={:.2}ms  Budget={budget_ms:.1}ms  \
             Over-budget={:.1}%",
            self.p50,
            self.p95,
            self.p99,
            self.max,
            self.over_budget_ratio * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Tracing Span Names
// ---------------------------------------------------------------------------

/// Span names for `tracing` instrumentation.
pub mod spans {
    /// One full refresh pass over an area.
    pub const AREA_TICK: &str = "lookout::area::tick";
    /// Area change barrier.
    pub const AREA_CHANGE: &str = "lookout::area::change";
    /// A single entity refresh.
    pub const ENTITY_REFRESH: &str = "lookout::entity::refresh";
    /// Component address table rebuild.
    pub const REGISTRY_REBUILD: &str = "lookout::registry::rebuild";
    /// Type, subtype and state classification.
    pub const CLASSIFY: &str = "lookout::classify";
}
