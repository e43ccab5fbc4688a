//! Aggregator registry
//!
//! An [`Aggregators`] registry owns the named aggregators of one processing
//! unit, their shared window clock and the lifecycle
//!
//! ```text
//! NotStarted --start()--> Running --stop()--> Stopped
//! ```
//!
//! Aggregators can be created while `NotStarted` or `Running`. Reads and
//! merges work in every state; `process` only folds while `Running`.

use crate::aggregation::{AggregationKind, Aggregator, Numeric, WindowedAggregator};
use crate::config::AggregatorsConfig;
use crate::error::{AggregatorError, Result};
use crate::window::{
    LifecycleState, SystemTimeSource, TimeSource, WindowClock, WindowGranularity, WindowType,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Registry of named aggregators sharing one window clock
///
/// # Example
///
/// ```rust
/// use stream_aggregator::{AggregationKind, Aggregators, Statistic, WindowType};
///
/// let registry = Aggregators::new(2, WindowType::Rolling).unwrap();
/// let sum = registry.create_simple::<i64>("bytes", AggregationKind::Sum).unwrap();
/// registry.start(1).unwrap();
///
/// sum.process(512);
/// sum.process(256);
/// assert_eq!(sum.get(), Some(Statistic::Value(768)));
///
/// registry.roll().unwrap();
/// assert_eq!(sum.get(), None);
/// assert_eq!(sum.get_window(1), Some(Statistic::Value(768)));
///
/// registry.stop().unwrap();
/// ```
#[derive(Debug)]
pub struct Aggregators {
    config: AggregatorsConfig,
    clock: Arc<WindowClock>,
    aggregators: DashMap<String, Arc<dyn WindowedAggregator>>,
}

impl Aggregators {
    /// Registry with manually rolled windows
    pub fn new(window_count: usize, window_type: WindowType) -> Result<Self> {
        Self::from_config(&AggregatorsConfig {
            window_count,
            window_type,
            granularity: WindowGranularity::Manual,
        })
    }

    pub fn from_config(config: &AggregatorsConfig) -> Result<Self> {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    /// Registry reading time from `time_source` under time granularity
    pub fn with_time_source(
        config: &AggregatorsConfig,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config: config.clone(),
            clock: Arc::new(WindowClock::new(config.granularity, time_source)),
            aggregators: DashMap::new(),
        })
    }

    pub fn config(&self) -> &AggregatorsConfig {
        &self.config
    }

    pub fn window_count(&self) -> usize {
        self.config.window_count
    }

    pub fn window_type(&self) -> WindowType {
        self.config.window_type
    }

    pub fn state(&self) -> LifecycleState {
        self.clock.state()
    }

    /// Current window index, `None` before `start()`
    pub fn current_window(&self) -> Option<u64> {
        self.clock.current()
    }

    /// Register a new aggregator under `name`
    pub fn create_simple<T: Numeric>(
        &self,
        name: &str,
        kind: AggregationKind,
    ) -> Result<Arc<Aggregator<T>>> {
        let state = self.state();
        if state == LifecycleState::Stopped {
            return Err(AggregatorError::illegal_state("create aggregator", state));
        }

        match self.aggregators.entry(name.to_string()) {
            Entry::Occupied(_) => Err(AggregatorError::DuplicateName {
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                let retention = self.config.window_type.retention(self.config.window_count);
                let aggregator = Arc::new(Aggregator::<T>::new(
                    name,
                    kind,
                    Arc::clone(&self.clock),
                    retention,
                ));
                slot.insert(aggregator.clone() as Arc<dyn WindowedAggregator>);

                let domain = T::DOMAIN;
                debug!(name, kind = %kind, domain = %domain, retention, "Created aggregator");
                Ok(aggregator)
            }
        }
    }

    /// Typed handle to a registered aggregator
    pub fn aggregator<T: Numeric>(&self, name: &str) -> Result<Arc<Aggregator<T>>> {
        let erased = self
            .aggregators
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AggregatorError::UnknownAggregator {
                name: name.to_string(),
            })?;

        let actual = erased.domain();
        erased
            .into_any()
            .downcast::<Aggregator<T>>()
            .map_err(|_| AggregatorError::TypeMismatch {
                expected: T::DOMAIN.to_string(),
                actual: actual.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.aggregators.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .aggregators
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.aggregators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregators.is_empty()
    }

    /// Start rotating windows from `initial_window`
    pub fn start(&self, initial_window: u64) -> Result<()> {
        self.clock
            .start(initial_window)
            .map_err(|state| AggregatorError::illegal_state("start", state))?;

        info!(
            initial_window,
            window_count = self.config.window_count,
            window_type = ?self.config.window_type,
            granularity = %self.config.granularity,
            aggregators = self.aggregators.len(),
            "Aggregators started"
        );
        Ok(())
    }

    /// Halt rotation. Terminal: the registry cannot be restarted.
    ///
    /// The window index freezes and windows already out of retention are
    /// released. The last `window_count` windows stay readable and mergeable,
    /// and snapshots taken earlier remain valid.
    pub fn stop(&self) -> Result<()> {
        let last_window = self
            .clock
            .stop()
            .map_err(|state| AggregatorError::illegal_state("stop", state))?;
        let evicted = self.evict_expired();

        info!(last_window, evicted, "Aggregators stopped");
        Ok(())
    }

    /// Advance to the next window and evict windows that fell out of retention.
    ///
    /// Only available under [`WindowGranularity::Manual`].
    pub fn roll(&self) -> Result<u64> {
        if self.config.granularity != WindowGranularity::Manual {
            return Err(AggregatorError::IllegalState {
                operation: "roll".to_string(),
                state: format!("driven by {} granularity", self.config.granularity),
            });
        }

        let window = self.clock.advance()?;
        let evicted = self.evict_expired();

        debug!(window, evicted, "Rolled to next window");
        Ok(window)
    }

    /// Drop expired windows from every aggregator. Returns how many were dropped.
    pub fn evict_expired(&self) -> usize {
        self.aggregators
            .iter()
            .map(|entry| entry.value().evict_expired())
            .sum()
    }

    /// JSON array with a snapshot of every aggregator, sorted by name
    pub fn export_snapshots(&self) -> Result<String> {
        let mut handles: Vec<Arc<dyn WindowedAggregator>> = self
            .aggregators
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        handles.sort_by(|a, b| a.name().cmp(b.name()));

        let snapshots = handles
            .iter()
            .map(|aggregator| aggregator.snapshot_json())
            .collect::<Result<Vec<_>>>()?;
        Ok(serde_json::to_string(&snapshots)?)
    }

    /// Merge a JSON array produced by [`export_snapshots`](Self::export_snapshots)
    /// into the aggregators of the same names.
    ///
    /// Every snapshot is resolved by name, type checked and decoded before
    /// anything is merged, so a failing batch leaves every aggregator
    /// untouched. Returns the number of snapshots merged.
    pub fn merge_snapshots(&self, json: &str) -> Result<usize> {
        let snapshots: Vec<serde_json::Value> = serde_json::from_str(json)?;

        let mut targets = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            let name = snapshot
                .get("name")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| {
                    AggregatorError::Serialization("snapshot without a name".to_string())
                })?
                .to_string();
            let target = self
                .aggregators
                .get(&name)
                .map(|entry| Arc::clone(entry.value()))
                .ok_or(AggregatorError::UnknownAggregator { name })?;
            target.check_json(&snapshot)?;
            targets.push((target, snapshot));
        }

        let merged = targets.len();
        for (target, snapshot) in targets {
            target.merge_json(snapshot)?;
        }

        debug!(merged, "Merged snapshots");
        Ok(merged)
    }
}
