use super::aggregatable::{type_name, Aggregatable};
use super::data::AggregatorData;
use super::operation::{Accumulator, AggregationKind, Statistic};
use super::value::{Numeric, ValueDomain};
use crate::error::{AggregatorError, Result};
use crate::window::{WindowClock, WindowRing};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::any::Any;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Named, windowed accumulator for one statistic over one value domain
///
/// Aggregators are created through
/// [`Aggregators::create_simple`](crate::Aggregators::create_simple) and
/// share their registry's window clock. All methods take `&self`; the
/// per-window state sits behind one short-lived lock, so an aggregator can
/// be shared across threads as an `Arc`.
///
/// `get`, `get_aggregatable` and `aggregate` all address the current
/// window. Older retained windows are available through `get_window`,
/// `windows` and `get_rolled_up`.
///
/// # Examples
///
/// ```
/// use stream_aggregator::{AggregationKind, Aggregators, Statistic, WindowType};
///
/// let registry = Aggregators::new(2, WindowType::Rolling).unwrap();
/// let min = registry.create_simple::<f64>("a", AggregationKind::Min).unwrap();
/// registry.start(1).unwrap();
///
/// assert_eq!(min.get(), None);
/// min.process(1.0);
/// min.process(2.0);
/// assert_eq!(min.get(), Some(Statistic::Value(1.0)));
/// ```
#[derive(Debug)]
pub struct Aggregator<T> {
    name: String,
    kind: AggregationKind,
    clock: Arc<WindowClock>,
    ring: Mutex<WindowRing<T>>,
    ignored: AtomicU64,
}

impl<T: Numeric> Aggregator<T> {
    pub(crate) fn new(
        name: impl Into<String>,
        kind: AggregationKind,
        clock: Arc<WindowClock>,
        retention: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            clock,
            ring: Mutex::new(WindowRing::new(retention)),
            ignored: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AggregationKind {
        self.kind
    }

    pub fn domain(&self) -> ValueDomain {
        T::DOMAIN
    }

    /// Canonical type tag of snapshots produced by this aggregator
    pub fn type_name(&self) -> String {
        type_name(self.kind, T::DOMAIN)
    }

    /// Fold `value` into the current window.
    ///
    /// Values arriving while the registry is not running are ignored and
    /// counted in [`ignored_updates`](Self::ignored_updates).
    pub fn process(&self, value: T) {
        let Some(window) = self.clock.on_event() else {
            self.ignore(1, "registry not running");
            return;
        };

        let horizon = self.horizon(window);
        let folded = self
            .ring
            .lock()
            .entry(window, horizon, self.kind)
            .map(|data| data.process(value));
        if folded.is_none() {
            self.ignore(1, "window already evicted");
        }
    }

    /// Fold a batch of values under one lock acquisition.
    ///
    /// Each value counts as one event, so under event granularity a batch
    /// that crosses a window boundary is split between the windows.
    pub fn process_batch(&self, values: &[T]) {
        if values.is_empty() {
            return;
        }

        let Some(runs) = self.clock.on_events(values.len() as u64) else {
            self.ignore(values.len() as u64, "registry not running");
            return;
        };

        let newest = runs.last().map_or(0, |&(window, _)| window);
        let horizon = self.horizon(newest);
        let mut dropped = 0_u64;
        {
            let mut ring = self.ring.lock();
            let mut rest = values;
            for (window, count) in runs {
                let (chunk, tail) = rest.split_at((count as usize).min(rest.len()));
                rest = tail;
                match ring.entry(window, horizon, self.kind) {
                    Some(data) => {
                        for value in chunk {
                            data.process(*value);
                        }
                    }
                    None => dropped += chunk.len() as u64,
                }
            }
        }
        if dropped > 0 {
            self.ignore(dropped, "window already evicted");
        }
    }

    /// Statistic of the current window, `None` if nothing was folded into it
    pub fn get(&self) -> Option<Statistic<T>> {
        let window = self.clock.current()?;
        self.ring
            .lock()
            .get(window, window)
            .and_then(AggregatorData::value)
    }

    /// Statistic of a retained window, `None` if evicted, unopened or empty
    pub fn get_window(&self, window: u64) -> Option<Statistic<T>> {
        let horizon = self.clock.current()?;
        self.ring
            .lock()
            .get(window, horizon)
            .and_then(AggregatorData::value)
    }

    /// Retained windows holding a value, oldest first
    pub fn windows(&self) -> Vec<(u64, Statistic<T>)> {
        let Some(horizon) = self.clock.current() else {
            return Vec::new();
        };

        self.ring
            .lock()
            .retained(horizon)
            .into_iter()
            .filter_map(|data| data.value().map(|value| (data.window(), value)))
            .collect()
    }

    /// Statistic over every retained window merged together
    pub fn get_rolled_up(&self) -> Option<Statistic<T>> {
        let horizon = self.clock.current()?;
        let mut total = AggregatorData::new(horizon, self.kind);
        {
            let ring = self.ring.lock();
            for data in ring.retained(horizon) {
                total.merge(data.accumulator(), data.updates()).ok()?;
            }
        }
        total.value()
    }

    /// Number of values folded or merged into the current window
    pub fn updates(&self) -> u64 {
        let Some(window) = self.clock.current() else {
            return 0;
        };
        self.ring
            .lock()
            .get(window, window)
            .map_or(0, AggregatorData::updates)
    }

    /// Values dropped because the registry was not running or their window
    /// had already been evicted
    pub fn ignored_updates(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }

    /// Snapshot of the current window
    pub fn get_aggregatable(&self) -> Aggregatable<T> {
        let state = self.clock.current().and_then(|window| {
            self.ring
                .lock()
                .get(window, window)
                .map(|data| (data.updates(), *data.accumulator()))
        });

        let (updates, payload) = state.unwrap_or((0, Accumulator::identity(self.kind)));
        Aggregatable::new(self.name.as_str(), updates, payload)
    }

    /// Merge a foreign snapshot into the current window.
    ///
    /// Fails with [`AggregatorError::TypeMismatch`] when the snapshot was
    /// produced by a different operation or value domain; the aggregator is
    /// left untouched in that case.
    pub fn aggregate(&self, other: &Aggregatable<T>) -> Result<()> {
        self.check_compatible(other)?;

        let Some(window) = self.clock.current() else {
            debug!(aggregator = %self.name, "No current window before start, merge skipped");
            return Ok(());
        };
        self.merge_into(window, window, other);
        Ok(())
    }

    /// Merge a foreign snapshot into a specific retained window.
    ///
    /// Merges addressed to evicted or not yet opened windows are dropped.
    pub fn aggregate_at(&self, window: u64, other: &Aggregatable<T>) -> Result<()> {
        self.check_compatible(other)?;

        let Some(horizon) = self.clock.current() else {
            debug!(aggregator = %self.name, window, "No current window before start, merge skipped");
            return Ok(());
        };
        self.merge_into(window, horizon, other);
        Ok(())
    }

    pub(crate) fn evict_expired(&self) -> usize {
        match self.clock.current() {
            Some(horizon) => self.ring.lock().evict_expired(horizon),
            None => 0,
        }
    }

    fn check_compatible(&self, other: &Aggregatable<T>) -> Result<()> {
        self.check_tags(other.name(), other.kind(), other.domain())
    }

    fn check_tags(&self, source: &str, kind: AggregationKind, domain: ValueDomain) -> Result<()> {
        if kind == self.kind && domain == T::DOMAIN {
            return Ok(());
        }

        let err = AggregatorError::TypeMismatch {
            expected: self.type_name(),
            actual: type_name(kind, domain),
        };
        warn!(aggregator = %self.name, source, error = %err, "Rejected snapshot merge");
        Err(err)
    }

    /// Decode a JSON snapshot, comparing its tags before its payload so a
    /// foreign value domain is reported as a type mismatch.
    fn decode_json(&self, snapshot: &serde_json::Value) -> Result<Aggregatable<T>> {
        let source = snapshot
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        let domain: ValueDomain = tag(snapshot.get("domain"), "domain")?;
        let kind: AggregationKind =
            tag(snapshot.get("payload").and_then(|p| p.get("type")), "payload type")?;
        self.check_tags(source, kind, domain)?;

        Ok(Aggregatable::deserialize(snapshot)?)
    }

    fn merge_into(&self, window: u64, horizon: u64, other: &Aggregatable<T>) {
        if other.is_empty() {
            return;
        }

        let mut ring = self.ring.lock();
        match ring.entry(window, horizon, self.kind) {
            Some(data) => {
                // kinds were checked by check_compatible
                if let Err(err) = data.merge(other.payload(), other.updates()) {
                    warn!(aggregator = %self.name, error = %err, "Snapshot merge failed");
                }
            }
            None => {
                debug!(
                    aggregator = %self.name,
                    window,
                    horizon,
                    "Dropping merge for a window outside retention"
                );
            }
        }
    }

    fn horizon(&self, window: u64) -> u64 {
        self.clock.current().map_or(window, |current| current.max(window))
    }

    fn ignore(&self, count: u64, reason: &'static str) {
        self.ignored.fetch_add(count, Ordering::Relaxed);
        debug!(aggregator = %self.name, count, reason, "Ignored update");
    }
}

fn tag<D: DeserializeOwned>(value: Option<&serde_json::Value>, field: &str) -> Result<D> {
    let value = value.ok_or_else(|| {
        AggregatorError::Serialization(format!("snapshot without a {}", field))
    })?;
    Ok(D::deserialize(value)?)
}

/// Type-erased view of an aggregator, used by the registry to drive
/// rotation and snapshot exchange across value domains.
pub trait WindowedAggregator: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn kind(&self) -> AggregationKind;

    fn domain(&self) -> ValueDomain;

    /// Drop windows that fell out of retention
    fn evict_expired(&self) -> usize;

    fn snapshot_json(&self) -> Result<serde_json::Value>;

    /// Validate a JSON snapshot without touching any state
    fn check_json(&self, snapshot: &serde_json::Value) -> Result<()>;

    fn merge_json(&self, snapshot: serde_json::Value) -> Result<()>;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Numeric> WindowedAggregator for Aggregator<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> AggregationKind {
        self.kind
    }

    fn domain(&self) -> ValueDomain {
        T::DOMAIN
    }

    fn evict_expired(&self) -> usize {
        Aggregator::evict_expired(self)
    }

    fn snapshot_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.get_aggregatable())?)
    }

    fn check_json(&self, snapshot: &serde_json::Value) -> Result<()> {
        self.decode_json(snapshot).map(|_| ())
    }

    fn merge_json(&self, snapshot: serde_json::Value) -> Result<()> {
        let snapshot = self.decode_json(&snapshot)?;
        self.aggregate(&snapshot)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
