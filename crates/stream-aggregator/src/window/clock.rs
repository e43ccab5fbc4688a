//! Window clock
//!
//! The clock owns the registry lifecycle and publishes the current window
//! index through a single atomic, so every aggregator sharing the clock
//! observes a rotation at the same instant. The index never decreases.

use super::types::{LifecycleState, WindowGranularity};
use crate::error::{AggregatorError, Result};
use chrono::Utc;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Source of "now" for time-based windows, in epoch milliseconds
pub trait TimeSource: Send + Sync + Debug {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Time source that only moves when told to
///
/// Useful for replaying recorded streams and for tests.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: AtomicI64,
}

impl ManualTimeSource {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Shared window clock of one registry
#[derive(Debug)]
pub struct WindowClock {
    granularity: WindowGranularity,
    time_source: Arc<dyn TimeSource>,
    state: AtomicU8,
    initial: AtomicU64,
    origin_ms: AtomicI64,
    current: AtomicU64,
    events: AtomicU64,
    transition: Mutex<()>,
}

impl WindowClock {
    pub fn new(granularity: WindowGranularity, time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            granularity,
            time_source,
            state: AtomicU8::new(LifecycleState::NotStarted.as_u8()),
            initial: AtomicU64::new(0),
            origin_ms: AtomicI64::new(0),
            current: AtomicU64::new(0),
            events: AtomicU64::new(0),
            transition: Mutex::new(()),
        }
    }

    pub fn granularity(&self) -> WindowGranularity {
        self.granularity
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Start counting windows from `initial`.
    ///
    /// Returns the state found when the clock was not in `NotStarted`.
    pub(crate) fn start(&self, initial: u64) -> std::result::Result<(), LifecycleState> {
        let _guard = self.transition.lock();
        let state = self.state();
        if state != LifecycleState::NotStarted {
            return Err(state);
        }

        self.initial.store(initial, Ordering::Relaxed);
        self.origin_ms
            .store(self.time_source.now_millis(), Ordering::Relaxed);
        self.events.store(0, Ordering::Relaxed);
        self.current.store(initial, Ordering::Relaxed);
        self.state
            .store(LifecycleState::Running.as_u8(), Ordering::Release);

        debug!(initial, granularity = %self.granularity, "Window clock started");
        Ok(())
    }

    /// Freeze the index at its last value.
    ///
    /// Returns the state found when the clock was not `Running`.
    pub(crate) fn stop(&self) -> std::result::Result<u64, LifecycleState> {
        let _guard = self.transition.lock();
        let state = self.state();
        if state != LifecycleState::Running {
            return Err(state);
        }

        let last = self.observe();
        self.state
            .store(LifecycleState::Stopped.as_u8(), Ordering::Release);

        debug!(last_window = last, "Window clock stopped");
        Ok(last)
    }

    /// Current window index, `None` before `start()`
    pub fn current(&self) -> Option<u64> {
        match self.state() {
            LifecycleState::NotStarted => None,
            LifecycleState::Running => Some(self.observe()),
            LifecycleState::Stopped => Some(self.current.load(Ordering::Acquire)),
        }
    }

    /// Window a new event belongs to, `None` unless running.
    ///
    /// Under event granularity every call consumes one slot of the event
    /// counter, so each event lands in exactly one window.
    pub(crate) fn on_event(&self) -> Option<u64> {
        if !self.is_running() {
            return None;
        }

        match self.granularity {
            WindowGranularity::Events { per_window } => {
                let seen = self.events.fetch_add(1, Ordering::AcqRel);
                let window = self
                    .initial
                    .load(Ordering::Relaxed)
                    .saturating_add(seen / per_window.max(1));
                self.publish(window);
                Some(window)
            }
            _ => Some(self.observe()),
        }
    }

    /// Windows a batch of `count` new events belongs to, as `(window, events)`
    /// runs in order, `None` unless running.
    ///
    /// Under event granularity the batch consumes `count` slots of the event
    /// counter and is split wherever it crosses a window boundary. Otherwise
    /// the whole batch lands in the current window.
    pub(crate) fn on_events(&self, count: u64) -> Option<Vec<(u64, u64)>> {
        if !self.is_running() {
            return None;
        }
        if count == 0 {
            return Some(Vec::new());
        }

        let WindowGranularity::Events { per_window } = self.granularity else {
            return Some(vec![(self.observe(), count)]);
        };

        let per_window = per_window.max(1);
        let initial = self.initial.load(Ordering::Relaxed);
        let first = self.events.fetch_add(count, Ordering::AcqRel);
        let end = first.saturating_add(count);

        let mut runs = Vec::new();
        let mut seen = first;
        while seen < end {
            let offset = seen / per_window;
            let boundary = offset.saturating_add(1).saturating_mul(per_window);
            let taken = boundary.min(end) - seen;
            runs.push((initial.saturating_add(offset), taken));
            seen += taken;
        }

        if let Some(&(last, _)) = runs.last() {
            self.publish(last);
        }
        Some(runs)
    }

    /// Advance the clock by one window, returning the new index.
    ///
    /// Fails when the clock is not `Running` or already sits at the last
    /// representable window.
    pub(crate) fn advance(&self) -> Result<u64> {
        let _guard = self.transition.lock();
        let state = self.state();
        if state != LifecycleState::Running {
            return Err(AggregatorError::illegal_state("roll", state));
        }

        self.current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |index| {
                index.checked_add(1)
            })
            .map(|previous| previous + 1)
            .map_err(|_| AggregatorError::illegal_state("roll", "at the last window index"))
    }

    fn observe(&self) -> u64 {
        let initial = self.initial.load(Ordering::Relaxed);
        match self.granularity {
            WindowGranularity::Time { window_ms } => {
                let elapsed = self
                    .time_source
                    .now_millis()
                    .saturating_sub(self.origin_ms.load(Ordering::Relaxed))
                    .max(0) as u64;
                self.publish(initial.saturating_add(elapsed / window_ms.max(1)))
            }
            WindowGranularity::Events { per_window } => {
                let seen = self.events.load(Ordering::Acquire);
                self.publish(initial.saturating_add(seen / per_window.max(1)))
            }
            WindowGranularity::Manual => self.current.load(Ordering::Acquire),
        }
    }

    fn publish(&self, window: u64) -> u64 {
        let previous = self.current.fetch_max(window, Ordering::AcqRel);
        previous.max(window)
    }
}
