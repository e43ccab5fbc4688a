//! Fixed-capacity window ring
//!
//! Window `i` lives in slot `i % capacity`. A slot is reclaimed by
//! overwriting it when a newer window needs it, so at most `capacity`
//! windows are ever alive.

use crate::aggregation::{AggregationKind, AggregatorData, Numeric};
use tracing::trace;

#[derive(Debug)]
pub struct WindowRing<T> {
    slots: Vec<Option<AggregatorData<T>>>,
}

impl<T: Numeric> WindowRing<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether `window` is retained when `horizon` is the newest window
    pub fn is_retained(&self, window: u64, horizon: u64) -> bool {
        window <= horizon && horizon - window < self.capacity() as u64
    }

    /// Data for `window`, created on first use.
    ///
    /// Returns `None` for windows outside retention or whose slot already
    /// belongs to a newer window.
    pub fn entry(
        &mut self,
        window: u64,
        horizon: u64,
        kind: AggregationKind,
    ) -> Option<&mut AggregatorData<T>> {
        if !self.is_retained(window, horizon) {
            return None;
        }

        let index = self.slot_index(window);
        match self.slots[index].as_ref().map(|data| data.window()) {
            Some(owner) if owner > window => return None,
            Some(owner) if owner < window => {
                trace!(evicted = owner, window, "Reclaiming window slot");
                self.slots[index] = None;
            }
            _ => {}
        }

        Some(self.slots[index].get_or_insert_with(|| AggregatorData::new(window, kind)))
    }

    /// Data for `window` if it is retained and has been opened
    pub fn get(&self, window: u64, horizon: u64) -> Option<&AggregatorData<T>> {
        if !self.is_retained(window, horizon) {
            return None;
        }

        self.slots[self.slot_index(window)]
            .as_ref()
            .filter(|data| data.window() == window)
    }

    /// Retained windows, oldest first
    pub fn retained(&self, horizon: u64) -> Vec<&AggregatorData<T>> {
        let mut live: Vec<&AggregatorData<T>> = self
            .slots
            .iter()
            .flatten()
            .filter(|data| self.is_retained(data.window(), horizon))
            .collect();
        live.sort_by_key(|data| data.window());
        live
    }

    /// Drop every window that fell out of retention. Returns how many were dropped.
    pub fn evict_expired(&mut self, horizon: u64) -> usize {
        let capacity = self.capacity() as u64;
        let mut evicted = 0;
        for slot in self.slots.iter_mut() {
            let expired = matches!(
                slot,
                Some(data) if data.window() > horizon || horizon - data.window() >= capacity
            );
            if expired {
                *slot = None;
                evicted += 1;
            }
        }
        evicted
    }

    /// Number of windows currently holding data
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn slot_index(&self, window: u64) -> usize {
        (window % self.capacity() as u64) as usize
    }
}
