use super::operation::{Accumulator, AggregationKind, Statistic};
use super::value::Numeric;
use crate::error::Result;

/// Accumulation state of one aggregator for one window
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorData<T> {
    window: u64,
    updates: u64,
    accumulator: Accumulator<T>,
}

impl<T: Numeric> AggregatorData<T> {
    pub fn new(window: u64, kind: AggregationKind) -> Self {
        Self {
            window,
            updates: 0,
            accumulator: Accumulator::identity(kind),
        }
    }

    /// Window index this data belongs to
    pub fn window(&self) -> u64 {
        self.window
    }

    /// Number of values folded or merged in
    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn accumulator(&self) -> &Accumulator<T> {
        &self.accumulator
    }

    pub fn process(&mut self, value: T) -> bool {
        let folded = self.accumulator.fold(value);
        if folded {
            self.updates = self.updates.saturating_add(1);
        }
        folded
    }

    pub fn merge(&mut self, other: &Accumulator<T>, updates: u64) -> Result<()> {
        self.accumulator.merge(other)?;
        self.updates = self.updates.saturating_add(updates);
        Ok(())
    }

    /// `None` until something has been folded into this window
    pub fn value(&self) -> Option<Statistic<T>> {
        if self.updates == 0 {
            return None;
        }
        self.accumulator.statistic()
    }
}
