//! Transportable aggregator snapshots

use super::operation::{Accumulator, AggregationKind, Statistic};
use super::value::{Numeric, ValueDomain};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Immutable snapshot of an aggregator's accumulated state
///
/// Snapshots are plain values: they stay valid after the producing registry
/// is stopped and can be sent to other threads or processes. The JSON form
/// looks like
///
/// ```json
/// {"name":"latency","domain":"f64","updates":2,"payload":{"type":"min","min":1.0}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregatable<T> {
    name: String,
    domain: ValueDomain,
    updates: u64,
    payload: Accumulator<T>,
}

impl<T: Numeric> Aggregatable<T> {
    pub fn new(name: impl Into<String>, updates: u64, payload: Accumulator<T>) -> Self {
        Self {
            name: name.into(),
            domain: T::DOMAIN,
            updates,
            payload,
        }
    }

    /// Name of the aggregator that produced this snapshot
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical type tag, e.g. `min:f64`
    pub fn type_name(&self) -> String {
        type_name(self.kind(), self.domain)
    }

    pub fn kind(&self) -> AggregationKind {
        self.payload.kind()
    }

    pub fn domain(&self) -> ValueDomain {
        self.domain
    }

    /// Number of values folded into the snapshotted state
    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.updates == 0
    }

    pub fn payload(&self) -> &Accumulator<T> {
        &self.payload
    }

    /// Statistic the snapshot represents, `None` when empty
    pub fn value(&self) -> Option<Statistic<T>> {
        if self.is_empty() {
            return None;
        }
        self.payload.statistic()
    }

    pub fn min(&self) -> Option<T> {
        match self.payload {
            Accumulator::Min { min } => min,
            _ => None,
        }
    }

    pub fn max(&self) -> Option<T> {
        match self.payload {
            Accumulator::Max { max } => max,
            _ => None,
        }
    }

    pub fn sum(&self) -> Option<T> {
        match self.payload {
            Accumulator::Sum { sum } | Accumulator::Average { sum, .. } => Some(sum),
            _ => None,
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self.payload {
            Accumulator::Count { count } | Accumulator::Average { count, .. } => Some(count),
            _ => None,
        }
    }

    pub fn mean(&self) -> Option<f64> {
        match self.payload {
            Accumulator::Average { .. } => self.payload.statistic().and_then(|s| s.mean()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

pub(crate) fn type_name(kind: AggregationKind, domain: ValueDomain) -> String {
    format!("{}:{}", kind, domain)
}
