//! Operation catalog
//!
//! Each statistic is a variant of [`Accumulator`] carrying its own `fold`
//! and `merge` rules. Every merge is commutative and associative, so partial
//! accumulators can be combined in any order.

use super::value::Numeric;
use crate::error::{AggregatorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistic computed by an aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Min,
    Max,
    Sum,
    Count,
    Average,
}

impl AggregationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationKind::Min => "min",
            AggregationKind::Max => "max",
            AggregationKind::Sum => "sum",
            AggregationKind::Count => "count",
            AggregationKind::Average => "average",
        }
    }

    /// All supported kinds
    pub fn all() -> [AggregationKind; 5] {
        [
            AggregationKind::Min,
            AggregationKind::Max,
            AggregationKind::Sum,
            AggregationKind::Count,
            AggregationKind::Average,
        ]
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation-specific accumulation state
///
/// `Min`/`Max` start absent, `Sum`/`Count`/`Average` start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Accumulator<T> {
    Min { min: Option<T> },
    Max { max: Option<T> },
    Sum { sum: T },
    Count { count: u64 },
    Average { sum: T, count: u64 },
}

impl<T: Numeric> Accumulator<T> {
    /// Identity element of `kind`
    pub fn identity(kind: AggregationKind) -> Self {
        match kind {
            AggregationKind::Min => Accumulator::Min { min: None },
            AggregationKind::Max => Accumulator::Max { max: None },
            AggregationKind::Sum => Accumulator::Sum { sum: T::zero() },
            AggregationKind::Count => Accumulator::Count { count: 0 },
            AggregationKind::Average => Accumulator::Average {
                sum: T::zero(),
                count: 0,
            },
        }
    }

    pub fn kind(&self) -> AggregationKind {
        match self {
            Accumulator::Min { .. } => AggregationKind::Min,
            Accumulator::Max { .. } => AggregationKind::Max,
            Accumulator::Sum { .. } => AggregationKind::Sum,
            Accumulator::Count { .. } => AggregationKind::Count,
            Accumulator::Average { .. } => AggregationKind::Average,
        }
    }

    /// Fold one value in. Returns `false` when the value was ignored.
    ///
    /// NaN is ignored by every operation except `Count`, which counts
    /// observations rather than inspecting them.
    pub fn fold(&mut self, value: T) -> bool {
        if value.is_nan() && !matches!(self, Accumulator::Count { .. }) {
            return false;
        }

        match self {
            Accumulator::Min { min } => {
                *min = Some(match *min {
                    Some(current) if current <= value => current,
                    _ => value,
                });
            }
            Accumulator::Max { max } => {
                *max = Some(match *max {
                    Some(current) if current >= value => current,
                    _ => value,
                });
            }
            Accumulator::Sum { sum } => {
                *sum = sum.accumulate(value);
            }
            Accumulator::Count { count } => {
                *count = count.saturating_add(1);
            }
            Accumulator::Average { sum, count } => {
                *sum = sum.accumulate(value);
                *count = count.saturating_add(1);
            }
        }
        true
    }

    /// Merge another accumulator of the same kind into this one
    pub fn merge(&mut self, other: &Accumulator<T>) -> Result<()> {
        match (self, other) {
            (Accumulator::Min { min }, Accumulator::Min { min: theirs }) => {
                *min = merge_optional(*min, *theirs, |a, b| if b < a { b } else { a });
            }
            (Accumulator::Max { max }, Accumulator::Max { max: theirs }) => {
                *max = merge_optional(*max, *theirs, |a, b| if b > a { b } else { a });
            }
            (Accumulator::Sum { sum }, Accumulator::Sum { sum: theirs }) => {
                *sum = sum.accumulate(*theirs);
            }
            (Accumulator::Count { count }, Accumulator::Count { count: theirs }) => {
                *count = count.saturating_add(*theirs);
            }
            (
                Accumulator::Average { sum, count },
                Accumulator::Average {
                    sum: their_sum,
                    count: their_count,
                },
            ) => {
                *sum = sum.accumulate(*their_sum);
                *count = count.saturating_add(*their_count);
            }
            (this, other) => {
                return Err(AggregatorError::TypeMismatch {
                    expected: this.kind().to_string(),
                    actual: other.kind().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Current statistic, `None` when the operation has no defined value yet
    pub fn statistic(&self) -> Option<Statistic<T>> {
        match *self {
            Accumulator::Min { min } => min.map(Statistic::Value),
            Accumulator::Max { max } => max.map(Statistic::Value),
            Accumulator::Sum { sum } => Some(Statistic::Value(sum)),
            Accumulator::Count { count } => Some(Statistic::Count(count)),
            Accumulator::Average { sum, count } => {
                if count == 0 {
                    None
                } else {
                    Some(Statistic::Mean(sum.to_f64() / count as f64))
                }
            }
        }
    }
}

fn merge_optional<T: Copy>(a: Option<T>, b: Option<T>, pick: impl Fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Value read back from an aggregator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic<T> {
    /// Min, max or sum in the aggregator's own value domain
    Value(T),
    /// Number of observations
    Count(u64),
    /// Arithmetic mean
    Mean(f64),
}

impl<T: Numeric> Statistic<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            Statistic::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            Statistic::Count(c) => Some(*c),
            _ => None,
        }
    }

    pub fn mean(&self) -> Option<f64> {
        match self {
            Statistic::Mean(m) => Some(*m),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Statistic::Value(v) => v.to_f64(),
            Statistic::Count(c) => *c as f64,
            Statistic::Mean(m) => *m,
        }
    }
}
