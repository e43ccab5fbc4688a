//! Windowed, mergeable streaming aggregators
//!
//! This crate maintains running statistics (min, max, sum, count, average)
//! over a bounded ring of time-, event- or manually-rotated windows, and
//! merges partial results computed by independent workers into one correct
//! aggregate regardless of merge order.
//!
//! ```rust
//! use stream_aggregator::{AggregationKind, Aggregators, Statistic, WindowType};
//!
//! let registry = Aggregators::new(2, WindowType::Rolling).unwrap();
//! let min = registry.create_simple::<f64>("a", AggregationKind::Min).unwrap();
//! registry.start(1).unwrap();
//!
//! min.process(1.0);
//! min.process(2.0);
//! assert_eq!(min.get(), Some(Statistic::Value(1.0)));
//!
//! let snapshot = min.get_aggregatable();
//! assert_eq!(snapshot.type_name(), "min:f64");
//!
//! registry.stop().unwrap();
//! ```

pub mod aggregation;
pub mod config;
pub mod error;
pub mod registry;
pub mod window;

// Re-export commonly used types
pub use aggregation::{
    Accumulator, Aggregatable, AggregationKind, Aggregator, AggregatorData, Numeric, Statistic,
    ValueDomain, WindowedAggregator,
};

pub use config::AggregatorsConfig;

pub use error::{AggregatorError, Result};

pub use registry::Aggregators;

pub use window::{
    LifecycleState, ManualTimeSource, SystemTimeSource, TimeSource, WindowClock,
    WindowGranularity, WindowRing, WindowType,
};
