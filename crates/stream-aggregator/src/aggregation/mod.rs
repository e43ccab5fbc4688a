//! Windowed aggregators and their merge algebra
//!
//! Every aggregator supports:
//!
//! - **Incremental updates**: feed values one at a time, or a batch at once
//! - **Windowing**: state is kept per window and rotated by the registry clock
//! - **Snapshot merging**: combine results from independent workers
//! - **Snapshot serialization**: ship [`Aggregatable`] values as JSON
//!
//! # Available Operations
//!
//! | kind      | fold               | merge              | identity |
//! |-----------|--------------------|--------------------|----------|
//! | `Min`     | min(acc, v)        | min(a, b)          | absent   |
//! | `Max`     | max(acc, v)        | max(a, b)          | absent   |
//! | `Sum`     | acc + v            | a + b              | 0        |
//! | `Count`   | acc + 1            | a + b              | 0        |
//! | `Average` | (sum + v, n + 1)   | component-wise sum | (0, 0)   |
//!
//! All merges are commutative and associative.
//!
//! # Distributed Processing
//!
//! ```rust
//! use stream_aggregator::{AggregationKind, Aggregators, Statistic, WindowType};
//!
//! // Two workers, each with its own registry
//! let worker_a = Aggregators::new(2, WindowType::Rolling).unwrap();
//! let min_a = worker_a.create_simple::<f64>("latency", AggregationKind::Min).unwrap();
//! worker_a.start(1).unwrap();
//! min_a.process(3.0);
//!
//! let worker_b = Aggregators::new(2, WindowType::Rolling).unwrap();
//! let min_b = worker_b.create_simple::<f64>("latency", AggregationKind::Min).unwrap();
//! worker_b.start(1).unwrap();
//! min_b.process(1.0);
//! min_b.process(2.0);
//!
//! // Merge results
//! min_a.aggregate(&min_b.get_aggregatable()).unwrap();
//! assert_eq!(min_a.get(), Some(Statistic::Value(1.0)));
//! ```

mod aggregatable;
mod aggregator;
mod data;
mod operation;
mod value;

pub use aggregatable::Aggregatable;
pub use aggregator::{Aggregator, WindowedAggregator};
pub use data::AggregatorData;
pub use operation::{Accumulator, AggregationKind, Statistic};
pub use value::{Numeric, ValueDomain};
