//! Windowing for the aggregation engine
//!
//! A window is a slice of the aggregation timeline identified by a `u64`
//! index. Exactly one window is current at any instant. The
//! [`WindowClock`] decides which one, based on the configured
//! [`WindowGranularity`]:
//!
//! ```text
//! Time { window_ms: 5 }   0----5----10---15---20
//!                         [ 0 ][ 1 ][ 2 ][ 3 ]
//! Events { per_window: 3} e e e | e e e | e e e
//!                         [ 0  ]  [ 1  ]  [ 2  ]
//! Manual                  roll() ---> index + 1
//! ```
//!
//! Every aggregator keeps its per-window state in a [`WindowRing`] of fixed
//! capacity. Under [`WindowType::Rolling`] the last `window_count` windows
//! stay readable; under [`WindowType::Tumbling`] only the current one does.
//!
//! ```text
//! window_count = 3, current = 7
//! slots:   [ w6 ][ w7 ][ w5 ]     (slot = index % 3)
//! roll ->  current = 8, w5 evicted, w8 claims its slot on first use
//! ```

pub mod clock;
pub mod ring;
pub mod types;

pub use clock::{ManualTimeSource, SystemTimeSource, TimeSource, WindowClock};
pub use ring::WindowRing;
pub use types::{LifecycleState, WindowGranularity, WindowType};
