//! Window policies and lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Retention policy for completed windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    /// Completed windows stay readable up to `window_count` deep
    #[default]
    Rolling,
    /// Only the current window is kept
    Tumbling,
}

impl WindowType {
    /// Number of ring slots an aggregator needs under this policy
    pub fn retention(&self, window_count: usize) -> usize {
        match self {
            WindowType::Rolling => window_count,
            WindowType::Tumbling => 1,
        }
    }
}

/// What advances the current window index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WindowGranularity {
    /// A new window every `window_ms` milliseconds of time-source time
    Time { window_ms: u64 },
    /// A new window every `per_window` accepted values, registry-wide.
    /// Each value in a `process_batch` call counts as one event.
    Events { per_window: u64 },
    /// Windows advance only on explicit `roll()`
    #[default]
    Manual,
}

impl fmt::Display for WindowGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowGranularity::Time { window_ms } => write!(f, "time({}ms)", window_ms),
            WindowGranularity::Events { per_window } => write!(f, "events({})", per_window),
            WindowGranularity::Manual => f.write_str("manual"),
        }
    }
}

/// Registry lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    NotStarted,
    Running,
    Stopped,
}

impl LifecycleState {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LifecycleState::NotStarted,
            1 => LifecycleState::Running,
            _ => LifecycleState::Stopped,
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            LifecycleState::NotStarted => 0,
            LifecycleState::Running => 1,
            LifecycleState::Stopped => 2,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::NotStarted => f.write_str("not started"),
            LifecycleState::Running => f.write_str("running"),
            LifecycleState::Stopped => f.write_str("stopped"),
        }
    }
}
