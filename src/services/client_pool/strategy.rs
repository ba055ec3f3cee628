//! Credential selection strategies
//!
//! This module provides the strategies used to pick a credential for each
//! acquisition, and the shared cursor state for round-robin rotation.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// Selection Strategy
// ============================================================================

/// Strategy for choosing which credential serves the next request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Cycle through credentials in configured order (default)
    #[default]
    RoundRobin,
    /// Uniform random choice, with replacement, independent across calls
    Random,
}

impl SelectionStrategy {
    /// Parse from string (case-insensitive), falling back to round-robin
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "round_robin" | "roundrobin" | "round-robin" => Self::RoundRobin,
            "random" => Self::Random,
            _ => Self::RoundRobin,
        }
    }

    /// Map the boolean "random key selection" switch onto a strategy
    pub fn from_random_flag(random: bool) -> Self {
        if random {
            Self::Random
        } else {
            Self::RoundRobin
        }
    }
}

impl std::fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoundRobin => write!(f, "round_robin"),
            Self::Random => write!(f, "random"),
        }
    }
}

// ============================================================================
// Strategy State
// ============================================================================

/// Rotation cursor for round-robin selection
///
/// The cursor is kept in `[0, total)` so it never grows without bound.
#[derive(Debug, Default)]
pub struct RoundRobinState {
    cursor: AtomicUsize,
}

impl RoundRobinState {
    pub fn new() -> Self {
        Self {
            cursor: AtomicUsize::new(0),
        }
    }

    /// Return the current index and advance the cursor in one atomic step
    pub fn next(&self, total: usize) -> usize {
        if total == 0 {
            return 0;
        }
        let previous = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some((c + 1) % total))
            .unwrap_or_else(|current| current);
        previous % total
    }

    /// Current cursor position
    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Tests
// ============================================================================
