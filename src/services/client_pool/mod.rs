//! Client Pool Module
//!
//! Rotates requests across several API credentials and caches one client per
//! credential, so repeated tool invocations share authenticated clients
//! instead of rebuilding them.
//!
//! # Features
//! - Round-robin or random credential selection
//! - Lazy, per-credential client construction with concurrent misses coalesced
//! - Construction failures are reported, never cached
//!
//! # Example
//! ```ignore
//! use client_pool::{ClientPool, PoolConfig, SelectionStrategy};
//!
//! let pool = ClientPool::new(
//!     vec!["key1".into(), "key2".into()],
//!     factory,
//!     PoolConfig::new(SelectionStrategy::RoundRobin, "https://generativelanguage.googleapis.com"),
//! );
//!
//! let client = pool.acquire()?;
//! ```

mod pool;
mod strategy;

pub use pool::{normalize_base_url, ClientFactory, ClientPool, PoolConfig, PoolError, PoolStats};
pub use strategy::{RoundRobinState, SelectionStrategy};
