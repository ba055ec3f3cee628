//! Client Pool Implementation
//!
//! This module provides the generic `ClientPool` that selects a credential per
//! acquisition and lazily builds one client per credential.

use super::strategy::{RoundRobinState, SelectionStrategy};
use crate::utils::mask_secret;
use moka::sync::Cache;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use thiserror::Error;

// ============================================================================
// Client Factory
// ============================================================================

/// Builds a client handle for a single credential
///
/// Construction is expected to be local and cheap (no network I/O). The
/// returned client is shared between callers, so it must be usable
/// concurrently.
pub trait ClientFactory: Send + Sync {
    type Client: Send + Sync + 'static;

    fn construct(&self, credential: &str, base_url: &str) -> anyhow::Result<Self::Client>;
}

// ============================================================================
// Errors
// ============================================================================

/// Errors returned by [`ClientPool::acquire`]
#[derive(Error, Debug, Clone)]
pub enum PoolError {
    /// The pool has no credentials to choose from
    #[error("No API credentials configured")]
    NoCredentials,

    /// The factory failed for the selected credential
    #[error("Failed to construct client for credential {credential}: {reason}")]
    ClientConstruction { credential: String, reason: String },
}

impl PoolError {
    /// Whether the error is a configuration problem rather than a per-credential failure
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NoCredentials)
    }
}

// ============================================================================
// Pool Configuration
// ============================================================================

/// Configuration for client pool behavior
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Credential selection strategy
    pub strategy: SelectionStrategy,
    /// Base URL handed to the factory, without trailing slash
    pub base_url: String,
    /// Seed for the random source (random strategy only)
    pub seed: Option<u64>,
}

impl PoolConfig {
    pub fn new(strategy: SelectionStrategy, base_url: impl Into<String>) -> Self {
        Self {
            strategy,
            base_url: normalize_base_url(&base_url.into()),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Strip trailing slashes so path joins never produce `//`
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

// ============================================================================
// Client Pool
// ============================================================================

/// A pool of lazily built clients, one per credential
///
/// Each call to [`acquire`](Self::acquire) selects a credential with the
/// configured strategy and returns the cached client for it, building the
/// client on first use. Clients are never evicted unless explicitly
/// invalidated.
pub struct ClientPool<F: ClientFactory> {
    /// Credentials in configured order
    credentials: Vec<String>,
    /// Pool configuration
    config: PoolConfig,
    /// Builds clients on cache misses
    factory: F,
    /// Cursor for round-robin selection
    rr_state: RoundRobinState,
    /// Random source for random selection
    rng: Mutex<StdRng>,
    /// Constructed clients keyed by credential
    clients: Cache<String, Arc<F::Client>>,
}

impl<F: ClientFactory> ClientPool<F> {
    /// Create a new client pool
    ///
    /// An empty credential list is accepted here; every acquisition on such a
    /// pool fails with [`PoolError::NoCredentials`].
    pub fn new(credentials: Vec<String>, factory: F, config: PoolConfig) -> Self {
        if credentials.is_empty() {
            tracing::warn!("Client pool created without credentials");
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            credentials,
            config,
            factory,
            rr_state: RoundRobinState::new(),
            rng: Mutex::new(rng),
            clients: Cache::builder().build(),
        }
    }

    /// Select a credential and return its (possibly new) client
    pub fn acquire(&self) -> Result<Arc<F::Client>, PoolError> {
        let credential = self.select()?;

        self.clients
            .try_get_with(credential.to_string(), || {
                tracing::debug!(
                    credential = %mask_secret(credential),
                    base_url = %self.config.base_url,
                    "Constructing client for credential"
                );
                self.factory
                    .construct(credential, &self.config.base_url)
                    .map(Arc::new)
            })
            .map_err(|e| {
                tracing::warn!(
                    credential = %mask_secret(credential),
                    error = %e,
                    "Client construction failed"
                );
                PoolError::ClientConstruction {
                    credential: mask_secret(credential),
                    reason: format!("{:#}", e),
                }
            })
    }

    /// Pick the credential for the next acquisition
    fn select(&self) -> Result<&str, PoolError> {
        if self.credentials.is_empty() {
            return Err(PoolError::NoCredentials);
        }

        let idx = match self.config.strategy {
            SelectionStrategy::RoundRobin => self.rr_state.next(self.credentials.len()),
            SelectionStrategy::Random => {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                rng.gen_range(0..self.credentials.len())
            }
        };

        Ok(&self.credentials[idx])
    }

    /// Drop the cached client for a credential so the next selection rebuilds it
    pub fn invalidate(&self, credential: &str) {
        self.clients.invalidate(credential);
        tracing::info!(credential = %mask_secret(credential), "Invalidated cached client");
    }

    /// Drop every cached client
    pub fn invalidate_all(&self) {
        self.clients.invalidate_all();
        self.clients.run_pending_tasks();
    }

    /// Whether a client has been built for the credential
    pub fn is_cached(&self, credential: &str) -> bool {
        self.clients.contains_key(credential)
    }

    pub fn credentials(&self) -> &[String] {
        &self.credentials
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.config.strategy
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        self.clients.run_pending_tasks();
        PoolStats {
            total: self.credentials.len(),
            cached: self.clients.entry_count() as usize,
            strategy: self.config.strategy,
        }
    }
}

impl<F: ClientFactory> std::fmt::Debug for ClientPool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientPool")
            .field("credentials", &self.credentials.len())
            .field("strategy", &self.config.strategy)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

// ============================================================================
// Pool Statistics
// ============================================================================

/// Statistics about a client pool
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    /// Number of configured credentials
    pub total: usize,
    /// Number of constructed clients currently cached
    pub cached: usize,
    /// Selection strategy
    pub strategy: SelectionStrategy,
}

impl PoolStats {
    /// At least one credential is configured
    pub fn is_ready(&self) -> bool {
        self.total > 0
    }
}

// ============================================================================
// Tests
// ============================================================================
