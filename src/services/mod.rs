//! Services module
//!
//! Contains the credential-rotating client pool and the Gemini integrations
//! built on it.

pub mod client_pool;
pub mod gemini;
pub mod search;

pub use client_pool::{
    ClientFactory, ClientPool, PoolConfig, PoolError, PoolStats, SelectionStrategy,
};
pub use gemini::{GeminiClient, GeminiClientFactory, GeminiClientOptions, GeminiServiceError};
pub use search::{GeminiSearchTool, SearchError, SearchOptions, ToolDefinition, TOOL_NAME};
