//! Gemini-backed web search tool
//!
//! Exposes the `gemini_search` tool: a query is sent to Gemini with Google
//! Search grounding enabled, and the model's summary is returned as plain text
//! for the host to inject into the conversation.

use crate::config::GeminiSearchConfig;
use crate::schemas::gemini::GeminiRequest;
use crate::services::client_pool::{ClientPool, PoolConfig, PoolError, PoolStats};
use crate::services::gemini::{GeminiClientFactory, GeminiClientOptions, GeminiServiceError};
use crate::utils::truncate_str;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Name under which the tool is registered with the host
pub const TOOL_NAME: &str = "gemini_search";

const TOOL_DESCRIPTION: &str = "Web search tool (gemini_search). Whenever you need real-time or \
     up-to-date information from the internet, you must call this tool to search. Returns a \
     summary of key points together with the cited sources.";

const QUERY_DESCRIPTION: &str = "A brief description of what the user wants to look up";

/// Returned when no API key is configured
pub const MSG_MISSING_CREDENTIALS: &str =
    "Please configure at least one valid Gemini API key in the tool settings.";

/// Returned when the response carried no usable text
pub const MSG_NO_RESULTS: &str = "The search did not return any usable text.";

const QUERY_LOG_CHARS: usize = 80;

// ============================================================================
// Errors
// ============================================================================

/// Errors from a single search invocation
#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Gemini(#[from] GeminiServiceError),
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Tool metadata the host uses for registration
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Parameters schema (JSON Schema format)
    pub parameters: serde_json::Value,
}

// ============================================================================
// Search Options
// ============================================================================

/// Per-request generation settings
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Model name
    pub model: String,
    /// Generation temperature
    pub temperature: f32,
}

impl From<&GeminiSearchConfig> for SearchOptions {
    fn from(config: &GeminiSearchConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

// ============================================================================
// Search Tool
// ============================================================================

/// The `gemini_search` tool
#[derive(Debug, Clone)]
pub struct GeminiSearchTool {
    /// Rotating pool of per-key clients
    pool: Arc<ClientPool<GeminiClientFactory>>,
    options: SearchOptions,
}

impl GeminiSearchTool {
    pub fn new(pool: Arc<ClientPool<GeminiClientFactory>>, options: SearchOptions) -> Self {
        Self { pool, options }
    }

    /// Build the tool and its client pool from configuration
    pub fn from_config(config: &GeminiSearchConfig) -> Self {
        let factory = GeminiClientFactory::new(
            GeminiClientOptions::default()
                .with_api_version(config.api_version.clone())
                .with_timeout(config.timeout_seconds),
        );
        let pool = ClientPool::new(
            config.api_keys.clone(),
            factory,
            PoolConfig::new(config.strategy, config.base_url.clone()),
        );

        tracing::info!(
            key_count = pool.len(),
            strategy = %pool.strategy(),
            base_url = %pool.base_url(),
            model = %config.model,
            "Initialized Gemini search tool with client pool"
        );

        Self::new(Arc::new(pool), SearchOptions::from(config))
    }

    /// Tool metadata for registration
    pub fn definition() -> ToolDefinition {
        ToolDefinition {
            name: TOOL_NAME.to_string(),
            description: TOOL_DESCRIPTION.to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": QUERY_DESCRIPTION
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// Prompt asking the model to search and aggregate
    pub fn build_prompt(query: &str) -> String {
        format!(
            "You are a search aggregation assistant. Use the Google Search tool to research \
             the question below and produce:\n\
             1) a bullet-point summary of the key points;\n\
             2) a list of reference sources (title + URL).\n\
             Avoid lengthy descriptions; give conclusions and reliable sources directly.\n\
             Question: {}",
            query
        )
    }

    /// Request body for a query
    pub fn build_request(&self, query: &str) -> GeminiRequest {
        GeminiRequest::grounded_search(Self::build_prompt(query), self.options.temperature)
    }

    /// Run a search and return the trimmed answer, `None` if nothing usable came back
    pub async fn search(&self, query: &str) -> Result<Option<String>, SearchError> {
        let client = self.pool.acquire()?;
        let request = self.build_request(query);

        tracing::debug!(
            model = %self.options.model,
            query = %truncate_str(query, QUERY_LOG_CHARS),
            "Running Gemini search"
        );

        let response = client
            .generate_content(&self.options.model, &request)
            .await?;

        let text = response
            .resolve_text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        match text {
            Some(_) => tracing::debug!(
                sources = response.grounding_sources().len(),
                model_version = ?response.model_version,
                "Gemini search completed"
            ),
            None => tracing::warn!(shape = ?response.shape(), "Gemini search returned no text"),
        }

        Ok(text)
    }

    /// Run a search and render every outcome as conversation text
    pub async fn invoke(&self, query: &str) -> String {
        match self.search(query).await {
            Ok(Some(text)) => text,
            Ok(None) => MSG_NO_RESULTS.to_string(),
            Err(SearchError::Pool(e)) if e.is_configuration() => {
                tracing::error!(error = %e, "Search tool is not configured");
                MSG_MISSING_CREDENTIALS.to_string()
            }
            Err(SearchError::Pool(e)) => {
                tracing::error!(error = %e, "Failed to initialize Gemini client");
                format!("Failed to initialize the Gemini client: {}", e)
            }
            Err(SearchError::Gemini(e)) => {
                tracing::error!(error = %e, "Gemini search call failed");
                format!("Search failed: {}", e)
            }
        }
    }

    /// Statistics of the underlying client pool
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn model(&self) -> &str {
        &self.options.model
    }
}

// ============================================================================
// Tests
// ============================================================================
