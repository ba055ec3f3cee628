//! Gemini service for Google Gemini API interactions
//!
//! This module provides the per-credential client handle used by the search
//! tool, and the factory that lets the client pool build one lazily for each
//! configured API key.

use crate::schemas::gemini::{GeminiError, GeminiRequest, GeminiResponse};
use crate::services::client_pool::ClientFactory;
use crate::utils::mask_secret;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

pub const GEMINI_API_VERSION: &str = "v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building a client or calling the Gemini API
#[derive(Error, Debug)]
pub enum GeminiServiceError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {code} - {message}")]
    ApiError { code: i32, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

// ============================================================================
// Client Options
// ============================================================================

/// Settings shared by every client the factory builds
#[derive(Debug, Clone)]
pub struct GeminiClientOptions {
    /// REST API version segment (e.g. "v1beta")
    pub api_version: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for GeminiClientOptions {
    fn default() -> Self {
        Self {
            api_version: GEMINI_API_VERSION.to_string(),
            timeout_seconds: 120,
        }
    }
}

impl GeminiClientOptions {
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

// ============================================================================
// Gemini Client
// ============================================================================

/// An authenticated Gemini client bound to a single API key
///
/// Cheap to share: calls take `&self` and the inner HTTP client pools
/// connections.
pub struct GeminiClient {
    /// HTTP client
    client: Client,

    /// Headers sent with every request (carries the API key)
    headers: HeaderMap,

    /// Endpoint root, e.g. `https://generativelanguage.googleapis.com/v1beta`
    endpoint: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client for one API key
    pub fn new(
        api_key: &str,
        base_url: &str,
        options: &GeminiClientOptions,
    ) -> Result<Self, GeminiServiceError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(GeminiServiceError::InvalidApiKey(
                "API key is empty".to_string(),
            ));
        }
        let mut header = HeaderValue::from_str(api_key).map_err(|_| {
            GeminiServiceError::InvalidApiKey(format!(
                "{} contains characters not allowed in a header",
                mask_secret(api_key)
            ))
        })?;
        header.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, header);

        let base_url = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(base_url).map_err(|e| GeminiServiceError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GeminiServiceError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()?;

        let version = options.api_version.trim_matches('/');
        let endpoint = if version.is_empty() {
            base_url.to_string()
        } else {
            format!("{}/{}", base_url, version)
        };

        Ok(Self {
            client,
            headers,
            endpoint,
        })
    }

    /// Endpoint root used for requests
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Generate content (non-streaming)
    ///
    /// # Arguments
    /// * `model` - Model name (e.g., "gemini-2.0-flash")
    /// * `request` - The request body
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<GeminiResponse, GeminiServiceError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, model);

        tracing::debug!(
            model = %model,
            url = %url,
            "Calling Gemini generateContent API"
        );

        let resp = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();

            if let Ok(gemini_error) = serde_json::from_str::<GeminiError>(&error_text) {
                return Err(GeminiServiceError::ApiError {
                    code: gemini_error.error.code,
                    message: gemini_error.error.message,
                });
            }

            return Err(GeminiServiceError::ApiError {
                code: status.as_u16() as i32,
                message: error_text,
            });
        }

        let response_text = resp.text().await?;

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(error = %e, body = %response_text, "Failed to parse Gemini response");
            GeminiServiceError::ParseError(e.to_string())
        })
    }
}

// ============================================================================
// Client Factory
// ============================================================================

/// Builds [`GeminiClient`]s for the client pool
#[derive(Debug, Clone, Default)]
pub struct GeminiClientFactory {
    options: GeminiClientOptions,
}

impl GeminiClientFactory {
    pub fn new(options: GeminiClientOptions) -> Self {
        Self { options }
    }
}

impl ClientFactory for GeminiClientFactory {
    type Client = GeminiClient;

    fn construct(&self, credential: &str, base_url: &str) -> anyhow::Result<GeminiClient> {
        Ok(GeminiClient::new(credential, base_url, &self.options)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GeminiRequest {
        GeminiRequest::grounded_search("latest rust release", 0.2)
    }

    #[test]
    fn test_client_endpoint() {
        let client =
            GeminiClient::new("key", "https://custom.api.com/", &GeminiClientOptions::default())
                .unwrap();
        assert_eq!(client.endpoint(), "https://custom.api.com/v1beta");

        let client = GeminiClient::new(
            "key",
            GEMINI_API_BASE,
            &GeminiClientOptions::default().with_api_version("v1"),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1"
        );
    }

    #[test]
    fn test_client_rejects_blank_key() {
        let err = GeminiClient::new("  ", GEMINI_API_BASE, &GeminiClientOptions::default())
            .unwrap_err();
        assert!(matches!(err, GeminiServiceError::InvalidApiKey(_)));
    }

    #[test]
    fn test_client_rejects_key_with_control_characters() {
        let err = GeminiClient::new(
            "abc\ndef-secret",
            GEMINI_API_BASE,
            &GeminiClientOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GeminiServiceError::InvalidApiKey(_)));
        assert!(!err.to_string().contains("abc\ndef-secret"));
    }

    #[test]
    fn test_client_rejects_bad_base_url() {
        let err = GeminiClient::new("key", "not a url", &GeminiClientOptions::default())
            .unwrap_err();
        assert!(matches!(err, GeminiServiceError::InvalidBaseUrl { .. }));

        let err = GeminiClient::new("key", "ftp://example.com", &GeminiClientOptions::default())
            .unwrap_err();
        assert!(matches!(err, GeminiServiceError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_factory_wraps_construction_errors() {
        let factory = GeminiClientFactory::default();
        let err = factory.construct("", GEMINI_API_BASE).unwrap_err();
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_generate_content_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({"tools": [{"googleSearch": {}}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Rust 1.90 shipped."}]},
                    "finishReason": "STOP"
                }],
                "modelVersion": "gemini-2.0-flash"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            GeminiClient::new("test-key", &server.uri(), &GeminiClientOptions::default()).unwrap();
        let resp = client
            .generate_content("gemini-2.0-flash", &request())
            .await
            .unwrap();

        assert_eq!(resp.resolve_text().as_deref(), Some("Rust 1.90 shipped."));
        assert_eq!(resp.model_version.as_deref(), Some("gemini-2.0-flash"));
    }

    #[tokio::test]
    async fn test_generate_content_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "code": 429,
                    "message": "Resource has been exhausted",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })))
            .mount(&server)
            .await;

        let client =
            GeminiClient::new("test-key", &server.uri(), &GeminiClientOptions::default()).unwrap();
        let err = client
            .generate_content("gemini-2.0-flash", &request())
            .await
            .unwrap_err();

        match err {
            GeminiServiceError::ApiError { code, message } => {
                assert_eq!(code, 429);
                assert_eq!(message, "Resource has been exhausted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_content_plain_error_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client =
            GeminiClient::new("test-key", &server.uri(), &GeminiClientOptions::default()).unwrap();
        let err = client
            .generate_content("gemini-2.0-flash", &request())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "API error: 502 - bad gateway");
    }

    #[tokio::test]
    async fn test_generate_content_unparseable_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client =
            GeminiClient::new("test-key", &server.uri(), &GeminiClientOptions::default()).unwrap();
        let err = client
            .generate_content("gemini-2.0-flash", &request())
            .await
            .unwrap_err();

        assert!(matches!(err, GeminiServiceError::ParseError(_)));
    }
}
