//! Tool endpoints
//!
//! The host agent framework lists the available tools, then invokes them by
//! name. The result text is injected into the conversation as a tool message.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::state::AppState;
use crate::services::search::{GeminiSearchTool, ToolDefinition, TOOL_NAME};

/// Arguments of a tool invocation
#[derive(Debug, Deserialize)]
pub struct ToolInvocation {
    pub query: String,
}

/// Result of a tool invocation
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool: String,
    pub content: String,
}

/// GET /v1/tools
pub async fn list_tools() -> Json<Vec<ToolDefinition>> {
    Json(vec![GeminiSearchTool::definition()])
}

/// POST /v1/tools/:name
pub async fn invoke_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<ToolInvocation>, JsonRejection>,
) -> Result<Json<ToolResult>, ApiError> {
    if name != TOOL_NAME {
        return Err(ApiError::ToolNotFound(name));
    }
    let Json(invocation) = payload?;

    let query = invocation.query.trim();
    if query.is_empty() {
        return Err(ApiError::InvalidRequest("query must not be empty".to_string()));
    }

    let content = state.search.invoke(query).await;

    Ok(Json(ToolResult {
        tool: name,
        content,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::server::create_router;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn router(keys: &[&str], base_url: &str) -> Router {
        let mut settings = Settings::default();
        settings.gemini.api_keys = keys.iter().map(|k| k.to_string()).collect();
        settings.gemini.base_url = base_url.to_string();
        create_router(AppState::new(settings))
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_list_tools() {
        let (status, body) = call(router(&["k"], "https://example.test"), get("/v1/tools")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "gemini_search");
        assert_eq!(body[0]["parameters"]["required"], json!(["query"]));
    }

    #[tokio::test]
    async fn test_invoke_search() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "summary"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = call(
            router(&["k"], &server.uri()),
            post("/v1/tools/gemini_search", json!({"query": "news"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"tool": "gemini_search", "content": "summary"}));
    }

    #[tokio::test]
    async fn test_invoke_rejects_blank_query() {
        let (status, body) = call(
            router(&["k"], "https://example.test"),
            post("/v1/tools/gemini_search", json!({"query": "   "})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_invoke_rejects_malformed_body() {
        let (status, body) = call(
            router(&["k"], "https://example.test"),
            post("/v1/tools/gemini_search", json!({"q": "news"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "error");
        assert_eq!(body["error"]["type"], "invalid_request_error");

        let request = Request::builder()
            .method("POST")
            .uri("/v1/tools/gemini_search")
            .body(Body::from("query=news"))
            .unwrap();
        let (status, body) = call(router(&["k"], "https://example.test"), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let (status, body) = call(
            router(&["k"], "https://example.test"),
            post("/v1/tools/web_fetch", json!({"query": "x"})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "not_found_error");
    }

    #[tokio::test]
    async fn test_readiness_reflects_credentials() {
        let (status, body) = call(router(&["k"], "https://example.test"), get("/ready")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pool"]["total"], 1);
        assert_eq!(body["pool"]["strategy"], "round_robin");

        let (status, body) = call(router(&[], "https://example.test"), get("/ready")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], false);
    }

    #[tokio::test]
    async fn test_health_and_liveness() {
        let (status, body) = call(router(&["k"], "https://example.test"), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = call(router(&["k"], "https://example.test"), get("/liveness")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alive"], true);
    }
}
