// HTTP layer: axum router, API key middleware and server lifecycle.

pub mod auth;
pub mod server;
pub mod state;

pub use state::AppState;

use crate::core::mcp::{McpOutcome, SERVER_NAME};
use auth::ApiKey;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub const HEALTHCHECK_PATH: &str = "/healthcheck";
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    timestamp: String,
    service: &'static str,
}

async fn healthcheck() -> Json<Health> {
    Json(Health {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        service: SERVER_NAME,
    })
}

async fn mcp_endpoint(
    State(state): State<Arc<AppState>>,
    Extension(ApiKey(api_key)): Extension<ApiKey>,
    body: Bytes,
) -> Response {
    match state.mcp.handle_body(&api_key, &body).await {
        McpOutcome::Reply(response) => (StatusCode::OK, Json(response)).into_response(),
        McpOutcome::Rejected(response) => (StatusCode::BAD_REQUEST, Json(response)).into_response(),
        McpOutcome::Accepted => StatusCode::ACCEPTED.into_response(),
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

// 瀏覽器客戶端需要帶憑證，因此鏡像請求來源而非使用 `*`
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Build the full router. Used by main.rs and the integration tests.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(HEALTHCHECK_PATH, get(healthcheck))
        .route("/mcp", post(mcp_endpoint))
        .route("/:api_key/mcp", post(mcp_endpoint))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer())
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request| {
                tracing::debug_span!(
                    "http",
                    method = %req.method(),
                    path = %auth::redact_path(req.uri().path()),
                )
            }),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SearchProvider;
    use crate::domain::model::SearchRequest;
    use crate::utils::error::Result;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request as HttpRequest};
    use serde_json::Value;
    use tower::ServiceExt;

    struct KeyEcho;

    #[async_trait]
    impl SearchProvider for KeyEcho {
        async fn search(&self, request: &SearchRequest) -> Result<Value> {
            Ok(json!({ "api_key": request.get("api_key") }))
        }
    }

    fn router(server_key: Option<&str>, require_client_key: bool) -> Router {
        build_router(AppState::new(
            Arc::new(KeyEcho),
            "google_light",
            server_key.map(str::to_string),
            require_client_key,
        ))
    }

    fn call_body() -> String {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "search", "arguments": {"params": {"q": "x"}}}
        })
        .to_string()
    }

    async fn used_key(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        let data: Value = serde_json::from_str(text).unwrap();
        data["api_key"].as_str().unwrap().to_string()
    }

    fn post_json(uri: &str) -> axum::http::request::Builder {
        HttpRequest::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
    }

    #[tokio::test]
    async fn test_healthcheck_needs_no_key() {
        let response = router(None, true)
            .oneshot(HttpRequest::builder().uri("/healthcheck").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "SerpApi MCP Server");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_missing_key_is_rejected() {
        let response = router(Some("server"), true)
            .oneshot(post_json("/mcp").body(Body::from(call_body())).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], auth::MISSING_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn test_key_precedence() {
        let response = router(Some("server"), false)
            .oneshot(post_json("/mcp").body(Body::from(call_body())).unwrap())
            .await
            .unwrap();
        assert_eq!(used_key(response).await, "server");

        let response = router(Some("server"), false)
            .oneshot(post_json("/path-key/mcp").body(Body::from(call_body())).unwrap())
            .await
            .unwrap();
        assert_eq!(used_key(response).await, "path-key");

        let response = router(Some("server"), false)
            .oneshot(
                post_json("/path-key/mcp")
                    .header(header::AUTHORIZATION, "Bearer header-key")
                    .body(Body::from(call_body()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(used_key(response).await, "header-key");
    }

    #[tokio::test]
    async fn test_notification_returns_accepted() {
        let response = router(Some("server"), false)
            .oneshot(
                post_json("/mcp")
                    .body(Body::from(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_parse_error_is_bad_request() {
        let response = router(Some("server"), false)
            .oneshot(post_json("/mcp").body(Body::from("{oops")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    fn padded_ping(size: usize) -> Vec<u8> {
        let mut body = br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#.to_vec();
        body.resize(size, b' ');
        body
    }

    #[tokio::test]
    async fn test_body_at_limit_is_accepted() {
        let response = router(Some("server"), false)
            .oneshot(post_json("/mcp").body(Body::from(padded_ping(MAX_BODY_BYTES))).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_body_over_limit_is_rejected() {
        let response = router(Some("server"), false)
            .oneshot(post_json("/mcp").body(Body::from(padded_ping(MAX_BODY_BYTES + 1))).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_get_on_mcp_is_not_allowed() {
        let response = router(Some("server"), false)
            .oneshot(HttpRequest::builder().uri("/mcp").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let response = router(Some("server"), false)
            .oneshot(HttpRequest::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router(None, true)
            .oneshot(HttpRequest::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cors_preflight_skips_auth() {
        let response = router(None, true)
            .oneshot(
                HttpRequest::builder()
                    .method(Method::OPTIONS)
                    .uri("/mcp")
                    .header(header::ORIGIN, "https://app.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }
}
