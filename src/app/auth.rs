use crate::app::state::AppState;
use crate::app::HEALTHCHECK_PATH;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

pub const MISSING_KEY_MESSAGE: &str =
    "Missing API key. Use path format /{API_KEY}/mcp or Authorization: Bearer {API_KEY} header";

/// 本次請求使用的 SerpApi 金鑰，由中介層放入 request extensions
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(pub String);

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// `/{key}/mcp` 形式路徑中的金鑰
pub fn path_key(path: &str) -> Option<String> {
    let mut parts = path.trim_matches('/').split('/');
    let first = parts.next().filter(|p| !p.is_empty())?;
    match (parts.next(), parts.next()) {
        (Some("mcp"), None) => Some(first.to_string()),
        _ => None,
    }
}

/// 日誌用路徑，遮蔽其中的金鑰
pub fn redact_path(path: &str) -> String {
    match path_key(path) {
        Some(key) => path.replacen(&key, "<redacted>", 1),
        None => path.to_string(),
    }
}

/// 金鑰來源優先順序：Bearer 標頭、路徑前綴、伺服器憑證
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.uri().path() == HEALTHCHECK_PATH {
        return next.run(req).await;
    }

    let key = bearer_token(req.headers())
        .or_else(|| path_key(req.uri().path()))
        .or_else(|| state.fallback_key().map(str::to_string));

    match key {
        Some(key) => {
            req.extensions_mut().insert(ApiKey(key));
            next.run(req).await
        }
        None => {
            tracing::debug!(path = %redact_path(req.uri().path()), "rejecting request without API key");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": MISSING_KEY_MESSAGE })),
            )
                .into_response()
        }
    }
}
