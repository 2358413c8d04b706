use crate::domain::model::{SearchArguments, SearchMode, SearchRequest};
use crate::domain::ports::SearchProvider;
use crate::domain::protocol::CallToolResult;
use crate::utils::error::{ProxyError, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// `search` 工具的核心邏輯：組合參數、呼叫上游、依模式過濾
#[derive(Clone)]
pub struct SearchService {
    provider: Arc<dyn SearchProvider>,
    default_engine: String,
}

impl SearchService {
    pub fn new(provider: Arc<dyn SearchProvider>, default_engine: impl Into<String>) -> Self {
        Self {
            provider,
            default_engine: default_engine.into(),
        }
    }

    pub fn default_engine(&self) -> &str {
        &self.default_engine
    }

    /// api_key 與預設 engine 先寫入，使用者參數可覆蓋兩者
    pub fn build_request(&self, api_key: &str, params: &Map<String, Value>) -> SearchRequest {
        let mut request = SearchRequest::new();
        request.set("api_key", api_key);
        request.set("engine", self.default_engine.as_str());

        for (key, value) in params {
            if let Some(value) = SearchRequest::param_value(value) {
                request.set(key.as_str(), value);
            }
        }

        request
    }

    pub async fn execute(&self, api_key: &str, args: &SearchArguments) -> Result<String> {
        let mode = args
            .mode
            .parse::<SearchMode>()
            .map_err(|e| ProxyError::ValidationError {
                message: e.to_string(),
            })?;

        let request = self.build_request(api_key, &args.params);
        let engine = request.get("engine").unwrap_or_default().to_string();
        let started = Instant::now();

        let mut data = self.provider.search(&request).await?;
        mode.apply(&mut data);

        tracing::info!(
            engine = %engine,
            mode = ?mode,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search completed"
        );

        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// 執行搜尋並轉為 MCP 工具結果；錯誤以文字回報給客戶端
    pub async fn call(&self, api_key: &str, args: &SearchArguments) -> CallToolResult {
        match self.execute(api_key, args).await {
            Ok(text) => CallToolResult::text(text),
            Err(e) => {
                tracing::warn!(
                    "search failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                CallToolResult::error(error_text(&e))
            }
        }
    }
}

/// 將錯誤轉為回傳給工具呼叫者的訊息
pub fn error_text(error: &ProxyError) -> String {
    match error {
        ProxyError::ValidationError { message } => format!("Error: {}", message),
        _ => match error.upstream_status() {
            Some(429) => "Error: Rate limit exceeded. Please try again later.".to_string(),
            Some(401) => "Error: Invalid SerpApi API key. Check your API key in the path or Authorization header."
                .to_string(),
            Some(403) => {
                "Error: SerpApi API key forbidden. Verify your subscription and key validity."
                    .to_string()
            }
            _ => format!("Error: {}", error),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::protocol::Content;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// 記錄收到的請求並回傳固定結果
    struct MockProvider {
        response: Mutex<Option<Result<Value>>>,
        seen: Mutex<Vec<SearchRequest>>,
    }

    impl MockProvider {
        fn returning(response: Result<Value>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(response)),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> SearchRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl SearchProvider for MockProvider {
        async fn search(&self, request: &SearchRequest) -> Result<Value> {
            self.seen.lock().unwrap().push(request.clone());
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(json!({})))
        }
    }

    fn args(value: Value) -> SearchArguments {
        serde_json::from_value(value).unwrap()
    }

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0] {
            Content::Text { text } => text,
        }
    }

    #[test]
    fn test_build_request_defaults_and_overrides() {
        let service = SearchService::new(MockProvider::returning(Ok(json!({}))), "google_light");

        let request = service.build_request("k", &Map::new());
        assert_eq!(request.get("api_key"), Some("k"));
        assert_eq!(request.get("engine"), Some("google_light"));

        let params = args(json!({"params": {"engine": "bing", "q": "news", "num": 5, "safe": null}})).params;
        let request = service.build_request("k", &params);
        assert_eq!(request.get("engine"), Some("bing"));
        assert_eq!(request.get("q"), Some("news"));
        assert_eq!(request.get("num"), Some("5"));
        assert_eq!(request.get("safe"), None);
    }

    #[tokio::test]
    async fn test_execute_compact_mode() {
        let provider = MockProvider::returning(Ok(json!({
            "search_metadata": {"id": "abc"},
            "search_parameters": {"q": "news"},
            "organic_results": [{"title": "Noticias de última hora"}]
        })));
        let service = SearchService::new(provider.clone(), "google_light");

        let text = service
            .execute("k", &args(json!({"params": {"q": "news"}, "mode": "compact"})))
            .await
            .unwrap();

        let data: Value = serde_json::from_str(&text).unwrap();
        assert!(data.get("search_metadata").is_none());
        assert!(data.get("search_parameters").is_none());
        assert!(text.contains("última"));
        assert!(text.contains("\n  \"organic_results\""));
        assert_eq!(provider.last_request().get("q"), Some("news"));
    }

    #[tokio::test]
    async fn test_invalid_mode_skips_upstream() {
        let provider = MockProvider::returning(Ok(json!({})));
        let service = SearchService::new(provider.clone(), "google_light");

        let result = service.call("k", &args(json!({"mode": "full"}))).await;

        assert!(result.is_error);
        assert_eq!(text_of(&result), "Error: Invalid mode. Must be 'complete' or 'compact'");
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_errors_map_to_messages() {
        let cases = [
            (429, "Error: Rate limit exceeded. Please try again later."),
            (401, "Error: Invalid SerpApi API key. Check your API key in the path or Authorization header."),
            (403, "Error: SerpApi API key forbidden. Verify your subscription and key validity."),
        ];

        for (status, expected) in cases {
            let provider = MockProvider::returning(Err(ProxyError::UpstreamStatus {
                status,
                message: "upstream".to_string(),
            }));
            let service = SearchService::new(provider, "google_light");
            let result = service.call("k", &SearchArguments::default()).await;

            assert!(result.is_error);
            assert_eq!(text_of(&result), expected);
        }
    }

    #[tokio::test]
    async fn test_other_errors_are_prefixed() {
        let provider = MockProvider::returning(Err(ProxyError::UpstreamStatus {
            status: 500,
            message: "boom".to_string(),
        }));
        let service = SearchService::new(provider, "google_light");
        let result = service.call("k", &SearchArguments::default()).await;

        assert_eq!(text_of(&result), "Error: SerpApi returned HTTP 500: boom");
    }
}
