use crate::config::ServerConfig;
use crate::domain::model::SearchRequest;
use crate::domain::ports::SearchProvider;
use crate::utils::error::{ProxyError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const SEARCH_PATH: &str = "/search.json";

/// SerpApi HTTP 客戶端
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    client: Client,
    endpoint: String,
}

impl SerpApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("serpapi-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), SEARCH_PATH),
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 從回應內容取出 SerpApi 的錯誤說明，取不到則回傳原文
    fn error_message(body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string())
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, request: &SearchRequest) -> Result<Value> {
        tracing::debug!(
            "Making SerpApi request to {} (engine: {})",
            self.endpoint,
            request.get("engine").unwrap_or("default")
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(request.pairs())
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("SerpApi response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProxyError::UpstreamStatus {
                status: status.as_u16(),
                message: Self::error_message(&body),
            });
        }

        let data: Value = response.json().await?;

        // 查無結果時 SerpApi 以 200 回傳 {"error": "..."}，仍視為正常資料
        if let Some(message) = data.get("error").and_then(Value::as_str) {
            tracing::info!("SerpApi reported: {}", message);
        }

        Ok(data)
    }
}
