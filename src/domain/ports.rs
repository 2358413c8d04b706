use crate::domain::model::SearchRequest;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 搜尋後端介面；HTTP 層只依賴這個 trait，測試可替換實作
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<serde_json::Value>;
}
