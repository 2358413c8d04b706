use crate::adapters::SerpApiClient;
use crate::config::ServerConfig;
use crate::core::{McpHandler, SearchProvider, SearchService};
use crate::utils::error::Result;
use std::sync::Arc;

/// 啟動後不再變動的共用狀態
pub struct AppState {
    pub mcp: McpHandler,
    /// 請求未自帶金鑰時使用的伺服器憑證
    pub server_key: Option<String>,
    pub require_client_key: bool,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        default_engine: &str,
        server_key: Option<String>,
        require_client_key: bool,
    ) -> Arc<Self> {
        let search = SearchService::new(provider, default_engine);
        Arc::new(Self {
            mcp: McpHandler::new(search),
            server_key: server_key.filter(|k| !k.trim().is_empty()),
            require_client_key,
        })
    }

    /// 以 SerpApi 客戶端建立正式環境狀態
    pub fn from_config(config: &ServerConfig) -> Result<Arc<Self>> {
        let client = SerpApiClient::from_config(config)?;
        tracing::info!("Forwarding searches to {}", client.endpoint());

        let server_key = config.api_key()?.to_string();
        Ok(Self::new(
            Arc::new(client),
            &config.default_engine,
            Some(server_key),
            config.require_client_key,
        ))
    }

    pub fn fallback_key(&self) -> Option<&str> {
        if self.require_client_key {
            None
        } else {
            self.server_key.as_deref()
        }
    }
}
