pub mod cli;
pub mod toml_config;

pub use cli::CliArgs;
pub use toml_config::FileConfig;

use crate::utils::error::{ProxyError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use std::fmt;

pub const API_KEY_ENV: &str = "SERPAPI_API_KEY";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BASE_URL: &str = "https://serpapi.com";
pub const DEFAULT_ENGINE: &str = "google_light";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 合併後的伺服器設定：命令列 > 環境變數 > 設定檔 > 預設值
#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_engine: String,
    pub timeout_secs: u64,
    pub require_client_key: bool,
    pub verbose: bool,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_engine: DEFAULT_ENGINE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            require_client_key: false,
            verbose: false,
            log_format: LogFormat::Compact,
        }
    }
}

// api_key 不可出現在日誌中
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("default_engine", &self.default_engine)
            .field("timeout_secs", &self.timeout_secs)
            .field("require_client_key", &self.require_client_key)
            .field("verbose", &self.verbose)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl ServerConfig {
    /// 依命令列參數載入（含 --config 指定的設定檔）並合併
    pub fn load(cli: CliArgs) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => Some(FileConfig::from_file(path)?),
            None => None,
        };
        Self::merge(cli, file)
    }

    pub fn merge(cli: CliArgs, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let file_format = match file.logging.format.as_deref() {
            Some(raw) => Some(raw.parse::<LogFormat>().map_err(|reason| {
                ProxyError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: raw.to_string(),
                    reason,
                }
            })?),
            None => None,
        };

        Ok(Self {
            host: cli.host.or(file.server.host).unwrap_or(defaults.host),
            port: cli.port.or(file.server.port).unwrap_or(defaults.port),
            api_key: cli.api_key.or(file.serpapi.api_key),
            base_url: cli
                .base_url
                .or(file.serpapi.base_url)
                .unwrap_or(defaults.base_url),
            default_engine: cli
                .default_engine
                .or(file.serpapi.default_engine)
                .unwrap_or(defaults.default_engine),
            timeout_secs: cli
                .timeout_secs
                .or(file.serpapi.timeout_secs)
                .unwrap_or(defaults.timeout_secs),
            require_client_key: cli
                .require_client_key
                .or(file.server.require_client_key)
                .unwrap_or(defaults.require_client_key),
            verbose: cli.verbose || file.logging.verbose.unwrap_or(false),
            log_format: cli.log_format.or(file_format).unwrap_or(defaults.log_format),
        })
    }

    /// 已驗證的伺服器憑證
    pub fn api_key(&self) -> Result<&str> {
        validation::validate_required_secret(API_KEY_ENV, &self.api_key)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        // 憑證優先檢查：缺少時不得綁定任何埠
        self.api_key()?;

        validation::validate_non_empty_string("host", &self.host)?;
        validation::validate_url("base_url", &self.base_url)?;
        validation::validate_non_empty_string("default_engine", &self.default_engine)?;
        validation::validate_range("timeout_secs", self.timeout_secs, 1, 300)?;

        tracing::debug!("✅ Server configuration validation passed");
        Ok(())
    }
}
