use crate::utils::logger::LogFormat;
use clap::Parser;
use std::path::PathBuf;

/// 命令列與環境變數參數；未指定的值交由設定檔或預設值補上
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "serpapi-mcp-server")]
#[command(about = "MCP server that proxies search queries to SerpApi")]
#[command(version)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, env = "MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind (default 0.0.0.0)
    #[arg(long, env = "MCP_HOST")]
    pub host: Option<String>,

    /// Port to listen on (default 8000)
    #[arg(short, long, env = "MCP_PORT")]
    pub port: Option<u16>,

    /// SerpApi credential, required to start
    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// SerpApi base URL
    #[arg(long, env = "SERPAPI_BASE_URL")]
    pub base_url: Option<String>,

    /// Engine used when a request does not name one
    #[arg(long, env = "SERPAPI_DEFAULT_ENGINE")]
    pub default_engine: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, env = "SERPAPI_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Reject requests that carry no key of their own instead of using SERPAPI_API_KEY
    #[arg(
        long,
        env = "MCP_REQUIRE_CLIENT_KEY",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub require_client_key: Option<bool>,

    /// Log output format: compact or json
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
