use clap::Parser;
use serpapi_mcp_server::app::server;
use serpapi_mcp_server::utils::{logger, validation::Validate};
use serpapi_mcp_server::{CliArgs, ProxyError, ServerConfig};

fn exit_with(e: &ProxyError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code().max(1));
}

#[tokio::main]
async fn main() {
    // .env 不存在時忽略
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();

    let config = match ServerConfig::load(args) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    // 初始化日誌
    logger::init_server_logger(config.verbose, config.log_format);

    tracing::info!("Starting serpapi-mcp-server v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Server config: {:?}", config);

    // 驗證配置；缺少憑證時在綁定埠之前結束
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        exit_with(&e);
    }

    if let Err(e) = server::run(&config).await {
        tracing::error!(
            "❌ Server failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        exit_with(&e);
    }
}
