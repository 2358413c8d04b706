use crate::app::{build_router, AppState};
use crate::config::ServerConfig;
use crate::core::mcp::SERVER_NAME;
use crate::utils::error::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// 綁定設定中的位址並執行到收到關閉訊號為止
pub async fn run(config: &ServerConfig) -> Result<()> {
    let state = AppState::from_config(config)?;
    let listener = TcpListener::bind(config.listen_addr()).await?;

    serve(listener, state, shutdown_signal()).await
}

pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    tracing::info!("🚀 {} listening on {}", SERVER_NAME, listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("👋 {} shut down", SERVER_NAME);
    Ok(())
}

/// Ctrl+C 或 SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
