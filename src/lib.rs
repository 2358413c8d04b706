pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::SerpApiClient;
pub use app::{build_router, AppState};
pub use config::{CliArgs, ServerConfig};
pub use core::{mcp::McpHandler, search::SearchService};
pub use utils::error::{ProxyError, Result};
