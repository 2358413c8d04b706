pub mod mcp;
pub mod search;

pub use crate::domain::model::{SearchArguments, SearchMode, SearchRequest};
pub use crate::domain::ports::SearchProvider;
pub use crate::utils::error::Result;
pub use mcp::{McpHandler, McpOutcome};
pub use search::SearchService;
