// Domain layer: search models, MCP wire types and ports. No HTTP or runtime dependencies.

pub mod model;
pub mod ports;
pub mod protocol;
