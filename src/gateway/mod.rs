//! Gateway server implementation

pub mod auth;
mod meta_mcp;
mod meta_mcp_helpers;
mod router;
mod server;

pub use auth::{ResolvedAuthConfig, auth_middleware};
pub use meta_mcp::VerifyMcp;
pub use meta_mcp_helpers::{TOOL_DISCOVER, TOOL_EXECUTE, TOOL_GET_API_DETAILS, TOOL_LIST_CATEGORIES};
pub use router::{AppState, create_router};
pub use server::{Gateway, serve_stdio};
