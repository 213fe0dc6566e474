//! # A2A HTTP Server
//!
//! HTTP/1.1 transport for the action dispatcher. Callers discover the
//! available actions through the capability card and invoke them with
//! JSON-RPC 2.0 over `POST`.
//!
//! ## Features
//! - Capability card at `/.well-known/agent.json`, served without credentials
//! - HTTP Basic authentication against an in-memory user table
//! - Role-gated content routes sharing the action predicates
//! - CORS support for browser-based clients
//! - Request body limit enforced while reading

pub mod cors;
pub mod handler;
pub mod identity;
pub mod prelude;
pub mod routes;
pub mod server;

// Re-export main types
pub use cors::CorsLayer;
pub use handler::A2aHttpHandler;
pub use identity::{AnonymousResolver, AuthenticationError, BasicAuthResolver, IdentityResolver};
pub use routes::{ContentRoute, ContentRoutes};
pub use server::{A2aHttpServer, A2aHttpServerBuilder, DEFAULT_CARD_PATH, DEFAULT_RPC_PATH, ServerConfig};

/// Result type for HTTP server operations
pub type Result<T> = std::result::Result<T, HttpServerError>;

/// HTTP server errors
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid server configuration: {0}")]
    InvalidConfig(String),
}
