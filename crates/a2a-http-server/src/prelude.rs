//! # A2A HTTP Server Prelude
//!
//! ```rust
//! use a2a_http_server::prelude::*;
//! ```

pub use crate::identity::{AnonymousResolver, BasicAuthResolver, IdentityResolver};
pub use crate::server::{A2aHttpServer, A2aHttpServerBuilder, ServerConfig};

pub use a2a_actions::prelude::*;

// Error types
pub use crate::HttpServerError;
