//! # JSON-RPC 2.0 Envelope
//!
//! Transport-agnostic request, response and error envelopes used by the
//! action dispatcher. Nothing in here knows about actions or authorization;
//! it only shapes and parses the wire messages.
//!
//! ## Features
//! - Positional and named parameters
//! - Success/error union that never carries both `result` and `error`
//! - Envelope parsing that recovers the request id whenever it is usable

pub mod error;
pub mod parse;
pub mod prelude;
pub mod request;
pub mod response;
pub mod types;

// Re-export main types
pub use error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject};
pub use parse::parse_request;
pub use request::{JsonRpcRequest, RequestParams};
pub use response::{JsonRpcMessage, JsonRpcResponse};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes plus the application codes used for access control
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    /// Authentication required
    pub const UNAUTHENTICATED: i64 = -32001;
    /// Authenticated but not permitted
    pub const UNAUTHORIZED: i64 = -32002;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
