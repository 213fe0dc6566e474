//! # JSON-RPC Envelope Prelude
//!
//! ```rust
//! use a2a_json_rpc::prelude::*;
//! ```

pub use crate::error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject};
pub use crate::parse::parse_request;
pub use crate::request::{JsonRpcRequest, RequestParams};
pub use crate::response::{JsonRpcMessage, JsonRpcResponse};
pub use crate::types::{JsonRpcVersion, RequestId};

pub use crate::error_codes::*;
