use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error_codes;
use crate::types::{JsonRpcVersion, RequestId};

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    Unauthenticated,
    Unauthorized,
    ServerError(i64), // -32099 to -32000
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::Unauthenticated => error_codes::UNAUTHENTICATED,
            JsonRpcErrorCode::Unauthorized => error_codes::UNAUTHORIZED,
            JsonRpcErrorCode::ServerError(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
            JsonRpcErrorCode::Unauthenticated => "Authentication required",
            JsonRpcErrorCode::Unauthorized => "Unauthorized",
            JsonRpcErrorCode::ServerError(_) => "Server error",
        }
    }

    /// Map a wire code back onto a known category
    pub fn from_code(code: i64) -> Self {
        match code {
            error_codes::PARSE_ERROR => JsonRpcErrorCode::ParseError,
            error_codes::INVALID_REQUEST => JsonRpcErrorCode::InvalidRequest,
            error_codes::METHOD_NOT_FOUND => JsonRpcErrorCode::MethodNotFound,
            error_codes::INVALID_PARAMS => JsonRpcErrorCode::InvalidParams,
            error_codes::INTERNAL_ERROR => JsonRpcErrorCode::InternalError,
            error_codes::UNAUTHENTICATED => JsonRpcErrorCode::Unauthenticated,
            error_codes::UNAUTHORIZED => JsonRpcErrorCode::Unauthorized,
            other => JsonRpcErrorCode::ServerError(other),
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// JSON-RPC Error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: JsonRpcErrorCode, message: Option<String>, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: message.unwrap_or_else(|| code.message().to_string()),
            data,
        }
    }

    /// The category this object's code belongs to
    pub fn category(&self) -> JsonRpcErrorCode {
        JsonRpcErrorCode::from_code(self.code)
    }

    pub fn parse_error(detail: Option<String>) -> Self {
        Self::new(JsonRpcErrorCode::ParseError, detail, None)
    }

    pub fn invalid_request(detail: Option<String>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidRequest, detail, None)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::MethodNotFound,
            Some(format!("Method '{}' not found", method)),
            None,
        )
    }

    pub fn invalid_params(message: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::InvalidParams,
            Some(message.to_string()),
            None,
        )
    }

    /// Generic access-denied object; never names the role that was missing
    pub fn unauthorized() -> Self {
        Self::new(JsonRpcErrorCode::Unauthorized, None, None)
    }

    pub fn internal_error(message: Option<String>) -> Self {
        Self::new(JsonRpcErrorCode::InternalError, message, None)
    }

    /// Application-defined error in the reserved server range.
    /// Codes outside -32099..=-32000 are clamped to -32000.
    pub fn server_error(code: i64, message: &str, data: Option<Value>) -> Self {
        let code = if (error_codes::SERVER_ERROR_START..=error_codes::SERVER_ERROR_END)
            .contains(&code)
        {
            code
        } else {
            error_codes::SERVER_ERROR_END
        };
        Self::new(
            JsonRpcErrorCode::ServerError(code),
            Some(message.to_string()),
            data,
        )
    }
}

/// JSON-RPC Error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: Option<RequestId>,
    pub error: JsonRpcErrorObject,
}

impl JsonRpcError {
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorObject) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            error,
        }
    }

    pub fn parse_error(detail: Option<String>) -> Self {
        Self::new(None, JsonRpcErrorObject::parse_error(detail))
    }

    pub fn invalid_request(id: Option<RequestId>, detail: Option<String>) -> Self {
        Self::new(id, JsonRpcErrorObject::invalid_request(detail))
    }

    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::new(Some(id), JsonRpcErrorObject::method_not_found(method))
    }

    pub fn invalid_params(id: RequestId, message: &str) -> Self {
        Self::new(Some(id), JsonRpcErrorObject::invalid_params(message))
    }

    pub fn unauthorized(id: RequestId) -> Self {
        Self::new(Some(id), JsonRpcErrorObject::unauthorized())
    }

    pub fn internal_error(id: Option<RequestId>, message: Option<String>) -> Self {
        Self::new(id, JsonRpcErrorObject::internal_error(message))
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JSON-RPC Error {}: {}",
            self.error.code, self.error.message
        )
    }
}

impl std::error::Error for JsonRpcError {}
