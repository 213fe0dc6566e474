use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{JsonRpcError, JsonRpcErrorObject};
use crate::types::{JsonRpcVersion, RequestId};

/// A successful JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub result: Value,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            result,
        }
    }
}

/// Either a successful response or an error response.
///
/// Keeping the two shapes apart guarantees that exactly one of `result`
/// and `error` ever reaches the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Successful response with result field
    Response(JsonRpcResponse),
    /// Error response with error field
    Error(JsonRpcError),
}

impl JsonRpcMessage {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Response(JsonRpcResponse::success(id, result))
    }

    pub fn error(error: JsonRpcError) -> Self {
        Self::Error(error)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcMessage::Error(_))
    }

    /// Request id echoed by this message; `None` only for unreadable envelopes
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            JsonRpcMessage::Response(resp) => Some(&resp.id),
            JsonRpcMessage::Error(err) => err.id.as_ref(),
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            JsonRpcMessage::Response(resp) => Some(&resp.result),
            JsonRpcMessage::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&JsonRpcErrorObject> {
        match self {
            JsonRpcMessage::Response(_) => None,
            JsonRpcMessage::Error(err) => Some(&err.error),
        }
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcError> for JsonRpcMessage {
    fn from(error: JsonRpcError) -> Self {
        Self::Error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JsonRpcErrorCode;
    use serde_json::{from_str, json, to_string, to_value};

    #[test]
    fn test_success_carries_only_result() {
        let message = JsonRpcMessage::success(RequestId::Number(1), json!("hi"));
        let value = to_value(&message).unwrap();

        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 1, "result": "hi"}));
    }

    #[test]
    fn test_error_carries_only_error() {
        let message =
            JsonRpcMessage::error(JsonRpcError::unauthorized(RequestId::Number(2)));
        let value = to_value(&message).unwrap();

        assert!(value.get("result").is_none());
        assert_eq!(value["id"], 2);
        assert_eq!(value["error"]["code"], -32002);
    }

    #[test]
    fn test_message_decodes_to_matching_variant() {
        let ok: JsonRpcMessage =
            from_str(r#"{"jsonrpc":"2.0","id":"a","result":{"status":"confirmed"}}"#).unwrap();
        assert!(!ok.is_error());
        assert_eq!(ok.result(), Some(&json!({"status": "confirmed"})));

        let err: JsonRpcMessage = from_str(
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#,
        )
        .unwrap();
        assert!(err.is_error());
        assert_eq!(err.id(), None);
        assert_eq!(
            err.error_object().map(|e| e.category()),
            Some(JsonRpcErrorCode::ParseError)
        );
    }

    #[test]
    fn test_null_result_is_still_a_result() {
        let message = JsonRpcMessage::success(RequestId::Number(9), Value::Null);
        let json = to_string(&message).unwrap();
        assert!(json.contains("\"result\":null"));
    }
}
