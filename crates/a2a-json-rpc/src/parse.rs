//! Envelope decoding with request-id recovery

use serde_json::Value;

use crate::error::JsonRpcError;
use crate::request::JsonRpcRequest;
use crate::types::RequestId;

/// Decode a raw request body into a [`JsonRpcRequest`].
///
/// - Bytes that are not JSON produce a parse error with a `null` id.
/// - JSON that is not a single request object produces an invalid-request
///   error. The id is echoed when the envelope carried a usable one.
pub fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, JsonRpcError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| JsonRpcError::parse_error(None))?;

    let object = match &value {
        Value::Object(object) => object,
        Value::Array(_) => {
            return Err(JsonRpcError::invalid_request(
                None,
                Some("Batch requests are not supported".to_string()),
            ));
        }
        _ => {
            return Err(JsonRpcError::invalid_request(
                None,
                Some("Request must be a JSON object".to_string()),
            ));
        }
    };

    let id = object.get("id").and_then(RequestId::from_value);
    if id.is_none() {
        return Err(JsonRpcError::invalid_request(
            None,
            Some("Request is missing a string or integer 'id'".to_string()),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| JsonRpcError::invalid_request(id, Some(format!("Invalid Request: {}", e))))
}
