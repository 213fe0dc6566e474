use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Correlation token for a JSON-RPC request.
/// Can be a string or an integer; a `null` id is only ever produced by the
/// server for envelopes it could not read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl RequestId {
    /// Recover an id from an arbitrary JSON value, if it has a usable shape
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(RequestId::String(s.clone())),
            Value::Number(n) => n.as_i64().map(RequestId::Number),
            _ => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

/// JSON-RPC protocol version marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonRpcVersion {
    #[default]
    V2_0,
}

impl JsonRpcVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonRpcVersion::V2_0 => crate::JSONRPC_VERSION,
        }
    }
}

impl fmt::Display for JsonRpcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "2.0" => Ok(JsonRpcVersion::V2_0),
            _ => Err(serde::de::Error::custom(format!(
                "Invalid JSON-RPC version: {}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_serialization() {
        let id_str = RequestId::String("booking-7".to_string());
        let id_num = RequestId::Number(42);

        assert_eq!(serde_json::to_string(&id_str).unwrap(), r#""booking-7""#);
        assert_eq!(serde_json::to_string(&id_num).unwrap(), "42");
    }

    #[test]
    fn test_request_id_recovery() {
        assert_eq!(RequestId::from_value(&json!(3)), Some(RequestId::Number(3)));
        assert_eq!(
            RequestId::from_value(&json!("abc")),
            Some(RequestId::String("abc".to_string()))
        );
        assert_eq!(RequestId::from_value(&json!(1.5)), None);
        assert_eq!(RequestId::from_value(&json!(null)), None);
        assert_eq!(RequestId::from_value(&json!({"id": 1})), None);
    }

    #[test]
    fn test_json_rpc_version() {
        assert_eq!(JsonRpcVersion::V2_0.as_str(), "2.0");
        assert_eq!(
            serde_json::to_string(&JsonRpcVersion::V2_0).unwrap(),
            r#""2.0""#
        );
        assert!(serde_json::from_str::<JsonRpcVersion>(r#""1.0""#).is_err());
    }
}
