use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::types::{JsonRpcVersion, RequestId};

/// Parameters for a JSON-RPC request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    /// Positional parameters as an array
    Array(Vec<Value>),
    /// Named parameters as an object
    Object(HashMap<String, Value>),
}

impl RequestParams {
    /// Get a parameter by name (object params only)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestParams::Object(map) => map.get(key),
            RequestParams::Array(_) => None,
        }
    }

    /// Get a parameter by index (array params only)
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            RequestParams::Array(vec) => vec.get(index),
            RequestParams::Object(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RequestParams::Object(map) => map.len(),
            RequestParams::Array(vec) => vec.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<HashMap<String, Value>> for RequestParams {
    fn from(map: HashMap<String, Value>) -> Self {
        RequestParams::Object(map)
    }
}

impl From<Vec<Value>> for RequestParams {
    fn from(vec: Vec<Value>) -> Self {
        RequestParams::Array(vec)
    }
}

/// A JSON-RPC request naming an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<RequestParams>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Create a new request with no parameters
    pub fn new_no_params(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self::new(id, method, None)
    }

    /// Create a new request with positional parameters
    pub fn new_with_array_params(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Vec<Value>,
    ) -> Self {
        Self::new(id, method, Some(RequestParams::Array(params)))
    }

    /// Create a new request with named parameters
    pub fn new_with_object_params(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: HashMap<String, Value>,
    ) -> Self {
        Self::new(id, method, Some(RequestParams::Object(params)))
    }

    /// Get a parameter by name (if params are an object)
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref()?.get(name)
    }

    /// Get a parameter by index (if params are an array)
    pub fn get_param_index(&self, index: usize) -> Option<&Value> {
        self.params.as_ref()?.get_index(index)
    }
}
