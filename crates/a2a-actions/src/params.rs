//! Parameter shapes and argument binding

use std::fmt;

use a2a_json_rpc::RequestParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HandlerError, ParamError};

/// Type tag for one declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }

    /// Whether a JSON value satisfies this tag. Integers satisfy `number`;
    /// `null` satisfies nothing.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag name for an arbitrary JSON value, used in mismatch messages
pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One declared parameter: name plus type tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
        }
    }
}

/// Validated arguments in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActionArgs {
    names: Vec<String>,
    values: Vec<Value>,
}

impl ActionArgs {
    /// Check request params against the declared shape and bind them in
    /// declaration order. Named params are reordered; absent params count
    /// as an empty positional list.
    pub fn bind(specs: &[ParamSpec], params: Option<RequestParams>) -> Result<Self, ParamError> {
        let values = match params {
            None => Vec::new(),
            Some(RequestParams::Array(values)) => {
                if values.len() != specs.len() {
                    return Err(ParamError::Arity {
                        expected: specs.len(),
                        actual: values.len(),
                    });
                }
                values
            }
            Some(RequestParams::Object(mut named)) => {
                let mut ordered = Vec::with_capacity(specs.len());
                for spec in specs {
                    let value = named
                        .remove(&spec.name)
                        .ok_or_else(|| ParamError::Missing(spec.name.clone()))?;
                    ordered.push(value);
                }
                if let Some(unknown) = named.into_keys().min() {
                    return Err(ParamError::Unknown(unknown));
                }
                ordered
            }
        };

        if values.len() != specs.len() {
            return Err(ParamError::Arity {
                expected: specs.len(),
                actual: values.len(),
            });
        }

        for (spec, value) in specs.iter().zip(&values) {
            if !spec.param_type.accepts(value) {
                return Err(ParamError::Type {
                    param: spec.name.clone(),
                    expected: spec.param_type,
                    actual: value_type_name(value),
                });
            }
        }

        Ok(Self {
            names: specs.iter().map(|spec| spec.name.clone()).collect(),
            values,
        })
    }

    /// Build arguments directly, bypassing validation (handler unit tests)
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (names, values) = pairs.into_iter().map(|(n, v)| (n.into(), v)).unzip();
        Self { names, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn by_name(&self, name: &str) -> Option<&Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|index| self.values.get(index))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// String argument at `index`
    pub fn str(&self, index: usize) -> Result<&str, HandlerError> {
        self.get(index)
            .and_then(Value::as_str)
            .ok_or_else(|| self.argument_error(index, "string"))
    }

    /// Integer argument at `index`
    pub fn i64(&self, index: usize) -> Result<i64, HandlerError> {
        self.get(index)
            .and_then(Value::as_i64)
            .ok_or_else(|| self.argument_error(index, "integer"))
    }

    /// Numeric argument at `index`
    pub fn f64(&self, index: usize) -> Result<f64, HandlerError> {
        self.get(index)
            .and_then(Value::as_f64)
            .ok_or_else(|| self.argument_error(index, "number"))
    }

    /// Boolean argument at `index`
    pub fn bool(&self, index: usize) -> Result<bool, HandlerError> {
        self.get(index)
            .and_then(Value::as_bool)
            .ok_or_else(|| self.argument_error(index, "boolean"))
    }

    fn argument_error(&self, index: usize, expected: &str) -> HandlerError {
        let param = self
            .names
            .get(index)
            .cloned()
            .unwrap_or_else(|| index.to_string());
        HandlerError::InvalidArgument {
            param,
            message: format!("expected {}", expected),
        }
    }
}
