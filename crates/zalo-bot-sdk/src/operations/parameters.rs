// Per-item parameter access for batch operations

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::BinaryAttachment;
use crate::error::ParameterError;

/// Named parameter values and binary attachments for one batch item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemParameters {
    values: Map<String, Value>,
    binary: HashMap<String, BinaryAttachment>,
}

impl ItemParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object of parameter values.
    ///
    /// Non-object values produce an empty parameter set.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(values) => Self {
                values,
                binary: HashMap::new(),
            },
            _ => Self::default(),
        }
    }

    /// Add or replace a parameter value.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Add or replace a named binary attachment.
    pub fn with_binary(mut self, name: impl Into<String>, attachment: BinaryAttachment) -> Self {
        self.binary.insert(name.into(), attachment);
        self
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Required string parameter.
    ///
    /// Numbers are accepted and rendered as strings so numeric chat ids work.
    pub fn get_string(&self, name: &str) -> Result<String, ParameterError> {
        match self.values.get(name) {
            None | Some(Value::Null) => Err(ParameterError::Missing {
                name: name.to_string(),
            }),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(ParameterError::InvalidType {
                name: name.to_string(),
                expected: "string",
            }),
        }
    }

    /// Optional string parameter with a default.
    pub fn get_string_or(&self, name: &str, default: &str) -> Result<String, ParameterError> {
        match self.get_string(name) {
            Err(ParameterError::Missing { .. }) => Ok(default.to_string()),
            other => other,
        }
    }

    /// Optional boolean parameter with a default.
    pub fn get_bool_or(&self, name: &str, default: bool) -> Result<bool, ParameterError> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(ParameterError::InvalidType {
                name: name.to_string(),
                expected: "boolean",
            }),
        }
    }

    /// Named binary attachment.
    pub fn binary(&self, property: &str) -> Result<&BinaryAttachment, ParameterError> {
        self.binary
            .get(property)
            .ok_or_else(|| ParameterError::MissingBinaryData {
                property: property.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "parameters_tests.rs"]
mod tests;
