//! Opaque JSON documents
//!
//! Board specifications and solve payloads are produced by the frontend and
//! stored verbatim. The store only guarantees that each one is a JSON object;
//! its inner shape (`numbers`, `operators`, `expected`, ...) is not checked.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Board operator symbols and the tokens they are reported as
pub(crate) const OPERATORS: [(&str, &str); 4] = [("+", "add"), ("-", "sub"), ("*", "mul"), ("/", "div")];

/// Symbol for an operator token, e.g. `mul` -> `*`
pub(crate) fn operator_symbol(token: &str) -> Option<&'static str> {
    OPERATORS
        .iter()
        .find(|(_, t)| *t == token)
        .map(|(symbol, _)| *symbol)
}

/// A JSON object stored as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Parse a JSON string, rejecting anything that is not an object.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::try_from(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Operator tokens (`add`, `sub`, `mul`, `div`) used on a board.
    ///
    /// Reads the `operators` array in order, dropping unknown symbols and
    /// repeats. Missing or malformed arrays yield an empty list.
    pub fn operator_tokens(&self) -> Vec<&'static str> {
        let Some(Value::Array(ops)) = self.0.get("operators") else {
            return Vec::new();
        };

        let mut tokens = Vec::new();
        for op in ops.iter().filter_map(Value::as_str) {
            let Some(&(_, token)) = OPERATORS.iter().find(|(symbol, _)| *symbol == op) else {
                continue;
            };
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens
    }
}

impl TryFrom<Value> for Document {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(StoreError::InvalidDocument(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
