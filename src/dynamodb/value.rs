use std::collections::BTreeMap;
use std::fmt;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::dynamodb::error::{Error, Result};

/// Object key marking a base64 binary payload in the JSON form of a [`Value`].
pub const BINARY_TAG: &str = "$b64";

/// A dynamically typed attribute value, as seen by callers of this crate.
///
/// DynamoDB stores every attribute in a tagged wire form (`S`, `N`, `BOOL`,
/// `NULL`, `SS`, `NS`, `BS`, `L`, `M`, `B`). `Value` is the untagged shape
/// callers build records from; [`encode`] and [`decode`] translate between
/// the two.
///
/// # Numbers
///
/// Numbers carry no integer/float distinction at the type level. They keep
/// the textual form of a `serde_json::Number`, so `3` stays `3` and `1.0`
/// stays `1.0` when written to the wire.
///
/// # Binary
///
/// `Binary` only arises from decoding `B` and `BS` attributes. In JSON it is
/// written as a single-entry object `{"$b64": "<base64>"}` so that it reads
/// back as binary rather than as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "serde_json::Value", from = "serde_json::Value")]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Binary(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

/// Encodes a value into its DynamoDB wire representation.
///
/// Non-empty lists whose elements are all strings become a string set and
/// lists of only numbers become a number set. Every other list, including
/// empty lists and lists of booleans, maps or nested lists, is written as `L`.
pub fn encode(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Binary(bytes) => AttributeValue::B(Blob::new(bytes.clone())),
        Value::List(elements) => encode_list(elements),
        Value::Map(entries) => AttributeValue::M(
            entries
                .iter()
                .map(|(name, value)| (name.clone(), encode(value)))
                .collect(),
        ),
    }
}

fn encode_list(elements: &[Value]) -> AttributeValue {
    if elements.is_empty() {
        return AttributeValue::L(Vec::new());
    }

    let strings: Option<Vec<String>> = elements
        .iter()
        .map(|e| match e {
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    if let Some(strings) = strings {
        return AttributeValue::Ss(strings);
    }

    let numbers: Option<Vec<String>> = elements
        .iter()
        .map(|e| match e {
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();
    if let Some(numbers) = numbers {
        return AttributeValue::Ns(numbers);
    }

    AttributeValue::L(elements.iter().map(encode).collect())
}

/// Decodes a DynamoDB wire value.
///
/// Numeric text is parsed as an integer first and as a float second; text
/// that is neither (or a non-finite float such as `Infinity`) is rejected
/// with [`Error::InvalidNumber`].
pub fn decode(wire: AttributeValue) -> Result<Value> {
    match wire {
        AttributeValue::S(s) => Ok(Value::String(s)),
        AttributeValue::N(n) => parse_number(&n).map(Value::Number),
        AttributeValue::Bool(b) => Ok(Value::Bool(b)),
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::B(blob) => Ok(Value::Binary(blob.into_inner())),
        AttributeValue::Ss(strings) => Ok(Value::List(
            strings.into_iter().map(Value::String).collect(),
        )),
        AttributeValue::Ns(numbers) => numbers
            .iter()
            .map(|n| parse_number(n).map(Value::Number))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        AttributeValue::Bs(blobs) => Ok(Value::List(
            blobs
                .into_iter()
                .map(|blob| Value::Binary(blob.into_inner()))
                .collect(),
        )),
        AttributeValue::L(elements) => elements
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        AttributeValue::M(entries) => entries
            .into_iter()
            .map(|(name, value)| decode(value).map(|v| (name, v)))
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Value::Map),
        _ => Err(Error::UnknownValueShape),
    }
}

/// Parses DynamoDB numeric text, integer first, then float.
pub fn parse_number(text: &str) -> Result<Number> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(i.into());
    }
    if let Ok(u) = text.parse::<u64>() {
        return Ok(u.into());
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| Error::InvalidNumber(text.to_string()))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Binary(bytes) => f.write_str(&BASE64_STANDARD.encode(bytes)),
            Value::List(_) | Value::Map(_) => {
                write!(f, "{}", serde_json::Value::from(self.clone()))
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Value::Number(n),
            Value::String(s) => serde_json::Value::String(s),
            Value::Binary(bytes) => serde_json::Value::Object(serde_json::Map::from_iter([(
                BINARY_TAG.to_string(),
                serde_json::Value::String(BASE64_STANDARD.encode(bytes)),
            )])),
            Value::List(elements) => {
                serde_json::Value::Array(elements.into_iter().map(Into::into).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(elements) => {
                Value::List(elements.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(entries) => match tagged_binary(&entries) {
                Some(bytes) => Value::Binary(bytes),
                None => Value::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect()),
            },
        }
    }
}

/// Payload of a `{"$b64": "..."}` object. Anything else, including a tag
/// whose text is not valid base64, is an ordinary map.
fn tagged_binary(entries: &serde_json::Map<String, serde_json::Value>) -> Option<Vec<u8>> {
    if entries.len() != 1 {
        return None;
    }
    match entries.get(BINARY_TAG)? {
        serde_json::Value::String(text) => BASE64_STANDARD.decode(text).ok(),
        _ => None,
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(elements: Vec<Value>) -> Self {
        Value::List(elements)
    }
}
