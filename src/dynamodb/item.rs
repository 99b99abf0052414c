use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;
use tracing::warn;

use crate::dynamodb::error::{Error, Result};
use crate::dynamodb::transport::Record;
use crate::dynamodb::value::{decode, encode, Value};

/// Represents a DynamoDB item as a map of attribute names to [`Value`]s.
///
/// In DynamoDB, an item is a collection of attributes, each with a name and a value.
/// Items are similar to rows or records in other database systems.
///
/// # Primary Key
///
/// - Every item in a table is uniquely identified by its primary key.
/// - The primary key can be simple (partition key only) or composite (partition key and sort key).
/// - An item written to a table must carry every key attribute; see [`crate::dynamodb::extract_key`].
///
/// Items are produced by decoding scan results or by reading a snapshot, and
/// are consumed by the batch writer. Attribute order is stable (sorted by name)
/// so snapshots diff cleanly.
///
/// # Example
///
/// ```
/// use dynamo_lifecycle::dynamodb::Item;
///
/// let item = Item::new()
///     .set_string("user_id", "12345")
///     .set_string("username", "johndoe")
///     .set_number("age", 30);
/// assert_eq!(item.get_string("username"), Some("johndoe"));
/// ```
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item {
    attributes: BTreeMap<String, Value>,
}

impl Item {
    /// Creates a new empty `Item`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute to any value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets a string attribute.
    pub fn set_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, Value::String(value.into()))
    }

    /// Sets an integral number attribute.
    pub fn set_number(self, key: impl Into<String>, value: impl Into<Number>) -> Self {
        self.set(key, Value::Number(value.into()))
    }

    /// Sets a fractional number attribute.
    ///
    /// DynamoDB has no representation for NaN or infinity, so a non-finite
    /// value is stored as null and logged. Use [`Item::try_set_float`] to
    /// reject it instead.
    pub fn set_float(self, key: impl Into<String>, value: f64) -> Self {
        let key = key.into();
        match Number::from_f64(value) {
            Some(n) => self.set(key, Value::Number(n)),
            None => {
                warn!("Attribute '{key}' is not a finite number ({value}), storing null");
                self.set(key, Value::Null)
            }
        }
    }

    /// Sets a fractional number attribute, failing on NaN or infinity.
    pub fn try_set_float(self, key: impl Into<String>, value: f64) -> Result<Self> {
        let n = Number::from_f64(value).ok_or_else(|| Error::InvalidNumber(value.to_string()))?;
        Ok(self.set(key, Value::Number(n)))
    }

    /// Gets an attribute value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Gets the value of an attribute as a string.
    ///
    /// Returns `None` if the attribute doesn't exist or is not a string.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Gets the value of an attribute as a number (f64).
    ///
    /// Returns `None` if the attribute doesn't exist or is not a number.
    pub fn get_number(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key) {
            Some(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Returns all attributes of the item.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Encodes every attribute into its wire form.
    pub fn to_record(&self) -> Record {
        self.attributes
            .iter()
            .map(|(name, value)| (name.clone(), encode(value)))
            .collect()
    }

    /// Decodes a raw record returned by the service.
    pub fn from_record(record: Record) -> Result<Self> {
        let attributes = record
            .into_iter()
            .map(|(name, wire)| decode(wire).map(|value| (name, value)))
            .collect::<Result<_>>()?;
        Ok(Self { attributes })
    }
}

impl From<BTreeMap<String, Value>> for Item {
    fn from(attributes: BTreeMap<String, Value>) -> Self {
        Self { attributes }
    }
}
