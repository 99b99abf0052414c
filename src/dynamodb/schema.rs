use std::collections::HashMap;
use std::fmt;

use crate::dynamodb::error::{Error, Result};

/// Role of an attribute in a table's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// Partition key.
    Hash,
    /// Sort key.
    Range,
}

/// Declared wire type of a key attribute.
///
/// Only scalar types are legal for key attributes in DynamoDB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// String, `S` on the wire.
    String,
    /// Number, `N` on the wire.
    Number,
    /// Binary, `B` on the wire.
    Binary,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarType::String => "S",
            ScalarType::Number => "N",
            ScalarType::Binary => "B",
        })
    }
}

/// One element of a key schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

/// The primary key layout of a table.
///
/// # Primary Key
///
/// Every DynamoDB table must have a primary key, which can be:
/// - **Simple Primary Key**: Consists of just a partition (`HASH`) key.
/// - **Composite Primary Key**: Consists of a partition key and a sort (`RANGE`) key.
///
/// A `KeySchema` can only be built with exactly one hash key and at most one
/// range key, so iteration always yields the hash key first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    hash: String,
    range: Option<String>,
}

impl KeySchema {
    /// Creates a key schema from a partition key and an optional sort key.
    pub fn new(hash: impl Into<String>, range: Option<impl Into<String>>) -> Self {
        Self {
            hash: hash.into(),
            range: range.map(Into::into),
        }
    }

    /// Builds a key schema from an unordered element list, as returned by
    /// `DescribeTable`.
    pub fn from_elements(elements: impl IntoIterator<Item = KeySchemaElement>) -> Result<Self> {
        let mut hash = None;
        let mut range = None;

        for element in elements {
            let slot = match element.key_type {
                KeyType::Hash => &mut hash,
                KeyType::Range => &mut range,
            };
            if slot.replace(element.attribute_name).is_some() {
                return Err(Error::InvalidKeySchema(format!(
                    "more than one {:?} key",
                    element.key_type
                )));
            }
        }

        let hash =
            hash.ok_or_else(|| Error::InvalidKeySchema("no HASH key".to_string()))?;
        Ok(Self { hash, range })
    }

    /// Returns the partition key attribute name.
    pub fn partition_key(&self) -> &str {
        &self.hash
    }

    /// Returns the sort key attribute name, if any.
    pub fn sort_key(&self) -> Option<&str> {
        self.range.as_deref()
    }

    /// Iterates key elements, hash first, then range.
    pub fn elements(&self) -> impl Iterator<Item = (&str, KeyType)> {
        std::iter::once((self.hash.as_str(), KeyType::Hash))
            .chain(self.range.as_deref().map(|name| (name, KeyType::Range)))
    }
}

/// Declared types of a table's key attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDefinitions {
    types: HashMap<String, ScalarType>,
}

impl AttributeDefinitions {
    /// Creates an empty set of definitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition and returns the modified set.
    pub fn define(mut self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        self.types.insert(name.into(), scalar_type);
        self
    }

    /// Returns the declared type of an attribute.
    pub fn get(&self, name: &str) -> Option<ScalarType> {
        self.types.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<(String, ScalarType)> for AttributeDefinitions {
    fn from_iter<I: IntoIterator<Item = (String, ScalarType)>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str, key_type: KeyType) -> KeySchemaElement {
        KeySchemaElement {
            attribute_name: name.to_string(),
            key_type,
        }
    }

    #[test]
    fn test_schema_orders_hash_first() {
        let schema = KeySchema::from_elements([
            element("sort_key", KeyType::Range),
            element("id", KeyType::Hash),
        ])
        .unwrap();

        assert_eq!(schema.partition_key(), "id");
        assert_eq!(schema.sort_key(), Some("sort_key"));
        let elements: Vec<_> = schema.elements().collect();
        assert_eq!(
            elements,
            vec![("id", KeyType::Hash), ("sort_key", KeyType::Range)]
        );
    }

    #[test]
    fn test_schema_requires_single_hash() {
        assert!(matches!(
            KeySchema::from_elements([element("sk", KeyType::Range)]),
            Err(Error::InvalidKeySchema(_))
        ));
        assert!(matches!(
            KeySchema::from_elements([element("a", KeyType::Hash), element("b", KeyType::Hash)]),
            Err(Error::InvalidKeySchema(_))
        ));
        assert!(matches!(
            KeySchema::from_elements([
                element("a", KeyType::Hash),
                element("b", KeyType::Range),
                element("c", KeyType::Range),
            ]),
            Err(Error::InvalidKeySchema(_))
        ));
    }

    #[test]
    fn test_hash_only_schema() {
        let schema = KeySchema::new("id", None::<String>);
        assert_eq!(schema.elements().count(), 1);
        assert_eq!(schema.sort_key(), None);
    }

    #[test]
    fn test_attribute_definitions() {
        let defs = AttributeDefinitions::new()
            .define("id", ScalarType::String)
            .define("version", ScalarType::Number);

        assert_eq!(defs.len(), 2);
        assert_eq!(defs.get("version"), Some(ScalarType::Number));
        assert_eq!(defs.get("missing"), None);
    }
}
