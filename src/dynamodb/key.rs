use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use base64::prelude::{Engine as _, BASE64_STANDARD};

use crate::dynamodb::error::{Error, Result};
use crate::dynamodb::item::Item;
use crate::dynamodb::schema::{AttributeDefinitions, KeySchema, ScalarType};
use crate::dynamodb::transport::Record;
use crate::dynamodb::value::{parse_number, Value};

/// Derives the primary key of `item`.
///
/// The result holds exactly the key attributes named by `schema`, each
/// encoded according to its declared type in `definitions`. Every other
/// attribute of the item is ignored.
pub fn extract_key(
    item: &Item,
    schema: &KeySchema,
    definitions: &AttributeDefinitions,
) -> Result<Record> {
    schema
        .elements()
        .map(|(name, _)| {
            let scalar_type = definitions
                .get(name)
                .ok_or_else(|| Error::MissingAttributeDefinition(name.to_string()))?;
            let value = item
                .get(name)
                .ok_or_else(|| Error::MissingKeyAttribute(name.to_string()))?;
            encode_key_value(name, value, scalar_type).map(|wire| (name.to_string(), wire))
        })
        .collect()
}

fn encode_key_value(name: &str, value: &Value, scalar_type: ScalarType) -> Result<AttributeValue> {
    let invalid = || Error::InvalidKeyValue {
        name: name.to_string(),
        value: value.to_string(),
        expected: match scalar_type {
            ScalarType::String => "a string",
            ScalarType::Number => "a number",
            ScalarType::Binary => "binary",
        },
    };

    match (scalar_type, value) {
        (ScalarType::String, Value::String(s)) => Ok(AttributeValue::S(s.clone())),
        (ScalarType::String, Value::Number(n)) => Ok(AttributeValue::S(n.to_string())),
        (ScalarType::String, Value::Bool(b)) => Ok(AttributeValue::S(b.to_string())),
        (ScalarType::Number, Value::Number(n)) => Ok(AttributeValue::N(n.to_string())),
        (ScalarType::Number, Value::String(s)) => parse_number(s)
            .map(|n| AttributeValue::N(n.to_string()))
            .map_err(|_| invalid()),
        (ScalarType::Binary, Value::Binary(bytes)) => Ok(AttributeValue::B(Blob::new(bytes.clone()))),
        (ScalarType::Binary, Value::String(s)) => BASE64_STANDARD
            .decode(s)
            .map(|bytes| AttributeValue::B(Blob::new(bytes)))
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> KeySchema {
        KeySchema::new("id", Some("sort_key"))
    }

    fn definitions() -> AttributeDefinitions {
        AttributeDefinitions::new()
            .define("id", ScalarType::String)
            .define("sort_key", ScalarType::Number)
    }

    #[test]
    fn test_missing_sort_key_is_an_error() {
        let item = Item::new().set_string("id", "a");
        let err = extract_key(&item, &schema(), &definitions()).unwrap_err();
        assert!(matches!(err, Error::MissingKeyAttribute(name) if name == "sort_key"));
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let item = Item::new()
            .set_string("id", "a")
            .set_number("sort_key", 7)
            .set_string("title", "ignored")
            .set_float("price", 1.5);

        let key = extract_key(&item, &schema(), &definitions()).unwrap();
        assert_eq!(key.len(), 2);
        assert_eq!(key["id"], AttributeValue::S("a".into()));
        assert_eq!(key["sort_key"], AttributeValue::N("7".into()));
    }

    #[test]
    fn test_values_follow_declared_type() {
        let item = Item::new().set_number("id", 12).set_string("sort_key", "42");
        let key = extract_key(&item, &schema(), &definitions()).unwrap();
        assert_eq!(key["id"], AttributeValue::S("12".into()));
        assert_eq!(key["sort_key"], AttributeValue::N("42".into()));
    }

    #[test]
    fn test_binary_key_passes_through() {
        let schema = KeySchema::new("digest", None::<String>);
        let defs = AttributeDefinitions::new().define("digest", ScalarType::Binary);
        let item = Item::new().set("digest", Value::Binary(vec![1, 2, 3]));

        let key = extract_key(&item, &schema, &defs).unwrap();
        assert_eq!(key["digest"], AttributeValue::B(Blob::new(vec![1u8, 2, 3])));
    }

    #[test]
    fn test_base64_text_for_binary_key_is_decoded() {
        let schema = KeySchema::new("digest", None::<String>);
        let defs = AttributeDefinitions::new().define("digest", ScalarType::Binary);

        let item = Item::new().set_string("digest", "AQID");
        let key = extract_key(&item, &schema, &defs).unwrap();
        assert_eq!(key["digest"], AttributeValue::B(Blob::new(vec![1u8, 2, 3])));

        let item = Item::new().set_string("digest", "not base64!");
        assert!(matches!(
            extract_key(&item, &schema, &defs),
            Err(Error::InvalidKeyValue { ref name, expected: "binary", .. }) if name == "digest"
        ));
    }

    #[test]
    fn test_bool_string_key_is_stringified() {
        let item = Item::new().set("id", true).set_number("sort_key", 1);
        let key = extract_key(&item, &schema(), &definitions()).unwrap();
        assert_eq!(key["id"], AttributeValue::S("true".into()));
    }

    #[test]
    fn test_non_scalar_key_values_are_rejected() {
        let item = Item::new()
            .set_string("id", "a")
            .set("sort_key", Value::List(vec![]));
        let err = extract_key(&item, &schema(), &definitions()).unwrap_err();
        assert!(matches!(err, Error::InvalidKeyValue { ref name, .. } if name == "sort_key"));

        let item = Item::new().set_string("id", "a").set_string("sort_key", "soon");
        assert!(matches!(
            extract_key(&item, &schema(), &definitions()),
            Err(Error::InvalidKeyValue { .. })
        ));
    }

    #[test]
    fn test_undefined_key_attribute() {
        let item = Item::new().set_string("id", "a").set_number("sort_key", 1);
        let defs = AttributeDefinitions::new().define("id", ScalarType::String);
        assert!(matches!(
            extract_key(&item, &schema(), &defs),
            Err(Error::MissingAttributeDefinition(name)) if name == "sort_key"
        ));
    }
}
