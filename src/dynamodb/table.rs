use crate::dynamodb::schema::{AttributeDefinitions, KeySchema, ScalarType};

/// DynamoDB table description as far as lifecycle operations need it.
///
/// This struct names a specific DynamoDB table and its key layout.
///
/// # Table Structure
///
/// - **Table Name**: A unique identifier for the table within your AWS account and region.
/// - **Key Schema**: A partition key and an optional sort key.
/// - **Attribute Definitions**: The declared scalar type of each key attribute.
///
/// Tables are usually obtained from [`crate::dynamodb::TableClient::describe_table`],
/// since the key layout is what deletes need to address items.
///
/// # Example
///
/// ```
/// use dynamo_lifecycle::dynamodb::{AttributeDefinitions, KeySchema, ScalarType, Table};
///
/// let table = Table::new("user_messages", KeySchema::new("user_id", Some("timestamp")))
///     .with_attribute_definitions(
///         AttributeDefinitions::new()
///             .define("user_id", ScalarType::String)
///             .define("timestamp", ScalarType::Number),
///     );
/// assert_eq!(table.key_schema().sort_key(), Some("timestamp"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    key_schema: KeySchema,
    attribute_definitions: AttributeDefinitions,
}

impl Table {
    /// Creates a new `Table` whose key attributes default to string type.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the DynamoDB table.
    /// * `key_schema` - The partition key and optional sort key.
    pub fn new(name: impl Into<String>, key_schema: KeySchema) -> Self {
        let attribute_definitions = key_schema
            .elements()
            .map(|(attribute, _)| (attribute.to_string(), ScalarType::String))
            .collect();
        Self {
            name: name.into(),
            key_schema,
            attribute_definitions,
        }
    }

    /// Replaces the attribute definitions and returns the modified `Table`.
    pub fn with_attribute_definitions(mut self, definitions: AttributeDefinitions) -> Self {
        self.attribute_definitions = definitions;
        self
    }

    /// Returns the name of the table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the key schema of the table.
    pub fn key_schema(&self) -> &KeySchema {
        &self.key_schema
    }

    /// Returns the declared key attribute types.
    pub fn attribute_definitions(&self) -> &AttributeDefinitions {
        &self.attribute_definitions
    }
}
