use std::collections::HashMap;
use std::fmt;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::{self, DeleteRequest, PutRequest, WriteRequest},
    Client,
};
use tracing::{debug, error, info};

use crate::dynamodb::schema::{AttributeDefinitions, KeySchema, KeySchemaElement, KeyType, ScalarType};
use crate::dynamodb::table::Table;
use crate::dynamodb::transport::{
    BatchWriteResponse, Record, ScanPage, ServiceError, TableClient, WriteOp,
};

/// DynamoDB client wrapper implementing [`TableClient`] over the AWS SDK.
///
/// Every method performs exactly one request. Pagination and retries live
/// in [`crate::dynamodb::scan`] and [`crate::dynamodb::batch`].
///
/// # Operations
/// - **Scan**: Read one page of a table
/// - **BatchWriteItem**: Put or delete up to 25 items in one request
/// - **DescribeTable**: Read the key schema of a table
///
/// # Example
///
/// ```no_run
/// use dynamo_lifecycle::dynamodb::{scan_all, DynamoDb};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = aws_config::load_from_env().await;
/// let client = DynamoDb::new(&config);
/// client.check_auth().await?;
///
/// let items = scan_all(&client, "users").await?;
/// println!("{} users", items.len());
/// # Ok(())
/// # }
/// ```
///
/// # Error Handling
///
/// SDK failures are mapped to [`ServiceError`], keeping the service error
/// code so callers can tell throttling apart from permanent failures.
/// Timeouts and dispatch failures are always treated as transient.
#[derive(Debug, Clone)]
pub struct DynamoDb {
    client: Client,
}

impl DynamoDb {
    /// Creates a new `DynamoDb` instance.
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }

    /// Verifies authentication by attempting to list tables.
    pub async fn check_auth(&self) -> Result<()> {
        self.client.list_tables().limit(1).send().await.map_err(|e| {
            error!("Authentication failed: {}", DisplayErrorContext(&e));
            anyhow!("Authentication failed")
        })?;
        info!("Authentication successful");
        Ok(())
    }
}

#[async_trait]
impl TableClient for DynamoDb {
    async fn scan_page(
        &self,
        table: &str,
        continuation: Option<Record>,
    ) -> Result<ScanPage, ServiceError> {
        let response = self
            .client
            .scan()
            .table_name(table)
            .set_exclusive_start_key(continuation)
            .send()
            .await
            .map_err(service_error)?;

        Ok(ScanPage {
            items: response.items.unwrap_or_default(),
            continuation: response.last_evaluated_key.filter(|key| !key.is_empty()),
            scanned_count: response.scanned_count,
            returned_count: response.count,
        })
    }

    async fn batch_write(
        &self,
        table: &str,
        ops: Vec<WriteOp>,
    ) -> Result<BatchWriteResponse, ServiceError> {
        let requests = ops
            .into_iter()
            .map(write_request)
            .collect::<Result<Vec<_>, BuildError>>()
            .map_err(|e| ServiceError::permanent(format!("invalid write request: {e}")))?;

        let response = self
            .client
            .batch_write_item()
            .request_items(table, requests)
            .send()
            .await
            .map_err(service_error)?;

        Ok(batch_write_response(response.unprocessed_items))
    }

    async fn describe_table(&self, table: &str) -> Result<Table, ServiceError> {
        let response = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(service_error)?;
        let description = response.table.ok_or_else(|| {
            ServiceError::permanent(format!("no description returned for table '{table}'"))
        })?;

        let elements = description
            .key_schema()
            .iter()
            .map(|element| {
                let key_type = match element.key_type() {
                    types::KeyType::Hash => KeyType::Hash,
                    types::KeyType::Range => KeyType::Range,
                    other => return Err(unsupported("key type", other)),
                };
                Ok(KeySchemaElement {
                    attribute_name: element.attribute_name().to_string(),
                    key_type,
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;
        let key_schema = KeySchema::from_elements(elements)
            .map_err(|e| ServiceError::permanent(e.to_string()))?;

        let definitions = description
            .attribute_definitions()
            .iter()
            .map(|definition| {
                let scalar_type = match definition.attribute_type() {
                    types::ScalarAttributeType::S => ScalarType::String,
                    types::ScalarAttributeType::N => ScalarType::Number,
                    types::ScalarAttributeType::B => ScalarType::Binary,
                    other => return Err(unsupported("attribute type", other)),
                };
                Ok((definition.attribute_name().to_string(), scalar_type))
            })
            .collect::<Result<AttributeDefinitions, ServiceError>>()?;

        debug!("Table '{table}' key schema: {key_schema:?}");
        Ok(Table::new(table, key_schema).with_attribute_definitions(definitions))
    }
}

fn batch_write_response(
    unprocessed_items: Option<HashMap<String, Vec<WriteRequest>>>,
) -> BatchWriteResponse {
    let unprocessed = unprocessed_items
        .unwrap_or_default()
        .into_iter()
        .map(|(table, requests)| (table, requests.into_iter().filter_map(write_op).collect()))
        .collect();
    BatchWriteResponse { unprocessed }
}

fn write_request(op: WriteOp) -> Result<WriteRequest, BuildError> {
    let request = match op {
        WriteOp::Put(item) => WriteRequest::builder()
            .put_request(PutRequest::builder().set_item(Some(item)).build()?),
        WriteOp::Delete(key) => WriteRequest::builder()
            .delete_request(DeleteRequest::builder().set_key(Some(key)).build()?),
    };
    Ok(request.build())
}

fn write_op(request: WriteRequest) -> Option<WriteOp> {
    let WriteRequest {
        put_request,
        delete_request,
        ..
    } = request;
    put_request
        .map(|put| WriteOp::Put(put.item))
        .or_else(|| delete_request.map(|delete| WriteOp::Delete(delete.key)))
}

fn unsupported(what: &str, value: &impl fmt::Debug) -> ServiceError {
    ServiceError::permanent(format!("unsupported {what}: {value:?}"))
}

fn service_error<E, R>(err: SdkError<E, R>) -> ServiceError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ServiceError::transient(message)
        }
        _ => ServiceError::new(err.code().map(str::to_string), message),
    }
}
