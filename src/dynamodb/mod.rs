//! # DynamoDB Module
//!
//! This module implements table lifecycle operations on Amazon DynamoDB:
//! reading a whole table, and writing or deleting items in bulk.
//!
//! ## Components
//!
//! - [`Value`], [`encode`], [`decode`]: conversion between plain values and
//!   DynamoDB's tagged attribute values.
//! - [`Item`]: a record of named values.
//! - [`KeySchema`], [`AttributeDefinitions`], [`Table`]: a table's key layout.
//! - [`extract_key`]: the primary key of an item.
//! - [`scan_all`]: reads every page of a table.
//! - [`batch_write`], [`batch_delete`], [`delete_items`]: 25-item batches with
//!   backoff on unprocessed items.
//! - [`TableClient`]: the request/response seam, implemented by [`DynamoDb`].
//!
//! ## Example
//!
//! ```no_run
//! use dynamo_lifecycle::dynamodb::{batch_write, scan_all, DynamoDb, Item, RetryPolicy};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = aws_config::load_from_env().await;
//! let client = DynamoDb::new(&config);
//!
//! let items = vec![
//!     Item::new().set_string("user_id", "123").set_string("name", "John Doe"),
//!     Item::new().set_string("user_id", "124").set_number("age", 30),
//! ];
//! batch_write(&client, "users", &items, &RetryPolicy::default()).await?;
//!
//! let all = scan_all(&client, "users").await?;
//! assert!(all.len() >= 2);
//! # Ok(())
//! # }
//! ```

mod batch;
mod client;
mod error;
mod item;
mod key;
mod retry;
mod scan;
mod schema;
mod table;
mod transport;
mod value;

pub use batch::{batch_delete, batch_write, delete_items, partition, BatchSummary, MAX_BATCH_SIZE};
pub use client::DynamoDb;
pub use error::{Error, Result};
pub use item::Item;
pub use key::extract_key;
pub use retry::{RetryAttempt, RetryPolicy, Transition, DEFAULT_BACKOFF_SECS};
pub use scan::{scan_all, scan_from, ScanState};
pub use schema::{AttributeDefinitions, KeySchema, KeySchemaElement, KeyType, ScalarType};
pub use table::Table;
pub use transport::{
    BatchWriteResponse, ErrorClass, Record, ScanPage, ServiceError, TableClient, WriteOp,
};
pub use value::{decode, encode, parse_number, Value, BINARY_TAG};
