//! Error types for the conversion and batching core.

use thiserror::Error;

use crate::dynamodb::transport::ServiceError;

/// Result type alias for the dynamodb module.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while converting values or driving scans and batches.
///
/// Validation variants are never retried. `Service` wraps a failure reported
/// by the transport, and `RetriesExhausted` is raised when a group still has
/// unprocessed operations after its retry budget is spent.
#[derive(Error, Debug)]
pub enum Error {
    #[error("item is missing key attribute '{0}'")]
    MissingKeyAttribute(String),

    #[error("no attribute definition for key attribute '{0}'")]
    MissingAttributeDefinition(String),

    #[error("key attribute '{name}' holds {value}, which cannot be encoded as {expected}")]
    InvalidKeyValue {
        name: String,
        value: String,
        expected: &'static str,
    },

    #[error("invalid numeric text '{0}'")]
    InvalidNumber(String),

    #[error("attribute value has an unknown shape")]
    UnknownValueShape,

    #[error("invalid key schema: {0}")]
    InvalidKeySchema(String),

    #[error("{operation} on table '{table}' failed: {source}")]
    Service {
        operation: &'static str,
        table: String,
        #[source]
        source: ServiceError,
    },

    #[error("{remaining} operations left unprocessed on table '{table}' after {retries} retries")]
    RetriesExhausted {
        table: String,
        remaining: usize,
        retries: usize,
    },
}
