//! The request/response boundary between the core and the service.
//!
//! Scans and batches only talk to DynamoDB through [`TableClient`], so they
//! can run against the AWS SDK ([`crate::dynamodb::DynamoDb`]) or an
//! in-memory stand-in.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;

use crate::dynamodb::table::Table;

/// A raw item or key in wire form.
pub type Record = HashMap<String, AttributeValue>;

/// One page of a `Scan`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<Record>,
    /// `LastEvaluatedKey`; absent on the final page.
    pub continuation: Option<Record>,
    pub scanned_count: i32,
    pub returned_count: i32,
}

/// A single operation inside a `BatchWriteItem` request.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Put(Record),
    Delete(Record),
}

/// Response to a `BatchWriteItem` request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWriteResponse {
    /// Operations the service did not apply, keyed by table name.
    pub unprocessed: HashMap<String, Vec<WriteOp>>,
}

impl BatchWriteResponse {
    /// Takes the unprocessed operations for `table`.
    pub fn take_unprocessed(&mut self, table: &str) -> Vec<WriteOp> {
        self.unprocessed.remove(table).unwrap_or_default()
    }
}

/// Whether a failed call is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Throttling, exceeded capacity, internal errors and timeouts.
    Transient,
    /// Missing resources, access denied, malformed requests.
    Permanent,
}

const TRANSIENT_CODES: &[&str] = &[
    "ThrottlingException",
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "InternalServerError",
    "ServiceUnavailable",
    "TransactionInProgressException",
];

const TRANSIENT_TEXT: &[&str] = &["throttl", "capacity", "rate exceeded", "internal server error"];

impl ErrorClass {
    /// Classifies a service error by its code, or by its message text when
    /// the service sent no code.
    pub fn classify(code: Option<&str>, message: &str) -> Self {
        let transient = match code {
            Some(code) => TRANSIENT_CODES.contains(&code),
            None => {
                let message = message.to_lowercase();
                TRANSIENT_TEXT.iter().any(|text| message.contains(text))
            }
        };
        if transient {
            ErrorClass::Transient
        } else {
            ErrorClass::Permanent
        }
    }
}

/// A failed request, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub code: Option<String>,
    pub message: String,
    pub class: ErrorClass,
}

impl ServiceError {
    /// Creates an error, classifying it from its code and message.
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let class = ErrorClass::classify(code.as_deref(), &message);
        Self {
            code,
            message,
            class,
        }
    }

    /// Creates a transient error with no service code, e.g. a timeout.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            class: ErrorClass::Transient,
        }
    }

    /// Creates a permanent error raised locally, e.g. an unbuildable request.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            class: ErrorClass::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class == ErrorClass::Transient
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ServiceError {}

/// The service primitives lifecycle operations are built on.
///
/// Each call is one request/response round trip; implementations do not
/// retry on their own.
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Reads one page of `table`, starting after `continuation` when given.
    async fn scan_page(
        &self,
        table: &str,
        continuation: Option<Record>,
    ) -> Result<ScanPage, ServiceError>;

    /// Submits up to 25 operations against `table` as one batch.
    async fn batch_write(
        &self,
        table: &str,
        ops: Vec<WriteOp>,
    ) -> Result<BatchWriteResponse, ServiceError>;

    /// Fetches the key schema and attribute definitions of `table`.
    async fn describe_table(&self, table: &str) -> Result<Table, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_code() {
        assert_eq!(
            ErrorClass::classify(Some("ProvisionedThroughputExceededException"), ""),
            ErrorClass::Transient
        );
        assert_eq!(
            ErrorClass::classify(Some("ThrottlingException"), "Rate of requests exceeds the allowed throughput"),
            ErrorClass::Transient
        );
        assert_eq!(
            ErrorClass::classify(Some("ResourceNotFoundException"), "Requested resource not found"),
            ErrorClass::Permanent
        );
        assert_eq!(
            ErrorClass::classify(Some("AccessDeniedException"), "not authorized"),
            ErrorClass::Permanent
        );
        assert_eq!(
            ErrorClass::classify(Some("ValidationException"), "Item size has exceeded the maximum"),
            ErrorClass::Permanent
        );
    }

    #[test]
    fn test_classify_by_text() {
        assert_eq!(
            ErrorClass::classify(None, "request was throttled"),
            ErrorClass::Transient
        );
        assert_eq!(
            ErrorClass::classify(None, "Insufficient capacity"),
            ErrorClass::Transient
        );
        assert_eq!(ErrorClass::classify(None, "bad request"), ErrorClass::Permanent);
    }

    #[test]
    fn test_take_unprocessed_for_table() {
        let op = WriteOp::Delete(Record::new());
        let mut response = BatchWriteResponse {
            unprocessed: HashMap::from([("things".to_string(), vec![op.clone()])]),
        };
        assert!(response.take_unprocessed("other").is_empty());
        assert_eq!(response.take_unprocessed("things"), vec![op]);
        assert!(response.take_unprocessed("things").is_empty());
    }

    #[test]
    fn test_service_error_display() {
        let err = ServiceError::new(Some("ValidationException".into()), "bad key");
        assert_eq!(err.to_string(), "ValidationException: bad key");
        assert!(!err.is_transient());
        assert!(ServiceError::transient("timed out").is_transient());
    }
}
