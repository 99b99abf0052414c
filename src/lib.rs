//! Table lifecycle tooling for Amazon DynamoDB.
//!
//! The [`dynamodb`] module holds the conversion and batching core. The
//! remaining modules make up the command-line shell around it.

pub mod command_line;
pub mod config;
pub mod dynamodb;
pub mod logging;
pub mod snapshot;
