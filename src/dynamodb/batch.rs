use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::dynamodb::error::{Error, Result};
use crate::dynamodb::item::Item;
use crate::dynamodb::key::extract_key;
use crate::dynamodb::retry::{RetryAttempt, RetryPolicy, Transition};
use crate::dynamodb::table::Table;
use crate::dynamodb::transport::{Record, TableClient, WriteOp};

/// Most operations DynamoDB accepts in one `BatchWriteItem` request.
pub const MAX_BATCH_SIZE: usize = 25;

const OPERATION: &str = "BatchWriteItem";

/// What a batch write or delete did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Operations requested.
    pub items: usize,
    /// Groups of at most [`MAX_BATCH_SIZE`] the operations were split into.
    pub groups: usize,
    /// Requests sent, first submissions and resubmissions together.
    pub submissions: usize,
    /// Resubmissions after an unprocessed remainder or a retryable failure.
    pub retries: usize,
}

/// Splits `ops` into consecutive groups of at most [`MAX_BATCH_SIZE`],
/// keeping their order.
pub fn partition<T>(ops: Vec<T>) -> Vec<Vec<T>> {
    let mut groups = Vec::with_capacity(ops.len().div_ceil(MAX_BATCH_SIZE));
    let mut ops = ops.into_iter().peekable();
    while ops.peek().is_some() {
        groups.push(ops.by_ref().take(MAX_BATCH_SIZE).collect());
    }
    groups
}

/// Puts every item into `table`, 25 at a time.
///
/// Items are overwritten by key, so resubmitting a group is harmless. Groups
/// that were applied before a failure stay applied.
pub async fn batch_write<C>(
    client: &C,
    table: &str,
    items: &[Item],
    policy: &RetryPolicy,
) -> Result<BatchSummary>
where
    C: TableClient + ?Sized,
{
    let ops = items
        .iter()
        .map(|item| WriteOp::Put(item.to_record()))
        .collect();
    submit_all(client, table, ops, policy).await
}

/// Deletes the items identified by `keys` from `table`, 25 at a time.
pub async fn batch_delete<C>(
    client: &C,
    table: &str,
    keys: Vec<Record>,
    policy: &RetryPolicy,
) -> Result<BatchSummary>
where
    C: TableClient + ?Sized,
{
    let ops = keys.into_iter().map(WriteOp::Delete).collect();
    submit_all(client, table, ops, policy).await
}

/// Deletes `items` from `table`, addressing each by its primary key.
///
/// Every key is extracted before the first request is sent, so an item
/// without its key attributes fails the call without deleting anything.
pub async fn delete_items<C>(
    client: &C,
    table: &Table,
    items: &[Item],
    policy: &RetryPolicy,
) -> Result<BatchSummary>
where
    C: TableClient + ?Sized,
{
    let keys = items
        .iter()
        .map(|item| extract_key(item, table.key_schema(), table.attribute_definitions()))
        .collect::<Result<Vec<_>>>()?;
    batch_delete(client, table.name(), keys, policy).await
}

async fn submit_all<C>(
    client: &C,
    table: &str,
    ops: Vec<WriteOp>,
    policy: &RetryPolicy,
) -> Result<BatchSummary>
where
    C: TableClient + ?Sized,
{
    let mut summary = BatchSummary {
        items: ops.len(),
        ..BatchSummary::default()
    };
    let groups = partition(ops);
    summary.groups = groups.len();

    for (index, group) in groups.into_iter().enumerate() {
        debug!(
            "Submitting group {}/{} ({} operations) to '{table}'",
            index + 1,
            summary.groups,
            group.len()
        );
        let retries = submit_group(client, table, group, policy).await?;
        summary.submissions += retries + 1;
        summary.retries += retries;
    }

    info!(
        "Applied {} operations to '{table}' in {} groups ({} retries)",
        summary.items, summary.groups, summary.retries
    );
    Ok(summary)
}

/// Submits one group until it is fully processed, returning how many
/// resubmissions it took.
async fn submit_group<C>(
    client: &C,
    table: &str,
    group: Vec<WriteOp>,
    policy: &RetryPolicy,
) -> Result<usize>
where
    C: TableClient + ?Sized,
{
    let mut attempt = RetryAttempt::first(group);

    loop {
        let retries = attempt.retries;
        let outcome = client
            .batch_write(table, attempt.pending.clone())
            .await
            .map(|mut response| response.take_unprocessed(table));

        match attempt.advance(outcome, policy) {
            Transition::Complete => return Ok(retries),
            Transition::Retry { next, delay } => {
                warn!(
                    "{} operations pending on '{table}', retry {}/{} in {:?}",
                    next.pending.len(),
                    next.retries,
                    policy.max_retries,
                    delay
                );
                sleep(delay).await;
                attempt = next;
            }
            Transition::Exhausted { remaining, retries } => {
                error!(
                    "{} operations still unprocessed on '{table}' after {retries} retries",
                    remaining.len()
                );
                return Err(Error::RetriesExhausted {
                    table: table.to_string(),
                    remaining: remaining.len(),
                    retries,
                });
            }
            Transition::Failed { error, retries } => {
                error!("{OPERATION} on '{table}' failed after {retries} retries: {error}");
                return Err(Error::Service {
                    operation: OPERATION,
                    table: table.to_string(),
                    source: error,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_sizes_and_order() {
        for n in [0usize, 1, 24, 25, 26, 30, 50, 51, 100] {
            let input: Vec<usize> = (0..n).collect();
            let groups = partition(input.clone());

            assert_eq!(groups.len(), n.div_ceil(MAX_BATCH_SIZE), "n = {n}");
            if let Some((last, full)) = groups.split_last() {
                assert!(full.iter().all(|g| g.len() == MAX_BATCH_SIZE));
                assert!(!last.is_empty() && last.len() <= MAX_BATCH_SIZE);
            }
            assert_eq!(groups.concat(), input);
        }
    }

    #[test]
    fn test_thirty_items_make_two_groups() {
        let groups = partition((0..30).collect::<Vec<u32>>());
        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![25, 5]);
    }
}
