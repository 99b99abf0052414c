use tracing::{debug, info};

use crate::dynamodb::error::{Error, Result};
use crate::dynamodb::item::Item;
use crate::dynamodb::transport::{Record, ScanPage, TableClient};

/// Progress of a full-table scan.
///
/// Each page read is folded in with [`ScanState::absorb`], which returns the
/// next state. A scan can be resumed from a saved continuation token with
/// [`ScanState::resume`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanState {
    items: Vec<Item>,
    continuation: Option<Record>,
    pages: usize,
    finished: bool,
}

impl ScanState {
    /// State before the first page.
    pub fn new() -> Self {
        Self::default()
    }

    /// State that continues reading after `continuation`.
    pub fn resume(continuation: Record) -> Self {
        Self {
            continuation: Some(continuation),
            ..Self::default()
        }
    }

    /// Decodes one page and returns the state that follows it.
    pub fn absorb(self, page: ScanPage) -> Result<Self> {
        let ScanState {
            mut items,
            pages,
            ..
        } = self;

        items.reserve(page.items.len());
        for record in page.items {
            items.push(Item::from_record(record)?);
        }

        Ok(Self {
            items,
            finished: page.continuation.is_none(),
            continuation: page.continuation,
            pages: pages + 1,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.finished
    }

    /// Token for the next page, if any.
    pub fn continuation(&self) -> Option<&Record> {
        self.continuation.as_ref()
    }

    /// Number of pages read so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}

/// Reads every item of `table`.
pub async fn scan_all<C>(client: &C, table: &str) -> Result<Vec<Item>>
where
    C: TableClient + ?Sized,
{
    scan_from(client, table, ScanState::new())
        .await
        .map(ScanState::into_items)
}

/// Reads pages of `table` until the service stops returning a continuation
/// token, starting from `state`.
///
/// There is no page or time limit; termination relies on the service
/// eventually returning a final page.
pub async fn scan_from<C>(client: &C, table: &str, mut state: ScanState) -> Result<ScanState>
where
    C: TableClient + ?Sized,
{
    while !state.is_complete() {
        let page = client
            .scan_page(table, state.continuation.clone())
            .await
            .map_err(|source| Error::Service {
                operation: "Scan",
                table: table.to_string(),
                source,
            })?;

        debug!(
            "Scan page {} of '{table}': {} returned, {} scanned",
            state.pages + 1,
            page.returned_count,
            page.scanned_count
        );
        state = state.absorb(page)?;
    }

    info!(
        "Scanned {} items from '{table}' in {} pages",
        state.items.len(),
        state.pages
    );
    Ok(state)
}
