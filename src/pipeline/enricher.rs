//! Stage 2: per-item detail fan-out.

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};

use crate::error::Result;
use crate::remote::{EnrichedRow, ItemRef, SearchBackend};

/// Joins one detail request per item into ordered rows.
///
/// Without a limit every item of the page is requested at once; `limit`
/// caps how many requests are in flight together.
///
/// All-or-nothing: the first request to fail, in completion order, fails the
/// whole page and the requests still in flight are dropped. Output order
/// follows input order, not completion order.
pub struct ResultEnricher<B> {
    backend: Arc<B>,
    limit: Option<usize>,
}

impl<B: SearchBackend> ResultEnricher<B> {
    pub fn new(backend: Arc<B>, limit: Option<usize>) -> Self {
        Self { backend, limit }
    }

    pub async fn enrich(&self, items: &[ItemRef]) -> Result<Vec<EnrichedRow>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let in_flight = self.limit.unwrap_or(items.len()).max(1);

        let mut indexed: Vec<(usize, EnrichedRow)> =
            stream::iter(items.iter().cloned().enumerate())
                .map(|(index, item)| {
                    let backend = Arc::clone(&self.backend);
                    async move { backend.fetch_detail(&item).await.map(|row| (index, row)) }
                })
                .buffer_unordered(in_flight)
                .try_collect()
                .await?;

        indexed.sort_unstable_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, row)| row).collect())
    }
}
