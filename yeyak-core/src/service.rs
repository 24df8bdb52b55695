//! Paginated fetch loop that collects every listing from a source.

use std::sync::Arc;

use crate::model::{ListingPage, PageRange, RawRecord};
use crate::ports::{ListingPort, PortError};
use crate::retry::{RetryPolicy, with_retry};

/// Rows requested per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u64 = 1000;

#[derive(thiserror::Error, Debug)]
#[error("fetch failed for rows {range} after {attempts} attempt(s): {source}")]
/// A page could not be fetched; the whole run is aborted.
pub struct FetchError {
    /// Row range of the failing page.
    pub range: PageRange,
    /// Attempts spent on the page.
    pub attempts: u32,
    /// Error of the last attempt.
    #[source]
    pub source: PortError,
}

/// Walks a listing source page by page and accumulates its rows.
pub struct ListingService {
    port: Arc<dyn ListingPort>,
    page_size: u64,
    retry: RetryPolicy,
}

impl ListingService {
    /// Create a service reading from `port`.
    #[must_use]
    pub fn new(port: Arc<dyn ListingPort>, page_size: u64, retry: RetryPolicy) -> Self {
        Self {
            port,
            page_size: page_size.max(1),
            retry,
        }
    }

    /// Fetch every page, strictly in order, and return all rows.
    ///
    /// The first page's declared total decides how many pages follow. Without a
    /// usable total the service keeps probing until a page comes back empty; an
    /// empty page also ends a counted run early.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] as soon as one page fails permanently or runs
    /// out of retries. Rows fetched before that point are discarded.
    pub async fn fetch_all(&self) -> Result<Vec<RawRecord>, FetchError> {
        let first = self.fetch_page(1).await?;

        let last_page = if first.total_count > 0 {
            tracing::info!(
                source = %self.port.source().dataset,
                total = first.total_count,
                "discovered total count"
            );
            Some(first.total_count.div_ceil(self.page_size))
        } else {
            tracing::info!(
                source = %self.port.source().dataset,
                "no total count, probing until an empty page"
            );
            None
        };

        let mut records = first.rows;
        let mut page = 2;

        while last_page.is_none_or(|last| page <= last) {
            let listing = self.fetch_page(page).await?;
            if listing.rows.is_empty() {
                break;
            }
            records.extend(listing.rows);
            page += 1;
        }

        Ok(records)
    }

    async fn fetch_page(&self, page: u64) -> Result<ListingPage, FetchError> {
        let range = PageRange::page(page, self.page_size);

        let listing = with_retry(&self.retry, || self.port.fetch_page(range))
            .await
            .map_err(|failure| FetchError {
                range,
                attempts: failure.attempts,
                source: failure.error,
            })?;

        tracing::info!(%range, rows = listing.rows.len(), "fetched page");
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Map, Value};

    use super::*;
    use crate::ports::SourceMeta;

    type Reply = Result<ListingPage, PortError>;

    /// In-memory source answering each page start with scripted replies.
    struct ScriptedPort {
        meta: SourceMeta,
        replies: Mutex<HashMap<u64, VecDeque<Reply>>>,
        calls: Mutex<Vec<PageRange>>,
    }

    impl ScriptedPort {
        fn new() -> Self {
            Self {
                meta: SourceMeta {
                    dataset: "TestListing".into(),
                },
                replies: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn reply(self, start: u64, reply: Reply) -> Self {
            self.replies
                .lock()
                .expect("lock")
                .entry(start)
                .or_default()
                .push_back(reply);
            self
        }

        fn page(self, start: u64, total_count: u64, row_count: usize) -> Self {
            let rows = (0..row_count)
                .map(|idx| {
                    let mut fields = Map::new();
                    fields.insert("SVCID".into(), Value::String(format!("S{start}-{idx}")));
                    RawRecord(fields)
                })
                .collect();
            self.reply(start, Ok(ListingPage { total_count, rows }))
        }

        fn calls(&self) -> Vec<(u64, u64)> {
            self.calls
                .lock()
                .expect("lock")
                .iter()
                .map(|range| (range.start, range.end))
                .collect()
        }
    }

    #[async_trait]
    impl ListingPort for ScriptedPort {
        fn source(&self) -> &SourceMeta {
            &self.meta
        }

        async fn fetch_page(&self, range: PageRange) -> Result<ListingPage, PortError> {
            self.calls.lock().expect("lock").push(range);
            self.replies
                .lock()
                .expect("lock")
                .get_mut(&range.start)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Ok(ListingPage::default()))
        }
    }

    fn server_error() -> Reply {
        Err(PortError::Status {
            status: 503,
            url: "http://example.invalid/".into(),
        })
    }

    fn service(port: &Arc<ScriptedPort>) -> ListingService {
        let port: Arc<dyn ListingPort> = Arc::<ScriptedPort>::clone(port);
        ListingService::new(
            port,
            DEFAULT_PAGE_SIZE,
            RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::ZERO,
            },
        )
    }

    #[tokio::test]
    async fn total_count_bounds_the_page_walk() {
        let port = Arc::new(
            ScriptedPort::new()
                .page(1, 2500, 1000)
                .page(1001, 2500, 1000)
                .page(2001, 2500, 500)
                .page(3001, 2500, 7),
        );

        let records = service(&port).fetch_all().await.expect("fetch");

        assert_eq!(records.len(), 2500);
        assert_eq!(port.calls(), [(1, 1000), (1001, 2000), (2001, 3000)]);
    }

    #[tokio::test]
    async fn empty_page_stops_early() {
        let port = Arc::new(
            ScriptedPort::new()
                .page(1, 2500, 1000)
                .page(1001, 2500, 0)
                .page(2001, 2500, 500),
        );

        let records = service(&port).fetch_all().await.expect("fetch");

        assert_eq!(records.len(), 1000);
        assert_eq!(port.calls(), [(1, 1000), (1001, 2000)]);
    }

    #[tokio::test]
    async fn missing_total_probes_until_empty() {
        let port = Arc::new(
            ScriptedPort::new()
                .page(1, 0, 1000)
                .page(1001, 0, 1000)
                .page(2001, 0, 3),
        );

        let records = service(&port).fetch_all().await.expect("fetch");

        assert_eq!(records.len(), 2003);
        assert_eq!(
            port.calls(),
            [(1, 1000), (1001, 2000), (2001, 3000), (3001, 4000)]
        );
    }

    #[tokio::test]
    async fn rows_keep_page_order_without_dedup() {
        let port = Arc::new(
            ScriptedPort::new()
                .page(1, 1500, 2)
                .page(1001, 1500, 2),
        );

        let records = service(&port).fetch_all().await.expect("fetch");
        let ids: Vec<String> = records
            .iter()
            .map(|record| record.0["SVCID"].as_str().unwrap_or_default().to_owned())
            .collect();

        assert_eq!(ids, ["S1-0", "S1-1", "S1001-0", "S1001-1"]);
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let port = Arc::new(
            ScriptedPort::new()
                .page(1, 1500, 1000)
                .reply(1001, server_error())
                .reply(1001, Err(PortError::Decode("truncated".into())))
                .page(1001, 1500, 500),
        );

        let records = service(&port).fetch_all().await.expect("fetch");

        assert_eq!(records.len(), 1500);
        assert_eq!(
            port.calls(),
            [(1, 1000), (1001, 2000), (1001, 2000), (1001, 2000)]
        );
    }

    #[tokio::test]
    async fn exhausted_retries_abort_the_run() {
        let port = Arc::new(
            ScriptedPort::new()
                .page(1, 2500, 1000)
                .reply(1001, server_error())
                .reply(1001, server_error())
                .reply(1001, server_error()),
        );

        let err = service(&port).fetch_all().await.expect_err("should fail");

        assert_eq!(err.range, PageRange { start: 1001, end: 2000 });
        assert_eq!(err.attempts, 3);
        assert_eq!(port.calls().len(), 4);
    }

    #[tokio::test]
    async fn client_error_aborts_without_retry() {
        let port = Arc::new(ScriptedPort::new().reply(
            1,
            Err(PortError::Status {
                status: 401,
                url: "http://example.invalid/".into(),
            }),
        ));

        let err = service(&port).fetch_all().await.expect_err("should fail");

        assert_eq!(err.attempts, 1);
        assert!(matches!(err.source, PortError::Status { status: 401, .. }));
        assert_eq!(port.calls(), [(1, 1000)]);
    }
}
