//! Listing client
//!
//! Drives a [`ListingSession`] against a [`ListingService`]: issues the page
//! requests the session asks for, bounds each one with a timeout, merges the
//! responses, and reports progress to an optional [`ListingObserver`].

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt as _;
use futures::future::BoxFuture;

use crate::entry::{Entry, ObjectRef};
use crate::error::{Error, Result};
use crate::session::{FetchTicket, ListingSession, PageOutcome, Status};
use crate::traits::{BucketInfo, ListPage, ListRequest, ListingService};

/// Default number of keys requested per page
pub const DEFAULT_PAGE_SIZE: i32 = 200;

/// Default time allowed for a single page fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Static parameters of a listing client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingConfig {
    /// Bucket being browsed
    pub bucket: String,

    /// Keys requested per page
    pub page_size: i32,

    /// Upper bound on each page fetch
    pub fetch_timeout: Duration,
}

impl ListingConfig {
    /// Configuration with default page size and timeout
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            page_size: DEFAULT_PAGE_SIZE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// State transitions reported to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEvent {
    /// A fetch was issued
    LoadingStarted { prefix: String, initial: bool },
    /// A page was merged
    PageMerged {
        prefix: String,
        folders_added: usize,
        files_added: usize,
        has_more: bool,
    },
    /// A fetch failed; accumulated entries are unchanged
    Failed { prefix: String, message: String },
    /// A response arrived for a superseded fetch and was dropped
    StaleDiscarded { prefix: String },
}

/// Receiver of [`ListingEvent`]s
pub trait ListingObserver: Send + Sync {
    fn on_event(&self, event: &ListingEvent);
}

impl<F> ListingObserver for F
where
    F: Fn(&ListingEvent) + Send + Sync,
{
    fn on_event(&self, event: &ListingEvent) {
        self(event)
    }
}

/// Completed fetch, ready to be handed back to [`ListingClient::finish`]
#[derive(Debug)]
pub struct FetchResponse {
    ticket: FetchTicket,
    result: Result<ListPage>,
}

impl FetchResponse {
    pub fn ticket(&self) -> &FetchTicket {
        &self.ticket
    }
}

/// A fetch in flight; dropping it cancels the request
pub type PendingFetch = BoxFuture<'static, FetchResponse>;

/// Paginated, filterable listing of one prefix at a time
pub struct ListingClient<S: ListingService + ?Sized> {
    service: Arc<S>,
    config: ListingConfig,
    session: ListingSession,
    observer: Option<Arc<dyn ListingObserver>>,
}

impl<S: ListingService + ?Sized + 'static> ListingClient<S> {
    /// Create a client for `config.bucket` using a shared service handle
    pub fn new(service: Arc<S>, config: ListingConfig) -> Self {
        Self {
            service,
            config,
            session: ListingSession::new(),
            observer: None,
        }
    }

    /// Report state transitions to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn ListingObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Open `prefix` and load its first page
    pub async fn open(&mut self, prefix: &str) -> Result<()> {
        let pending = self.begin_open(prefix);
        let response = pending.await;
        self.finish(response).map(|_| ())
    }

    /// Load the next page
    ///
    /// Returns `Ok(false)` without fetching when the listing is exhausted,
    /// not yet ready, or already loading.
    pub async fn load_more(&mut self) -> Result<bool> {
        let Some(pending) = self.begin_load_more() else {
            return Ok(false);
        };
        let response = pending.await;
        self.finish(response)?;
        Ok(true)
    }

    /// Keep loading pages until exhausted or `max_pages` more were fetched
    ///
    /// Returns the number of additional pages merged.
    pub async fn load_pages(&mut self, max_pages: Option<usize>) -> Result<usize> {
        let mut loaded = 0;
        while max_pages.is_none_or(|max| loaded < max) {
            if !self.load_more().await? {
                break;
            }
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Reset to `prefix` and return the first-page fetch without awaiting it
    ///
    /// Any fetch still in flight is superseded; its response will be discarded.
    pub fn begin_open(&mut self, prefix: &str) -> PendingFetch {
        let ticket = self.session.open(prefix);
        self.dispatch(ticket)
    }

    /// Return the next-page fetch without awaiting it, if one is due
    pub fn begin_load_more(&mut self) -> Option<PendingFetch> {
        let ticket = self.session.begin_load_more()?;
        Some(self.dispatch(ticket))
    }

    fn dispatch(&self, ticket: FetchTicket) -> PendingFetch {
        self.notify(ListingEvent::LoadingStarted {
            prefix: ticket.prefix().to_string(),
            initial: ticket.is_initial(),
        });

        let request = ListRequest::new(&self.config.bucket, ticket.prefix(), self.config.page_size)
            .with_continuation_token(ticket.continuation_token().map(str::to_string));
        let service = Arc::clone(&self.service);
        let timeout = self.config.fetch_timeout;

        async move {
            tracing::debug!(
                bucket = %request.bucket,
                prefix = %request.prefix,
                continuation = request.continuation_token.is_some(),
                "fetching page"
            );
            let result = match tokio::time::timeout(timeout, service.list_page(request)).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(timeout.as_millis() as u64)),
            };
            FetchResponse { ticket, result }
        }
        .boxed()
    }

    /// Merge a completed fetch into the session
    pub fn finish(&mut self, response: FetchResponse) -> Result<PageOutcome> {
        let FetchResponse { ticket, result } = response;
        let prefix = ticket.prefix().to_string();

        match self.session.complete(&ticket, result) {
            Ok(PageOutcome::Discarded) => {
                self.notify(ListingEvent::StaleDiscarded { prefix });
                Ok(PageOutcome::Discarded)
            }
            Ok(outcome @ PageOutcome::Merged {
                folders_added,
                files_added,
            }) => {
                tracing::debug!(
                    prefix = %prefix,
                    folders_added,
                    files_added,
                    has_more = self.session.has_more(),
                    "merged page"
                );
                self.notify(ListingEvent::PageMerged {
                    prefix,
                    folders_added,
                    files_added,
                    has_more: self.session.has_more(),
                });
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(prefix = %prefix, error = %e, "listing fetch failed");
                self.notify(ListingEvent::Failed {
                    prefix,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn notify(&self, event: ListingEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }

    pub fn set_filter(&mut self, query: impl Into<String>) {
        self.session.set_filter(query);
    }

    pub fn filter(&self) -> &str {
        self.session.filter()
    }

    pub fn filtered_view(&self) -> Vec<Entry<'_>> {
        self.session.filtered_view()
    }

    pub fn status(&self) -> Status {
        self.session.status()
    }

    pub fn prefix(&self) -> &str {
        self.session.prefix()
    }

    pub fn folders(&self) -> &[String] {
        self.session.folders()
    }

    pub fn files(&self) -> &[ObjectRef] {
        self.session.files()
    }

    pub fn has_more(&self) -> bool {
        self.session.has_more()
    }

    pub fn session(&self) -> &ListingSession {
        &self.session
    }

    pub fn config(&self) -> &ListingConfig {
        &self.config
    }
}

/// List buckets through `service`, bounded by `timeout`
pub async fn list_buckets<S: ListingService + ?Sized>(
    service: &S,
    timeout: Duration,
) -> Result<Vec<BucketInfo>> {
    match tokio::time::timeout(timeout, service.list_buckets()).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(timeout.as_millis() as u64)),
    }
}
