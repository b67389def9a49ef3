//! Listing session state machine
//!
//! A [`ListingSession`] accumulates the folders and objects found under one
//! prefix, page by page. It performs no I/O: [`ListingSession::open`] and
//! [`ListingSession::begin_load_more`] hand out a [`FetchTicket`] describing the
//! page to request, and the caller reports the response back through
//! [`ListingSession::complete`]. A ticket issued before the most recent `open`
//! no longer matches the session and its response is discarded unmerged.
//!
//! ```text
//! Idle -> Loading -> Ready <-> LoadingMore
//!                      \-> Ready (exhausted)
//! ```

use std::collections::HashSet;

use crate::entry::{Entry, ObjectRef};
use crate::error::Result;
use crate::path::normalize_prefix;
use crate::traits::ListPage;

/// Lifecycle state of a listing session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing fetched yet, or the initial fetch failed
    Idle,
    /// First page in flight; no partial results are exposed
    Loading,
    /// At least one page merged
    Ready,
    /// Continuation page in flight; accumulated entries stay visible
    LoadingMore,
}

impl Status {
    /// Whether a fetch is currently in flight
    pub fn is_loading(self) -> bool {
        matches!(self, Status::Loading | Status::LoadingMore)
    }
}

/// Describes one page fetch issued by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    fetch_id: u64,
    prefix: String,
    continuation_token: Option<String>,
}

impl FetchTicket {
    /// Prefix the page belongs to
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Token to resume from, `None` for the first page
    pub fn continuation_token(&self) -> Option<&str> {
        self.continuation_token.as_deref()
    }

    /// Whether this ticket requests the first page of a session
    pub fn is_initial(&self) -> bool {
        self.continuation_token.is_none()
    }
}

/// Result of reporting a page back to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was merged into the session
    Merged {
        folders_added: usize,
        files_added: usize,
    },
    /// The ticket belonged to a superseded fetch; nothing changed
    Discarded,
}

/// Accumulated listing of a single prefix
#[derive(Debug)]
pub struct ListingSession {
    prefix: String,
    folders: Vec<String>,
    files: Vec<ObjectRef>,
    seen_folders: HashSet<String>,
    seen_files: HashSet<String>,
    continuation_token: Option<String>,
    exhausted: bool,
    status: Status,
    generation: u64,
    next_fetch_id: u64,
    in_flight: Option<u64>,
    filter: String,
}

impl Default for ListingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingSession {
    /// Create an idle session rooted at the bucket root
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
            folders: Vec::new(),
            files: Vec::new(),
            seen_folders: HashSet::new(),
            seen_files: HashSet::new(),
            continuation_token: None,
            exhausted: false,
            status: Status::Idle,
            generation: 0,
            next_fetch_id: 0,
            in_flight: None,
            filter: String::new(),
        }
    }

    /// Reset the session for `prefix` and issue the first fetch
    ///
    /// Any fetch still in flight is superseded.
    pub fn open(&mut self, prefix: &str) -> FetchTicket {
        self.generation += 1;
        self.prefix = normalize_prefix(prefix);
        self.folders.clear();
        self.files.clear();
        self.seen_folders.clear();
        self.seen_files.clear();
        self.continuation_token = None;
        self.exhausted = false;
        self.status = Status::Idle;
        self.in_flight = None;

        self.issue(Status::Loading, None)
    }

    /// Issue a continuation fetch, or `None` when there is nothing to do
    ///
    /// Redundant calls (exhausted, already loading, never opened) are ignored.
    pub fn begin_load_more(&mut self) -> Option<FetchTicket> {
        if self.status != Status::Ready || self.exhausted || self.in_flight.is_some() {
            return None;
        }
        let token = self.continuation_token.clone();
        Some(self.issue(Status::LoadingMore, token))
    }

    fn issue(&mut self, status: Status, continuation_token: Option<String>) -> FetchTicket {
        self.next_fetch_id += 1;
        self.in_flight = Some(self.next_fetch_id);
        self.status = status;
        FetchTicket {
            generation: self.generation,
            fetch_id: self.next_fetch_id,
            prefix: self.prefix.clone(),
            continuation_token,
        }
    }

    /// Whether `ticket` is the fetch this session is waiting for
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation && self.in_flight == Some(ticket.fetch_id)
    }

    /// Report the response for `ticket`
    ///
    /// Stale tickets yield [`PageOutcome::Discarded`]. A failed fetch returns
    /// the error after reverting to the last stable state; accumulated entries
    /// are left untouched so the caller may retry.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        response: Result<ListPage>,
    ) -> Result<PageOutcome> {
        if !self.is_current(ticket) {
            tracing::debug!(prefix = %ticket.prefix, "discarding response of superseded fetch");
            return Ok(PageOutcome::Discarded);
        }

        self.in_flight = None;
        let page = match response {
            Ok(page) => page,
            Err(e) => {
                self.status = if ticket.is_initial() {
                    Status::Idle
                } else {
                    Status::Ready
                };
                return Err(e);
            }
        };

        let (folders_added, files_added) = self.merge(page);
        self.status = Status::Ready;

        Ok(PageOutcome::Merged {
            folders_added,
            files_added,
        })
    }

    fn merge(&mut self, page: ListPage) -> (usize, usize) {
        let folders_before = self.folders.len();
        let files_before = self.files.len();

        for prefix in page.folder_prefixes {
            if self.seen_folders.insert(prefix.clone()) {
                self.folders.push(prefix);
            }
        }

        for object in page.object_items {
            // Directory marker for the folder being listed
            if object.key == self.prefix {
                continue;
            }
            if self.seen_files.insert(object.key.clone()) {
                self.files.push(object);
            }
        }

        // A truncated page without a token cannot be resumed.
        self.exhausted = !page.is_truncated || page.next_continuation_token.is_none();
        self.continuation_token = if self.exhausted {
            None
        } else {
            page.next_continuation_token
        };

        (
            self.folders.len() - folders_before,
            self.files.len() - files_before,
        )
    }

    /// Set the filter query; never triggers a fetch
    pub fn set_filter(&mut self, query: impl Into<String>) {
        self.filter = query.into();
    }

    /// Current filter query
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Entries whose display name contains the filter, case-insensitively
    ///
    /// Folders come before files, each in accumulation order.
    pub fn filtered_view(&self) -> Vec<Entry<'_>> {
        let query = self.filter.to_lowercase();
        self.entries()
            .filter(|entry| {
                query.is_empty() || entry.display_name().to_lowercase().contains(&query)
            })
            .collect()
    }

    /// All accumulated entries, folders first
    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> {
        self.folders
            .iter()
            .map(|p| Entry::Folder(p.as_str()))
            .chain(self.files.iter().map(Entry::Object))
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Prefix this session lists
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    pub fn files(&self) -> &[ObjectRef] {
        &self.files
    }

    /// Token the next continuation fetch will use
    pub fn continuation_token(&self) -> Option<&str> {
        self.continuation_token.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Whether another page can be requested once the session is ready
    pub fn has_more(&self) -> bool {
        !self.exhausted && self.status != Status::Idle
    }

    /// Number of accumulated entries
    pub fn len(&self) -> usize {
        self.folders.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
