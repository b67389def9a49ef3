//! bv-core: Core library for the bucketview object-storage browser
//!
//! This crate provides:
//! - The listing session: paged, duplicate-free, filterable folder listings
//! - The listing client that drives a session against a storage backend
//! - Prefix parsing and navigation helpers
//! - Configuration and connection profiles
//!
//! This crate is designed to be independent of any specific S3 SDK; the
//! backend is reached only through the [`ListingService`] trait.

pub mod client;
pub mod config;
pub mod entry;
pub mod error;
pub mod path;
pub mod profile;
pub mod session;
pub mod traits;

pub use client::{
    FetchResponse, ListingClient, ListingConfig, ListingEvent, ListingObserver, PendingFetch,
    list_buckets,
};
pub use config::{Config, ConfigManager};
pub use entry::{Entry, ObjectRef, StorageTier};
pub use error::{Error, Result};
pub use path::{RemotePath, child_prefix, parent_prefix, parse_remote_path};
pub use profile::{Profile, ProfileManager};
pub use session::{FetchTicket, ListingSession, PageOutcome, Status};
pub use traits::{BucketInfo, ListPage, ListRequest, ListingService};
