//! ListingService trait definition
//!
//! This trait is the only way the core reaches the object-storage service.
//! It keeps the listing session independent of any specific S3 SDK.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entry::ObjectRef;
use crate::error::Result;
use crate::path::DELIMITER;

/// Parameters of a single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// Bucket to list
    pub bucket: String,

    /// Folder prefix (empty for bucket root)
    pub prefix: String,

    /// Delimiter for grouping (always "/")
    pub delimiter: String,

    /// Maximum number of keys to return per request
    pub page_size: i32,

    /// Continuation token for pagination
    pub continuation_token: Option<String>,
}

impl ListRequest {
    /// Request for the first page of `prefix`
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>, page_size: i32) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            delimiter: DELIMITER.to_string(),
            page_size,
            continuation_token: None,
        }
    }

    /// Resume after a previous page
    pub fn with_continuation_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }
}

/// One page of a delimited listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage {
    /// Common prefixes (sub-folders), fully qualified
    pub folder_prefixes: Vec<String>,

    /// Objects directly under the prefix
    pub object_items: Vec<ObjectRef>,

    /// Token to request the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_continuation_token: Option<String>,

    /// Whether more pages are available
    pub is_truncated: bool,
}

/// A bucket visible to the configured credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    /// Bucket name
    pub name: String,

    /// Creation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<jiff::Timestamp>,
}

impl BucketInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created: None,
        }
    }
}

/// Trait for paginated, delimited listing against an object store
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingService: Send + Sync {
    /// Fetch one page of folders and objects under a prefix
    async fn list_page(&self, request: ListRequest) -> Result<ListPage>;

    /// List buckets
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_request_defaults() {
        let request = ListRequest::new("photos", "2023/", 200);
        assert_eq!(request.delimiter, "/");
        assert_eq!(request.page_size, 200);
        assert!(request.continuation_token.is_none());

        let request = request.with_continuation_token(Some("tok1".into()));
        assert_eq!(request.continuation_token.as_deref(), Some("tok1"));
    }

    #[test]
    fn test_bucket_info() {
        let info = BucketInfo::new("my-bucket");
        assert_eq!(info.name, "my-bucket");
        assert!(info.created.is_none());
    }
}
