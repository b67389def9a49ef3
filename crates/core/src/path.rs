//! Path parsing and prefix navigation
//!
//! Remote locations are written as `profile/bucket[/prefix]`. Prefixes are the
//! virtual folders of a bucket: the empty string is the bucket root and every
//! other prefix ends with [`SEPARATOR`].

use crate::error::{Error, Result};

/// Separator used to emulate folders over the flat key space
pub const SEPARATOR: char = '/';

/// Delimiter passed to the listing service
pub const DELIMITER: &str = "/";

/// A parsed remote location pointing at a folder inside a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    /// Profile name
    pub profile: String,
    /// Bucket name (empty when only the profile was given)
    pub bucket: String,
    /// Folder prefix (empty for bucket root)
    pub prefix: String,
}

impl RemotePath {
    /// Create a new RemotePath, normalizing the prefix
    pub fn new(
        profile: impl Into<String>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            profile: profile.into(),
            bucket: bucket.into(),
            prefix: normalize_prefix(&prefix.into()),
        }
    }

    /// Whether this path names a bucket (as opposed to just a profile)
    pub fn has_bucket(&self) -> bool {
        !self.bucket.is_empty()
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.bucket.is_empty() {
            write!(f, "{}/", self.profile)
        } else {
            write!(f, "{}/{}/{}", self.profile, self.bucket, self.prefix)
        }
    }
}

/// Parse `profile[/bucket[/prefix]]`
pub fn parse_remote_path(path: &str) -> Result<RemotePath> {
    if path.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".into()));
    }

    let parts: Vec<&str> = path.splitn(3, SEPARATOR).collect();
    let profile = parts[0];

    if !is_valid_profile_name(profile) {
        return Err(Error::InvalidPath(format!(
            "'{profile}' is not a valid profile name. Use format: profile/bucket[/prefix]"
        )));
    }

    let bucket = parts.get(1).copied().unwrap_or_default();
    let prefix = parts.get(2).copied().unwrap_or_default();

    if bucket.is_empty() && !prefix.is_empty() {
        return Err(Error::InvalidPath("Bucket name cannot be empty".into()));
    }

    Ok(RemotePath::new(profile, bucket, prefix))
}

/// Check if a string is a valid profile name
fn is_valid_profile_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Whether `prefix` satisfies the folder invariant
pub fn is_valid_prefix(prefix: &str) -> bool {
    prefix.is_empty() || prefix.ends_with(SEPARATOR)
}

/// Append the separator to a non-empty prefix that lacks one
pub fn normalize_prefix(prefix: &str) -> String {
    if is_valid_prefix(prefix) {
        prefix.to_string()
    } else {
        format!("{prefix}{SEPARATOR}")
    }
}

/// Prefix to open when entering `folder` from `_parent`
///
/// The listing service already returns fully-qualified common prefixes.
pub fn child_prefix(_parent: &str, folder: &str) -> String {
    folder.to_string()
}

/// Prefix one level up, or `None` at the bucket root
pub fn parent_prefix(prefix: &str) -> Option<String> {
    if prefix.is_empty() {
        return None;
    }

    let trimmed = prefix.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(pos) => Some(trimmed[..=pos].to_string()),
        None => Some(String::new()),
    }
}

/// Last non-empty segment of a folder prefix
pub fn folder_name(prefix: &str) -> &str {
    prefix
        .trim_end_matches(SEPARATOR)
        .rsplit(SEPARATOR)
        .next()
        .unwrap_or_default()
}

/// Last segment of an object key
pub fn file_name(key: &str) -> &str {
    key.rsplit(SEPARATOR).next().unwrap_or(key)
}
