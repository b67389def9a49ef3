//! Listing entries
//!
//! A folder is identified by its fully-qualified prefix, an object by its key.

use serde::{Deserialize, Serialize};

use crate::path::{file_name, folder_name};

/// Storage class reported for an object
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StorageTier {
    #[default]
    Standard,
    ReducedRedundancy,
    StandardIa,
    OnezoneIa,
    IntelligentTiering,
    Glacier,
    GlacierIr,
    DeepArchive,
    Outposts,
    /// Any class this crate does not know about, kept verbatim
    Other(String),
}

impl StorageTier {
    /// Wire name of the storage class
    pub fn as_str(&self) -> &str {
        match self {
            StorageTier::Standard => "STANDARD",
            StorageTier::ReducedRedundancy => "REDUCED_REDUNDANCY",
            StorageTier::StandardIa => "STANDARD_IA",
            StorageTier::OnezoneIa => "ONEZONE_IA",
            StorageTier::IntelligentTiering => "INTELLIGENT_TIERING",
            StorageTier::Glacier => "GLACIER",
            StorageTier::GlacierIr => "GLACIER_IR",
            StorageTier::DeepArchive => "DEEP_ARCHIVE",
            StorageTier::Outposts => "OUTPOSTS",
            StorageTier::Other(s) => s,
        }
    }

    /// Objects in these tiers must be restored before their content can be read
    pub fn is_archived(&self) -> bool {
        matches!(self, StorageTier::Glacier | StorageTier::DeepArchive)
    }
}

impl From<&str> for StorageTier {
    fn from(s: &str) -> Self {
        match s {
            "" | "STANDARD" => StorageTier::Standard,
            "REDUCED_REDUNDANCY" => StorageTier::ReducedRedundancy,
            "STANDARD_IA" => StorageTier::StandardIa,
            "ONEZONE_IA" => StorageTier::OnezoneIa,
            "INTELLIGENT_TIERING" => StorageTier::IntelligentTiering,
            "GLACIER" => StorageTier::Glacier,
            "GLACIER_IR" => StorageTier::GlacierIr,
            "DEEP_ARCHIVE" => StorageTier::DeepArchive,
            "OUTPOSTS" => StorageTier::Outposts,
            other => StorageTier::Other(other.to_string()),
        }
    }
}

impl From<String> for StorageTier {
    fn from(s: String) -> Self {
        StorageTier::from(s.as_str())
    }
}

impl From<StorageTier> for String {
    fn from(tier: StorageTier) -> Self {
        tier.as_str().to_string()
    }
}

impl std::fmt::Display for StorageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf object returned by the listing service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Full object key
    pub key: String,

    /// Size in bytes
    pub size: u64,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,

    /// Storage class
    #[serde(default)]
    pub storage_tier: StorageTier,
}

impl ObjectRef {
    /// Create an object reference with only key and size set
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified: None,
            storage_tier: StorageTier::Standard,
        }
    }

    /// Last path segment of the key
    pub fn name(&self) -> &str {
        file_name(&self.key)
    }

    /// Human-readable size
    pub fn size_human(&self) -> String {
        humansize::format_size(self.size, humansize::BINARY)
    }
}

/// A borrowed view of one accumulated entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a> {
    /// Sub-folder, as its fully-qualified prefix
    Folder(&'a str),
    /// Leaf object
    Object(&'a ObjectRef),
}

impl<'a> Entry<'a> {
    /// Identity within a listing: the prefix or the key
    pub fn identity(&self) -> &'a str {
        match *self {
            Entry::Folder(prefix) => prefix,
            Entry::Object(object) => &object.key,
        }
    }

    /// Name shown to the user and matched by filters
    pub fn display_name(&self) -> &'a str {
        match *self {
            Entry::Folder(prefix) => folder_name(prefix),
            Entry::Object(object) => file_name(&object.key),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Entry::Folder(_))
    }
}
