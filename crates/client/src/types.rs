//! API response types.

use serde::{Deserialize, Serialize};

/// A bucket as listed by the bucket API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketInfo {
    pub id: u64,
    pub name: String,
    /// Fields this client does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Bucket list response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketList {
    #[serde(default)]
    pub buckets: Vec<BucketInfo>,
}

/// An object or a directory inside a bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    /// `true` for objects (files), `false` for directories.
    pub fod: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Entry {
    pub fn is_object(&self) -> bool {
        self.fod
    }

    pub fn is_dir(&self) -> bool {
        !self.fod
    }
}

/// Metadata response for a single path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub data: Entry,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
