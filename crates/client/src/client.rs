//! High-level facade: buckets, directories and full object paths.

use std::path::Path;

use harbor_transfer::{DownloadedChunk, ProgressObserver, TransferOutcome, TransferReport};

use crate::api::Api;
use crate::page::{DEFAULT_PER_PAGE, DirPage};
use crate::types::{BucketInfo, Metadata};
use crate::validation::{split_path, validate_dir_name};
use crate::{ClientError, HarborConfig};

/// Entry point for working with a backend.
#[derive(Debug, Clone)]
pub struct Client {
    api: Api,
}

impl Client {
    pub fn new(config: &HarborConfig) -> Result<Self, ClientError> {
        Ok(Self {
            api: Api::new(config)?,
        })
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn bucket(&self, name: &str) -> Bucket<'_> {
        Bucket {
            api: &self.api,
            name: name.to_string(),
        }
    }

    pub async fn list_buckets(&self) -> Result<Vec<BucketInfo>, ClientError> {
        self.api.list_buckets().await
    }

    pub async fn bucket_permission(&self, bucket: &str, public: bool) -> Result<String, ClientError> {
        self.bucket(bucket).set_permission(public).await
    }

    /// Uploads `source` to the object at full path `obj_path`.
    pub async fn put_object(
        &self,
        bucket: &str,
        obj_path: &str,
        source: &Path,
    ) -> Result<TransferReport, ClientError> {
        let (dir, name) = split_path(obj_path);
        self.bucket(bucket).dir(dir).put_object(name, source, 0).await
    }

    pub async fn download_object(
        &self,
        bucket: &str,
        obj_path: &str,
        dest: &Path,
    ) -> Result<TransferReport, ClientError> {
        let (dir, name) = split_path(obj_path);
        self.bucket(bucket).dir(dir).download_object(name, dest, 0).await
    }

    pub async fn delete_object(&self, bucket: &str, obj_path: &str) -> Result<(), ClientError> {
        let (dir, name) = split_path(obj_path);
        self.bucket(bucket).dir(dir).delete_object(name).await
    }

    pub async fn share_object(
        &self,
        bucket: &str,
        obj_path: &str,
        share: bool,
        days: i64,
    ) -> Result<String, ClientError> {
        let (dir, name) = split_path(obj_path);
        self.bucket(bucket)
            .dir(dir)
            .share_object(name, share, days)
            .await
    }

    pub async fn object_info(&self, bucket: &str, obj_path: &str) -> Result<Metadata, ClientError> {
        let (dir, name) = split_path(obj_path);
        self.bucket(bucket).dir(dir).object_info(name).await
    }

    /// Creates the last directory of `dir_path`; its parent must exist.
    pub async fn create_dir(&self, bucket: &str, dir_path: &str) -> Result<String, ClientError> {
        let (parent, name) = split_path(dir_path.trim_end_matches('/'));
        self.bucket(bucket).dir(parent).create_dir(name).await
    }

    pub async fn delete_dir(&self, bucket: &str, dir_path: &str) -> Result<(), ClientError> {
        self.bucket(bucket).dir(dir_path).delete().await
    }

    pub async fn list_dir(
        &self,
        bucket: &str,
        dir_path: &str,
        per_page: Option<u32>,
    ) -> Result<DirPage, ClientError> {
        self.bucket(bucket).dir(dir_path).list(per_page).await
    }

    pub async fn write_one_chunk(
        &self,
        bucket: &str,
        obj_path: &str,
        offset: u64,
        chunk: &[u8],
    ) -> TransferOutcome {
        self.api.write_one_chunk(bucket, obj_path, offset, chunk).await
    }

    pub async fn read_one_chunk(
        &self,
        bucket: &str,
        obj_path: &str,
        offset: u64,
        size: u64,
    ) -> TransferOutcome<DownloadedChunk> {
        self.api.read_one_chunk(bucket, obj_path, offset, size).await
    }

    pub async fn move_object(
        &self,
        bucket: &str,
        obj_path: &str,
        to: &str,
        rename: Option<&str>,
    ) -> Result<serde_json::Value, ClientError> {
        let (dir, name) = split_path(obj_path);
        self.bucket(bucket)
            .dir(dir)
            .move_object(name, to, rename)
            .await
    }

    pub async fn rename_object(
        &self,
        bucket: &str,
        obj_path: &str,
        rename: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let (dir, name) = split_path(obj_path);
        self.bucket(bucket).dir(dir).rename_object(name, rename).await
    }

    pub async fn is_dir(&self, bucket: &str, dir_path: &str) -> Result<bool, ClientError> {
        self.api.is_dir(bucket, dir_path).await
    }

    pub async fn is_file(&self, bucket: &str, obj_path: &str) -> Result<bool, ClientError> {
        self.api.is_file(bucket, obj_path).await
    }
}

/// A named bucket.
#[derive(Debug, Clone)]
pub struct Bucket<'a> {
    api: &'a Api,
    name: String,
}

impl<'a> Bucket<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory at `path` inside this bucket (`""` is the bucket root).
    pub fn dir(&self, path: &str) -> Directory<'a> {
        Directory {
            api: self.api,
            bucket: self.name.clone(),
            path: path.trim_matches('/').to_string(),
        }
    }

    pub async fn id(&self) -> Result<Option<u64>, ClientError> {
        self.api.bucket_id(&self.name).await
    }

    pub async fn set_permission(&self, public: bool) -> Result<String, ClientError> {
        let id = self
            .id()
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("bucket {}", self.name)))?;
        self.api.set_bucket_permission(id, public).await
    }
}

/// A directory inside a bucket.
#[derive(Debug, Clone)]
pub struct Directory<'a> {
    api: &'a Api,
    bucket: String,
    path: String,
}

impl Directory<'_> {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn create_dir(&self, name: &str) -> Result<String, ClientError> {
        self.api.create_dir(&self.bucket, &self.path, name).await
    }

    pub async fn delete_dir(&self, name: &str) -> Result<(), ClientError> {
        validate_dir_name(name)?;
        self.api.delete_dir(&self.bucket, &self.path, name).await
    }

    /// Deletes this directory. The bucket root cannot be deleted.
    pub async fn delete(&self) -> Result<(), ClientError> {
        if self.path.is_empty() {
            return Err(ClientError::InvalidName(
                "cannot delete the root directory of a bucket".into(),
            ));
        }
        self.api.delete_dir(&self.bucket, &self.path, "").await
    }

    /// First page of this directory's listing.
    pub async fn list(&self, per_page: Option<u32>) -> Result<DirPage, ClientError> {
        let limit = per_page.unwrap_or(DEFAULT_PER_PAGE);
        self.api
            .list_dir(&self.bucket, &self.path, None, Some(limit))
            .await
    }

    pub async fn put_object(
        &self,
        name: &str,
        source: &Path,
        offset: u64,
    ) -> Result<TransferReport, ClientError> {
        self.put_object_with_progress(name, source, offset, None).await
    }

    pub async fn put_object_with_progress(
        &self,
        name: &str,
        source: &Path,
        offset: u64,
        observer: Option<ProgressObserver>,
    ) -> Result<TransferReport, ClientError> {
        self.api
            .upload_file(&self.bucket, &self.path, name, source, offset, observer)
            .await
    }

    pub async fn download_object(
        &self,
        name: &str,
        dest: &Path,
        offset: u64,
    ) -> Result<TransferReport, ClientError> {
        self.download_object_with_progress(name, dest, offset, None).await
    }

    pub async fn download_object_with_progress(
        &self,
        name: &str,
        dest: &Path,
        offset: u64,
        observer: Option<ProgressObserver>,
    ) -> Result<TransferReport, ClientError> {
        self.api
            .download_file(&self.bucket, &self.path, name, dest, offset, observer)
            .await
    }

    pub async fn delete_object(&self, name: &str) -> Result<(), ClientError> {
        self.api.delete_object(&self.bucket, &self.path, name).await
    }

    pub async fn share_object(
        &self,
        name: &str,
        share: bool,
        days: i64,
    ) -> Result<String, ClientError> {
        self.api
            .share_object(&self.bucket, &self.path, name, share, days)
            .await
    }

    pub async fn object_info(&self, name: &str) -> Result<Metadata, ClientError> {
        self.api.object_info(&self.bucket, &self.path, name).await
    }

    pub async fn move_object(
        &self,
        name: &str,
        to: &str,
        rename: Option<&str>,
    ) -> Result<serde_json::Value, ClientError> {
        self.api
            .move_object(&self.bucket, &self.path, name, Some(to), rename)
            .await
    }

    pub async fn rename_object(
        &self,
        name: &str,
        rename: &str,
    ) -> Result<serde_json::Value, ClientError> {
        self.api
            .move_object(&self.bucket, &self.path, name, None, Some(rename))
            .await
    }
}
