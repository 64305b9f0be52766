//! Request formatting for bucket, directory and object resources.
//!
//! Each method issues one request (or one transfer) and maps the backend's
//! status codes onto `Result`.

use std::path::Path;

use harbor_transfer::{
    DownloadOrchestrator, DownloadedChunk, HttpResponse, ProgressObserver, TransferOutcome,
    TransferReport, UploadOrchestrator, download_chunk, upload_chunk,
};
use reqwest::Method;
use tracing::{debug, warn};

use crate::endpoint::{Endpoints, join_url};
use crate::http::HttpRequester;
use crate::page::DirPage;
use crate::types::{BucketInfo, BucketList, Metadata};
use crate::validation::{path_breadcrumbs, validate_dir_name, validate_object_name};
use crate::{ClientError, HarborConfig};

/// Low-level client: one method per backend operation.
#[derive(Debug, Clone)]
pub struct Api {
    requester: HttpRequester,
    endpoints: Endpoints,
    chunk_size: usize,
}

impl Api {
    /// Validates `config` and builds the requester and endpoints from it.
    pub fn new(config: &HarborConfig) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self {
            requester: HttpRequester::new(config)?,
            endpoints: Endpoints::new(config),
            chunk_size: config.chunk_size,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn requester(&self) -> &HttpRequester {
        &self.requester
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<HttpResponse, ClientError> {
        Ok(self.requester.send(method, url, query).await?)
    }

    // -----------------------------------------------------------------------
    // Buckets
    // -----------------------------------------------------------------------

    pub async fn list_buckets(&self) -> Result<Vec<BucketInfo>, ClientError> {
        let resp = self
            .request(Method::GET, &self.endpoints.bucket_list_url(), &[])
            .await?;
        let list: BucketList = expect_status(resp, &[200])?.json()?;
        Ok(list.buckets)
    }

    /// Looks up a bucket id by name.
    pub async fn bucket_id(&self, name: &str) -> Result<Option<u64>, ClientError> {
        let buckets = self.list_buckets().await?;
        Ok(buckets.into_iter().find(|b| b.name == name).map(|b| b.id))
    }

    /// Makes a bucket public or private.
    pub async fn set_bucket_permission(&self, id: u64, public: bool) -> Result<String, ClientError> {
        let flag = if public { "1" } else { "2" };
        let resp = self
            .request(
                Method::PATCH,
                &self.endpoints.bucket_url(id),
                &[("public", flag.to_string())],
            )
            .await?;
        Ok(expect_status(resp, &[200])?.message())
    }

    // -----------------------------------------------------------------------
    // Directories
    // -----------------------------------------------------------------------

    /// Creates directory `name` under `base`. An existing directory counts
    /// as created.
    pub async fn create_dir(
        &self,
        bucket: &str,
        base: &str,
        name: &str,
    ) -> Result<String, ClientError> {
        validate_dir_name(name)?;
        let url = self.endpoints.dir_url(bucket, base, name);
        let resp = self.request(Method::POST, &url, &[]).await?;
        match resp.status {
            201 => Ok(resp.message()),
            400 if is_existing(&resp) => {
                debug!(bucket, base, name, "directory already exists");
                Ok(resp.message())
            }
            _ => Err(api_error(resp)),
        }
    }

    /// Deletes directory `name` under `base`; an empty `name` deletes `base`.
    pub async fn delete_dir(
        &self,
        bucket: &str,
        base: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        let url = self.endpoints.dir_url(bucket, base, name);
        let resp = self.request(Method::DELETE, &url, &[]).await?;
        expect_status(resp, &[200, 204])?;
        Ok(())
    }

    /// Lists one page of a directory.
    pub async fn list_dir(
        &self,
        bucket: &str,
        dir_path: &str,
        offset: Option<u64>,
        limit: Option<u32>,
    ) -> Result<DirPage, ClientError> {
        let mut query = Vec::new();
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let url = self.endpoints.dir_url(bucket, dir_path, "");
        let resp = self.request(Method::GET, &url, &query).await?;
        Ok(expect_status(resp, &[200])?.json()?)
    }

    /// Fetches a listing page from an absolute URL (`next`/`previous` links).
    pub async fn list_dir_by_url(&self, url: &str) -> Result<DirPage, ClientError> {
        let resp = self.request(Method::GET, url, &[]).await?;
        Ok(expect_status(resp, &[200])?.json()?)
    }

    /// Creates every level of `dir_path` below `base_dir`.
    ///
    /// Each level is attempted twice before giving up.
    pub async fn create_path(
        &self,
        bucket: &str,
        dir_path: &str,
        base_dir: &str,
    ) -> Result<(), ClientError> {
        for (name, parent) in path_breadcrumbs(dir_path, base_dir) {
            if let Err(e) = self.create_dir(bucket, &parent, &name).await {
                warn!(
                    bucket,
                    parent = %parent,
                    name = %name,
                    error = %e,
                    "create directory failed, retrying"
                );
                self.create_dir(bucket, &parent, &name).await?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    pub async fn delete_object(
        &self,
        bucket: &str,
        dir_path: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        validate_object_name(name)?;
        let url = self.endpoints.object_url(bucket, dir_path, name);
        let resp = self.request(Method::DELETE, &url, &[]).await?;
        expect_status(resp, &[200, 204])?;
        Ok(())
    }

    /// Shares an object publicly for `days` days (0 means forever), or makes
    /// it private again when `share` is false.
    pub async fn share_object(
        &self,
        bucket: &str,
        dir_path: &str,
        name: &str,
        share: bool,
        days: i64,
    ) -> Result<String, ClientError> {
        validate_object_name(name)?;
        let url = self.endpoints.object_url(bucket, dir_path, name);
        let query = [("share", share.to_string()), ("days", days.to_string())];
        let resp = self.request(Method::PATCH, &url, &query).await?;
        Ok(expect_status(resp, &[200])?.message())
    }

    pub async fn object_info(
        &self,
        bucket: &str,
        dir_path: &str,
        name: &str,
    ) -> Result<Metadata, ClientError> {
        validate_object_name(name)?;
        self.metadata(bucket, &join_url(dir_path, &[name])).await
    }

    /// Metadata of an object or directory by full path.
    pub async fn metadata(&self, bucket: &str, path: &str) -> Result<Metadata, ClientError> {
        let url = self.endpoints.metadata_url(bucket, path);
        let resp = self.request(Method::GET, &url, &[]).await?;
        Ok(expect_status(resp, &[200])?.json()?)
    }

    /// Moves an object to directory `to`, optionally renaming it.
    ///
    /// Without `to` the object stays in place and only `rename` applies.
    pub async fn move_object(
        &self,
        bucket: &str,
        dir_path: &str,
        name: &str,
        to: Option<&str>,
        rename: Option<&str>,
    ) -> Result<serde_json::Value, ClientError> {
        validate_object_name(name)?;
        if let Some(rename) = rename {
            validate_object_name(rename)?;
        }

        let mut query = Vec::new();
        if let Some(to) = to {
            query.push(("move_to", to.to_string()));
        }
        if let Some(rename) = rename {
            query.push(("rename", rename.to_string()));
        }
        let url = self.endpoints.move_url(bucket, dir_path, name);
        let resp = self.request(Method::POST, &url, &query).await?;
        Ok(expect_status(resp, &[200, 201])?.json()?)
    }

    /// Whether `path` names a directory. A missing path is not one.
    pub async fn is_dir(&self, bucket: &str, path: &str) -> Result<bool, ClientError> {
        match self.metadata(bucket, path).await {
            Ok(meta) => Ok(meta.data.is_dir()),
            Err(ClientError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether `path` names an object. A missing path is not one.
    pub async fn is_file(&self, bucket: &str, path: &str) -> Result<bool, ClientError> {
        match self.metadata(bucket, path).await {
            Ok(meta) => Ok(meta.data.is_object()),
            Err(ClientError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // -----------------------------------------------------------------------
    // Transfers
    // -----------------------------------------------------------------------

    /// Uploads one chunk of the object at full path `obj_path`.
    pub async fn write_one_chunk(
        &self,
        bucket: &str,
        obj_path: &str,
        offset: u64,
        chunk: &[u8],
    ) -> TransferOutcome {
        let url = self.endpoints.object_url(bucket, obj_path, "");
        upload_chunk(&self.requester, &url, offset, chunk).await
    }

    /// Downloads up to `size` bytes at `offset` of the object at `obj_path`.
    pub async fn read_one_chunk(
        &self,
        bucket: &str,
        obj_path: &str,
        offset: u64,
        size: u64,
    ) -> TransferOutcome<DownloadedChunk> {
        let url = self.endpoints.object_url(bucket, obj_path, "");
        download_chunk(&self.requester, &url, offset, size).await
    }

    /// Uploads a local file as object `name` in `dir_path`, from byte `start`.
    pub async fn upload_file(
        &self,
        bucket: &str,
        dir_path: &str,
        name: &str,
        source: &Path,
        start: u64,
        observer: Option<ProgressObserver>,
    ) -> Result<TransferReport, ClientError> {
        validate_object_name(name)?;
        let url = self.endpoints.object_url(bucket, dir_path, name);

        let mut orchestrator =
            UploadOrchestrator::new(&self.requester).with_chunk_size(self.chunk_size);
        if let Some(observer) = observer {
            orchestrator = orchestrator.with_observer(observer);
        }
        Ok(orchestrator.upload_file(&url, source, start).await?)
    }

    /// Downloads object `name` in `dir_path` to a local file, from byte `start`.
    pub async fn download_file(
        &self,
        bucket: &str,
        dir_path: &str,
        name: &str,
        dest: &Path,
        start: u64,
        observer: Option<ProgressObserver>,
    ) -> Result<TransferReport, ClientError> {
        validate_object_name(name)?;
        let url = self.endpoints.object_url(bucket, dir_path, name);

        let mut orchestrator =
            DownloadOrchestrator::new(&self.requester).with_chunk_size(self.chunk_size as u64);
        if let Some(observer) = observer {
            orchestrator = orchestrator.with_observer(observer);
        }
        Ok(orchestrator.download_object(&url, dest, start).await?)
    }
}

fn is_existing(resp: &HttpResponse) -> bool {
    resp.json::<serde_json::Value>()
        .ok()
        .and_then(|v| v.get("existing").and_then(serde_json::Value::as_bool))
        .unwrap_or(false)
}

fn api_error(resp: HttpResponse) -> ClientError {
    let message = resp.message();
    if resp.status == 404 {
        ClientError::NotFound(message)
    } else {
        ClientError::Api {
            status: resp.status,
            message,
        }
    }
}

fn expect_status(resp: HttpResponse, ok: &[u16]) -> Result<HttpResponse, ClientError> {
    if ok.contains(&resp.status) {
        Ok(resp)
    } else {
        Err(api_error(resp))
    }
}
