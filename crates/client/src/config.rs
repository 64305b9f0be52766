//! Client configuration.
//!
//! A plain record handed to the endpoint resolver and the requester at
//! construction. Every field has a default, so a partial TOML or JSON
//! document deserializes into a complete configuration.

use serde::{Deserialize, Serialize};

use harbor_transfer::DEFAULT_CHUNK_SIZE;

use crate::ClientError;

/// Connection settings for one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarborConfig {
    /// Backend origin, e.g. `http://obs.casearth.cn/`.
    #[serde(default = "default_domain_name")]
    pub domain_name: String,

    /// API version segment.
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_obj_api_prefix")]
    pub obj_api_prefix: String,

    #[serde(default = "default_dir_api_prefix")]
    pub dir_api_prefix: String,

    #[serde(default = "default_bucket_api_prefix")]
    pub bucket_api_prefix: String,

    /// API token sent as `Authorization: Token <token>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transfer chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_domain_name() -> String {
    "http://obs.casearth.cn/".into()
}

fn default_version() -> String {
    "v1".into()
}

fn default_obj_api_prefix() -> String {
    "obj".into()
}

fn default_dir_api_prefix() -> String {
    "dir".into()
}

fn default_bucket_api_prefix() -> String {
    "buckets".into()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for HarborConfig {
    fn default() -> Self {
        Self {
            domain_name: default_domain_name(),
            version: default_version(),
            obj_api_prefix: default_obj_api_prefix(),
            dir_api_prefix: default_dir_api_prefix(),
            bucket_api_prefix: default_bucket_api_prefix(),
            token: None,
            timeout_secs: default_timeout_secs(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl HarborConfig {
    /// Default configuration pointed at `domain_name`.
    pub fn with_domain(domain_name: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Checks that the configuration can produce usable endpoints.
    pub fn validate(&self) -> Result<(), ClientError> {
        let url = reqwest::Url::parse(&self.domain_name).map_err(|e| {
            ClientError::InvalidConfig(format!("domain_name {:?}: {e}", self.domain_name))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "domain_name must use http or https: {}",
                self.domain_name
            )));
        }

        for (key, value) in [
            ("version", &self.version),
            ("obj_api_prefix", &self.obj_api_prefix),
            ("dir_api_prefix", &self.dir_api_prefix),
            ("bucket_api_prefix", &self.bucket_api_prefix),
        ] {
            if value.trim_matches('/').is_empty() {
                return Err(ClientError::InvalidConfig(format!("{key} must not be empty")));
            }
        }

        if self.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig("timeout_secs must be positive".into()));
        }
        if self.chunk_size == 0 {
            return Err(ClientError::InvalidConfig("chunk_size must be positive".into()));
        }
        if self.token.as_deref().is_some_and(str::is_empty) {
            return Err(ClientError::InvalidConfig("token must not be empty".into()));
        }
        Ok(())
    }
}
