//! Client for the Harbor object-storage HTTP service.
//!
//! [`Api`] issues one request per backend operation; [`Client`] layers
//! bucket and directory handles over it. Object content moves through the
//! resumable chunked transfer in `harbor-transfer`, which reaches the
//! backend through [`HttpRequester`].

pub mod api;
pub mod client;
pub mod config;
pub mod endpoint;
mod error;
pub mod http;
pub mod page;
pub mod types;
pub mod validation;

#[cfg(test)]
mod test_server;

pub use api::Api;
pub use client::{Bucket, Client, Directory};
pub use config::HarborConfig;
pub use endpoint::Endpoints;
pub use error::ClientError;
pub use http::HttpRequester;
pub use page::{DirPage, PageInfo};
pub use types::{BucketInfo, Entry, Metadata};

pub use harbor_transfer::{ProgressObserver, RateMeter, TransferOutcome, TransferReport};
