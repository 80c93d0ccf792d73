mod s3;
mod stats;

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::error::{Error, Result};

pub use {s3::S3Storage, stats::StorageStats};

pub type SharedStorage = Arc<dyn Storage>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}

/// Object metadata as returned by a HEAD request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectHead {
    pub storage_class: Option<String>,
    /// Raw `x-amz-restore` header, e.g. `ongoing-request="false", expiry-date="..."`.
    pub restore: Option<String>,
    pub e_tag: Option<String>,
}

#[async_trait]
pub trait Storage: Debug + Send + Sync {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>>;
    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectHead>;
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool>;
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Streams the object body into `writer`, returning the number of bytes written.
    async fn download(
        &self,
        bucket: &str,
        key: &str,
        writer: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64>;

    fn stats(&self) -> StorageStats;

    async fn e_tag(&self, bucket: &str, key: &str) -> Result<String> {
        let head = self.head(bucket, key).await?;
        head.e_tag.ok_or_else(|| Error::MissingETag {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        })
    }
}
