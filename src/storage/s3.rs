use std::{
    pin::pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_stream::try_stream;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::{
    error::SdkError,
    operation::{get_object::GetObjectError, head_object::HeadObjectError},
    primitives::ByteStream,
    Client,
};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use log::trace;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    task::spawn_blocking,
};
use tokio_stream::{Stream, StreamExt};

use crate::error::{Error, Result};

use super::{ObjectHead, ObjectSummary, Storage, StorageStats};

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
    stats: Arc<Mutex<StorageStats>>,
}

impl S3Storage {
    pub fn new(config: &SdkConfig) -> Self {
        let client = Client::new(config);
        let stats = Arc::new(Mutex::new(StorageStats::new()));
        S3Storage { client, stats }
    }

    fn stats_mut(&self) -> MutexGuard<'_, StorageStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn objects_paginated<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> impl Stream<Item = Result<Vec<ObjectSummary>>> + 'a {
        try_stream! {
            let mut stream = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .into_paginator()
                .send();

            loop {
                let maybe_page = stream.try_next().await?;
                self.stats_mut().add_list();

                if let Some(page) = maybe_page {
                    let mut objects = vec![];
                    for object in page.contents.unwrap_or_default() {
                        let size = object
                            .size
                            .and_then(|size| u64::try_from(size).ok())
                            .unwrap_or(0);
                        if let Some(key) = object.key {
                            objects.push(ObjectSummary { key, size });
                        }
                    }

                    trace!("listed {} objects in s3://{bucket}/{prefix}", objects.len());
                    yield objects;
                } else {
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut pages = pin!(self.objects_paginated(bucket, prefix));
        let mut objects = vec![];
        while let Some(page) = pages.try_next().await? {
            objects.extend(page);
        }

        Ok(objects)
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectHead> {
        let response = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| match err.into_service_error() {
                HeadObjectError::NotFound(_) => Error::ItemNotFound {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                },
                err => Error::other(err),
            })?;
        self.stats_mut().add_head();

        Ok(ObjectHead {
            storage_class: response
                .storage_class()
                .map(|class| class.as_str().to_owned()),
            restore: response.restore().map(ToOwned::to_owned),
            e_tag: response.e_tag().map(ToOwned::to_owned),
        })
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let response_result = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(SdkError::into_service_error);
        self.stats_mut().add_head();

        match response_result {
            Ok(_) => Ok(true),
            Err(HeadObjectError::NotFound(_)) => Ok(false),
            Err(err) => Err(Error::other(err)),
        }
    }

    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
        let size = bytes.len() as u64;
        let (bytes, encoded_digest) = spawn_blocking(move || {
            let encoded_digest = md5_base64(&bytes);
            (bytes, encoded_digest)
        })
        .await?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_md5(encoded_digest)
            .send()
            .await?;

        self.stats_mut().add_put(size);
        Ok(())
    }

    async fn download(
        &self,
        bucket: &str,
        key: &str,
        writer: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| match err.into_service_error() {
                GetObjectError::NoSuchKey(_) => Error::ItemNotFound {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                },
                err => Error::other(err),
            })?;

        let mut body = response.body;
        let mut size = 0;
        while let Some(bytes) = body.try_next().await? {
            writer.write_all(&bytes).await?;
            size += bytes.len() as u64;
        }

        writer.flush().await?;
        self.stats_mut().add_get(size);
        Ok(size)
    }

    fn stats(&self) -> StorageStats {
        self.stats_mut().clone()
    }
}

fn md5_base64(bytes: &[u8]) -> String {
    let digest = md5::compute(bytes);
    BASE64_STANDARD.encode(digest.0)
}
