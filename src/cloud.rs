use std::sync::Arc;

use aws_sdk_s3::config::Region;

use crate::{
    control::{S3ControlJobs, SharedIdentity, SharedJobs, StsIdentity},
    storage::{S3Storage, SharedStorage},
};

/// The three remote services a restore talks to.
#[derive(Debug, Clone)]
pub struct Cloud {
    pub storage: SharedStorage,
    pub jobs: SharedJobs,
    pub identity: SharedIdentity,
}

impl Cloud {
    /// Credentials come from the standard environment chain; only the region may be overridden.
    pub async fn from_env(region: Option<String>) -> Cloud {
        let mut loader = aws_config::from_env();
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }

        let config = loader.load().await;
        Cloud {
            storage: Arc::new(S3Storage::new(&config)),
            jobs: Arc::new(S3ControlJobs::new(&config)),
            identity: Arc::new(StsIdentity::new(&config)),
        }
    }
}
