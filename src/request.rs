use std::{fmt, path::PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_JOB_PRIORITY: i32 = 10;
pub const DEFAULT_REPORT_PREFIX: &str = "batch-job-reports/";
pub const RESTORE_EXPIRATION_DAYS: i32 = 7;

/// Everything a single restore needs, loaded once and never mutated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub restore_path: String,
    pub asset_bucket_list: Vec<String>,
    pub manifest_bucket: String,
    pub manifest_key: String,
    pub manifest_local_path: PathBuf,
    pub retrieval_type: String,
    pub base_path: PathBuf,
    pub role_arn: String,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default = "default_priority")]
    pub priority: i32,

    #[serde(default = "default_report_prefix")]
    pub report_prefix: String,

    #[serde(default)]
    pub file_owner_uid: Option<u32>,

    #[serde(default)]
    pub file_owner_gid: Option<u32>,

    #[serde(default)]
    pub project_id: Option<i64>,

    #[serde(default)]
    pub user: Option<String>,
}

impl RestoreRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        let request: RestoreRequest = serde_json::from_str(json)?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.manifest_bucket.is_empty() || self.manifest_key.is_empty() {
            return Err(Error::InvalidConfig(
                "manifest bucket and key must be set".to_owned(),
            ));
        }

        if self.base_path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("base path must be set".to_owned()));
        }

        Ok(())
    }

    pub fn tier(&self) -> RetrievalTier {
        RetrievalTier::from_speed_class(&self.retrieval_type)
    }

    pub fn ownership(&self) -> Option<Ownership> {
        if self.file_owner_uid.is_none() && self.file_owner_gid.is_none() {
            None
        } else {
            Some(Ownership {
                uid: self.file_owner_uid,
                gid: self.file_owner_gid,
            })
        }
    }

    pub fn manifest_arn(&self) -> String {
        format!("arn:aws:s3:::{}/{}", self.manifest_bucket, self.manifest_key)
    }

    pub fn report_bucket_arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.manifest_bucket)
    }
}

fn default_priority() -> i32 {
    DEFAULT_JOB_PRIORITY
}

fn default_report_prefix() -> String {
    DEFAULT_REPORT_PREFIX.to_owned()
}

/// Retrieval speed class understood by the batch service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalTier {
    Standard,
    Bulk,
}

impl RetrievalTier {
    /// `standard` stands in for expedited retrieval, which batch restores don't support.
    pub fn from_speed_class(class: &str) -> Self {
        if class.eq_ignore_ascii_case("standard") {
            RetrievalTier::Standard
        } else {
            RetrievalTier::Bulk
        }
    }
}

impl fmt::Display for RetrievalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalTier::Standard => write!(f, "standard"),
            RetrievalTier::Bulk => write!(f, "bulk"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}
