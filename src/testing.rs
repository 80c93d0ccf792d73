//! In-memory stand-ins for the remote services.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{
    cloud::Cloud,
    control::{AccountResolver, BatchJobs, JobDescription, JobStatus, RestoreJobSpec},
    error::{Error, Result},
    storage::{ObjectHead, ObjectSummary, Storage, StorageStats},
};

pub const ACCOUNT_ID: &str = "123456789012";

type ObjectId = (String, String);

#[derive(Debug, Clone)]
struct FakeObject {
    data: Vec<u8>,
    head: ObjectHead,
}

#[derive(Debug, Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<ObjectId, FakeObject>>,
    broken_heads: Mutex<HashSet<ObjectId>>,
    broken_downloads: Mutex<HashSet<ObjectId>>,
    missing_e_tags: Mutex<bool>,
    pub list_calls: AtomicUsize,
    pub head_calls: AtomicUsize,
    pub exists_calls: AtomicUsize,
}

fn object_id(bucket: &str, key: &str) -> ObjectId {
    (bucket.to_owned(), key.to_owned())
}

fn e_tag(data: &[u8]) -> String {
    format!("\"{:x}\"", md5::compute(data))
}

impl FakeStorage {
    pub fn new() -> Self {
        FakeStorage::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        let head = ObjectHead {
            storage_class: None,
            restore: None,
            e_tag: Some(e_tag(data)),
        };
        self.insert_with_head(bucket, key, data, head);
    }

    /// Archived object; `restore` is the raw restore header, if any.
    pub fn insert_archived(&self, bucket: &str, key: &str, data: &[u8], restore: Option<&str>) {
        let head = ObjectHead {
            storage_class: Some("DEEP_ARCHIVE".to_owned()),
            restore: restore.map(ToOwned::to_owned),
            e_tag: Some(e_tag(data)),
        };
        self.insert_with_head(bucket, key, data, head);
    }

    pub fn insert_with_head(&self, bucket: &str, key: &str, data: &[u8], head: ObjectHead) {
        let object = FakeObject {
            data: data.to_vec(),
            head,
        };
        self.objects
            .lock()
            .unwrap()
            .insert(object_id(bucket, key), object);
    }

    pub fn set_restore(&self, bucket: &str, key: &str, restore: &str) {
        let mut objects = self.objects.lock().unwrap();
        let object = objects.get_mut(&object_id(bucket, key)).unwrap();
        object.head.restore = Some(restore.to_owned());
    }

    pub fn break_head(&self, bucket: &str, key: &str) {
        self.broken_heads
            .lock()
            .unwrap()
            .insert(object_id(bucket, key));
    }

    pub fn fix_head(&self, bucket: &str, key: &str) {
        self.broken_heads
            .lock()
            .unwrap()
            .remove(&object_id(bucket, key));
    }

    pub fn break_download(&self, bucket: &str, key: &str) {
        self.broken_downloads
            .lock()
            .unwrap()
            .insert(object_id(bucket, key));
    }

    pub fn hide_e_tags(&self) {
        *self.missing_e_tags.lock().unwrap() = true;
    }

    pub fn data(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&object_id(bucket, key))
            .map(|object| object.data.clone())
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for FakeStorage {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let objects = self.objects.lock().unwrap();
        let mut summaries = objects
            .iter()
            .filter(|((object_bucket, key), _)| object_bucket == bucket && key.starts_with(prefix))
            .map(|((_, key), object)| ObjectSummary {
                key: key.clone(),
                size: object.data.len() as u64,
            })
            .collect::<Vec<_>>();
        summaries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(summaries)
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectHead> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let id = object_id(bucket, key);
        if self.broken_heads.lock().unwrap().contains(&id) {
            return Err(Error::other(io::Error::other("connection reset")));
        }

        let mut head = self
            .objects
            .lock()
            .unwrap()
            .get(&id)
            .map(|object| object.head.clone())
            .ok_or_else(|| Error::ItemNotFound {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            })?;

        if *self.missing_e_tags.lock().unwrap() {
            head.e_tag = None;
        }

        Ok(head)
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        let exists = self
            .objects
            .lock()
            .unwrap()
            .contains_key(&object_id(bucket, key));
        Ok(exists)
    }

    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.insert(bucket, key, &bytes);
        Ok(())
    }

    async fn download(
        &self,
        bucket: &str,
        key: &str,
        writer: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64> {
        let id = object_id(bucket, key);
        let data = self
            .data(bucket, key)
            .ok_or_else(|| Error::ItemNotFound {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            })?;

        let broken = self.broken_downloads.lock().unwrap().contains(&id);
        if broken {
            let half = data.len() / 2;
            writer.write_all(&data[..half]).await?;
            return Err(Error::other(io::Error::other("stream interrupted")));
        }

        writer.write_all(&data).await?;
        Ok(data.len() as u64)
    }

    fn stats(&self) -> StorageStats {
        StorageStats::new()
    }
}

#[derive(Debug, Default)]
pub struct FakeJobs {
    statuses: Mutex<VecDeque<JobStatus>>,
    create_errors: Mutex<VecDeque<Error>>,
    describe_errors: Mutex<VecDeque<Error>>,
    start_errors: Mutex<VecDeque<Error>>,
    failure_reasons: Mutex<Vec<String>>,
    pub created: Mutex<Vec<RestoreJobSpec>>,
    pub describe_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
}

impl FakeJobs {
    /// Statuses returned by successive describe calls; the last one repeats.
    pub fn with_statuses<I: IntoIterator<Item = JobStatus>>(statuses: I) -> Self {
        FakeJobs {
            statuses: Mutex::new(statuses.into_iter().collect()),
            ..FakeJobs::default()
        }
    }

    pub fn fail_next_create(&self, error: Error) {
        self.create_errors.lock().unwrap().push_back(error);
    }

    pub fn fail_next_describe(&self, error: Error) {
        self.describe_errors.lock().unwrap().push_back(error);
    }

    pub fn fail_next_start(&self, error: Error) {
        self.start_errors.lock().unwrap().push_back(error);
    }

    pub fn set_failure_reasons(&self, reasons: &[&str]) {
        *self.failure_reasons.lock().unwrap() =
            reasons.iter().map(|reason| (*reason).to_owned()).collect();
    }
}

#[async_trait]
impl BatchJobs for FakeJobs {
    async fn create_restore_job(&self, account_id: &str, spec: &RestoreJobSpec) -> Result<String> {
        assert_eq!(account_id, ACCOUNT_ID);
        self.created.lock().unwrap().push(spec.clone());
        if let Some(error) = self.create_errors.lock().unwrap().pop_front() {
            return Err(error);
        }

        let count = self.created.lock().unwrap().len();
        Ok(format!("job-{count}"))
    }

    async fn describe_job(&self, _account_id: &str, _job_id: &str) -> Result<JobDescription> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.describe_errors.lock().unwrap().pop_front() {
            return Err(error);
        }

        let mut statuses = self.statuses.lock().unwrap();
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().copied()
        };
        let status = next.unwrap_or(JobStatus::Suspended);

        Ok(JobDescription {
            status,
            failure_reasons: self.failure_reasons.lock().unwrap().clone(),
            progress: None,
        })
    }

    async fn start_job(&self, _account_id: &str, _job_id: &str) -> Result<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        match self.start_errors.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
pub struct FakeIdentity;

#[async_trait]
impl AccountResolver for FakeIdentity {
    async fn account_id(&self) -> Result<String> {
        Ok(ACCOUNT_ID.to_owned())
    }
}

pub fn fake_cloud(storage: Arc<FakeStorage>, jobs: Arc<FakeJobs>) -> Cloud {
    Cloud {
        storage,
        jobs,
        identity: Arc::new(FakeIdentity),
    }
}
