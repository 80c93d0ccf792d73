use std::collections::{hash_map::Entry, HashMap};

use log::{debug, info};

use crate::{
    error::{Error, Result},
    format::{format_path, format_size},
    manifest::{write_manifest, ManifestEntry},
    request::RestoreRequest,
    stats::ManifestStats,
    storage::Storage,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltManifest {
    pub entries: Vec<ManifestEntry>,
    pub stats: ManifestStats,
}

pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() || prefix == "/" {
        Err(Error::InvalidPrefix(prefix.to_owned()))
    } else {
        Ok(())
    }
}

/// Lists every bucket under the prefix and assigns each key to the first
/// bucket (in list order) that holds it.
pub async fn collect_entries(
    storage: &dyn Storage,
    buckets: &[String],
    prefix: &str,
) -> Result<BuiltManifest> {
    validate_prefix(prefix)?;
    if buckets.is_empty() {
        return Err(Error::EmptyBucketList);
    }

    let mut owners = HashMap::<String, String>::new();
    let mut stats = ManifestStats::default();

    for bucket in buckets {
        debug!("checking bucket {bucket} for prefix {prefix}");
        let objects = storage.list(bucket, prefix).await?;
        for object in objects {
            if let Entry::Vacant(entry) = owners.entry(object.key) {
                entry.insert(bucket.clone());
                stats.add_object(object.size);
            }
        }
    }

    if owners.is_empty() {
        return Err(Error::NoObjectsFound(prefix.to_owned()));
    }

    let mut entries = owners
        .into_iter()
        .map(|(key, bucket)| ManifestEntry { bucket, key })
        .collect::<Vec<_>>();
    entries.sort_unstable_by(|a, b| a.key.cmp(&b.key));

    Ok(BuiltManifest { entries, stats })
}

pub async fn build_manifest(storage: &dyn Storage, request: &RestoreRequest) -> Result<BuiltManifest> {
    if request.manifest_local_path.as_os_str().is_empty() {
        return Err(Error::EmptyPath);
    }

    let manifest =
        collect_entries(storage, &request.asset_bucket_list, &request.restore_path).await?;
    write_manifest(&request.manifest_local_path, &manifest.entries).await?;

    info!(
        "wrote manifest {} with {} objects ({}) from {} buckets",
        format_path(&request.manifest_local_path),
        manifest.stats.file_count,
        format_size(manifest.stats.total_size),
        request.asset_bucket_list.len()
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Arc};

    use tempfile::tempdir;

    use crate::{
        error::Error,
        manifest::{read_manifest, ManifestEntry},
        ops::tests::request_in,
        stats::ManifestStats,
        testing::FakeStorage,
    };

    use super::{build_manifest, collect_entries};

    fn buckets(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    fn project_storage() -> FakeStorage {
        let storage = FakeStorage::new();
        storage.insert("b1", "proj/a.txt", &[0; 100]);
        storage.insert("b1", "proj/shared.txt", &[1; 50]);
        storage.insert("b2", "proj/b.txt", &[2; 200]);
        storage.insert("b2", "proj/shared.txt", &[3; 50]);
        storage.insert("b2", "other/c.txt", &[4; 10]);
        storage
    }

    #[tokio::test]
    async fn first_bucket_wins() {
        let storage = project_storage();
        let manifest = collect_entries(&storage, &buckets(&["b1", "b2"]), "proj/")
            .await
            .unwrap();

        assert_eq!(
            manifest.entries,
            vec![
                ManifestEntry::new("b1", "proj/a.txt"),
                ManifestEntry::new("b2", "proj/b.txt"),
                ManifestEntry::new("b1", "proj/shared.txt"),
            ]
        );
        assert_eq!(
            manifest.stats,
            ManifestStats {
                file_count: 3,
                total_size: 350
            }
        );
    }

    #[tokio::test]
    async fn bucket_order_decides_owner() {
        let storage = project_storage();
        let manifest = collect_entries(&storage, &buckets(&["b2", "b1"]), "proj/")
            .await
            .unwrap();

        let shared = manifest
            .entries
            .iter()
            .find(|entry| entry.key == "proj/shared.txt")
            .unwrap();
        assert_eq!(shared.bucket, "b2");
    }

    #[tokio::test]
    async fn invalid_prefix_error_without_listing() {
        let storage = project_storage();
        for prefix in ["", "/"] {
            let result = collect_entries(&storage, &buckets(&["b1"]), prefix).await;
            assert_eq!(result, Err(Error::InvalidPrefix(prefix.to_owned())));
        }
        assert_eq!(FakeStorage::calls(&storage.list_calls), 0);
    }

    #[tokio::test]
    async fn empty_bucket_list_error_without_listing() {
        let storage = project_storage();
        let result = collect_entries(&storage, &[], "proj/").await;
        assert_eq!(result, Err(Error::EmptyBucketList));
        assert_eq!(FakeStorage::calls(&storage.list_calls), 0);
    }

    #[tokio::test]
    async fn no_objects_found_error() {
        let storage = project_storage();
        let result = collect_entries(&storage, &buckets(&["b1", "b2"]), "missing/").await;
        assert_eq!(result, Err(Error::NoObjectsFound("missing/".to_owned())));
        assert_eq!(FakeStorage::calls(&storage.list_calls), 2);
    }

    #[tokio::test]
    async fn build_writes_manifest_file() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(project_storage());
        let request = request_in(dir.path());

        let manifest = build_manifest(storage.as_ref(), &request).await.unwrap();
        let mut written = read_manifest(&request.manifest_local_path).await.unwrap();
        written.sort();
        let mut expected = manifest.entries.clone();
        expected.sort();
        assert_eq!(written, expected);
    }

    #[tokio::test]
    async fn build_empty_manifest_path_error() {
        let dir = tempdir().unwrap();
        let storage = project_storage();
        let mut request = request_in(dir.path());
        request.manifest_local_path = Path::new("").to_owned();

        let result = build_manifest(&storage, &request).await;
        assert_eq!(result, Err(Error::EmptyPath));
    }
}
