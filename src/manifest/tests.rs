use std::path::Path;

use tempfile::tempdir;

use crate::error::Error;

use super::{decode, encode, read_manifest, write_manifest, ManifestEntry};

#[test]
fn decode_plain_records() {
    let text = "bucket1,key1\nbucket2,key2\nbucket3,key3";
    let entries = decode(text).unwrap();
    assert_eq!(
        entries,
        vec![
            ManifestEntry::new("bucket1", "key1"),
            ManifestEntry::new("bucket2", "key2"),
            ManifestEntry::new("bucket3", "key3"),
        ]
    );
}

#[test]
fn decode_skips_blank_lines() {
    let text = "b1,proj/a.txt\n\nb2,proj/b.txt\n";
    let entries = decode(text).unwrap();
    assert_eq!(entries.len(), 2);
}

#[test]
fn decode_crlf() {
    let entries = decode("b1,proj/a.txt\r\nb2,proj/b.txt\r\n").unwrap();
    assert_eq!(entries[0].key, "proj/a.txt");
    assert_eq!(entries[1].key, "proj/b.txt");
}

#[test]
fn encode_quotes_keys_with_delimiters() {
    let entries = vec![
        ManifestEntry::new("b1", "proj/plain.txt"),
        ManifestEntry::new("b1", "proj/take 1, take 2.mov"),
        ManifestEntry::new("b1", "proj/\"final\".wav"),
    ];
    let text = encode(&entries);
    assert_eq!(
        text,
        "b1,proj/plain.txt\nb1,\"proj/take 1, take 2.mov\"\nb1,\"proj/\"\"final\"\".wav\"\n"
    );
    assert_eq!(decode(&text).unwrap(), entries);
}

#[test]
fn decode_quoted_line_break() {
    let entries = vec![ManifestEntry::new("b1", "proj/line\nbreak.txt")];
    let text = encode(&entries);
    assert_eq!(decode(&text).unwrap(), entries);
}

#[test]
fn decode_wrong_field_count_error() {
    let result = decode("b1,proj/a.txt\nb1\n");
    assert_eq!(
        result,
        Err(Error::InvalidManifestRecord {
            line: 2,
            record: "b1".to_owned()
        })
    );
}

#[test]
fn decode_unterminated_quote_error() {
    let result = decode("b1,\"proj/a.txt\n");
    assert!(matches!(
        result,
        Err(Error::InvalidManifestRecord { line: 1, .. })
    ));
}

#[test]
fn entry_is_directory() {
    assert!(ManifestEntry::new("b1", "proj/folder/").is_directory());
    assert!(!ManifestEntry::new("b1", "proj/folder/file").is_directory());
}

#[tokio::test]
async fn manifest_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("manifest.csv");
    let entries = vec![
        ManifestEntry::new("b1", "proj/a.txt"),
        ManifestEntry::new("b2", "proj/b.txt"),
    ];

    write_manifest(&path, &entries).await.unwrap();
    assert_eq!(read_manifest(&path).await.unwrap(), entries);
}

#[tokio::test]
async fn write_manifest_empty_path_error() {
    let result = write_manifest(Path::new(""), &[]).await;
    assert_eq!(result, Err(Error::EmptyPath));
}
