use neardupe::scanner::{FileEntry, ReadError};
use neardupe::similarity::{FinderConfig, FingerprintConfig, SimilarityFinder};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

#[test]
fn test_find_similar_in_files_continues_on_read_error() {
    let dir = tempdir().unwrap();
    let data = noise(16 * 1024, 9);
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");
    fs::write(&a, &data).unwrap();
    fs::write(&b, &data).unwrap();

    let files = vec![
        FileEntry::new(a, data.len() as u64),
        FileEntry::new(PathBuf::from("nonexistent_1.bin"), 100),
        FileEntry::new(b, data.len() as u64),
    ];

    let config = FinderConfig::default()
        .with_fingerprint_config(FingerprintConfig::new(1024, 56).unwrap());
    let (pairs, summary) = SimilarityFinder::new(config)
        .find_similar_in_files(files)
        .unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.fingerprinted, 2);
    assert_eq!(summary.read_errors.len(), 1);
    assert!(summary.has_read_errors());

    match &summary.read_errors[0] {
        ReadError::NotFound(path) => assert_eq!(path, &PathBuf::from("nonexistent_1.bin")),
        other => panic!("Expected NotFound ReadError, got: {:?}", other),
    }
}

#[test]
fn test_all_reads_failing_is_not_fatal() {
    let files = vec![
        FileEntry::new(PathBuf::from("nonexistent_1.bin"), 100),
        FileEntry::new(PathBuf::from("nonexistent_2.bin"), 100),
    ];

    let (pairs, summary) = SimilarityFinder::with_defaults()
        .find_similar_in_files(files)
        .unwrap();

    assert!(pairs.is_empty());
    assert_eq!(summary.read_errors.len(), 2);
    assert_eq!(summary.fingerprinted, 0);
    assert_eq!(summary.pairs_compared, 0);
}

#[test]
fn test_rejected_files_are_recorded_in_order() {
    let dir = tempdir().unwrap();
    let small = dir.path().join("small.bin");
    let eight = dir.path().join("eight.bin");
    fs::write(&small, b"tiny file").unwrap();
    fs::write(&eight, b"12345678").unwrap();

    let files = vec![FileEntry::new(small, 9), FileEntry::new(eight, 8)];
    let (_, summary) = SimilarityFinder::with_defaults()
        .find_similar_in_files(files)
        .unwrap();

    assert_eq!(summary.skipped_undersized, 1);
    assert_eq!(summary.skipped_degenerate, 1);
    assert_eq!(summary.skipped.len(), 2);
    assert!(summary.skipped[0].path.ends_with("small.bin"));
    assert!(summary.skipped[1].path.ends_with("eight.bin"));
    assert!(summary.read_errors.is_empty());
}
