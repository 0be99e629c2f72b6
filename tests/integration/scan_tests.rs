use neardupe::similarity::{FinderConfig, FingerprintConfig, SimilarityFinder};
use std::fs;
use std::path::Path;
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

fn small_finder() -> SimilarityFinder {
    let config = FinderConfig::default()
        .with_fingerprint_config(FingerprintConfig::new(1024, 56).unwrap())
        .with_match_threshold(0.8)
        .with_io_threads(2);
    SimilarityFinder::new(config)
}

fn write(dir: &Path, name: &str, data: &[u8]) {
    fs::write(dir.join(name), data).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let (pairs, summary) = small_finder()
        .find_similar(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(pairs.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.fingerprinted, 0);
    assert_eq!(summary.pairs_compared, 0);
}

#[test]
fn test_scan_unrelated_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.bin", &noise(16 * 1024, 1));
    write(dir.path(), "b.bin", &noise(16 * 1024, 2));
    write(dir.path(), "c.bin", &noise(16 * 1024, 3));

    let (pairs, summary) = small_finder()
        .find_similar(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(pairs.is_empty());
    assert_eq!(summary.fingerprinted, 3);
    assert_eq!(summary.pairs_compared, 3);
}

#[test]
fn test_scan_identical_files_score_one() {
    let dir = tempdir().unwrap();
    let data = noise(16 * 1024, 7);
    write(dir.path(), "a.bin", &data);
    write(dir.path(), "b.bin", &data);

    let (pairs, summary) = small_finder()
        .find_similar(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].score, 1.0);
    assert_eq!(pairs[0].path_a.file_name().unwrap(), "b.bin");
    assert_eq!(pairs[0].path_b.file_name().unwrap(), "a.bin");
    assert_eq!(pairs[0].size_a, data.len() as u64);
    assert_eq!(summary.matches, 1);
}

#[test]
fn test_scan_detects_inserted_bytes() {
    let dir = tempdir().unwrap();
    let original = noise(32 * 1024, 11);
    let mut edited = original.clone();
    edited.splice(10_000..10_000, noise(200, 99));

    write(dir.path(), "draft.bin", &original);
    write(dir.path(), "final.bin", &edited);
    write(dir.path(), "other.bin", &noise(32 * 1024, 12));

    let (pairs, summary) = small_finder()
        .find_similar(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].score >= 0.8 && pairs[0].score < 1.0);
    assert_eq!(pairs[0].path_a.file_name().unwrap(), "final.bin");
    assert_eq!(pairs[0].path_b.file_name().unwrap(), "draft.bin");
    assert_eq!(summary.pairs_compared, 3);
}

#[test]
fn test_scan_nested_directories_in_walk_order() {
    let dir = tempdir().unwrap();
    let data = noise(16 * 1024, 5);
    fs::create_dir(dir.path().join("sub")).unwrap();
    write(dir.path(), "a.bin", &data);
    write(&dir.path().join("sub"), "copy.bin", &data);

    let (pairs, _) = small_finder()
        .find_similar(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].path_a.ends_with("sub/copy.bin"));
    assert!(pairs[0].path_b.ends_with("a.bin"));
}

#[test]
fn test_scan_threshold_one_keeps_only_identical() {
    let dir = tempdir().unwrap();
    let data = noise(32 * 1024, 21);
    let mut edited = data.clone();
    edited.splice(5_000..5_000, noise(300, 22));
    write(dir.path(), "a.bin", &data);
    write(dir.path(), "b.bin", &data);
    write(dir.path(), "c.bin", &edited);

    let config = FinderConfig::default()
        .with_fingerprint_config(FingerprintConfig::new(1024, 56).unwrap())
        .with_match_threshold(1.0);
    let (pairs, _) = SimilarityFinder::new(config)
        .find_similar(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].score, 1.0);
}

#[test]
fn test_scan_default_settings_large_files() {
    let dir = tempdir().unwrap();
    let data = noise(512 * 1024, 3);
    write(dir.path(), "one.bin", &data);
    write(dir.path(), "two.bin", &data);

    let (pairs, summary) = SimilarityFinder::with_defaults()
        .find_similar(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.fingerprinted, 2);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].score, 1.0);
}

#[test]
fn test_scan_results_are_deterministic() {
    let dir = tempdir().unwrap();
    let base = noise(16 * 1024, 40);
    for i in 0..6u64 {
        let mut data = base.clone();
        data.splice(0..0, noise(64, 100 + i));
        write(dir.path(), &format!("f{i}.bin"), &data);
    }

    let roots = [dir.path().to_path_buf()];
    let (first, _) = small_finder().find_similar(&roots).unwrap();
    let (second, _) = small_finder().find_similar(&roots).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}
