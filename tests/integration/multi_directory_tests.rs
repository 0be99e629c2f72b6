use neardupe::similarity::{FinderConfig, FingerprintConfig, SimilarityFinder};
use std::fs;
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

fn finder() -> SimilarityFinder {
    SimilarityFinder::new(
        FinderConfig::default()
            .with_fingerprint_config(FingerprintConfig::new(1024, 56).unwrap())
            .with_match_threshold(0.8),
    )
}

#[test]
fn test_scan_two_non_overlapping_directories() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    let data = noise(16 * 1024, 1);
    fs::write(dir1.path().join("a.bin"), &data).unwrap();
    fs::write(dir2.path().join("b.bin"), &data).unwrap();

    let (pairs, summary) = finder()
        .find_similar(&[dir1.path().to_path_buf(), dir2.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(pairs.len(), 1);
    // Later roots are discovered later and so sit on the outer side.
    assert!(pairs[0].path_a.starts_with(dir2.path()));
    assert!(pairs[0].path_b.starts_with(dir1.path()));
}

#[test]
fn test_root_order_follows_arguments() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    let data = noise(16 * 1024, 2);
    fs::write(dir1.path().join("a.bin"), &data).unwrap();
    fs::write(dir2.path().join("b.bin"), &data).unwrap();

    let (pairs, _) = finder()
        .find_similar(&[dir2.path().to_path_buf(), dir1.path().to_path_buf()])
        .unwrap();

    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].path_a.starts_with(dir1.path()));
    assert!(pairs[0].path_b.starts_with(dir2.path()));
}

#[test]
fn test_scan_overlapping_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    let data = noise(16 * 1024, 3);
    fs::write(dir.path().join("a.bin"), &data).unwrap();
    fs::write(sub.join("b.bin"), &data).unwrap();

    // The nested root is already covered by its parent.
    let (pairs, summary) = finder()
        .find_similar(&[dir.path().to_path_buf(), sub.clone()])
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(pairs.len(), 1);
}

#[test]
fn test_same_directory_twice() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.bin"), noise(16 * 1024, 4)).unwrap();
    fs::write(dir.path().join("b.bin"), noise(16 * 1024, 5)).unwrap();

    let (pairs, summary) = finder()
        .find_similar(&[dir.path().to_path_buf(), dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert!(pairs.is_empty());
}

#[test]
fn test_mixed_file_and_directory_roots() {
    let dir = tempdir().unwrap();
    let loose = tempdir().unwrap();
    let data = noise(16 * 1024, 6);
    fs::write(dir.path().join("inside.bin"), &data).unwrap();
    let file = loose.path().join("loose.bin");
    fs::write(&file, &data).unwrap();

    let (pairs, summary) = finder()
        .find_similar(&[file.clone(), dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].path_b, file);
}
