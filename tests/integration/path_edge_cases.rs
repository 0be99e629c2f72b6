use neardupe::output::CsvOutput;
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
            .with_fingerprint_config(FingerprintConfig::new(1024, 56).unwrap()),
    )
}

#[test]
fn test_paths_with_quotes_and_commas() {
    let dir = tempdir().unwrap();

    // Windows does not allow double quotes in filenames.
    if cfg!(not(windows)) {
        let data = noise(16 * 1024, 31);
        fs::write(dir.path().join("a \"quoted\", name.bin"), &data).unwrap();
        fs::write(dir.path().join("b.bin"), &data).unwrap();

        let (pairs, _) = finder().find_similar(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(pairs.len(), 1);

        let csv = CsvOutput::new(&pairs).to_string().unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert!(record[2].ends_with("a \"quoted\", name.bin"));
    }
}

#[test]
fn test_paths_with_unicode() {
    let dir = tempdir().unwrap();
    let data = noise(16 * 1024, 32);
    fs::write(dir.path().join("résumé.bin"), &data).unwrap();
    fs::write(dir.path().join("日本語.bin"), &data).unwrap();

    let (pairs, summary) = finder().find_similar(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(summary.fingerprinted, 2);
    assert_eq!(pairs.len(), 1);
}

#[test]
fn test_deeply_nested_paths() {
    let dir = tempdir().unwrap();
    let mut current = dir.path().to_path_buf();
    let folder_name = "a".repeat(50);

    for i in 0..6 {
        current = current.join(format!("{}_{}", i, folder_name));
        if fs::create_dir(&current).is_err() {
            // Some filesystems cap path length; nothing to test then.
            return;
        }
    }

    let data = noise(16 * 1024, 33);
    fs::write(current.join("deep.bin"), &data).unwrap();
    fs::write(dir.path().join("shallow.bin"), &data).unwrap();

    let (pairs, _) = finder().find_similar(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(pairs.len(), 1);
}

#[cfg(unix)]
#[test]
fn test_symlinks_not_followed_by_default() {
    let dir = tempdir().unwrap();
    let data = noise(16 * 1024, 34);
    let target = dir.path().join("target.bin");
    fs::write(&target, &data).unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("link.bin")).unwrap();

    let (pairs, summary) = finder().find_similar(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(summary.total_files, 1);
    assert!(pairs.is_empty());
}
