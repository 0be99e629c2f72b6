use neardupe::cli::OutputFormat;
use neardupe::error::ExitCode;
use neardupe::output::Report;
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

fn render(format: OutputFormat) -> String {
    let dir = tempdir().unwrap();
    let data = noise(16 * 1024, 17);
    fs::write(dir.path().join("a.bin"), &data).unwrap();
    fs::write(dir.path().join("b.bin"), &data).unwrap();
    fs::write(dir.path().join("tiny.bin"), b"tiny").unwrap();

    let finder = SimilarityFinder::new(
        FinderConfig::default()
            .with_fingerprint_config(FingerprintConfig::new(1024, 56).unwrap()),
    );
    let (pairs, summary) = finder.find_similar(&[dir.path().to_path_buf()]).unwrap();
    let exit_code = ExitCode::for_scan(pairs.len(), summary.has_read_errors());

    let report = Report {
        pairs: &pairs,
        summary: &summary,
        config: finder.config(),
        exit_code,
    };
    let mut out = Vec::new();
    report.write(format, &mut out, false).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_text_export() {
    let text = render(OutputFormat::Text);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "Read and processed 2 files.");
    assert_eq!(lines[1], "B=1024 T=56");
    assert_eq!(lines[2], "1.000000");
    assert!(lines[3].starts_with("  ") && lines[3].ends_with("b.bin"));
    assert!(lines[4].starts_with("  ") && lines[4].ends_with("a.bin"));
    assert_eq!(lines[5], "16384,16384");
    assert_eq!(lines[6], "");
    assert!(lines[7].starts_with("1 similar pair among 3 files"));
    assert!(lines[7].ends_with("1 skipped"));
}

#[test]
fn test_json_export() {
    let json = render(OutputFormat::Json);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["matches"].as_array().unwrap().len(), 1);
    assert_eq!(value["matches"][0]["score"], 1.0);
    assert_eq!(value["skipped"].as_array().unwrap().len(), 1);
    assert_eq!(value["settings"]["bucket_count"], 1024);
    assert_eq!(value["summary"]["exit_code"], 0);
}

#[test]
fn test_csv_export() {
    let csv = render(OutputFormat::Csv);
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "score,path_a,path_b,size_a,size_b");
    assert!(lines[1].starts_with("1.000000,"));
    assert!(lines[1].ends_with(",16384,16384"));
}
