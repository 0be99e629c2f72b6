use neardupe::cli::OutputFormat;
use neardupe::config::Config;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_profile() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
chunking_threshold = 50
io_threads = 4

[profile.sources]
chunking_threshold = 56
io_threads = 8
min_size = 4096

[profile.archives]
follow_symlinks = true
output = "json"
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load_from_path(config_path.clone(), Some("sources"));
    assert_eq!(config.chunking_threshold, 56); // Overridden by profile
    assert_eq!(config.io_threads, 8); // Overridden by profile
    assert_eq!(config.min_size, Some(4096)); // Set in profile
    assert!(!config.follow_symlinks); // Default from base

    let config = Config::load_from_path(config_path, Some("archives"));
    assert_eq!(config.chunking_threshold, 50); // From base
    assert!(config.follow_symlinks); // Set in profile
    assert_eq!(config.output, OutputFormat::Json);
    assert_eq!(config.min_size, None); // Not set anywhere
}

#[test]
fn test_config_profile_not_found() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
match_threshold = 0.75
[profile.strict]
match_threshold = 0.99
"#;
    fs::write(&config_path, toml_content).unwrap();

    // Unknown profile falls back to the base values
    let config = Config::load_from_path(config_path, Some("nonexistent"));
    assert_eq!(config.match_threshold, 0.75);
}

#[test]
fn test_config_list_profiles() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
[profile.sources]
chunking_threshold = 56

[profile.archives]
bucket_count = 16384
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load_from_path(config_path, None);
    assert!(config.profile.contains_key("sources"));
    assert!(config.profile.contains_key("archives"));
    assert_eq!(config.profile.len(), 2);
    // Profiles are not applied unless selected
    assert_eq!(config.bucket_count, 8192);
}

#[test]
fn test_profile_replaces_ignore_patterns() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
ignore_patterns = ["*.tmp"]

[profile.clean]
ignore_patterns = ["target/", "*.o"]
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load_from_path(config_path, Some("clean"));
    assert_eq!(config.ignore_patterns, vec!["target/", "*.o"]);
}
