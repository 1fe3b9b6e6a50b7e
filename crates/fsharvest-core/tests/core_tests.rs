use fsharvest_core::{
    ConfigError, Depth, ExtensionKey, FileContent, FileRecord, FormatSet, HarvestError, Root,
    SearchConfig, UNDEFINED_EXTENSION,
};
use std::collections::HashSet;
use std::path::PathBuf;

#[test]
fn test_extension_keys_fold_case() {
    let upper = ExtensionKey::of_name("REPORT.PDF");
    let lower = ExtensionKey::of_name("report.pdf");
    assert_eq!(upper, lower);

    let mut set = HashSet::new();
    set.insert(upper);
    assert!(set.contains(&lower));
}

#[test]
fn test_undefined_extension_sentinel() {
    let key = ExtensionKey::of_name("README");
    assert!(key.is_undefined());
    assert_eq!(key.as_str(), UNDEFINED_EXTENSION);
    assert_eq!(key, ExtensionKey::undefined());
}

#[test]
fn test_file_record_paths() {
    let record = FileRecord::new("/data/docs", "a.TXT");
    assert_eq!(record.full_path(), PathBuf::from("/data/docs/a.TXT"));
    assert_eq!(record.dir(), PathBuf::from("/data/docs").as_path());
    assert_eq!(record.extension().as_str(), ".txt");
}

#[test]
fn test_file_record_equality_uses_name_and_path() {
    let a = FileRecord::new("/x", "same.txt");
    let b = FileRecord::new("/x", "same.txt");
    let c = FileRecord::new("/y", "same.txt");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a < c);
}

#[test]
fn test_file_content() {
    let content = FileContent::new(FileRecord::new("/x", "a.bin"), vec![1, 2, 3]);
    assert_eq!(content.len(), 3);
    assert!(!content.is_empty());
}

#[test]
fn test_configure_surface() {
    let config = SearchConfig::configure([".txt", "PDF"], 0, "/out");
    assert_eq!(config.require_depth(), Ok(Depth::Unlimited));
    assert_eq!(config.require_formats().map(FormatSet::len), Ok(2));

    let unset = SearchConfig::configure(Vec::<String>::new(), -1, "/out");
    assert_eq!(unset.require_formats().err(), Some(ConfigError::NoFormats));
    assert_eq!(unset.require_depth(), Err(ConfigError::UnconfiguredDepth));
}

#[test]
fn test_config_toml_roundtrip_preserves_formats() {
    let config = SearchConfig::configure(["pdf"], 3, "/out");
    let text = toml::to_string(&config).unwrap();
    let parsed = SearchConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_bad_toml_is_config_file_error() {
    let err = SearchConfig::from_toml_str("depth = \"deep\"").unwrap_err();
    assert!(matches!(err, HarvestError::ConfigFile { .. }));
    assert_eq!(err.status_code(), -7);
}

#[test]
fn test_root_display() {
    let root = Root::new("C", "/mnt/c");
    assert_eq!(root.to_string(), "C (/mnt/c)");
}
