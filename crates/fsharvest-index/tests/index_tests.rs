use fsharvest_index::{CacheIndex, ExtensionKey};
use fsharvest_scan::{LocalFs, Root, Traverser, WorkerPool};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn create_test_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir_all(root.join("alpha/nested/deep")).unwrap();
    fs::create_dir_all(root.join("beta")).unwrap();

    fs::write(root.join("readme.md"), "top").unwrap();
    fs::write(root.join("alpha/readme.md"), "alpha").unwrap();
    fs::write(root.join("alpha/nested/deep/readme.md"), "deep").unwrap();
    fs::write(root.join("alpha/nested/README.md"), "upper").unwrap();
    fs::write(root.join("beta/data.CSV"), "1,2").unwrap();
    fs::write(root.join("beta/other.csv"), "3,4").unwrap();
    fs::write(root.join("beta/LICENSE"), "mit").unwrap();

    temp
}

fn build(capacity: usize, roots: &[Root]) -> CacheIndex {
    let pool = WorkerPool::new(capacity).unwrap();
    let traverser = Traverser::new(&pool, &LocalFs);
    CacheIndex::build(&traverser, roots).unwrap()
}

#[test]
fn test_find_by_name_returns_all_directories() {
    let temp = create_test_tree();
    let root = temp.path();
    let index = build(4, &[Root::new("T", root)]);

    let found: BTreeSet<PathBuf> = index.lookup("readme.md").into_iter().collect();
    let expected: BTreeSet<PathBuf> = [
        root.to_path_buf(),
        root.join("alpha"),
        root.join("alpha/nested/deep"),
    ]
    .into_iter()
    .collect();

    assert_eq!(found, expected);
    assert_eq!(index.lookup("README.md"), vec![root.join("alpha/nested")]);
}

#[test]
fn test_extension_buckets() {
    let temp = create_test_tree();
    let index = build(2, &[Root::new("T", temp.path())]);

    let csv = ExtensionKey::parse_format("csv").unwrap();
    assert_eq!(index.records_for(&csv).len(), 2);
    assert_eq!(index.records_for(&ExtensionKey::undefined()).len(), 1);
    assert_eq!(index.len(), 7);
    assert_eq!(index.stats().walk.files_visited, 7);
}

#[test]
fn test_rebuild_is_idempotent_across_capacities() {
    let temp = create_test_tree();
    let roots = [Root::new("T", temp.path())];

    let first = build(1, &roots);
    let second = build(8, &roots);
    assert_eq!(first, second);
}

#[test]
fn test_multiple_roots_share_the_index() {
    let a = create_test_tree();
    let b = create_test_tree();
    let index = build(
        3,
        &[Root::new("A", a.path()), Root::new("B", b.path())],
    );

    assert_eq!(index.len(), 14);
    assert_eq!(index.lookup("data.CSV").len(), 2);
}

#[test]
fn test_unreadable_root_yields_empty_index() {
    let temp = TempDir::new().unwrap();
    let index = build(2, &[Root::new("X", temp.path().join("missing"))]);

    assert!(index.is_empty());
    assert_eq!(index.stats().walk.dirs_skipped, 1);
}
