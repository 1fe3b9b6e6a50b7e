use fsharvest_scan::{
    Depth, DirEntry, EntryKind, FileSystem, FixedRoots, LocalFs, Root, RootProvider, Traverser,
    WorkerPool,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// In-memory directory tree with optional unreadable directories.
#[derive(Default)]
struct MemFs {
    dirs: HashMap<PathBuf, Vec<DirEntry>>,
    denied: HashSet<PathBuf>,
}

impl MemFs {
    fn dir(mut self, path: &str, entries: Vec<DirEntry>) -> Self {
        self.dirs.insert(PathBuf::from(path), entries);
        self
    }

    fn deny(mut self, path: &str) -> Self {
        self.denied.insert(PathBuf::from(path));
        self
    }
}

impl FileSystem for MemFs {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        if self.denied.contains(dir) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        self.dirs
            .get(dir)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
    }

    fn read(&self, _path: &Path) -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "read"))
    }

    fn write(&self, _path: &Path, _data: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "write"))
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "mkdir"))
    }
}

/// Build a tree `levels` deep with `fanout` subdirectories and two files
/// per directory.
fn build_tree(root: &Path, levels: u32, fanout: u32) {
    fn build(dir: &Path, level: u32, levels: u32, fanout: u32) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(format!("l{level}_a.txt")), "a").unwrap();
        fs::write(dir.join(format!("l{level}_b.bin")), "b").unwrap();
        if level < levels {
            for i in 0..fanout {
                build(&dir.join(format!("d{i}")), level + 1, levels, fanout);
            }
        }
    }
    build(root, 0, levels, fanout);
}

/// Files at directory depth <= `max` (None = all), computed sequentially.
fn expected_files(root: &Path, max: Option<u32>) -> BTreeSet<PathBuf> {
    fn collect(dir: &Path, level: u32, max: Option<u32>, out: &mut BTreeSet<PathBuf>) {
        for entry in fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            if path.is_dir() {
                if max.is_none_or(|m| level < m) {
                    collect(&path, level + 1, max, out);
                }
            } else {
                out.insert(path);
            }
        }
    }
    let mut out = BTreeSet::new();
    collect(root, 0, max, &mut out);
    out
}

fn walk_files(pool: &WorkerPool, roots: &[Root], depth: Depth) -> Vec<PathBuf> {
    let traverser = Traverser::new(pool, &LocalFs);
    let seen = Mutex::new(Vec::new());
    traverser
        .walk_roots(roots, depth, &|dir: &Path, name: &str| {
            seen.lock().unwrap().push(dir.join(name));
        })
        .unwrap();
    seen.into_inner().unwrap()
}

#[test]
fn test_result_set_independent_of_capacity() {
    let temp = TempDir::new().unwrap();
    build_tree(temp.path(), 3, 3);
    let roots = vec![Root::new("T", temp.path())];

    for (depth, max) in [
        (Depth::Unlimited, None),
        (Depth::Limited(1), Some(1)),
        (Depth::Limited(2), Some(2)),
        (Depth::Limited(5), Some(5)),
    ] {
        let expected = expected_files(temp.path(), max);

        for capacity in [1, 2, 8] {
            let pool = WorkerPool::new(capacity).unwrap();
            let visited = walk_files(&pool, &roots, depth);

            // Every file exactly once.
            let unique: BTreeSet<PathBuf> = visited.iter().cloned().collect();
            assert_eq!(unique.len(), visited.len(), "duplicate visits, capacity {capacity}");
            assert_eq!(unique, expected, "depth {depth:?}, capacity {capacity}");
        }
    }
}

#[test]
fn test_in_flight_never_exceeds_capacity() {
    let temp = TempDir::new().unwrap();
    build_tree(temp.path(), 3, 4);
    let roots = vec![
        Root::new("A", temp.path().join("d0")),
        Root::new("B", temp.path().join("d1")),
        Root::new("C", temp.path().join("d2")),
    ];

    for capacity in [1, 2, 8] {
        let pool = WorkerPool::new(capacity).unwrap();
        let traverser = Traverser::new(&pool, &LocalFs);
        let active = AtomicUsize::new(0);
        let max_active = AtomicUsize::new(0);

        traverser
            .walk_roots(&roots, Depth::Unlimited, &|_: &Path, _: &str| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_micros(200));
                active.fetch_sub(1, Ordering::SeqCst);
            })
            .unwrap();

        assert!(max_active.load(Ordering::SeqCst) <= capacity);
        assert!(pool.peak_in_flight() <= capacity);
        assert_eq!(pool.in_flight(), 0);
        assert_eq!(pool.available(), capacity);
    }
}

#[test]
fn test_capacity_one_visits_every_file_once() {
    let temp = TempDir::new().unwrap();
    build_tree(temp.path(), 4, 2);
    let pool = WorkerPool::new(1).unwrap();
    let traverser = Traverser::new(&pool, &LocalFs);
    let count = AtomicUsize::new(0);

    let stats = traverser
        .walk(temp.path(), Depth::Unlimited, &|_: &Path, _: &str| {
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let expected = expected_files(temp.path(), None).len();
    assert_eq!(count.load(Ordering::SeqCst), expected);
    assert_eq!(stats.spawned_descents, 0);
    assert!(stats.inline_descents > 0);
}

#[test]
fn test_depth_one_on_three_level_tree() {
    let temp = TempDir::new().unwrap();
    build_tree(temp.path(), 3, 2);
    let pool = WorkerPool::new(4).unwrap();
    let roots = vec![Root::new("T", temp.path())];

    let visited = walk_files(&pool, &roots, Depth::Limited(1));
    assert!(!visited.is_empty());
    for path in &visited {
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("l0_") || name.starts_with("l1_"), "{name}");
    }
    assert_eq!(visited.len(), 2 + 2 * 2);
}

#[test]
fn test_denied_subtree_is_skipped() {
    let fs = MemFs::default()
        .dir(
            "/r",
            vec![
                DirEntry::new(".", EntryKind::Dir),
                DirEntry::new("..", EntryKind::Dir),
                DirEntry::dir("locked"),
                DirEntry::dir("open"),
                DirEntry::file("top.txt"),
                DirEntry::new("socket", EntryKind::Other),
            ],
        )
        .dir("/r/locked", vec![DirEntry::file("secret.txt")])
        .deny("/r/locked")
        .dir("/r/open", vec![DirEntry::file("ok.txt")]);

    let pool = WorkerPool::new(2).unwrap();
    let traverser = Traverser::new(&pool, &fs);
    let seen = Mutex::new(BTreeSet::new());

    let stats = traverser
        .walk(Path::new("/r"), Depth::Unlimited, &|dir: &Path, name: &str| {
            seen.lock().unwrap().insert(dir.join(name));
        })
        .unwrap();

    let seen = seen.into_inner().unwrap();
    assert_eq!(
        seen,
        BTreeSet::from([PathBuf::from("/r/open/ok.txt"), PathBuf::from("/r/top.txt")])
    );
    assert_eq!(stats.dirs_skipped, 1);
    assert_eq!(stats.dirs_listed, 2);
}

#[test]
fn test_unreadable_root_does_not_stop_other_roots() {
    let fs = MemFs::default()
        .deny("/bad")
        .dir("/good", vec![DirEntry::file("a.txt")]);
    let provider = FixedRoots::new([Root::new("X", "/bad"), Root::new("Y", "/good")]);
    let roots = provider.roots().unwrap();

    let pool = WorkerPool::new(1).unwrap();
    let traverser = Traverser::new(&pool, &fs);
    let count = AtomicUsize::new(0);

    let stats = traverser
        .walk_roots(&roots, Depth::Unlimited, &|_: &Path, _: &str| {
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(stats.dirs_skipped, 1);
}
