use crate::common::write_jar;
use appgraph_cli::paths::{
    self, ArchiveTree, CachingTree, ContentError, DirectoryTree, MultiRootTree, PathTree,
};
use appgraph_cli::test_utils::{JarFixture, init_test_logging};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn names<T: PathTree + ?Sized>(tree: &T) -> Vec<String> {
    let mut names = Vec::new();
    tree.walk(&mut |visit| {
        if !visit.is_directory() {
            names.push(visit.relative_path().to_string());
        }
    })
    .unwrap();
    names.sort();
    names
}

fn read<T: PathTree + ?Sized>(tree: &T, name: &str) -> Option<String> {
    tree.read_entry(name).unwrap().map(|b| String::from_utf8(b).unwrap())
}

fn multi_release_jar(dir: &TempDir) -> std::path::PathBuf {
    JarFixture::new()
        .multi_release()
        .entry("org/acme/Impl.class", "base")
        .versioned_entry(9, "org/acme/Impl.class", "v9")
        .versioned_entry(11, "org/acme/Impl.class", "v11")
        .versioned_entry(17, "org/acme/Impl.class", "v17")
        .versioned_entry(11, "org/acme/Only11.class", "only11")
        .write(&dir.path().join("mr.jar"))
        .unwrap()
}

#[test]
fn test_archive_walk_and_lookup() {
    init_test_logging(None);
    let dir = TempDir::new().unwrap();
    let jar = write_jar(dir.path(), "lib.jar", &[("a/one.txt", "1"), ("a/b/two.txt", "2")]).unwrap();
    let tree = ArchiveTree::new(&jar);

    assert_eq!(names(&tree), vec!["a/b/two.txt", "a/one.txt"]);
    assert_eq!(read(&tree, "a/b/two.txt").as_deref(), Some("2"));
    assert_eq!(read(&tree, "./a/one.txt").as_deref(), Some("1"));
    assert!(read(&tree, "missing.txt").is_none());
    assert!(!tree.contains("../a/one.txt").unwrap());
}

#[test]
fn test_walk_stops_when_asked() {
    let dir = TempDir::new().unwrap();
    let jar = write_jar(dir.path(), "lib.jar", &[("a.txt", "a"), ("b.txt", "b"), ("c.txt", "c")]).unwrap();
    let tree = ArchiveTree::new(&jar);

    let mut seen = 0;
    tree.walk(&mut |visit| {
        seen += 1;
        visit.stop_walking();
    })
    .unwrap();
    assert_eq!(seen, 1);
}

#[test]
fn test_multi_release_overlay_at_highest_release() {
    let dir = TempDir::new().unwrap();
    let jar = multi_release_jar(&dir);
    let tree = ArchiveTree::with_release(&jar, 17);

    assert!(tree.is_multi_release());
    assert_eq!(read(&tree, "org/acme/Impl.class").as_deref(), Some("v17"));
    assert_eq!(read(&tree, "org/acme/Only11.class").as_deref(), Some("only11"));

    let mut walked = Vec::new();
    tree.walk(&mut |visit| {
        if visit.relative_path() == "org/acme/Impl.class" {
            walked.push(visit.read_bytes().unwrap());
        }
    })
    .unwrap();
    assert_eq!(walked, vec![b"v17".to_vec()]);
}

#[test]
fn test_multi_release_overlay_between_versions() {
    let dir = TempDir::new().unwrap();
    let jar = multi_release_jar(&dir);

    let tree = ArchiveTree::with_release(&jar, 10);
    assert_eq!(read(&tree, "org/acme/Impl.class").as_deref(), Some("v9"));
    assert!(read(&tree, "org/acme/Only11.class").is_none());

    let tree = ArchiveTree::with_release(&jar, 8);
    assert_eq!(read(&tree, "org/acme/Impl.class").as_deref(), Some("base"));
}

#[test]
fn test_versioned_entries_ignored_without_manifest_flag() {
    let dir = TempDir::new().unwrap();
    let jar = JarFixture::new()
        .entry("Impl.class", "base")
        .versioned_entry(11, "Impl.class", "v11")
        .write(&dir.path().join("plain.jar"))
        .unwrap();
    let tree = ArchiveTree::with_release(&jar, 17);

    assert!(!tree.is_multi_release());
    assert_eq!(read(&tree, "Impl.class").as_deref(), Some("base"));
}

#[test]
fn test_directory_multi_release() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("classes");
    fs::create_dir_all(root.join("META-INF/versions/11/pkg")).unwrap();
    fs::create_dir_all(root.join("pkg")).unwrap();
    fs::write(root.join("META-INF/MANIFEST.MF"), "Manifest-Version: 1.0\nMulti-Release: true\n").unwrap();
    fs::write(root.join("pkg/A.class"), "base").unwrap();
    fs::write(root.join("META-INF/versions/11/pkg/A.class"), "v11").unwrap();

    let tree = DirectoryTree::with_release(&root, 17);
    assert_eq!(read(&tree, "pkg/A.class").as_deref(), Some("v11"));
    let tree = DirectoryTree::with_release(&root, 9);
    assert_eq!(read(&tree, "pkg/A.class").as_deref(), Some("base"));
}

#[test]
fn test_rewritten_archive_may_have_changed() {
    let dir = TempDir::new().unwrap();
    let jar = write_jar(dir.path(), "lib.jar", &[("a.txt", "a")]).unwrap();
    let tree = ArchiveTree::new(&jar);
    assert_eq!(names(&tree), vec!["a.txt"]);

    fs::write(&jar, b"no longer a zip archive, and longer than before").unwrap();
    let err = tree.walk(&mut |_| {}).unwrap_err();
    assert!(matches!(err, ContentError::MayHaveChanged { .. }), "unexpected error: {err}");
    assert!(err.is_retryable());
}

#[test]
fn test_removed_archive_may_have_changed() {
    let dir = TempDir::new().unwrap();
    let jar = write_jar(dir.path(), "lib.jar", &[("a.txt", "a")]).unwrap();
    let tree = ArchiveTree::new(&jar);

    fs::remove_file(&jar).unwrap();
    let err = tree.walk(&mut |_| {}).unwrap_err();
    assert!(matches!(err, ContentError::MayHaveChanged { .. }), "unexpected error: {err}");
}

#[test]
fn test_corrupt_archive_is_not_retryable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.jar");
    fs::write(&path, b"garbage").unwrap();
    let tree = ArchiveTree::new(&path);

    let err = tree.walk(&mut |_| {}).unwrap_err();
    assert!(!err.is_retryable(), "unexpected error: {err}");
}

#[test]
fn test_open_archive_close() {
    let dir = TempDir::new().unwrap();
    let jar = write_jar(dir.path(), "lib.jar", &[("a.txt", "a")]).unwrap();
    let tree: Arc<dyn PathTree> = Arc::new(ArchiveTree::new(&jar));

    let open = tree.clone().open().unwrap();
    assert!(open.is_open());
    assert_eq!(read(open.as_ref(), "a.txt").as_deref(), Some("a"));

    open.close().unwrap();
    assert!(!open.is_open());
    let err = open.walk(&mut |_| {}).unwrap_err();
    assert!(matches!(err, ContentError::Closed { .. }));
    // closing twice is harmless
    open.close().unwrap();
    assert_eq!(names(open.original_tree().as_ref()), vec!["a.txt"]);
}

#[test]
fn test_caching_tree_snapshot_survives_handle_close() {
    let dir = TempDir::new().unwrap();
    let jar = write_jar(dir.path(), "lib.jar", &[("a.txt", "a"), ("b/c.txt", "c")]).unwrap();
    let tree: Arc<dyn PathTree> = Arc::new(ArchiveTree::new(&jar));
    let handle = tree.open().unwrap();
    let cache = CachingTree::from_open(handle.clone());

    assert!(!cache.is_cached());
    assert_eq!(names(&cache), vec!["a.txt", "b/c.txt"]);
    assert!(cache.is_cached());

    handle.close().unwrap();
    assert_eq!(read(&cache, "b/c.txt").as_deref(), Some("c"));
    assert_eq!(names(&cache), vec!["a.txt", "b/c.txt"]);
}

#[test]
fn test_multi_root_first_match_wins() {
    let dir = TempDir::new().unwrap();
    let first = write_jar(dir.path(), "first.jar", &[("shared.txt", "first"), ("one.txt", "1")]).unwrap();
    let second = dir.path().join("second");
    fs::create_dir_all(&second).unwrap();
    fs::write(second.join("shared.txt"), "second").unwrap();
    fs::write(second.join("two.txt"), "2").unwrap();

    let tree = MultiRootTree::new(vec![
        paths::of_directory_or_archive(&first, 17),
        paths::of_directory_or_archive(&second, 17),
    ]);
    assert_eq!(read(&tree, "shared.txt").as_deref(), Some("first"));
    assert_eq!(read(&tree, "two.txt").as_deref(), Some("2"));
    assert_eq!(tree.roots(), vec![first, second]);
}
