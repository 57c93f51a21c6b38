use crate::common::{key, write_jar};
use appgraph_cli::classpath::ClassPathElement;
use appgraph_cli::paths::{ArchiveTree, PathTree};
use appgraph_cli::test_utils::JarFixture;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn element(dir: &TempDir) -> ClassPathElement {
    let jar = write_jar(dir.path(), "lib.jar", &[("a.txt", "alpha"), ("pkg/B.class", "b")]).unwrap();
    let tree: Arc<dyn PathTree> = Arc::new(ArchiveTree::new(jar));
    ClassPathElement::new(tree, Some(key("org.acme:lib")), true).unwrap()
}

#[test]
fn test_resources_of_open_element() {
    let dir = TempDir::new().unwrap();
    let element = element(&dir);

    assert_eq!(element.dependency_key(), Some(&key("org.acme:lib")));
    assert!(element.is_runtime());
    assert_eq!(element.read_resource("a.txt").unwrap(), Some(b"alpha".to_vec()));
    let resource = element.get_resource("pkg/B.class").unwrap().unwrap();
    assert_eq!(resource.name, "pkg/B.class");
    assert!(!resource.directory);
    assert!(element.get_resource("missing").unwrap().is_none());

    let provided = element.provided_resources().unwrap();
    assert!(provided.contains("a.txt"));
    assert!(provided.contains("pkg/B.class"));
}

#[test]
fn test_reads_after_close_use_short_lived_handle() {
    let dir = TempDir::new().unwrap();
    let element = element(&dir);
    element.close().unwrap();
    assert!(element.is_closed());

    assert_eq!(element.read_resource("a.txt").unwrap(), Some(b"alpha".to_vec()));
    assert_eq!(element.provided_resources().unwrap().len(), 2);
    // second close is a no-op
    element.close().unwrap();
}

#[test]
fn test_closed_element_indexes_current_content() {
    let dir = TempDir::new().unwrap();
    let element = element(&dir);
    assert_eq!(element.provided_resources().unwrap().len(), 2);
    element.close().unwrap();

    write_jar(dir.path(), "lib.jar", &[("a.txt", "alpha"), ("c.txt", "c"), ("d.txt", "d")]).unwrap();
    let after_close = element.provided_resources().unwrap();
    assert_eq!(after_close.iter().map(String::as_str).collect::<Vec<_>>(), vec!["a.txt", "c.txt", "d.txt"]);

    write_jar(dir.path(), "lib.jar", &[("e.txt", "e")]).unwrap();
    let rewritten = element.provided_resources().unwrap();
    assert_eq!(rewritten.iter().map(String::as_str).collect::<Vec<_>>(), vec!["e.txt"]);
}

#[test]
fn test_close_waits_for_in_flight_read() {
    let dir = TempDir::new().unwrap();
    let element = Arc::new(element(&dir));
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let reader = {
        let element = element.clone();
        thread::spawn(move || {
            element.with_open_tree(|tree| {
                started_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                tree.read_entry("a.txt")
            })
        })
    };
    started_rx.recv().unwrap();

    let closer = {
        let element = element.clone();
        thread::spawn(move || element.close())
    };
    thread::sleep(Duration::from_millis(50));
    assert!(!element.is_closed(), "close must wait for the read lock");

    release_tx.send(()).unwrap();
    assert_eq!(reader.join().unwrap().unwrap(), Some(b"alpha".to_vec()));
    closer.join().unwrap().unwrap();
    assert!(element.is_closed());
}

#[test]
fn test_manifest_of_element() {
    let dir = TempDir::new().unwrap();
    let jar = JarFixture::new()
        .manifest(&[("Implementation-Title", "acme")])
        .entry("a.txt", "a")
        .write(&dir.path().join("app.jar"))
        .unwrap();
    let tree: Arc<dyn PathTree> = Arc::new(ArchiveTree::new(jar));
    let element = ClassPathElement::new(tree, None, false).unwrap();

    let manifest = element.manifest().unwrap();
    assert_eq!(manifest.main_attribute("Implementation-Title"), Some("acme"));
    assert!(!element.is_runtime());
}
