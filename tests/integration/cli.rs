use crate::common::{single_extension_app, write_jar};
use appgraph_cli::test_utils::JarFixture;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// The binary with configuration pointed at `dir` and colors off.
fn appgraph(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("appgraph").unwrap();
    cmd.env("APPGRAPH_CONFIG_PATH", dir.join("config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_resolve_text_output() {
    let builder = single_extension_app().unwrap();
    let catalog = builder.write().unwrap();

    appgraph(builder.dir())
        .arg("resolve")
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("org.acme:app:1.0 [normal]"))
        .stdout(predicate::str::contains("Runtime classpath (2):"))
        .stdout(predicate::str::contains("Deployment classpath (2):"))
        .stdout(predicate::str::contains("org.acme:ext-a-deployment:1.0"))
        .stdout(predicate::str::contains("org.acme:ext-a:1.0: org.acme.a"))
        .stdout(predicate::str::contains("Platform: aligned"));
}

#[test]
fn test_resolve_json_for_several_modes() {
    let builder = single_extension_app().unwrap();
    let catalog = builder.write().unwrap();

    let output = appgraph(builder.dir())
        .args(["resolve", "--format", "json", "--mode", "normal", "--mode", "dev"])
        .arg(&catalog)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let models: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let models = models.as_array().unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0]["mode"], "normal");
    assert_eq!(models[1]["mode"], "dev");
    assert_eq!(models[0]["app"], "org.acme:app:1.0");
    assert_eq!(models[0]["platform"]["status"], "aligned");

    let artifacts: Vec<&str> = models[0]["dependencies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["artifact"].as_str().unwrap())
        .collect();
    assert!(artifacts.contains(&"org.acme:ext-a:1.0"));
    assert!(artifacts.contains(&"org.acme:build-tool:1.0"));
}

#[test]
fn test_resolve_uses_configured_modes() {
    let builder = single_extension_app().unwrap();
    let catalog = builder.write().unwrap();
    std::fs::write(builder.dir().join("config.toml"), "launch_modes = [\"test\"]\n").unwrap();

    appgraph(builder.dir())
        .arg("resolve")
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("[test]"))
        .stdout(predicate::str::contains("[normal]").not());
}

#[test]
fn test_resolve_missing_catalog_fails() {
    let dir = TempDir::new().unwrap();
    appgraph(dir.path())
        .arg("resolve")
        .arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn test_content_list_with_filters() {
    let dir = TempDir::new().unwrap();
    let jar = write_jar(
        dir.path(),
        "lib.jar",
        &[("org/acme/A.class", "a"), ("org/acme/B.class", "b"), ("META-INF/notes.txt", "n")],
    )
    .unwrap();

    appgraph(dir.path())
        .args(["content", "list"])
        .arg(&jar)
        .args(["--include", "org/**", "--exclude", "**/B.class"])
        .assert()
        .success()
        .stdout("org/acme/A.class\n");
}

#[test]
fn test_content_cat_multi_release_entry() {
    let dir = TempDir::new().unwrap();
    let jar = JarFixture::new()
        .multi_release()
        .entry("Impl.class", "base")
        .versioned_entry(11, "Impl.class", "v11")
        .write(&dir.path().join("mr.jar"))
        .unwrap();

    appgraph(dir.path())
        .args(["content", "cat"])
        .arg(&jar)
        .arg("Impl.class")
        .assert()
        .success()
        .stdout("v11");

    appgraph(dir.path())
        .args(["content", "cat", "--release", "9"])
        .arg(&jar)
        .arg("Impl.class")
        .assert()
        .success()
        .stdout("base");
}

#[test]
fn test_content_cat_missing_entry_fails() {
    let dir = TempDir::new().unwrap();
    let jar = write_jar(dir.path(), "lib.jar", &[("a.txt", "a")]).unwrap();

    appgraph(dir.path())
        .args(["content", "cat"])
        .arg(&jar)
        .arg("b.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("b.txt"));
}

#[test]
fn test_platform_report() {
    let builder = single_extension_app()
        .unwrap()
        .platform_property("platform.release-info@org.acme$main#1.0", "org.acme:core:1.0")
        .platform_import("org.acme:core-platform-descriptor:1.0:json")
        .unwrap()
        .platform_import("org.acme:core-platform-properties:1.0:properties")
        .unwrap();
    let catalog = builder.write().unwrap();

    appgraph(builder.dir())
        .arg("platform")
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("Platform org.acme"))
        .stdout(predicate::str::contains("stream main: 1.0"))
        .stdout(predicate::str::contains("org.acme:core:1.0:pom"))
        .stdout(predicate::str::contains("Platform imports are aligned"));
}

#[test]
fn test_platform_misaligned_with_warn_policy() {
    let builder = single_extension_app()
        .unwrap()
        .platform_property("platform.release-info@org.acme$main#1.0", "org.acme:core:1.0,org.acme:extras:1.0")
        .platform_property("platform.release-info@org.acme$main#2.0", "org.acme:core:2.0,org.acme:extras:2.0")
        .platform_import("org.acme:core-platform-descriptor:1.0:json")
        .unwrap()
        .platform_import("org.acme:core-platform-properties:1.0:properties")
        .unwrap()
        .platform_import("org.acme:extras-platform-descriptor:2.0:json")
        .unwrap()
        .platform_import("org.acme:extras-platform-properties:2.0:properties")
        .unwrap();
    let catalog = builder.write().unwrap();

    appgraph(builder.dir())
        .arg("platform")
        .arg(&catalog)
        .assert()
        .failure()
        .stderr(predicate::str::contains("different platform releases"));

    std::fs::write(
        builder.dir().join("config.toml"),
        "misaligned_platform_imports = \"warn\"\n",
    )
    .unwrap();
    appgraph(builder.dir())
        .args(["platform", "--format", "json"])
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"not_aligned\""));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let dir = TempDir::new().unwrap();
    appgraph(dir.path())
        .args(["--verbose", "--quiet", "content", "list"])
        .arg(dir.path())
        .assert()
        .failure();
}
