use crate::common::{APP, deployment_keys, flags_of, key, resolve, runtime_keys, single_extension_app};
use appgraph_cli::config::LaunchMode;
use appgraph_cli::models::DependencyFlags;
use appgraph_cli::resolver::ApplicationModelResolver;
use appgraph_cli::test_utils::{CatalogBuilder, init_test_logging};
use std::collections::BTreeSet;
use std::sync::Arc;

#[test]
fn test_extension_and_companion_partition() {
    init_test_logging(None);
    let builder = single_extension_app().unwrap();
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    assert_eq!(runtime_keys(&model), vec!["org.acme:ext-a", "org.acme:lib-a"]);
    assert_eq!(deployment_keys(&model), vec!["org.acme:build-tool", "org.acme:ext-a-deployment"]);

    let ext = flags_of(&model, "org.acme:ext-a");
    assert!(ext.contains(
        DependencyFlags::DIRECT
            | DependencyFlags::RUNTIME_CP
            | DependencyFlags::DEPLOYMENT_CP
            | DependencyFlags::RUNTIME_EXTENSION_ARTIFACT
            | DependencyFlags::TOP_LEVEL_RUNTIME_EXTENSION_ARTIFACT
    ));
    let lib = flags_of(&model, "org.acme:lib-a");
    assert!(lib.contains(DependencyFlags::RUNTIME_CP | DependencyFlags::DEPLOYMENT_CP));
    assert!(!lib.contains(DependencyFlags::DIRECT));

    let companion = flags_of(&model, "org.acme:ext-a-deployment");
    assert!(companion.contains(DependencyFlags::DEPLOYMENT_CP | DependencyFlags::DIRECT));
    assert!(!companion.contains(DependencyFlags::RUNTIME_CP));
    assert!(!flags_of(&model, "org.acme:build-tool").contains(DependencyFlags::DIRECT));

    let capabilities = model.extension_capabilities();
    assert_eq!(capabilities.len(), 1);
    assert_eq!(capabilities[0].provides, vec!["org.acme.a".to_string()]);
}

#[test]
fn test_runtime_and_deployment_only_are_disjoint() {
    let builder = single_extension_app().unwrap();
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    let runtime: BTreeSet<_> = runtime_keys(&model).into_iter().collect();
    let deployment: BTreeSet<_> = deployment_keys(&model).into_iter().collect();
    assert!(runtime.is_disjoint(&deployment));

    let all: BTreeSet<_> = model.dependencies().iter().map(|d| d.key().clone()).collect();
    assert_eq!(all.len(), model.dependencies().len(), "every key appears once");
}

#[test]
fn test_diamond_and_cycle_are_deduplicated() {
    let builder = CatalogBuilder::new(APP, &["org.acme:a:1.0", "org.acme:b:1.0"])
        .unwrap()
        .library("org.acme:a:1.0", &["org.acme:c:1.0"])
        .unwrap()
        .library("org.acme:b:1.0", &["org.acme:c:1.0"])
        .unwrap()
        .library("org.acme:c:1.0", &["org.acme:a:1.0"])
        .unwrap();
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    assert_eq!(runtime_keys(&model), vec!["org.acme:a", "org.acme:b", "org.acme:c"]);
    assert_eq!(model.dependencies().len(), 3);
    assert!(flags_of(&model, "org.acme:a").contains(DependencyFlags::DIRECT));
    assert!(flags_of(&model, "org.acme:b").contains(DependencyFlags::DIRECT));
    assert!(!flags_of(&model, "org.acme:c").contains(DependencyFlags::DIRECT));
}

#[test]
fn test_direct_flag_is_kept_when_first_reached_transitively() {
    let builder = CatalogBuilder::new(APP, &["org.acme:a:1.0", "org.acme:b:1.0"])
        .unwrap()
        .library("org.acme:a:1.0", &["org.acme:b:1.0"])
        .unwrap()
        .library("org.acme:b:1.0", &[])
        .unwrap();
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    assert!(flags_of(&model, "org.acme:b").contains(DependencyFlags::DIRECT));
}

#[test]
fn test_resolution_is_idempotent() {
    let builder = single_extension_app().unwrap();
    let resolver = ApplicationModelResolver::new(Arc::new(builder.host().unwrap()));

    let first = resolver.resolve(builder.root(), LaunchMode::Normal).unwrap();
    let second = resolver.resolve(builder.root(), LaunchMode::Normal).unwrap();
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[test]
fn test_nested_extension_is_not_top_level() {
    let builder = CatalogBuilder::new(APP, &["org.acme:ext-a:1.0"])
        .unwrap()
        .extension(
            "org.acme:ext-a:1.0",
            &["org.acme:ext-nested:1.0"],
            "deployment-artifact=org.acme:ext-a-deployment:1.0",
        )
        .unwrap()
        .extension(
            "org.acme:ext-nested:1.0",
            &[],
            "deployment-artifact=org.acme:ext-nested-deployment:1.0",
        )
        .unwrap()
        .library("org.acme:ext-a-deployment:1.0", &[])
        .unwrap()
        .library("org.acme:ext-nested-deployment:1.0", &[])
        .unwrap();
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    let nested = flags_of(&model, "org.acme:ext-nested");
    assert!(nested.contains(DependencyFlags::RUNTIME_EXTENSION_ARTIFACT));
    assert!(!nested.contains(DependencyFlags::TOP_LEVEL_RUNTIME_EXTENSION_ARTIFACT));
    assert_eq!(deployment_keys(&model), vec!["org.acme:ext-a-deployment"]);
}

#[test]
fn test_transitive_extension_companion_via_variant() {
    let builder = CatalogBuilder::new(APP, &["org.acme:lib-p:1.0"])
        .unwrap()
        .library("org.acme:lib-p:1.0", &["org.acme:ext-v:1.0"])
        .unwrap()
        .extension("org.acme:ext-v:1.0", &[], "deployment-artifact=org.acme:ext-v-deployment:1.0")
        .unwrap()
        .library("org.acme:ext-v-deployment:1.0", &["org.acme:codegen:1.0"])
        .unwrap()
        .library("org.acme:codegen:1.0", &[])
        .unwrap();
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    let ext = flags_of(&model, "org.acme:ext-v");
    assert!(ext.contains(DependencyFlags::TOP_LEVEL_RUNTIME_EXTENSION_ARTIFACT));
    assert!(!ext.contains(DependencyFlags::DIRECT));
    assert_eq!(deployment_keys(&model), vec!["org.acme:codegen", "org.acme:ext-v-deployment"]);
    assert!(!flags_of(&model, "org.acme:ext-v-deployment").contains(DependencyFlags::DIRECT));
}

#[test]
fn test_workspace_module_companion_is_direct() {
    let builder = CatalogBuilder::new(APP, &["org.acme:local-lib:1.0"])
        .unwrap()
        .workspace_module(
            "org.acme:local-lib:1.0",
            &["org.acme:ext-w:1.0"],
            &[("org/acme/Local.class", "local")],
        )
        .unwrap()
        .extension("org.acme:ext-w:1.0", &[], "deployment-artifact=org.acme:ext-w-deployment:1.0")
        .unwrap()
        .library("org.acme:ext-w-deployment:1.0", &[])
        .unwrap();

    let model = resolve(&builder, LaunchMode::Normal).unwrap();
    let local = flags_of(&model, "org.acme:local-lib");
    assert!(local.contains(DependencyFlags::PROJECT_MODULE | DependencyFlags::DIRECT));
    assert!(!local.contains(DependencyFlags::RELOADABLE));
    assert!(model.local_project_dependencies().contains(&key("org.acme:local-lib")));
    assert!(flags_of(&model, "org.acme:ext-w-deployment").contains(DependencyFlags::DIRECT));

    let tree = model.content_tree(&key("org.acme:local-lib"), None).unwrap();
    assert_eq!(tree.read_entry("org/acme/Local.class").unwrap(), Some(b"local".to_vec()));

    let dev = resolve(&builder, LaunchMode::Development).unwrap();
    assert!(flags_of(&dev, "org.acme:local-lib").contains(DependencyFlags::RELOADABLE));
    assert!(!flags_of(&dev, "org.acme:ext-w").contains(DependencyFlags::RELOADABLE));
}

#[test]
fn test_excluded_artifacts_are_removed() {
    let builder = CatalogBuilder::new(APP, &["org.acme:ext-a:1.0", "org.legacy:old-lib:1.0"])
        .unwrap()
        .extension(
            "org.acme:ext-a:1.0",
            &[],
            "deployment-artifact=org.acme:ext-a-deployment:1.0\n\
             excluded-artifacts=org.legacy:old-lib\n\
             parent-first-artifacts=org.acme:agent\n\
             lesser-priority-artifacts=org.acme:fallback",
        )
        .unwrap()
        .library("org.acme:ext-a-deployment:1.0", &[])
        .unwrap()
        .library("org.legacy:old-lib:1.0", &[])
        .unwrap();
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    assert!(model.dependency(&key("org.legacy:old-lib")).is_none());
    assert!(model.excluded().contains(&key("org.legacy:old-lib")));
    assert!(model.parent_first().contains(&key("org.acme:agent")));
    assert!(model.lesser_priority().contains(&key("org.acme:fallback")));
}

#[test]
fn test_optional_edge_propagates() {
    let builder = CatalogBuilder::new(APP, &[])
        .unwrap()
        .library("org.acme:opt:1.0", &["org.acme:opt-child:1.0"])
        .unwrap()
        .library("org.acme:opt-child:1.0", &[])
        .unwrap()
        .edge(APP, "org.acme:opt:1.0", None, true)
        .unwrap();
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    assert!(flags_of(&model, "org.acme:opt").contains(DependencyFlags::OPTIONAL | DependencyFlags::DIRECT));
    assert!(flags_of(&model, "org.acme:opt-child").contains(DependencyFlags::OPTIONAL));
}

#[test]
fn test_test_scope_only_in_test_mode() {
    let builder = CatalogBuilder::new(APP, &["org.acme:a:1.0"])
        .unwrap()
        .library("org.acme:a:1.0", &[])
        .unwrap()
        .library("org.acme:junit:1.0", &[])
        .unwrap()
        .edge(APP, "org.acme:junit:1.0", Some("test"), false)
        .unwrap();

    let normal = resolve(&builder, LaunchMode::Normal).unwrap();
    assert_eq!(runtime_keys(&normal), vec!["org.acme:a"]);

    let test = resolve(&builder, LaunchMode::Test).unwrap();
    assert_eq!(runtime_keys(&test), vec!["org.acme:a", "org.acme:junit"]);
}

#[test]
fn test_missing_module_fails() {
    let builder = CatalogBuilder::new(APP, &["org.acme:ghost:1.0"]).unwrap();
    let err = resolve(&builder, LaunchMode::Normal).unwrap_err();
    assert!(err.to_string().contains("org.acme:ghost:1.0"), "unexpected error: {err}");
}

#[test]
fn test_pom_only_module_contributes_its_dependencies() {
    let builder = CatalogBuilder::new(APP, &["org.acme:bundle:1.0"])
        .unwrap()
        .pom_only("org.acme:bundle:1.0", &["org.acme:a:1.0"])
        .unwrap()
        .library("org.acme:a:1.0", &[])
        .unwrap();
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    assert_eq!(runtime_keys(&model), vec!["org.acme:a"]);
}

#[tokio::test]
async fn test_resolve_modes_in_parallel() {
    let builder = single_extension_app().unwrap();
    let resolver = ApplicationModelResolver::new(Arc::new(builder.host().unwrap()));

    let models = resolver.resolve_modes(builder.root(), &LaunchMode::ALL).await.unwrap();
    let modes: Vec<_> = models.iter().map(|m| m.mode()).collect();
    assert_eq!(modes, LaunchMode::ALL.to_vec());
    for model in &models {
        assert_eq!(runtime_keys(model), vec!["org.acme:ext-a", "org.acme:lib-a"]);
    }
}

#[test]
fn test_unreadable_descriptors_leave_plain_libraries() {
    init_test_logging(None);
    let builder = CatalogBuilder::new(APP, &["org.acme:broken-ext:1.0", "org.acme:corrupt:1.0"])
        .unwrap()
        .extension(
            "org.acme:broken-ext:1.0",
            &["org.acme:lib-b:1.0"],
            "deployment-artifact=org.acme:broken-ext-deployment:1.0\n\
             conditional-dependencies=not-a-coordinate",
        )
        .unwrap()
        .library("org.acme:lib-b:1.0", &[])
        .unwrap()
        .library("org.acme:broken-ext-deployment:1.0", &[])
        .unwrap()
        .library("org.acme:corrupt:1.0", &[])
        .unwrap();
    std::fs::write(builder.jar_path("org.acme:corrupt:1.0").unwrap(), b"not a zip archive").unwrap();

    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    assert_eq!(
        runtime_keys(&model),
        vec!["org.acme:broken-ext", "org.acme:corrupt", "org.acme:lib-b"]
    );
    assert!(deployment_keys(&model).is_empty());
    for plain in ["org.acme:broken-ext", "org.acme:corrupt"] {
        let flags = flags_of(&model, plain);
        assert!(flags.contains(DependencyFlags::DIRECT | DependencyFlags::RUNTIME_CP));
        assert!(!flags.contains(DependencyFlags::RUNTIME_EXTENSION_ARTIFACT), "{plain} is not an extension");
    }
    assert!(model.extension_capabilities().is_empty());
}
