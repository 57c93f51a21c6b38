use crate::common::{APP, deployment_keys, flags_of, resolve, runtime_keys};
use appgraph_cli::config::LaunchMode;
use appgraph_cli::core::AppGraphError;
use appgraph_cli::models::DependencyFlags;
use appgraph_cli::resolver::ApplicationModelResolver;
use appgraph_cli::test_utils::{CatalogBuilder, init_test_logging};
use std::sync::Arc;

/// `ext-x` declares `ext-x-y`, which needs `lib-y` on the classpath.
fn conditional_app(with_lib_y: bool) -> CatalogBuilder {
    let deps: &[&str] = if with_lib_y {
        &["org.acme:ext-x:1.0", "org.acme:lib-y:1.0"]
    } else {
        &["org.acme:ext-x:1.0"]
    };
    CatalogBuilder::new(APP, deps)
        .unwrap()
        .extension(
            "org.acme:ext-x:1.0",
            &[],
            "deployment-artifact=org.acme:ext-x-deployment:1.0\n\
             conditional-dependencies=org.acme:ext-x-y:1.0",
        )
        .unwrap()
        .extension(
            "org.acme:ext-x-y:1.0",
            &["org.acme:ext-x-y-support:1.0"],
            "dependency-condition=org.acme:lib-y",
        )
        .unwrap()
        .library("org.acme:ext-x-y-support:1.0", &[])
        .unwrap()
        .library("org.acme:ext-x-deployment:1.0", &[])
        .unwrap()
        .library("org.acme:lib-y:1.0", &[])
        .unwrap()
}

#[test]
fn test_conditional_dependency_activated() {
    init_test_logging(None);
    let builder = conditional_app(true);
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    assert_eq!(
        runtime_keys(&model),
        vec!["org.acme:ext-x", "org.acme:ext-x-y", "org.acme:ext-x-y-support", "org.acme:lib-y"]
    );
    let activated = flags_of(&model, "org.acme:ext-x-y");
    assert!(activated.contains(DependencyFlags::RUNTIME_EXTENSION_ARTIFACT | DependencyFlags::RUNTIME_CP));
    assert!(!activated.contains(DependencyFlags::DIRECT));
    assert!(model.inactive_conditional_dependencies().is_empty());
}

#[test]
fn test_conditional_dependency_stays_inactive() {
    let builder = conditional_app(false);
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    assert_eq!(runtime_keys(&model), vec!["org.acme:ext-x"]);
    let inactive: Vec<String> = model
        .inactive_conditional_dependencies()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(inactive, vec!["org.acme:ext-x-y:1.0"]);
}

#[test]
fn test_condition_met_by_another_conditional_dependency() {
    let builder = CatalogBuilder::new(APP, &["org.acme:ext-x:1.0", "org.acme:lib-y:1.0"])
        .unwrap()
        .extension(
            "org.acme:ext-x:1.0",
            &[],
            "conditional-dependencies=org.acme:second:1.0,org.acme:first:1.0",
        )
        .unwrap()
        .extension("org.acme:first:1.0", &[], "dependency-condition=org.acme:lib-y")
        .unwrap()
        .extension("org.acme:second:1.0", &[], "dependency-condition=org.acme:first")
        .unwrap()
        .library("org.acme:lib-y:1.0", &[])
        .unwrap();
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    assert_eq!(
        runtime_keys(&model),
        vec!["org.acme:ext-x", "org.acme:first", "org.acme:lib-y", "org.acme:second"]
    );
    assert!(model.inactive_conditional_dependencies().is_empty());
}

#[test]
fn test_activated_dependency_brings_its_own_conditionals() {
    let builder = CatalogBuilder::new(APP, &["org.acme:ext-x:1.0"])
        .unwrap()
        .extension("org.acme:ext-x:1.0", &[], "conditional-dependencies=org.acme:first:1.0")
        .unwrap()
        .extension("org.acme:first:1.0", &[], "conditional-dependencies=org.acme:nested:1.0")
        .unwrap()
        .library("org.acme:nested:1.0", &[])
        .unwrap();
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    assert_eq!(runtime_keys(&model), vec!["org.acme:ext-x", "org.acme:first", "org.acme:nested"]);
}

#[test]
fn test_mutually_dependent_conditions_never_activate() {
    let builder = CatalogBuilder::new(APP, &["org.acme:ext-x:1.0"])
        .unwrap()
        .extension(
            "org.acme:ext-x:1.0",
            &[],
            "conditional-dependencies=org.acme:left:1.0,org.acme:right:1.0",
        )
        .unwrap()
        .extension("org.acme:left:1.0", &[], "dependency-condition=org.acme:right")
        .unwrap()
        .extension("org.acme:right:1.0", &[], "dependency-condition=org.acme:left")
        .unwrap();
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    assert_eq!(runtime_keys(&model), vec!["org.acme:ext-x"]);
    assert_eq!(model.inactive_conditional_dependencies().len(), 2);
}

#[test]
fn test_dev_conditional_dependencies() {
    let builder = CatalogBuilder::new(APP, &["org.acme:ext-x:1.0"])
        .unwrap()
        .extension("org.acme:ext-x:1.0", &[], "conditional-dev-dependencies=org.acme:dev-ui:1.0")
        .unwrap()
        .library("org.acme:dev-ui:1.0", &[])
        .unwrap();

    let normal = resolve(&builder, LaunchMode::Normal).unwrap();
    assert_eq!(runtime_keys(&normal), vec!["org.acme:ext-x"]);
    assert!(normal.inactive_conditional_dependencies().is_empty());

    let dev = resolve(&builder, LaunchMode::Development).unwrap();
    assert_eq!(runtime_keys(&dev), vec!["org.acme:dev-ui", "org.acme:ext-x"]);
}

#[test]
fn test_unresolvable_conditional_dependency_fails() {
    let builder = CatalogBuilder::new(APP, &["org.acme:ext-x:1.0"])
        .unwrap()
        .extension("org.acme:ext-x:1.0", &[], "conditional-dependencies=org.acme:nowhere:1.0")
        .unwrap();
    let resolver = ApplicationModelResolver::new(Arc::new(builder.host().unwrap()));

    let err = resolver.resolve(builder.root(), LaunchMode::Normal).unwrap_err();
    assert_eq!(
        err,
        AppGraphError::ArtifactNotFound {
            coords: "org.acme:nowhere:1.0".to_string()
        }
    );
    assert!(err.to_string().ends_with("did not resolve to any artifacts"));
}

/// Adds `org.acme:<name>:1.0` with a deployment companion depending on the
/// companions of `deployment_deps`.
fn with_extension(
    builder: CatalogBuilder,
    name: &str,
    deps: &[&str],
    deployment_deps: &[&str],
    descriptor: &str,
) -> CatalogBuilder {
    fn coords(name: &str) -> String {
        format!("org.acme:{name}:1.0")
    }
    let deps: Vec<String> = deps.iter().map(|&d| coords(d)).collect();
    let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
    let companion_deps: Vec<String> = deployment_deps.iter().map(|d| coords(&format!("{d}-deployment"))).collect();
    let companion_deps: Vec<&str> = companion_deps.iter().map(String::as_str).collect();
    let descriptor = format!("deployment-artifact={}\n{descriptor}", coords(&format!("{name}-deployment")));

    builder
        .extension(&coords(name), &deps, &descriptor)
        .unwrap()
        .library(&coords(&format!("{name}-deployment")), &companion_deps)
        .unwrap()
}

#[test]
fn test_activated_conditional_extensions_bring_their_companions() {
    // f -> g -> h?(i,j) -> k
    // l -> j -> p?(o)
    // m -> n?(g) -> i -> o?(h)
    let mut builder =
        CatalogBuilder::new(APP, &["org.acme:ext-f:1.0", "org.acme:ext-l:1.0", "org.acme:ext-m:1.0"]).unwrap();
    for (name, deps, descriptor) in [
        ("ext-f", &["ext-g"][..], ""),
        ("ext-g", &[][..], "conditional-dependencies=org.acme:ext-h:1.0"),
        ("ext-h", &["ext-k"][..], "dependency-condition=org.acme:ext-i,org.acme:ext-j"),
        ("ext-i", &[][..], "conditional-dependencies=org.acme:ext-o:1.0"),
        ("ext-j", &[][..], "conditional-dependencies=org.acme:ext-p:1.0"),
        ("ext-k", &[][..], ""),
        ("ext-l", &["ext-j"][..], ""),
        ("ext-m", &[][..], "conditional-dependencies=org.acme:ext-n:1.0"),
        ("ext-n", &["ext-i"][..], "dependency-condition=org.acme:ext-g"),
        ("ext-o", &[][..], "dependency-condition=org.acme:ext-h"),
        ("ext-p", &[][..], "dependency-condition=org.acme:ext-o"),
    ] {
        builder = with_extension(builder, name, deps, deps, descriptor);
    }
    let model = resolve(&builder, LaunchMode::Normal).unwrap();

    let names = ["f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p"];
    let expected_runtime: Vec<String> = names.iter().map(|n| format!("org.acme:ext-{n}")).collect();
    assert_eq!(runtime_keys(&model), expected_runtime);
    let expected_deployment: Vec<String> =
        names.iter().map(|n| format!("org.acme:ext-{n}-deployment")).collect();
    assert_eq!(deployment_keys(&model), expected_deployment);
    assert!(model.inactive_conditional_dependencies().is_empty());

    assert!(flags_of(&model, "org.acme:ext-f-deployment").contains(DependencyFlags::DIRECT));
    let conditional_companion = flags_of(&model, "org.acme:ext-n-deployment");
    assert!(conditional_companion.contains(DependencyFlags::DEPLOYMENT_CP));
    assert!(!conditional_companion.intersects(DependencyFlags::DIRECT | DependencyFlags::RUNTIME_CP));
}
