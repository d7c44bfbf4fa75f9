//! Tests for environment exclusivity and target overlay resolution.

use gdpack_core::manifest;
use gdpack_core::prelude::*;

fn names(deps: &[Dependency]) -> Vec<&str> {
    deps.iter().map(|d| d.name.as_str()).collect()
}

#[test]
fn prod_and_dev_are_mutually_exclusive() {
    let mut manifest = Manifest::new();

    manifest.add("lib", Spec::asset(1), &Query::production()).unwrap();
    assert!(manifest.list(&Query::development()).unwrap().is_empty());

    manifest.add("lib", Spec::asset(1), &Query::development()).unwrap();
    assert!(manifest.list(&Query::production()).unwrap().is_empty());
    assert_eq!(names(&manifest.list(&Query::development()).unwrap()), vec!["lib"]);
}

#[test]
fn exclusivity_holds_per_target_scope() {
    let mut manifest = Manifest::new();
    let web = Query::production().with_target("web");
    let web_dev = Query::development().with_target("web");

    manifest.add("lib", Spec::asset(1), &web).unwrap();
    manifest.add("lib", Spec::asset(2), &web_dev).unwrap();

    let set = manifest.target("web").unwrap();
    assert_eq!(set.get("lib"), Some((Environment::Development, &Spec::asset(2))));
    assert!(set.list(Environment::Production).is_empty());
}

#[test]
fn remove_clears_both_environments_and_is_idempotent() {
    let mut manifest = Manifest::new();
    manifest.add("a", Spec::asset(1), &Query::production()).unwrap();
    manifest.add("b", Spec::asset(2), &Query::development()).unwrap();

    assert!(manifest.remove("a", &Query::default()).unwrap());
    assert!(manifest.remove("b", &Query::development()).unwrap());
    assert!(manifest.list(&Query::production()).unwrap().is_empty());
    assert!(manifest.list(&Query::development()).unwrap().is_empty());

    assert!(!manifest.remove("a", &Query::default()).unwrap());
    assert!(manifest.is_empty());
}

#[test]
fn target_overrides_default_by_name() {
    let spec_a = Spec::git(GitSource::new("https://example.com/lib.git").with_tag("v1"));
    let spec_b = Spec::local("vendor/lib-x86");

    let mut manifest = Manifest::new();
    manifest.add("lib", spec_a.clone(), &Query::production()).unwrap();
    manifest
        .add("lib", spec_b.clone(), &Query::production().with_target("x86_64"))
        .unwrap();

    assert_eq!(
        manifest.list_with_target("x86_64"),
        vec![Dependency::new("lib", spec_b)]
    );
    assert_eq!(manifest.list_with_target(""), vec![Dependency::new("lib", spec_a)]);
}

#[test]
fn disjoint_target_entries_are_added() {
    let mut manifest = Manifest::new();
    manifest.add("a", Spec::asset(1), &Query::production()).unwrap();
    manifest
        .add("b", Spec::asset(2), &Query::production().with_target("x86_64"))
        .unwrap();

    let deps = manifest
        .list(&Query::production().with_target("x86_64"))
        .unwrap();
    assert_eq!(names(&deps), vec!["a", "b"]);
    assert_eq!(deps[0].spec, Spec::asset(1));
    assert_eq!(deps[1].spec, Spec::asset(2));
}

#[test]
fn dev_listing_does_not_include_prod_entries() {
    let mut manifest = Manifest::new();
    manifest.add("a", Spec::asset(1), &Query::production()).unwrap();
    manifest
        .add("b", Spec::asset(2), &Query::development().with_target("web"))
        .unwrap();

    assert_eq!(names(&manifest.list_dev_with_target("web")), vec!["b"]);
    assert_eq!(names(&manifest.list_with_target("web")), vec!["a"]);
}

#[test]
fn parsed_manifest_with_unlisted_target_yields_empty_list() {
    let manifest = manifest::parse(
        r#"
[target.android]

[target.ios.devDependencies]
"#,
    )
    .unwrap();

    assert!(manifest.list_with_target("android").is_empty());
    assert!(manifest.list_dev_with_target("ios").is_empty());
    assert!(
        manifest
            .list(&Query::development().with_target("switch"))
            .unwrap()
            .is_empty()
    );
}

#[test]
fn repeated_queries_are_identical() {
    let mut manifest = Manifest::new();
    for (i, name) in ["d", "a", "c", "b"].into_iter().enumerate() {
        manifest
            .add(name, Spec::asset(i as u64), &Query::production())
            .unwrap();
    }
    manifest
        .add("c", Spec::asset(99), &Query::production().with_target("mac"))
        .unwrap();

    let query = Query::production().with_target("mac");
    let first = manifest.list(&query).unwrap();
    for _ in 0..5 {
        assert_eq!(manifest.list(&query).unwrap(), first);
    }
}
