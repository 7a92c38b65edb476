//! End-to-end expansion scenarios against the in-memory registry.

use std::collections::HashSet;

use brewgraph::test_utils::{FakeTaps, Registry, ReceiptStore};
use brewgraph::{
    Dependency, Error, ExpandRequest, Expander, ExpansionCache, Package, Tag, TraversalAction,
};

fn names(deps: &[Dependency]) -> Vec<&str> {
    deps.iter().map(Dependency::name).collect()
}

/// Opt-in expansion traces via `RUST_LOG=brewgraph=trace`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A realistic formula graph: a diamond on a build-only library, an
/// optional feature that is requested, and a test-only dependency.
fn curl_like_registry() -> Registry {
    let mut registry = Registry::new();
    registry.package("ca-certificates").add();
    registry.package("pkgconf").add();
    registry.package("openssl").dep("ca-certificates").dep_tagged("pkgconf", &[Tag::Build]).add();
    registry.package("nghttp2").dep_tagged("pkgconf", &[Tag::Build]).add();
    registry.package("brotli").add();
    registry.package("pytest").add();
    registry
        .package("curl")
        .dep("openssl")
        .dep("nghttp2")
        .dep_tagged("brotli", &[Tag::Optional])
        .dep_tagged("pytest", &[Tag::Test])
        .wants("brotli")
        .add();
    registry
}

#[test]
fn test_full_graph_expansion() {
    init_tracing();
    let registry = curl_like_registry();
    let deps = Expander::new(&registry).expand(registry.get("curl").as_ref()).unwrap();

    let names = names(&deps);
    assert_eq!(names, ["ca-certificates", "pkgconf", "openssl", "nghttp2", "brotli", "pytest"]);

    // pkgconf is build-only on both edges, so it stays build-only
    let pkgconf = deps.iter().find(|d| d.name() == "pkgconf").unwrap();
    assert!(pkgconf.is_build_only());
    assert!(pkgconf.is_required());

    // the requested optional dependency keeps its marker
    let brotli = deps.iter().find(|d| d.name() == "brotli").unwrap();
    assert!(brotli.is_optional());

    let pytest = deps.iter().find(|d| d.name() == "pytest").unwrap();
    assert!(pytest.is_test());
}

#[test]
fn test_dependency_before_dependent_holds_everywhere() {
    let registry = curl_like_registry();
    let deps = Expander::new(&registry).expand(registry.get("curl").as_ref()).unwrap();
    let position =
        |name: &str| deps.iter().position(|d| d.name() == name).unwrap_or(usize::MAX);

    assert!(position("ca-certificates") < position("openssl"));
    assert!(position("pkgconf") < position("openssl"));
    assert!(position("pkgconf") < position("nghttp2"));
}

#[test]
fn test_shared_cache_across_roots() {
    let mut registry = Registry::new();
    registry.package("zlib").add();
    registry.package("libpng").dep("zlib").add();
    registry.package("freetype").dep("libpng").add();
    registry.package("harfbuzz").dep("freetype").add();

    let cache = ExpansionCache::new();
    let expander = Expander::new(&registry).with_cache(&cache);

    let freetype = expander
        .expand_with(registry.get("freetype").as_ref(), ExpandRequest::cached("plan"))
        .unwrap();
    assert_eq!(names(&freetype), ["zlib", "libpng"]);

    let before = registry.resolution_count();
    let harfbuzz = expander
        .expand_with(registry.get("harfbuzz").as_ref(), ExpandRequest::cached("plan"))
        .unwrap();
    assert_eq!(names(&harfbuzz), ["zlib", "libpng", "freetype"]);
    // freetype's subtree was served from the cache; only the
    // harfbuzz -> freetype edge needed resolving
    assert_eq!(registry.resolution_count(), before + 1);

    // a different cache key does not see those entries
    assert!(cache.get("other", "freetype::formula").is_none());
}

#[test]
fn test_skip_inside_cycle_is_dropped() {
    let mut registry = Registry::new();
    registry.package("a").dep("b").add();
    registry.package("b").dep("a").add();

    // skipping b would re-enter a, which is already in progress
    let mut decide = |_: &dyn Package, dep: &Dependency| {
        (dep.name() == "b").then_some(TraversalAction::Skip)
    };
    let deps = Expander::new(&registry)
        .expand_with(registry.get("a").as_ref(), ExpandRequest::deciding(&mut decide))
        .unwrap();
    assert!(deps.is_empty());
}

#[test]
fn test_persisted_form_matches_stored_data() {
    // the wire shape written by previous runs
    let stored = r#"[{"name":"openssl","tags":["build"]},{"name":"gettext","tags":["optional","universal"]}]"#;
    let persisted: Vec<brewgraph::PersistedDependency> = serde_json::from_str(stored).unwrap();

    let deps: Vec<Dependency> = persisted
        .into_iter()
        .map(|p| Dependency::from_persisted(p).unwrap())
        .collect();
    assert_eq!(deps[0].name(), "openssl");
    assert!(deps[0].is_build_only());
    assert_eq!(deps[1].tags(), [Tag::Optional, Tag::Other("universal".to_string())]);

    // and writing back produces the identical bytes
    let round_tripped: Vec<_> = deps.iter().map(Dependency::to_persisted).collect();
    assert_eq!(serde_json::to_string(&round_tripped).unwrap(), stored);
}

#[test]
fn test_satisfied_tracks_receipt_options() {
    let mut registry = Registry::new();
    registry
        .package("ffmpeg")
        .option("with-docs")
        .option("with-ssl")
        .installed(true)
        .add();

    let dep = Dependency::new("ffmpeg", vec![])
        .unwrap()
        .with_option_names(vec!["with-docs".to_string()]);
    let inherited: HashSet<String> =
        ["with-ssl".to_string(), "with-x11".to_string()].into_iter().collect();

    let mut receipts = ReceiptStore::new();
    receipts.record("ffmpeg", ["with-ssl"]);

    // with-x11 is unsupported and drops out; with-ssl is already used
    let missing = dep.missing_options(&registry, &receipts, &inherited).unwrap();
    assert_eq!(missing, ["with-docs".to_string()].into_iter().collect());
    assert!(!dep.satisfied(&registry, &receipts, &inherited).unwrap());

    receipts.record("ffmpeg", ["with-docs"]);
    assert!(dep.satisfied(&registry, &receipts, &inherited).unwrap());
}

#[test]
fn test_not_installed_is_not_satisfied() {
    let mut registry = Registry::new();
    registry.package("jq").add();

    let dep = Dependency::new("jq", vec![]).unwrap();
    let receipts = ReceiptStore::new();
    assert!(!dep.satisfied(&registry, &receipts, &HashSet::new()).unwrap());
}

#[test]
fn test_tap_scoped_installed_downgrades_unavailable() {
    let registry = Registry::new();

    // a plain dependency propagates the resolution failure
    let plain = Dependency::new("ghost", vec![]).unwrap();
    assert_eq!(
        plain.installed(&registry).unwrap_err(),
        Error::TargetUnavailable { name: "ghost".to_string() }
    );

    // the tap-scoped equivalent reports "not installed" instead
    let tapped = Dependency::tap("user/repo/ghost", vec![]).unwrap();
    assert!(!tapped.installed(&registry).unwrap());
}

#[test]
fn test_tap_scoped_installed_resolves_like_plain_when_available() {
    let mut registry = Registry::new();
    registry
        .package("user/repo/tool")
        .full_name("user/repo/tool")
        .installed(true)
        .add();

    let dep = Dependency::tap("user/repo/tool", vec![]).unwrap();
    assert!(dep.installed(&registry).unwrap());
}

#[test]
fn test_tap_lookup() {
    let mut taps = FakeTaps::new();
    taps.add("homebrew/science", true);
    taps.add("user/dead", false);

    let dep = Dependency::tap("homebrew/science/foo", vec![]).unwrap();
    let tap = dep.fetch_tap(&taps).unwrap().unwrap();
    assert_eq!(tap.name(), "homebrew/science");
    assert!(tap.installed());

    let dep = Dependency::tap("user/dead/bar", vec![]).unwrap();
    assert!(!dep.fetch_tap(&taps).unwrap().unwrap().installed());

    let dep = Dependency::tap("no/such/tap", vec![]).unwrap();
    assert!(dep.fetch_tap(&taps).is_err());

    let plain = Dependency::new("foo", vec![]).unwrap();
    assert!(plain.fetch_tap(&taps).unwrap().is_none());
}

#[test]
fn test_expansion_of_tap_scoped_dependencies() {
    let mut registry = Registry::new();
    registry.package("libsodium").add();
    registry
        .package("tool")
        .full_name("user/repo/tool")
        .dep("libsodium")
        .add();
    registry.alias("user/repo/tool", "tool");

    registry
        .package("app")
        .dependency(Dependency::tap("user/repo/tool", vec![]).unwrap())
        .add();

    let deps = Expander::new(&registry).expand(registry.get("app").as_ref()).unwrap();
    assert_eq!(names(&deps), ["libsodium", "user/repo/tool"]);
    assert!(deps[1].kind().is_tap());
    assert_eq!(deps[1].tap_name(), Some("user/repo"));
}
