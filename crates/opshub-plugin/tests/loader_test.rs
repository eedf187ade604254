//! Integration tests for filesystem discovery and activation.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use opshub_core::AppError;
use opshub_core::config::plugin::PluginConfig;
use opshub_core::manifest::PluginManifest;
use opshub_core::result::AppResult;
use opshub_core::types::NavItem;
use opshub_plugin::loader::PluginLoader;
use opshub_plugin::registry::PluginRegistry;
use opshub_plugin::resolver::PluginResolver;
use opshub_plugin::traits::PluginModule;

/// Test module that records its activation and can be told to misbehave.
#[derive(Debug)]
struct TestModule {
    name: &'static str,
    activation_log: Arc<Mutex<Vec<String>>>,
    fail_activate: bool,
    fail_nav: bool,
}

impl TestModule {
    fn new(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            activation_log: log,
            fail_activate: false,
            fail_nav: false,
        })
    }

    fn failing_activate(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            activation_log: log,
            fail_activate: true,
            fail_nav: false,
        })
    }

    fn failing_nav(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            activation_log: log,
            fail_activate: false,
            fail_nav: true,
        })
    }
}

#[async_trait]
impl PluginModule for TestModule {
    async fn activate(&self) -> AppResult<()> {
        self.activation_log
            .lock()
            .unwrap()
            .push(self.name.to_string());
        if self.fail_activate {
            return Err(AppError::plugin("activation exploded"));
        }
        Ok(())
    }

    fn nav_items(&self, manifest: &PluginManifest) -> AppResult<Vec<NavItem>> {
        if self.fail_nav {
            return Err(AppError::internal("nav exploded"));
        }
        Ok(vec![NavItem::from_manifest(manifest)])
    }
}

fn write_manifest(root: &TempDir, name: &str, deps: &[&str], enabled: bool) {
    let dir = root.path().join(name);
    std::fs::create_dir_all(&dir).unwrap();
    let manifest = json!({
        "name": name,
        "displayName": name,
        "description": "",
        "icon": "box",
        "route": format!("/{name}"),
        "version": "1.0.0",
        "enabled": enabled,
        "dependencies": deps,
        "permissions": []
    });
    std::fs::write(
        dir.join("manifest.json"),
        serde_json::to_string_pretty(&manifest).unwrap(),
    )
    .unwrap();
}

fn loader_over(root: &TempDir, resolver: Arc<PluginResolver>) -> PluginLoader {
    let config = PluginConfig {
        modules_dir: root.path().to_string_lossy().into_owned(),
        auto_load: true,
        hot_reload: false,
    };
    PluginLoader::new(config, Arc::new(PluginRegistry::new()), resolver)
}

fn loader_with_registry(
    root: &TempDir,
    resolver: Arc<PluginResolver>,
    registry: Arc<PluginRegistry>,
) -> PluginLoader {
    let config = PluginConfig {
        modules_dir: root.path().to_string_lossy().into_owned(),
        auto_load: true,
        hot_reload: false,
    };
    PluginLoader::new(config, registry, resolver)
}

#[tokio::test]
async fn batch_dependencies_resolve_and_missing_ones_reject() {
    // C depends on A (same batch), B depends on D which exists nowhere.
    let root = TempDir::new().unwrap();
    write_manifest(&root, "a", &[], true);
    write_manifest(&root, "b", &["d"], true);
    write_manifest(&root, "c", &["a"], true);

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = Arc::new(PluginResolver::new());
    resolver.register_builtin("a", TestModule::new("a", log.clone())).await;
    resolver.register_builtin("b", TestModule::new("b", log.clone())).await;
    resolver.register_builtin("c", TestModule::new("c", log.clone())).await;

    let registry = Arc::new(PluginRegistry::new());
    let loader = loader_with_registry(&root, resolver, registry.clone());

    let active = loader.load_plugins().await;
    let mut names: Vec<&str> = active.iter().map(|m| m.name()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["a", "c"]);

    assert!(registry.contains("a").await);
    assert!(registry.contains("c").await);
    assert!(!registry.contains("b").await);
}

#[tokio::test]
async fn dependencies_activate_before_dependents() {
    let root = TempDir::new().unwrap();
    write_manifest(&root, "zeta", &[], true);
    write_manifest(&root, "alpha", &["zeta"], true);

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = Arc::new(PluginResolver::new());
    resolver
        .register_builtin("zeta", TestModule::new("zeta", log.clone()))
        .await;
    resolver
        .register_builtin("alpha", TestModule::new("alpha", log.clone()))
        .await;

    let loader = loader_over(&root, resolver);
    loader.load_plugins().await;

    assert_eq!(*log.lock().unwrap(), vec!["zeta", "alpha"]);
}

#[tokio::test]
async fn broken_manifest_only_skips_its_own_module() {
    let root = TempDir::new().unwrap();
    write_manifest(&root, "good", &[], true);

    let bad_dir = root.path().join("bad");
    std::fs::create_dir_all(&bad_dir).unwrap();
    std::fs::write(
        bad_dir.join("manifest.json"),
        r#"{ "name": "bad", "enabled": true }"#,
    )
    .unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = Arc::new(PluginResolver::new());
    resolver
        .register_builtin("good", TestModule::new("good", log.clone()))
        .await;
    resolver
        .register_builtin("bad", TestModule::new("bad", log.clone()))
        .await;

    let loader = loader_over(&root, resolver);
    let active = loader.load_plugins().await;

    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name(), "good");
}

#[tokio::test]
async fn disabled_and_manifest_less_directories_are_skipped() {
    let root = TempDir::new().unwrap();
    write_manifest(&root, "on", &[], true);
    write_manifest(&root, "off", &[], false);
    std::fs::create_dir_all(root.path().join("empty")).unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = Arc::new(PluginResolver::new());
    for name in ["on", "off", "empty"] {
        resolver
            .register_builtin(name, TestModule::new("x", log.clone()))
            .await;
    }

    let loader = loader_over(&root, resolver);
    let active = loader.load_plugins().await;

    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name(), "on");
}

#[tokio::test]
async fn activation_failure_excludes_only_that_module() {
    let root = TempDir::new().unwrap();
    write_manifest(&root, "stable", &[], true);
    write_manifest(&root, "flaky", &[], true);

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = Arc::new(PluginResolver::new());
    resolver
        .register_builtin("stable", TestModule::new("stable", log.clone()))
        .await;
    resolver
        .register_builtin("flaky", TestModule::failing_activate("flaky", log.clone()))
        .await;

    let registry = Arc::new(PluginRegistry::new());
    let loader = loader_with_registry(&root, resolver, registry.clone());

    let active = loader.load_plugins().await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name(), "stable");
    assert!(!registry.contains("flaky").await);
}

#[tokio::test]
async fn unresolvable_implementation_is_skipped() {
    let root = TempDir::new().unwrap();
    write_manifest(&root, "ghost", &[], true);
    write_manifest(&root, "real", &[], true);

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = Arc::new(PluginResolver::new());
    resolver
        .register_builtin("real", TestModule::new("real", log.clone()))
        .await;

    let loader = loader_over(&root, resolver);
    let active = loader.load_plugins().await;

    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name(), "real");
}

#[tokio::test]
async fn snapshot_isolates_nav_item_failures() {
    let root = TempDir::new().unwrap();
    write_manifest(&root, "healthy", &[], true);
    write_manifest(&root, "navless", &[], true);

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = Arc::new(PluginResolver::new());
    resolver
        .register_builtin("healthy", TestModule::new("healthy", log.clone()))
        .await;
    resolver
        .register_builtin("navless", TestModule::failing_nav("navless", log.clone()))
        .await;

    let loader = loader_over(&root, resolver);
    let snapshot = loader.client_snapshot().await;

    // Both modules are active, but only one contributed navigation.
    assert_eq!(snapshot.manifests.len(), 2);
    assert_eq!(snapshot.nav_items.len(), 1);
    assert_eq!(snapshot.nav_items[0].id, "healthy");
}

#[tokio::test]
async fn cache_serves_until_invalidated() {
    let root = TempDir::new().unwrap();
    write_manifest(&root, "first", &[], true);

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = Arc::new(PluginResolver::new());
    resolver
        .register_builtin("first", TestModule::new("first", log.clone()))
        .await;
    resolver
        .register_builtin("second", TestModule::new("second", log.clone()))
        .await;

    let loader = loader_over(&root, resolver);
    assert_eq!(loader.load_plugins().await.len(), 1);

    // A new module appears on disk, but the clean cache keeps serving.
    write_manifest(&root, "second", &[], true);
    assert_eq!(loader.load_plugins().await.len(), 1);

    loader.invalidate();
    assert_eq!(loader.load_plugins().await.len(), 2);
}

#[tokio::test]
async fn rebuild_replaces_the_previous_generation() {
    let root = TempDir::new().unwrap();
    write_manifest(&root, "keeper", &[], true);

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = Arc::new(PluginResolver::new());
    resolver
        .register_builtin("keeper", TestModule::new("keeper", log.clone()))
        .await;

    let registry = Arc::new(PluginRegistry::new());
    let loader = loader_with_registry(&root, resolver, registry.clone());

    loader.load_plugins().await;
    loader.invalidate();
    let active = loader.load_plugins().await;

    // Re-discovery does not trip the duplicate check against itself.
    assert_eq!(active.len(), 1);
    assert_eq!(registry.count().await, 1);
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn mismatched_manifest_name_is_rejected() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("box");
    std::fs::create_dir_all(&dir).unwrap();
    let manifest = json!({
        "name": "other",
        "displayName": "Other",
        "description": "",
        "icon": "box",
        "route": "/other",
        "version": "1.0.0",
        "enabled": true,
        "dependencies": [],
        "permissions": []
    });
    std::fs::write(dir.join("manifest.json"), manifest.to_string()).unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = Arc::new(PluginResolver::new());
    resolver
        .register_builtin("other", TestModule::new("other", log.clone()))
        .await;

    let loader = loader_over(&root, resolver);
    assert!(loader.load_plugins().await.is_empty());
}

#[tokio::test]
async fn unsafe_directory_names_never_reach_the_resolver() {
    let root = TempDir::new().unwrap();
    write_manifest(&root, "fine", &[], true);
    // Unsafe characters in the directory name; never read or probed.
    std::fs::create_dir_all(root.path().join("evil name!")).unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = Arc::new(PluginResolver::new());
    resolver
        .register_builtin("fine", TestModule::new("fine", log.clone()))
        .await;

    let loader = loader_over(&root, resolver);
    let active = loader.load_plugins().await;

    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name(), "fine");
}

#[tokio::test]
async fn get_plugin_by_name_finds_active_modules() {
    let root = TempDir::new().unwrap();
    write_manifest(&root, "ops", &[], true);

    let log = Arc::new(Mutex::new(Vec::new()));
    let resolver = Arc::new(PluginResolver::new());
    resolver
        .register_builtin("ops", TestModule::new("ops", log.clone()))
        .await;

    let loader = loader_over(&root, resolver);
    assert!(loader.get_plugin_by_name("ops").await.is_some());
    assert!(loader.get_plugin_by_name("nope").await.is_none());
}
