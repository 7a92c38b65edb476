//! In-memory fixtures for exercising the expander without a real package
//! store.
//!
//! Available to unit tests and, through the `test-utils` feature, to
//! integration tests and doctests. [`Registry`] is a builder-style package
//! store implementing [`Resolver`]; [`ReceiptStore`] and [`FakeTaps`] stand
//! in for the installation-receipt and tap collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::{Error, Result};
use crate::dependency::{Dependency, Tag};
use crate::resolver::{InstallReceipts, Package, Resolver};
use crate::tap::{Tap, TapRegistry};

/// A package definition held by a [`Registry`].
pub struct TestPackage {
    name: String,
    full_name: String,
    kind: String,
    deps: Vec<Dependency>,
    options: HashSet<String>,
    wanted: Mutex<HashSet<String>>,
    installed: bool,
}

impl Package for TestPackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn declared_deps(&self) -> Vec<Dependency> {
        self.deps.clone()
    }

    fn wants(&self, dep: &Dependency) -> bool {
        let wanted = self.wanted.lock().unwrap_or_else(PoisonError::into_inner);
        dep.option_names().iter().any(|option| wanted.contains(option))
    }

    fn supported_options(&self) -> HashSet<String> {
        self.options.clone()
    }

    fn latest_version_installed(&self) -> bool {
        self.installed
    }
}

/// An in-memory package store with builder-style definitions.
///
/// ```rust
/// use brewgraph::test_utils::Registry;
///
/// let mut registry = Registry::new();
/// registry.package("zlib").add();
/// registry.package("curl").dep("zlib").installed(true).add();
/// assert_eq!(registry.get("curl").declared_deps().len(), 1);
/// ```
#[derive(Default)]
pub struct Registry {
    packages: HashMap<String, Arc<TestPackage>>,
    aliases: HashMap<String, String>,
    resolutions: AtomicUsize,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start defining a package; call [`PackageBuilder::add`] to store it.
    pub fn package(&mut self, name: &str) -> PackageBuilder<'_> {
        PackageBuilder {
            registry: self,
            name: name.to_string(),
            full_name: None,
            kind: "formula".to_string(),
            deps: Vec::new(),
            options: HashSet::new(),
            wanted: HashSet::new(),
            installed: false,
        }
    }

    /// Register `alias` as an alternative name for `canonical`.
    pub fn alias(&mut self, alias: &str, canonical: &str) {
        self.aliases.insert(alias.to_string(), canonical.to_string());
    }

    /// Mark an option as requested by the named package's build.
    ///
    /// # Panics
    ///
    /// Panics if the package has not been defined.
    pub fn want(&self, package: &str, option: &str) {
        let pkg = self
            .packages
            .get(package)
            .unwrap_or_else(|| panic!("package '{package}' is not defined in the registry"));
        pkg.wanted.lock().unwrap_or_else(PoisonError::into_inner).insert(option.to_string());
    }

    /// Fetch a defined package by name.
    ///
    /// # Panics
    ///
    /// Panics if the package has not been defined.
    pub fn get(&self, name: &str) -> Arc<dyn Package> {
        let pkg = self
            .packages
            .get(name)
            .unwrap_or_else(|| panic!("package '{name}' is not defined in the registry"));
        Arc::clone(pkg) as Arc<dyn Package>
    }

    /// Number of `resolve_by_name` calls served so far.
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

impl Resolver for Registry {
    fn resolve_by_name(&self, name: &str) -> Result<Arc<dyn Package>> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        let canonical = self.aliases.get(name).map_or(name, String::as_str);
        self.packages
            .get(canonical)
            .map(|pkg| Arc::clone(pkg) as Arc<dyn Package>)
            .ok_or_else(|| Error::TargetUnavailable { name: name.to_string() })
    }
}

/// Builder returned by [`Registry::package`].
pub struct PackageBuilder<'a> {
    registry: &'a mut Registry,
    name: String,
    full_name: Option<String>,
    kind: String,
    deps: Vec<Dependency>,
    options: HashSet<String>,
    wanted: HashSet<String>,
    installed: bool,
}

impl PackageBuilder<'_> {
    /// Override the fully qualified name (defaults to the short name).
    #[must_use]
    pub fn full_name(mut self, full_name: &str) -> Self {
        self.full_name = Some(full_name.to_string());
        self
    }

    /// Override the package kind (defaults to `formula`).
    #[must_use]
    pub fn kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    /// Declare a required runtime dependency.
    #[must_use]
    pub fn dep(self, name: &str) -> Self {
        self.dep_tagged(name, &[])
    }

    /// Declare a dependency with the given tags.
    #[must_use]
    pub fn dep_tagged(mut self, name: &str, tags: &[Tag]) -> Self {
        self.deps.push(Dependency::new(name, tags.to_vec()).unwrap());
        self
    }

    /// Declare a pre-built dependency value.
    #[must_use]
    pub fn dependency(mut self, dep: Dependency) -> Self {
        self.deps.push(dep);
        self
    }

    /// Declare a supported build option.
    #[must_use]
    pub fn option(mut self, name: &str) -> Self {
        self.options.insert(name.to_string());
        self
    }

    /// Mark an option as requested by this package's build.
    #[must_use]
    pub fn wants(mut self, option: &str) -> Self {
        self.wanted.insert(option.to_string());
        self
    }

    /// Mark the latest version as installed (defaults to false).
    #[must_use]
    pub fn installed(mut self, installed: bool) -> Self {
        self.installed = installed;
        self
    }

    /// Store the package in the registry.
    pub fn add(self) {
        let full_name = self.full_name.unwrap_or_else(|| self.name.clone());
        let package = TestPackage {
            name: self.name.clone(),
            full_name,
            kind: self.kind,
            deps: self.deps,
            options: self.options,
            wanted: Mutex::new(self.wanted),
            installed: self.installed,
        };
        self.registry.packages.insert(self.name, Arc::new(package));
    }
}

/// In-memory installation receipts keyed by fully qualified name.
#[derive(Default)]
pub struct ReceiptStore {
    used: HashMap<String, HashSet<String>>,
}

impl ReceiptStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the options a package was installed with.
    pub fn record<I, S>(&mut self, full_name: &str, options: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.used.entry(full_name.to_string()).or_default().extend(options.into_iter().map(Into::into));
    }
}

impl InstallReceipts for ReceiptStore {
    fn used_options(&self, package: &dyn Package) -> HashSet<String> {
        self.used.get(package.full_name()).cloned().unwrap_or_default()
    }
}

/// In-memory tap registry.
#[derive(Default)]
pub struct FakeTaps {
    taps: HashMap<String, bool>,
}

impl FakeTaps {
    /// Create a registry with no known taps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a tap and whether it is installed.
    pub fn add(&mut self, name: &str, installed: bool) {
        self.taps.insert(name.to_string(), installed);
    }
}

impl TapRegistry for FakeTaps {
    fn fetch_tap(&self, name: &str) -> Result<Box<dyn Tap>> {
        let installed = *self
            .taps
            .get(name)
            .ok_or_else(|| Error::TargetUnavailable { name: name.to_string() })?;
        Ok(Box::new(FakeTap { name: name.to_string(), installed }))
    }
}

struct FakeTap {
    name: String,
    installed: bool,
}

impl Tap for FakeTap {
    fn name(&self) -> &str {
        &self.name
    }

    fn installed(&self) -> bool {
        self.installed
    }
}
