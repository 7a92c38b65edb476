//! Dependency declarations and the queries made against them.
//!
//! A [`Dependency`] is an immutable value naming another package plus the
//! metadata needed to decide when and how it applies: an ordered tag list
//! (see [`tag`]), the option names used to match it against a dependent's
//! build configuration, and an optional callback that mutates the ambient
//! build environment when the dependency is activated.
//!
//! Dependencies are created when a package's declaration is parsed and are
//! never mutated afterwards; the expander only produces *new* values, via
//! merging or canonical-name rewriting.
//!
//! # Persistence
//!
//! The on-disk form is deliberately lossy: only `(name, tags)` survive a
//! round trip through [`PersistedDependency`]. The environment callback is
//! not a serializable value, and option names are re-derived from the name.
//! This is a contract, not a defect - stored data written by older runs
//! must keep deserializing to the same pair shape.

pub mod tag;

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::resolver::{InstallReceipts, ResolvedTarget, Resolver};
use crate::tap::{Tap, TapRegistry};

pub use tag::Tag;

/// Callback invoked to mutate the ambient build environment when a
/// dependency is activated.
pub type EnvProc = Arc<dyn Fn() + Send + Sync>;

/// Distinguishes a plain dependency from a tap-scoped one.
///
/// Tap-scoped dependencies name a package inside a third-party tap
/// (`user/repo/package`); the tap portion is everything before the last
/// path separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// A dependency on a package from the default registry.
    Plain,
    /// A dependency on a package provided by a named tap.
    Tap {
        /// The tap identifier, e.g. `homebrew/science`.
        tap: String,
    },
}

impl DependencyKind {
    /// Whether this is a tap-scoped dependency.
    pub fn is_tap(&self) -> bool {
        matches!(self, Self::Tap { .. })
    }

    /// Kind discriminator used in cache identities and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Tap { .. } => "tap",
        }
    }
}

/// An immutable, named reference to another package.
///
/// Equality covers the kind, the name, and the tag sequence *as declared* -
/// two logically equivalent but differently ordered tag lists compare
/// unequal, although merged dependencies always carry tags in canonical
/// order. Hashing covers `(name, tags)` only. The environment callback and
/// option names never participate in equality.
#[derive(Clone)]
pub struct Dependency {
    kind: DependencyKind,
    name: String,
    tags: Vec<Tag>,
    option_names: Vec<String>,
    env_proc: Option<EnvProc>,
}

impl Dependency {
    /// Create a plain dependency on `name` with the given tags.
    ///
    /// Option names default to `[name]` and the environment callback to a
    /// no-op. Fails with [`Error::InvalidDependency`] if `name` is empty.
    pub fn new(name: impl Into<String>, tags: Vec<Tag>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid("name must not be empty"));
        }
        let option_names = vec![name.clone()];
        Ok(Self { kind: DependencyKind::Plain, name, tags, option_names, env_proc: None })
    }

    /// Create a tap-scoped dependency from a fully qualified name.
    ///
    /// The tap is everything before the last path separator; option names
    /// default to the final path segment rather than the qualified name.
    /// Fails with [`Error::InvalidDependency`] if the name is empty or
    /// carries no tap path.
    pub fn tap(name: impl Into<String>, tags: Vec<Tag>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid("name must not be empty"));
        }
        let Some((tap, leaf)) = name.rsplit_once('/') else {
            return Err(Error::invalid(format!("'{name}' is not a tap-scoped name")));
        };
        if tap.is_empty() || leaf.is_empty() {
            return Err(Error::invalid(format!("'{name}' is not a tap-scoped name")));
        }
        let kind = DependencyKind::Tap { tap: tap.to_string() };
        let option_names = vec![leaf.to_string()];
        Ok(Self { kind, name, tags, option_names, env_proc: None })
    }

    /// Internal constructor used by the expander's merge step.
    pub(crate) fn from_parts(
        kind: DependencyKind,
        name: String,
        tags: Vec<Tag>,
        option_names: Vec<String>,
        env_proc: Option<EnvProc>,
    ) -> Self {
        Self { kind, name, tags, option_names, env_proc }
    }

    /// Replace the default environment callback.
    #[must_use]
    pub fn with_env_proc(mut self, env_proc: EnvProc) -> Self {
        self.env_proc = Some(env_proc);
        self
    }

    /// Replace the default option names.
    #[must_use]
    pub fn with_option_names(mut self, option_names: Vec<String>) -> Self {
        self.option_names = option_names;
        self
    }

    /// The name of the package this dependency refers to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tag sequence as declared (or as merged, for expander output).
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Option names used to match this dependency against a dependent's
    /// build configuration.
    pub fn option_names(&self) -> &[String] {
        &self.option_names
    }

    /// Whether this dependency is plain or tap-scoped.
    pub fn kind(&self) -> &DependencyKind {
        &self.kind
    }

    /// The tap identifier for a tap-scoped dependency, `None` otherwise.
    pub fn tap_name(&self) -> Option<&str> {
        match &self.kind {
            DependencyKind::Tap { tap } => Some(tap),
            DependencyKind::Plain => None,
        }
    }

    /// Fetch the tap providing this dependency from the registry.
    ///
    /// Returns `Ok(None)` for plain dependencies.
    pub fn fetch_tap(&self, registry: &dyn TapRegistry) -> Result<Option<Box<dyn Tap>>> {
        match &self.kind {
            DependencyKind::Tap { tap } => registry.fetch_tap(tap).map(Some),
            DependencyKind::Plain => Ok(None),
        }
    }

    /// Whether this dependency carries the `optional` marker.
    pub fn is_optional(&self) -> bool {
        self.tags.contains(&Tag::Optional)
    }

    /// Whether this dependency carries the `recommended` marker.
    pub fn is_recommended(&self) -> bool {
        self.tags.contains(&Tag::Recommended)
    }

    /// Required means neither optional nor recommended.
    pub fn is_required(&self) -> bool {
        !self.is_optional() && !self.is_recommended()
    }

    /// Whether this dependency is needed at build time only.
    pub fn is_build_only(&self) -> bool {
        self.tags.contains(&Tag::Build)
    }

    /// Whether this dependency is only needed for the dependent's tests.
    pub fn is_test(&self) -> bool {
        self.tags.contains(&Tag::Test)
    }

    /// Build flags forwarded to the resolved package.
    ///
    /// Free-form markers become `--<marker>` flags (`test` becomes
    /// `--with-test`); necessity and temporality markers produce none.
    pub fn build_flags(&self) -> Vec<String> {
        self.tags
            .iter()
            .filter_map(|tag| match tag {
                Tag::Optional | Tag::Recommended | Tag::Build => None,
                Tag::Test => Some("--with-test".to_string()),
                Tag::Other(s) if s.starts_with("--") => Some(s.clone()),
                Tag::Other(s) => Some(format!("--{s}")),
            })
            .collect()
    }

    /// Resolve this dependency's name to a concrete package, attaching the
    /// build flags computed from its tags.
    ///
    /// Fails with [`Error::TargetUnavailable`] if no package provides the
    /// name. Resolution may populate a resolver-owned cache; this crate
    /// never owns that cache.
    pub fn resolve_target(&self, resolver: &dyn Resolver) -> Result<ResolvedTarget> {
        let package = resolver.resolve_by_name(&self.name)?;
        Ok(ResolvedTarget::new(package, self.build_flags()))
    }

    /// Whether the latest version of the resolved package is present.
    ///
    /// For plain dependencies an unresolvable name propagates as
    /// [`Error::TargetUnavailable`]; tap-scoped dependencies catch that
    /// case and report `false`, since an uninstalled tap makes its packages
    /// unresolvable by definition.
    pub fn installed(&self, resolver: &dyn Resolver) -> Result<bool> {
        match self.resolve_target(resolver) {
            Ok(target) => Ok(target.package().latest_version_installed()),
            Err(Error::TargetUnavailable { .. }) if self.kind.is_tap() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether this dependency is installed with every required option.
    pub fn satisfied(
        &self,
        resolver: &dyn Resolver,
        receipts: &dyn InstallReceipts,
        inherited_options: &HashSet<String>,
    ) -> Result<bool> {
        if !self.installed(resolver)? {
            return Ok(false);
        }
        Ok(self.missing_options(resolver, receipts, inherited_options)?.is_empty())
    }

    /// Options this dependency requires that its installation lacks.
    ///
    /// Computes `(own ∪ inherited) ∩ supported-by-target`, then subtracts
    /// the options recorded in the target's installation receipt. A
    /// non-empty result means the installed package must be rebuilt.
    pub fn missing_options(
        &self,
        resolver: &dyn Resolver,
        receipts: &dyn InstallReceipts,
        inherited_options: &HashSet<String>,
    ) -> Result<HashSet<String>> {
        let target = self.resolve_target(resolver)?;
        let supported = target.package().supported_options();
        let used = receipts.used_options(target.package());
        let mut required: HashSet<String> = self
            .option_names
            .iter()
            .chain(inherited_options.iter())
            .filter(|opt| supported.contains(*opt))
            .cloned()
            .collect();
        required.retain(|opt| !used.contains(opt));
        Ok(required)
    }

    /// Shared handle to the environment callback, for the merge step.
    pub(crate) fn env_proc_clone(&self) -> Option<EnvProc> {
        self.env_proc.clone()
    }

    /// Invoke the environment callback, if any.
    pub fn modify_build_environment(&self) {
        if let Some(env_proc) = &self.env_proc {
            env_proc();
        }
    }

    /// A copy of this dependency pointing at `new_name`, carrying tags,
    /// option names, and the environment callback over unchanged.
    ///
    /// Used by the expander to normalize aliased or renamed packages to
    /// their canonical identity. Tap-scoped dependencies re-derive the tap
    /// from the new name when it is qualified.
    #[must_use]
    pub fn with_renamed_target(&self, new_name: impl Into<String>) -> Self {
        let name = new_name.into();
        let kind = match &self.kind {
            DependencyKind::Plain => DependencyKind::Plain,
            DependencyKind::Tap { tap } => match name.rsplit_once('/') {
                Some((tap, _)) if !tap.is_empty() => DependencyKind::Tap { tap: tap.to_string() },
                _ => DependencyKind::Tap { tap: tap.clone() },
            },
        };
        Self {
            kind,
            name,
            tags: self.tags.clone(),
            option_names: self.option_names.clone(),
            env_proc: self.env_proc.clone(),
        }
    }

    /// The lossy persistable subset of this dependency.
    pub fn to_persisted(&self) -> PersistedDependency {
        PersistedDependency { name: self.name.clone(), tags: self.tags.clone() }
    }

    /// Reconstruct a dependency from its persisted form.
    ///
    /// Always yields a plain dependency with the default no-op callback and
    /// `option_names = [name]`, regardless of what the original carried.
    pub fn from_persisted(persisted: PersistedDependency) -> Result<Self> {
        Self::new(persisted.name, persisted.tags)
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name && self.tags == other.tags
    }
}

impl Eq for Dependency {}

impl Hash for Dependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.tags.hash(state);
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("option_names", &self.option_names)
            .field("env_proc", &self.env_proc.is_some())
            .finish()
    }
}

/// The persisted form of a [`Dependency`]: exactly `(name, tags)`.
///
/// This pair shape is the one bit-exact compatibility surface with stored
/// data. Tags serialize as strings (`"build"`, `"optional"`, opaque markers
/// verbatim).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDependency {
    /// Name of the package the dependency refers to
    pub name: String,
    /// Tag sequence as declared
    pub tags: Vec<Tag>,
}

/// An ordered collection of dependencies with classification helpers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dependencies(Vec<Dependency>);

impl Dependencies {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dependency, preserving declaration order.
    pub fn push(&mut self, dep: Dependency) {
        self.0.push(dep);
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.0.iter()
    }

    /// Number of dependencies.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The required subset, in order.
    pub fn required(&self) -> Vec<&Dependency> {
        self.iter().filter(|dep| dep.is_required()).collect()
    }

    /// The recommended subset, in order.
    pub fn recommended(&self) -> Vec<&Dependency> {
        self.iter().filter(|dep| dep.is_recommended()).collect()
    }

    /// The optional subset, in order.
    pub fn optional(&self) -> Vec<&Dependency> {
        self.iter().filter(|dep| dep.is_optional()).collect()
    }

    /// Dependencies needed at build time only.
    pub fn build_time(&self) -> Vec<&Dependency> {
        self.iter().filter(|dep| dep.is_build_only()).collect()
    }

    /// Dependencies also needed at runtime.
    pub fn runtime(&self) -> Vec<&Dependency> {
        self.iter().filter(|dep| !dep.is_build_only()).collect()
    }
}

impl From<Vec<Dependency>> for Dependencies {
    fn from(deps: Vec<Dependency>) -> Self {
        Self(deps)
    }
}

impl IntoIterator for Dependencies {
    type Item = Dependency;
    type IntoIter = std::vec::IntoIter<Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dependencies {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
