//! Dependency resolution and expansion for brewgraph.
//!
//! This module implements the transitive-closure algorithm that turns a
//! package's declared dependencies into the deduplicated, tag-merged,
//! cycle-safe install plan, plus the trait seams the algorithm consumes.
//!
//! # Architecture Overview
//!
//! The expander is purely synchronous recursion over a dependency graph
//! that is discovered as it is walked - there is no up-front graph
//! construction phase. Three collaborator traits keep the algorithm
//! independent of any concrete package store:
//!
//! - [`Package`] - the dependent abstraction: a name, a declared
//!   dependency list, and a build-configuration predicate.
//! - [`Resolver`] - maps a dependency name to a concrete [`Package`],
//!   failing with [`TargetUnavailable`] when nothing provides it.
//! - [`InstallReceipts`] - looks up which options a package was last
//!   installed with, for [`Dependency::missing_options`].
//!
//! # Resolution Process
//!
//! For each direct dependency the expander classifies a
//! [`TraversalAction`] (caller callback first, default policy second) and
//! interprets it:
//!
//! 1. **Prune** - drop the dependency and its entire subtree
//! 2. **Skip** - drop the dependency but splice in its descendants
//! 3. **KeepNoRecurse** - keep the dependency, do not descend
//! 4. **Descend** - expand the resolved package's own declarations first,
//!    then append the dependency under its canonical name
//!
//! Repeated names are collapsed afterwards with the tag-merge rules in
//! [`crate::dependency::tag`], so the output is dependency-before-dependent
//! ordered and duplicate-free.
//!
//! # Cycle Safety
//!
//! A per-call in-progress set guards the recursion. Each top-level
//! [`Expander::expand`] owns its own guard, so concurrent, unrelated
//! expansions never observe each other's traversal state. The optional
//! [`ExpansionCache`] is the only shared structure, and it only ever holds
//! complete, merged results.
//!
//! [`TargetUnavailable`]: crate::core::Error::TargetUnavailable
//! [`Dependency::missing_options`]: crate::dependency::Dependency::missing_options

pub mod cache;
pub mod expander;

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::Result;
use crate::dependency::Dependency;

pub use cache::ExpansionCache;
pub use expander::{DecisionFn, ExpandRequest, Expander, TraversalAction, merge_repeats};

/// The dependent abstraction: a buildable unit whose declarations the
/// expander walks.
///
/// Implementations are expected to be cheap to query; `declared_deps` is
/// called once per visit and the expander performs no caching of its own
/// beyond the optional [`ExpansionCache`].
pub trait Package {
    /// Short name, used for cycle-guard membership and self-dependency
    /// checks.
    fn name(&self) -> &str;

    /// Fully qualified name (tap-qualified where applicable); the canonical
    /// identity dependencies are rewritten to.
    fn full_name(&self) -> &str;

    /// Kind discriminator mixed into the cache identity, so two package
    /// kinds sharing a full name never collide in the cache.
    fn kind(&self) -> &str {
        "formula"
    }

    /// Directly declared dependencies, in declaration order.
    fn declared_deps(&self) -> Vec<Dependency>;

    /// Whether this package's build configuration requests `dep`.
    ///
    /// Consulted by the default traversal policy for optional and
    /// recommended dependencies.
    fn wants(&self, dep: &Dependency) -> bool;

    /// Option identifiers this package's build supports.
    fn supported_options(&self) -> HashSet<String>;

    /// Whether the latest version of this package is installed.
    fn latest_version_installed(&self) -> bool;
}

/// Cache identity of a package: fully qualified name plus concrete kind.
pub(crate) fn package_identity(package: &dyn Package) -> String {
    format!("{}::{}", package.full_name(), package.kind())
}

/// Maps dependency names to concrete packages.
///
/// A resolver may keep its own resolution cache; that cache is owned by
/// the resolver, not by this crate, and is invisible to the expander.
pub trait Resolver {
    /// Resolve `name` to a concrete package.
    ///
    /// Fails with [`Error::TargetUnavailable`] when no package (or no
    /// unambiguous package) provides the name.
    ///
    /// [`Error::TargetUnavailable`]: crate::core::Error::TargetUnavailable
    fn resolve_by_name(&self, name: &str) -> Result<Arc<dyn Package>>;
}

/// Lookup of the options recorded when a package was last installed.
pub trait InstallReceipts {
    /// Option identifiers the given package was installed with.
    fn used_options(&self, package: &dyn Package) -> HashSet<String>;
}

/// A dependency resolved to a concrete package, carrying the build flags
/// computed from the dependency's tags.
pub struct ResolvedTarget {
    package: Arc<dyn Package>,
    build_flags: Vec<String>,
}

impl ResolvedTarget {
    pub(crate) fn new(package: Arc<dyn Package>, build_flags: Vec<String>) -> Self {
        Self { package, build_flags }
    }

    /// The resolved package.
    pub fn package(&self) -> &dyn Package {
        self.package.as_ref()
    }

    /// Shared handle to the resolved package.
    pub fn package_arc(&self) -> Arc<dyn Package> {
        Arc::clone(&self.package)
    }

    /// Build flags this dependency requests from the package, derived from
    /// its free-form tags.
    pub fn build_flags(&self) -> &[String] {
        &self.build_flags
    }
}
