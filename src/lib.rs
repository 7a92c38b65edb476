//! brewgraph - dependency-graph expansion for a Homebrew-style package manager
//!
//! Given a buildable unit (the *dependent*) and its declared direct
//! dependencies, brewgraph computes the deduplicated, tag-merged,
//! cycle-safe transitive closure of its dependencies in
//! dependency-before-dependent order. Necessity (required, recommended,
//! optional) and temporality (build-time-only vs runtime) semantics are
//! honored per dependency, and callers can override traversal edge by edge
//! with a decision callback.
//!
//! # Architecture Overview
//!
//! The crate is a pure algorithm plus value types; everything that touches
//! a real package store sits behind traits:
//!
//! - [`dependency`] - the immutable [`Dependency`] value type, its tag
//!   semantics, and the lossy persisted form
//! - [`resolver`] - the [`Expander`] algorithm, the [`ExpansionCache`],
//!   and the collaborator traits ([`Package`], [`Resolver`],
//!   [`InstallReceipts`])
//! - [`tap`] - the narrow tap-lookup seam for tap-scoped dependencies
//! - [`core`] - error taxonomy and the crate-wide [`Result`] alias
//!
//! # Expansion Semantics
//!
//! For each `dependent -> dep` edge the expander picks a
//! [`TraversalAction`]: a caller callback gets first say, then the default
//! policy prunes optional/recommended dependencies the dependent's build
//! does not request and descends into everything else. Descending expands
//! the resolved package's own declarations *before* appending the
//! dependency itself, which yields the dependency-before-dependent
//! ordering. Repeated names are collapsed with strictest-necessity-wins /
//! any-runtime-promotes tag merging.
//!
//! Cycles are broken by a per-call in-progress guard, so mutually
//! dependent packages expand to a finite, correct plan, and independent
//! expansions never share traversal state.
//!
//! # Example
//!
//! ```rust
//! use brewgraph::resolver::Expander;
//! use brewgraph::test_utils::Registry;
//! use brewgraph::Tag;
//!
//! let mut registry = Registry::new();
//! registry.package("ca-certificates").add();
//! registry.package("openssl@3").dep("ca-certificates").add();
//! registry.package("curl")
//!     .dep_tagged("openssl@3", &[Tag::Build])
//!     .dep_tagged("brotli", &[Tag::Optional])
//!     .add();
//!
//! let deps = Expander::new(&registry)
//!     .expand(registry.get("curl").as_ref())
//!     .unwrap();
//!
//! // brotli is optional and not requested; openssl's own dependency
//! // comes before openssl itself
//! let names: Vec<_> = deps.iter().map(|d| d.name()).collect();
//! assert_eq!(names, ["ca-certificates", "openssl@3"]);
//! ```
//!
//! [`Dependency`]: dependency::Dependency
//! [`Expander`]: resolver::Expander
//! [`ExpansionCache`]: resolver::ExpansionCache
//! [`Package`]: resolver::Package
//! [`Resolver`]: resolver::Resolver
//! [`InstallReceipts`]: resolver::InstallReceipts
//! [`TraversalAction`]: resolver::TraversalAction
//! [`Result`]: core::Result

pub mod core;
pub mod dependency;
pub mod resolver;
pub mod tap;

// Fixtures shared by unit tests, integration tests, and doctests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::core::{Error, Result};
pub use crate::dependency::{
    Dependencies, Dependency, DependencyKind, EnvProc, PersistedDependency, Tag,
};
pub use crate::resolver::{
    DecisionFn, ExpandRequest, Expander, ExpansionCache, InstallReceipts, Package, ResolvedTarget,
    Resolver, TraversalAction,
};
pub use crate::tap::{Tap, TapRegistry};
