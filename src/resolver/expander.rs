//! The recursive dependency expander.
//!
//! [`Expander::expand`] computes the transitive closure of a package's
//! dependencies: deduplicated by name, tag-merged across diamond edges,
//! ordered dependency-before-dependent, and guarded against cycles. Callers
//! can override traversal per edge through a decision callback returning a
//! [`TraversalAction`].

use std::collections::{HashMap, HashSet};

use crate::core::Result;
use crate::dependency::{Dependency, tag};

use super::cache::ExpansionCache;
use super::{Package, Resolver, package_identity};

/// What to do with one `dependent -> dependency` edge.
///
/// Returned by decision callbacks and by the default policy. This is an
/// ordinary value, not an error: every variant is a legitimate, expected
/// traversal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalAction {
    /// Drop the dependency and its entire subtree.
    Prune,
    /// Drop the dependency itself but splice in its descendants.
    Skip,
    /// Keep the dependency without descending into its own dependencies.
    KeepNoRecurse,
    /// Expand the dependency's own declarations, then keep it (default).
    Descend,
}

/// Caller-supplied per-edge decision callback.
///
/// Returning `None` falls through to the default policy: prune optional or
/// recommended dependencies the dependent's build does not request,
/// descend otherwise.
pub type DecisionFn<'a> = dyn FnMut(&dyn Package, &Dependency) -> Option<TraversalAction> + 'a;

/// Optional knobs for a single [`Expander::expand_with`] call.
pub struct ExpandRequest<'a> {
    /// Dependencies to expand instead of the dependent's own declarations.
    pub deps: Option<Vec<Dependency>>,
    /// Key under which to memoize results in the expander's cache. No key
    /// means no memoization for this call.
    pub cache_key: Option<&'a str>,
    /// Per-edge decision callback.
    pub decide: Option<&'a mut DecisionFn<'a>>,
}

impl Default for ExpandRequest<'_> {
    fn default() -> Self {
        Self { deps: None, cache_key: None, decide: None }
    }
}

impl<'a> ExpandRequest<'a> {
    /// Request with a cache key and otherwise default behavior.
    pub fn cached(cache_key: &'a str) -> Self {
        Self { cache_key: Some(cache_key), ..Self::default() }
    }

    /// Request with a decision callback and otherwise default behavior.
    pub fn deciding(decide: &'a mut DecisionFn<'a>) -> Self {
        Self { decide: Some(decide), ..Self::default() }
    }
}

/// Per-top-level-call traversal state.
///
/// The in-progress set is the cycle guard; it lives for one `expand` call
/// tree and is never shared between independent expansions.
struct ExpandContext<'a> {
    in_progress: HashSet<String>,
    cache_key: Option<&'a str>,
    decide: Option<&'a mut DecisionFn<'a>>,
}

/// Computes transitive dependency closures against a [`Resolver`].
///
/// The expander itself is stateless between calls; the optional
/// [`ExpansionCache`] is the only cross-call state, and attaching one is
/// the caller's explicit choice.
///
/// # Examples
///
/// ```rust
/// use brewgraph::resolver::{ExpandRequest, Expander, ExpansionCache};
/// use brewgraph::test_utils::Registry;
///
/// let mut registry = Registry::new();
/// registry.package("zlib").add();
/// registry.package("curl").dep("zlib").add();
///
/// let cache = ExpansionCache::new();
/// let expander = Expander::new(&registry).with_cache(&cache);
/// let root = registry.get("curl");
/// let deps = expander
///     .expand_with(root.as_ref(), ExpandRequest::cached("install"))
///     .unwrap();
/// assert_eq!(deps.len(), 1);
/// assert_eq!(deps[0].name(), "zlib");
/// ```
pub struct Expander<'r> {
    resolver: &'r dyn Resolver,
    cache: Option<&'r ExpansionCache>,
}

impl<'r> Expander<'r> {
    /// Create an expander over the given resolver, with no cache attached.
    pub fn new(resolver: &'r dyn Resolver) -> Self {
        Self { resolver, cache: None }
    }

    /// Attach a memoization cache. Cache entries are only read or written
    /// for calls that carry a cache key.
    #[must_use]
    pub fn with_cache(mut self, cache: &'r ExpansionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Expand the dependent's declared dependencies with default policy
    /// and no memoization.
    ///
    /// The result never contains the dependent itself, contains no two
    /// entries with the same name, and lists every dependency before the
    /// entries that depend on it.
    pub fn expand(&self, dependent: &dyn Package) -> Result<Vec<Dependency>> {
        self.expand_with(dependent, ExpandRequest::default())
    }

    /// Expand with explicit dependencies, cache key, or decision callback.
    ///
    /// Fails with [`Error::TargetUnavailable`] if any descended-into name
    /// does not resolve; the cycle guard is unwound cleanly on that path,
    /// so a failed expansion never poisons a later one.
    ///
    /// [`Error::TargetUnavailable`]: crate::core::Error::TargetUnavailable
    pub fn expand_with(
        &self,
        dependent: &dyn Package,
        request: ExpandRequest<'_>,
    ) -> Result<Vec<Dependency>> {
        let deps = request.deps.unwrap_or_else(|| dependent.declared_deps());
        let mut ctx = ExpandContext {
            in_progress: HashSet::new(),
            cache_key: request.cache_key,
            decide: request.decide,
        };
        self.expand_inner(dependent, &deps, &mut ctx)
    }

    /// One recursion frame: guard push, expansion, guaranteed guard pop.
    fn expand_inner(
        &self,
        dependent: &dyn Package,
        deps: &[Dependency],
        ctx: &mut ExpandContext<'_>,
    ) -> Result<Vec<Dependency>> {
        ctx.in_progress.insert(dependent.name().to_string());
        // The pop must run on every exit path, error returns included.
        let result = self.expand_deps(dependent, deps, ctx);
        ctx.in_progress.remove(dependent.name());
        result
    }

    fn expand_deps(
        &self,
        dependent: &dyn Package,
        deps: &[Dependency],
        ctx: &mut ExpandContext<'_>,
    ) -> Result<Vec<Dependency>> {
        let identity = package_identity(dependent);

        if let (Some(cache_key), Some(cache)) = (ctx.cache_key, self.cache)
            && let Some(hit) = cache.get(cache_key, &identity)
        {
            tracing::debug!("expansion cache hit for '{identity}' under key '{cache_key}'");
            return Ok(hit);
        }

        let mut expanded: Vec<Dependency> = Vec::new();

        for dep in deps {
            if dep.name() == dependent.name() {
                tracing::trace!("dropping self-dependency of '{}'", dependent.name());
                continue;
            }

            match self.classify(dependent, dep, ctx) {
                TraversalAction::Prune => {
                    tracing::trace!("pruning '{}' and its subtree", dep.name());
                }
                TraversalAction::Skip => {
                    if ctx.in_progress.contains(dep.name()) {
                        tracing::trace!("'{}' is already being expanded, dropping", dep.name());
                        continue;
                    }
                    let target = dep.resolve_target(self.resolver)?;
                    let sub_deps = target.package().declared_deps();
                    expanded.extend(self.expand_inner(target.package(), &sub_deps, ctx)?);
                }
                TraversalAction::KeepNoRecurse => {
                    expanded.push(dep.clone());
                }
                TraversalAction::Descend => {
                    if ctx.in_progress.contains(dep.name()) {
                        tracing::trace!("'{}' is already being expanded, dropping", dep.name());
                        continue;
                    }
                    let target = dep.resolve_target(self.resolver)?;
                    let sub_deps = target.package().declared_deps();
                    expanded.extend(self.expand_inner(target.package(), &sub_deps, ctx)?);

                    // Normalize renamed/aliased packages to their canonical name.
                    let canonical = target.package().full_name();
                    if dep.name() != canonical {
                        tracing::debug!("rewriting '{}' to canonical name '{canonical}'", dep.name());
                        expanded.push(dep.with_renamed_target(canonical));
                    } else {
                        expanded.push(dep.clone());
                    }
                }
            }
        }

        let merged = merge_repeats(expanded);

        if let (Some(cache_key), Some(cache)) = (ctx.cache_key, self.cache) {
            cache.insert(cache_key, &identity, merged.clone());
        }

        Ok(merged)
    }

    /// Classify the action for one edge: callback first, default policy on
    /// fall-through.
    fn classify(
        &self,
        dependent: &dyn Package,
        dep: &Dependency,
        ctx: &mut ExpandContext<'_>,
    ) -> TraversalAction {
        if let Some(decide) = ctx.decide.as_mut()
            && let Some(action) = decide(dependent, dep)
        {
            return action;
        }
        if (dep.is_optional() || dep.is_recommended()) && !dependent.wants(dep) {
            TraversalAction::Prune
        } else {
            TraversalAction::Descend
        }
    }
}

/// Collapse an expansion by unique name.
///
/// For each group of same-named entries: the first occurrence's kind and
/// environment callback are kept, option names are unioned, and tags are
/// merged with the rules in [`crate::dependency::tag`]. Output order is the
/// first-seen position of each unique name.
pub fn merge_repeats(all: Vec<Dependency>) -> Vec<Dependency> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<&Dependency>> = HashMap::new();
    for dep in &all {
        let group = grouped.entry(dep.name()).or_default();
        if group.is_empty() {
            order.push(dep.name());
        }
        group.push(dep);
    }

    order
        .into_iter()
        .map(|name| {
            let group = &grouped[name];
            let first = group[0];
            let tags = tag::merge(group);
            let mut option_names: Vec<String> = Vec::new();
            for dep in group {
                for option in dep.option_names() {
                    if !option_names.contains(option) {
                        option_names.push(option.clone());
                    }
                }
            }
            Dependency::from_parts(
                first.kind().clone(),
                name.to_string(),
                tags,
                option_names,
                first.env_proc_clone(),
            )
        })
        .collect()
}
