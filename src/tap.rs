//! Tap lookup for tap-scoped dependencies.
//!
//! A tap is a named external repository of package definitions. The only
//! thing this crate needs from one is whether it is present locally, so the
//! interface stays deliberately narrow. Taps are resolved lazily: a
//! tap-scoped [`Dependency`] stores the tap identifier and fetches the
//! handle on demand via [`Dependency::fetch_tap`].
//!
//! [`Dependency`]: crate::dependency::Dependency
//! [`Dependency::fetch_tap`]: crate::dependency::Dependency::fetch_tap

use crate::core::Result;

/// A handle to a named external repository of package definitions.
pub trait Tap {
    /// The tap identifier, e.g. `homebrew/science`.
    fn name(&self) -> &str;

    /// Whether the tap is present locally.
    fn installed(&self) -> bool;
}

/// Lookup of taps by identifier.
pub trait TapRegistry {
    /// Fetch a handle for the named tap.
    ///
    /// Fails with [`Error::TargetUnavailable`] when the identifier names no
    /// known tap.
    ///
    /// [`Error::TargetUnavailable`]: crate::core::Error::TargetUnavailable
    fn fetch_tap(&self, name: &str) -> Result<Box<dyn Tap>>;
}
