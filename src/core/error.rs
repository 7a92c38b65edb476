//! Error handling for brewgraph
//!
//! The expander surfaces a small, strongly-typed error taxonomy so callers
//! can match on the failure mode. Two conditions cover everything the core
//! can fail with:
//!
//! - [`Error::InvalidDependency`] - a dependency declaration that can never
//!   be valid (empty name, malformed tap-scoped name). Raised at
//!   construction time, never from inside an expansion.
//! - [`Error::TargetUnavailable`] - a dependency name that does not resolve
//!   to a concrete package. Propagates out of [`Expander::expand`] by
//!   default; tap-scoped installed-checks downgrade it to "not installed".
//!
//! There are no retries anywhere in this crate; every failure is returned
//! synchronously to the immediate caller.
//!
//! # Examples
//!
//! ```rust
//! use brewgraph::core::{Error, Result};
//!
//! fn check(result: Result<()>) {
//!     match result {
//!         Ok(()) => {}
//!         Err(Error::TargetUnavailable { name }) => {
//!             eprintln!("no package provides '{name}'");
//!         }
//!         Err(e) => eprintln!("unexpected error: {e}"),
//!     }
//! }
//! ```
//!
//! [`Expander::expand`]: crate::resolver::Expander::expand

use thiserror::Error;

/// The error type for all brewgraph operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A dependency declaration is structurally invalid.
    ///
    /// Returned from [`Dependency`] constructors when the name is empty or,
    /// for tap-scoped dependencies, when the name carries no tap path.
    /// Expansion never produces this error: every [`Dependency`] value that
    /// exists has already passed construction.
    ///
    /// [`Dependency`]: crate::dependency::Dependency
    #[error("invalid dependency: {reason}")]
    InvalidDependency {
        /// Why the declaration was rejected
        reason: String,
    },

    /// A dependency name does not resolve to any concrete package.
    ///
    /// Raised by [`Resolver::resolve_by_name`] and propagated out of the
    /// expansion that triggered the lookup. The single exception is
    /// [`Dependency::installed`] on a tap-scoped dependency, which catches
    /// this error and reports `false` instead.
    ///
    /// [`Resolver::resolve_by_name`]: crate::resolver::Resolver::resolve_by_name
    /// [`Dependency::installed`]: crate::dependency::Dependency::installed
    #[error("no available package for dependency '{name}'")]
    TargetUnavailable {
        /// The dependency name that failed to resolve
        name: String,
    },
}

impl Error {
    /// Shorthand for an [`Error::InvalidDependency`] with the given reason.
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidDependency { reason: reason.into() }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
