//! Core types for brewgraph
//!
//! This module holds the foundational pieces shared by the rest of the
//! crate: the strongly-typed error taxonomy and the crate-wide [`Result`]
//! alias. The error system is deliberately small - expansion can only fail
//! in two ways (see [`error`]), and callers are expected to match on the
//! variants rather than inspect strings.

pub mod error;

pub use error::{Error, Result};
