//! Error types produced by the configuration compiler.

mod constructors;
mod types;

pub use types::StrataError;

use std::sync::Arc;

/// Result alias used throughout the crate.
///
/// Errors are shared behind an [`Arc`] so that a single failure can be
/// reported from several call sites (for example a compile error surfaced
/// both by `compile` and a later `marshal`) without cloning the payload.
pub type StrataResult<T> = Result<T, Arc<StrataError>>;

#[cfg(test)]
mod tests;
