//! Error types for the wiring core.
//!
//! The taxonomy is deliberately small: invalidity is a signal encoded in
//! return values, not a fault. Callers must treat `Stale` as "re-resolve or
//! drop your reference", never as an empty result.

use thiserror::Error;

/// Errors surfaced by wiring queries and loader access.
#[derive(Debug, Error)]
pub enum WiringError {
    /// The node has been invalidated and exposes no live state. Distinct
    /// from a valid node with an empty answer.
    #[error("wiring state is no longer available")]
    Stale,
    /// The adaptor failed to construct a loader. Not cached; a later call
    /// may retry creation.
    #[error("loader construction failed: {0}")]
    LoaderFailed(String),
}

pub type WiringResult<T> = Result<T, WiringError>;
