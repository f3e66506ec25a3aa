//! Error types for shipsync-netcode

use shipsync_core::Tick;
use thiserror::Error;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Delta snapshot references a baseline that is not cached
    #[error("Missing baseline tick {old_tick} for snapshot {tick}")]
    MissingBaseline { tick: Tick, old_tick: Tick },

    /// Error from the core crate
    #[error(transparent)]
    Core(#[from] shipsync_core::Error),
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
