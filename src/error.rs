//! Error handling
//!
//! Error types for board construction and the slot cycle. Configuration and
//! planning errors are fatal at startup; everything else is local to one slot.

use thiserror::Error;

/// Board error type
#[derive(Error, Debug)]
pub enum BoardError {
    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Board configured with no slots
    #[error("slot count must be greater than 0")]
    NoSlots,

    /// Slot capacity of zero
    #[error("slot {slot} has capacity 0, every slot needs at least one profile")]
    ZeroCapacity { slot: usize },

    /// Capacity list length disagrees with the slot count
    #[error("{provided} capacities provided for {slot_count} slots")]
    CapacityCount { slot_count: usize, provided: usize },

    /// Capacities do not sum to the pool size
    #[error("slot capacities sum to {assigned} but the profile pool holds {pool_size} profiles")]
    CapacityMismatch { assigned: usize, pool_size: usize },

    /// A referenced profile has no backing record
    #[error("slot {slot} references profile index {index} which has no record")]
    MissingContent { slot: usize, index: usize },

    /// Mirror group has no elements to update
    #[error("slot {slot} has no rendered elements")]
    EmptyMirrorGroup { slot: usize },

    /// Asset failed to load
    #[error("asset load failed for {reference}: {reason}")]
    AssetLoad { reference: String, reason: String },

    /// Asset did not load within the bounded timeout
    #[error("asset load timed out after {millis}ms: {reference}")]
    AssetTimeout { reference: String, millis: u64 },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BoardError {
    /// Whether the error aborts board initialization
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BoardError::Config(_)
                | BoardError::NoSlots
                | BoardError::ZeroCapacity { .. }
                | BoardError::CapacityCount { .. }
                | BoardError::CapacityMismatch { .. }
                | BoardError::Io(_)
                | BoardError::Serialization(_)
        )
    }
}

impl From<std::io::Error> for BoardError {
    fn from(e: std::io::Error) -> Self {
        BoardError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(e: serde_json::Error) -> Self {
        BoardError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for BoardError {
    fn from(e: figment::Error) -> Self {
        BoardError::Config(e.to_string())
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, BoardError>;
