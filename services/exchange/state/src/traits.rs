//! State Management Traits
//!
//! Snapshot and restore for the components that own exchange state.

use thiserror::Error;

/// Error types for state management operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Snapshot rejected: {reason}")]
    InvalidSnapshot { reason: String },
}

/// Components whose full state can be captured and reinstated
///
/// Snapshots are opaque bytes; only the component that produced one is
/// expected to read it back.
pub trait Stateful {
    /// Create a snapshot of the current state
    fn snapshot(&self) -> Result<Vec<u8>, StateError>;

    /// Replace the current state with a snapshot
    fn restore(&self, snapshot: &[u8]) -> Result<(), StateError>;
}
