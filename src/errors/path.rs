//! Path enumeration and evaluation errors.

/// Errors that can occur while validating or sizing a path
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Invalid path: {reason}")]
    InvalidPath { reason: String },

    #[error("Path too short: minimum length is {min_length}, got {actual_length}")]
    PathTooShort { min_length: usize, actual_length: usize },

    #[error("Path too long: maximum length is {max_length}, got {actual_length}")]
    PathTooLong { max_length: usize, actual_length: usize },

    #[error("Empty path: no edges available")]
    EmptyPath,

    #[error("Cycle detection failed: path does not start and end at the base asset")]
    InvalidCycle,

    #[error("Edge {key} appears more than once in the path")]
    RepeatedEdge { key: String },

    #[error("Edges {index} and {next} are not connected")]
    Disconnected { index: usize, next: usize },

    #[error("Amount {requested} exceeds capacity {max_available} at step {step}")]
    AmountExceedsCapacity {
        step: usize,
        requested: String,
        max_available: String,
    },
}
