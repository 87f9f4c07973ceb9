//! Error types for the AI layer.
//!
//! All of these are setup-time errors. Once an evaluator is built,
//! evaluation itself cannot fail.

/// Errors raised while building evaluators or loading priority tables.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// The priority table has no entry for a declared state pair.
    #[error("no priority configured for transition {from} -> {to}")]
    MissingPriority { from: String, to: String },

    /// Targets and guards must be parallel lists.
    #[error("{targets} target states but {guards} guards")]
    GuardCountMismatch { targets: usize, guards: usize },

    /// A behavior machine already has an evaluator for this source state.
    #[error("state {0} already has a transition set")]
    DuplicateSource(String),

    /// The priority table file could not be parsed.
    #[error("invalid priority table: {0}")]
    InvalidTable(#[from] serde_json::Error),
}
