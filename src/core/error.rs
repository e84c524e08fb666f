use thiserror::Error;

/// Failures that abort extraction for a single filing.
///
/// None of these are fatal to a batch: the driver logs the error and moves on
/// to the next filing.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("model provider could not load {path}: {reason}")]
    ProviderLoad { path: String, reason: String },

    #[error("report missing concept definitions for {count} facts")]
    MissingConcepts { count: usize },

    #[error("report artifact missing: {0}")]
    MissingArtifact(String),

    #[error("cycle detected following {arcrole} in {elr} at {concept}")]
    CycleDetected {
        arcrole: String,
        elr: String,
        concept: String,
    },

    #[error("markup scan failed: {0}")]
    Markup(String),
}
