use thiserror::Error;

/// Errors that can occur during engine operations.
///
/// Only `Validation`, `Conflict`, and `Store` are meant to reach callers:
/// index and collaborator failures are recovered internally by degrading to
/// the next retrieval tier.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Bad input shape. Never retried.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Duplicate teaching id. Should not occur with freshly generated ids.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Knowledge store failure. Fatal to the operation in flight.
    #[error("knowledge store error: {0}")]
    Store(String),

    /// Vector index failure. Recovered by falling back to lexical scoring.
    #[error("vector index error: {0}")]
    Index(String),

    /// Embedding or generative collaborator failed or timed out.
    /// Recovered by falling back to the next tier.
    #[error("collaborator error: {0}")]
    Collaborator(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        EngineError::Store(e.to_string())
    }
}

impl EngineError {
    /// Check whether this error should surface to the caller as a failure,
    /// rather than degrade the pipeline.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_) | EngineError::Conflict(_) | EngineError::Store(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_validation_conflict_and_store_surface() {
        assert!(EngineError::Validation("x".into()).is_fatal());
        assert!(EngineError::Conflict("x".into()).is_fatal());
        assert!(EngineError::Store("x".into()).is_fatal());
        assert!(!EngineError::Index("x".into()).is_fatal());
        assert!(!EngineError::Collaborator("x".into()).is_fatal());
    }
}
