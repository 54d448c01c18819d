//! # CLI Command Implementations
//!
//! One submodule per top-level command.
//!
//! ## Available Commands
//!
//! - [`teach`] - Store a teaching in the knowledge base
//! - [`respond`] - Ask a question against the knowledge base
//! - [`health`] - Report store, index, and generative collaborator status
//! - [`reindex`] - Rebuild the vector index from the knowledge store

pub mod health;
pub mod reindex;
pub mod respond;
pub mod teach;

use lore_engine::EngineError;

use crate::exit_codes::*;

/// Map an engine error to an exit code.
pub(crate) fn exit_code_for(error: &EngineError) -> i32 {
    match error {
        EngineError::Validation(_) | EngineError::Conflict(_) => EXIT_INVALID_INPUT,
        EngineError::Store(_) => EXIT_STORE_ERROR,
        _ => EXIT_ERROR,
    }
}
