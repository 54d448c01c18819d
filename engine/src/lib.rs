//! lore-engine: tiered retrieval-and-write-back over a teaching store.
//!
//! # Architecture
//!
//! ```text
//! teach ──> KnowledgeStore (durable, authoritative)
//!               │ best-effort
//!               ▼
//!           VectorIndex  <── ReindexJob (repairs divergence)
//!
//! respond ─> Engine: vector search ─or─ lexical scan of recent rows
//!               │ confidence gate (trust a stored answer)
//!               ▼
//!           Responder (generative escalation) ──> write-back
//! ```
//!
//! The knowledge store is the single source of truth; the vector index is
//! a derived cache repaired by [`Engine::reindex`]. Retrieval degrades
//! tier by tier (vector, lexical, generative, placeholder) and only
//! validation and store failures ever surface to the caller.
//!
//! # Example
//!
//! ```ignore
//! use lore_engine::{Engine, EngineConfig, RespondRequest, TeachRequest, Scope};
//!
//! let engine = Engine::new(EngineConfig::from_env())?;
//! engine.teach(TeachRequest {
//!     text: "Paris is the capital of France".into(),
//!     scope: Some(Scope::Global),
//!     ..Default::default()
//! })?;
//! let answer = engine.respond(RespondRequest {
//!     input: "capital of France".into(),
//!     ..Default::default()
//! }).await?;
//! ```

pub mod config;
pub mod embed;
pub mod engine;
pub mod error;
pub mod generate;
pub mod index;
pub mod lexical;
pub mod store;
pub mod types;

pub use config::EngineConfig;
pub use engine::{Engine, RespondRequest, TeachRequest, GENERATED_TAG, PLACEHOLDER_REPLY};
pub use error::EngineError;
pub use store::KnowledgeStore;
pub use types::{
    Answer, Candidate, ComponentStatus, HealthReport, ReindexReport, Scope, ScopeFilter, Source,
    TeachReceipt, Teaching,
};
