//! Engine configuration.
//!
//! Every knob lives here so the retrieval thresholds stay explicit,
//! documented constants rather than values derived at runtime. Defaults
//! match a local single-node deployment; environment variables override.

use serde::Deserialize;

/// Default Qdrant endpoint.
const DEFAULT_QDRANT_URL: &str = "http://127.0.0.1:6333";

/// Default OpenAI-compatible API endpoint.
const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// Engine configuration, normally built from the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite database path. `:memory:` is accepted for tests.
    pub database_path: String,

    /// Qdrant base URL. Empty disables the vector tier entirely.
    pub qdrant_url: String,
    /// Vector collection name.
    pub collection: String,

    /// API key for the hosted embedding/generative provider. Empty means
    /// no hosted provider: the deterministic local embedder is used and
    /// the generative tier is unavailable.
    pub openai_api_key: String,
    pub openai_endpoint: String,
    /// Hosted embedding model.
    pub embed_model: String,
    /// Hosted chat model for generative escalation.
    pub chat_model: String,
    /// Vector dimension of the hosted embedding model.
    pub embed_dimensions: usize,
    /// Vector dimension of the local hash embedder.
    pub fallback_dimensions: usize,

    /// Retrieval score at or above which a stored candidate is trusted
    /// without generative escalation.
    pub high_confidence: f32,
    /// Confidence assigned to every generated answer. The collaborator
    /// reports no confidence of its own, so a conservative constant
    /// stands in until a real signal exists.
    pub generated_confidence: f32,
    /// Generated answers at or above this confidence are persisted back
    /// into the knowledge store.
    pub writeback_threshold: f32,

    /// Candidates requested from the vector tier per query.
    pub top_k: usize,
    /// Rows scanned by the lexical fallback tier.
    pub recent_window: usize,

    /// Timeout for embedding and index calls, in seconds.
    pub request_timeout_secs: u64,
    /// Request-scoped budget for the generative call, in seconds.
    pub generate_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: "lore.db".to_string(),
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            collection: "teachings".to_string(),
            openai_api_key: String::new(),
            openai_endpoint: DEFAULT_OPENAI_ENDPOINT.to_string(),
            embed_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embed_dimensions: 1536,
            fallback_dimensions: 256,
            high_confidence: 0.70,
            generated_confidence: 0.65,
            writeback_threshold: 0.60,
            top_k: 4,
            recent_window: 50,
            request_timeout_secs: 15,
            generate_timeout_secs: 20,
        }
    }
}

impl EngineConfig {
    /// Build a configuration from the environment, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("LORE_DB") {
            cfg.database_path = v;
        }
        if let Ok(v) = std::env::var("QDRANT_URL") {
            cfg.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("QDRANT_COLLECTION") {
            cfg.collection = v;
        }
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            cfg.openai_api_key = v;
        }
        if let Ok(v) = std::env::var("OPENAI_ENDPOINT") {
            cfg.openai_endpoint = v;
        }
        if let Ok(v) = std::env::var("OPENAI_EMBED_MODEL") {
            cfg.embed_model = v;
        }
        if let Ok(v) = std::env::var("OPENAI_CHAT_MODEL") {
            cfg.chat_model = v;
        }
        if let Some(v) = env_parse("LORE_EMBED_DIMENSIONS") {
            cfg.embed_dimensions = v;
        }
        if let Some(v) = env_parse("LORE_TOP_K") {
            cfg.top_k = v;
        }
        if let Some(v) = env_parse("LORE_RECENT_WINDOW") {
            cfg.recent_window = v;
        }

        cfg
    }

    /// Whether a hosted embedding/generative provider is configured.
    pub fn has_hosted_provider(&self) -> bool {
        !self.openai_api_key.is_empty()
    }

    /// Whether the vector tier is configured at all.
    pub fn has_vector_index(&self) -> bool {
        !self.qdrant_url.is_empty()
    }

    /// Clamp a caller-supplied top-k to a sane bound, defaulting to the
    /// configured value when absent.
    pub fn clamp_top_k(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.top_k).clamp(1, 16)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_thresholds_ordered() {
        let cfg = EngineConfig::default();
        assert!(cfg.high_confidence > cfg.generated_confidence);
        assert!(cfg.generated_confidence > cfg.writeback_threshold);
    }

    #[test]
    fn hosted_provider_requires_a_key() {
        let mut cfg = EngineConfig::default();
        assert!(!cfg.has_hosted_provider());
        cfg.openai_api_key = "sk-test".to_string();
        assert!(cfg.has_hosted_provider());
    }

    #[test]
    fn top_k_is_clamped() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.clamp_top_k(None), 4);
        assert_eq!(cfg.clamp_top_k(Some(0)), 1);
        assert_eq!(cfg.clamp_top_k(Some(100)), 16);
        assert_eq!(cfg.clamp_top_k(Some(8)), 8);
    }
}
