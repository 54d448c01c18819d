//! Hosted embedding provider.
//!
//! Talks to an OpenAI-compatible `/embeddings` endpoint. Calls may take
//! seconds and may fail transiently (timeout, quota); failures come back
//! as `Collaborator` errors so the caller can degrade to the lexical tier
//! instead of surfacing them.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::embed::Embedder;
use crate::error::EngineError;

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dims: usize,
}

impl OpenAiEmbedder {
    /// Create a hosted provider.
    ///
    /// # Arguments
    /// * `endpoint` - API base (e.g. "https://api.openai.com/v1")
    /// * `model` - Model name (e.g. "text-embedding-3-small")
    /// * `dims` - Embedding dimensions (1536 for text-embedding-3-small)
    /// * `timeout` - Per-request budget; a slow provider degrades one
    ///   request, not the service
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        dims: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            endpoint,
            api_key,
            model,
            dims,
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        let url = format!("{}/embeddings", self.endpoint);
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: vec![text.to_string()],
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Collaborator(format!("embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Collaborator(format!(
                "embedding API error {status}: {body}"
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Collaborator(format!("embedding response parse: {e}")))?;

        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EngineError::Collaborator("empty embedding response".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        &self.model
    }

    fn is_remote(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_configured_dimensions_and_model() {
        let e = OpenAiEmbedder::new(
            "https://api.openai.com/v1".to_string(),
            "test-key".to_string(),
            "text-embedding-3-small".to_string(),
            1536,
            Duration::from_secs(15),
        );
        assert_eq!(e.dimensions(), 1536);
        assert_eq!(e.name(), "text-embedding-3-small");
        assert!(e.is_remote());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_collaborator_error() {
        // Nothing listens on this port; the call must fail fast and map
        // to the degradable error class, not panic or hang.
        let e = OpenAiEmbedder::new(
            "http://127.0.0.1:1".to_string(),
            "key".to_string(),
            "model".to_string(),
            8,
            Duration::from_millis(200),
        );
        let err = e.embed("hello").await.unwrap_err();
        assert!(matches!(err, EngineError::Collaborator(_)));
    }
}
