//! Vector index client.
//!
//! Nearest-neighbor search over embedded teachings, keyed by the same ids
//! as the knowledge store and eventually consistent with it. Every write
//! here is best-effort: the caller logs and swallows failures, and the
//! reindex job repairs any divergence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{Candidate, Scope, Teaching};

/// Nearest-neighbor search over embedded teachings.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Idempotent create-if-absent of the collection. Safe on every
    /// startup and before every write.
    async fn ensure_collection(&self) -> Result<(), EngineError>;

    /// Insert or replace the point for the teaching's id.
    async fn upsert(&self, teaching: &Teaching, vector: Vec<f32>) -> Result<(), EngineError>;

    /// Up to `top_k` nearest points by cosine similarity, with payloads.
    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<Candidate>, EngineError>;

    /// Liveness probe for the health report.
    async fn ping(&self) -> Result<(), EngineError>;
}

// --- Qdrant REST wire types ---

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ExistsResult {
    exists: bool,
}

#[derive(Debug, Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Debug, Serialize)]
struct UpsertPoints {
    points: Vec<Point>,
}

#[derive(Debug, Serialize)]
struct Point {
    id: String,
    vector: Vec<f32>,
    payload: PointPayload,
}

/// Payload stored alongside each vector, mirroring the teaching row.
#[derive(Debug, Serialize, Deserialize)]
struct PointPayload {
    text: String,
    #[serde(default)]
    tags: Vec<String>,
    scope: Scope,
    #[serde(default)]
    session_id: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct QueryPoints<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    points: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: String,
    #[serde(default)]
    score: f32,
    payload: Option<PointPayload>,
}

/// Qdrant-backed index over its REST surface.
pub struct QdrantIndex {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    dimensions: usize,
}

impl QdrantIndex {
    pub fn new(
        base_url: String,
        collection: String,
        dimensions: usize,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            collection,
            dimensions,
        }
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection, suffix)
    }

    async fn collection_exists(&self) -> Result<bool, EngineError> {
        let response = self
            .client
            .get(self.collection_url("/exists"))
            .send()
            .await
            .map_err(|e| EngineError::Index(format!("exists check failed: {e}")))?;

        if !response.status().is_success() {
            return Err(EngineError::Index(format!(
                "exists check returned {}",
                response.status()
            )));
        }

        let body: ApiResponse<ExistsResult> = response
            .json()
            .await
            .map_err(|e| EngineError::Index(format!("exists response parse: {e}")))?;
        Ok(body.result.exists)
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_collection(&self) -> Result<(), EngineError> {
        if self.collection_exists().await? {
            return Ok(());
        }

        let body = CreateCollection {
            vectors: VectorParams {
                size: self.dimensions,
                distance: "Cosine",
            },
        };
        let response = self
            .client
            .put(self.collection_url(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Index(format!("create collection failed: {e}")))?;

        // A concurrent creator winning the race is fine.
        if response.status().is_success() || response.status() == reqwest::StatusCode::CONFLICT {
            Ok(())
        } else {
            Err(EngineError::Index(format!(
                "create collection returned {}",
                response.status()
            )))
        }
    }

    async fn upsert(&self, teaching: &Teaching, vector: Vec<f32>) -> Result<(), EngineError> {
        let body = UpsertPoints {
            points: vec![Point {
                id: teaching.id.clone(),
                vector,
                payload: PointPayload {
                    text: teaching.text.clone(),
                    tags: teaching.tags.clone(),
                    scope: teaching.scope,
                    session_id: teaching.session_id.clone(),
                    created_at: teaching.created_at,
                },
            }],
        };

        let response = self
            .client
            .put(self.collection_url("/points?wait=true"))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Index(format!("upsert failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(EngineError::Index(format!(
                "upsert returned {}",
                response.status()
            )))
        }
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<Candidate>, EngineError> {
        let body = QueryPoints {
            query: vector,
            limit: top_k,
            with_payload: true,
        };

        let response = self
            .client
            .post(self.collection_url("/points/query"))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Index(format!("search failed: {e}")))?;

        if !response.status().is_success() {
            return Err(EngineError::Index(format!(
                "search returned {}",
                response.status()
            )));
        }

        let result: ApiResponse<QueryResult> = response
            .json()
            .await
            .map_err(|e| EngineError::Index(format!("search response parse: {e}")))?;

        let candidates = result
            .result
            .points
            .into_iter()
            .filter_map(|p| {
                let payload = p.payload?;
                Some(Candidate {
                    id: p.id,
                    text: payload.text,
                    tags: payload.tags,
                    scope: payload.scope,
                    session_id: payload.session_id,
                    created_at: payload.created_at,
                    score: p.score.clamp(0.0, 1.0),
                })
            })
            .collect();
        Ok(candidates)
    }

    async fn ping(&self) -> Result<(), EngineError> {
        let response = self
            .client
            .get(format!("{}/collections", self.base_url))
            .send()
            .await
            .map_err(|e| EngineError::Index(format!("ping failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(EngineError::Index(format!(
                "ping returned {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_index() -> QdrantIndex {
        // Nothing listens on port 1.
        QdrantIndex::new(
            "http://127.0.0.1:1".to_string(),
            "teachings".to_string(),
            8,
            Duration::from_millis(200),
        )
    }

    #[test]
    fn collection_url_joins_cleanly() {
        let index = QdrantIndex::new(
            "http://127.0.0.1:6333/".to_string(),
            "teachings".to_string(),
            8,
            Duration::from_secs(1),
        );
        assert_eq!(
            index.collection_url("/points"),
            "http://127.0.0.1:6333/collections/teachings/points"
        );
    }

    #[tokio::test]
    async fn unreachable_index_maps_to_index_errors() {
        let index = unreachable_index();
        assert!(matches!(
            index.ping().await.unwrap_err(),
            EngineError::Index(_)
        ));
        assert!(matches!(
            index.search(&[0.0; 8], 4).await.unwrap_err(),
            EngineError::Index(_)
        ));
        assert!(matches!(
            index.ensure_collection().await.unwrap_err(),
            EngineError::Index(_)
        ));
    }

    #[test]
    fn payload_round_trips_through_json() {
        let payload = PointPayload {
            text: "Paris is the capital of France".to_string(),
            tags: vec!["geo".to_string()],
            scope: Scope::Global,
            session_id: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        let back: PointPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.text, payload.text);
        assert_eq!(back.tags, payload.tags);
        assert_eq!(back.scope, Scope::Global);
    }
}
