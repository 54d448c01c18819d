//! The retrieval orchestrator.
//!
//! Turns a query into ranked candidates, decides whether to trust them or
//! escalate to the generative collaborator, and decides whether to commit
//! a generated answer back into the knowledge store. Tier selection
//! happens once at construction from configuration; per-request the engine
//! only falls *down* the tiers (vector, lexical, generative, placeholder),
//! never errors sideways: only validation and knowledge-store failures are
//! allowed to surface.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::config::EngineConfig;
use crate::embed::{Embedder, HashEmbedder, OpenAiEmbedder};
use crate::error::EngineError;
use crate::generate::{OpenAiResponder, Responder};
use crate::index::{QdrantIndex, VectorIndex};
use crate::lexical;
use crate::store::KnowledgeStore;
use crate::types::{
    Answer, Candidate, ComponentStatus, HealthReport, ReindexReport, Scope, ScopeFilter, Source,
    TeachReceipt, Teaching,
};

/// Reply returned when no tier produced a confident answer.
pub const PLACEHOLDER_REPLY: &str = "I don't know that yet. Teach me and ask again.";

/// Provenance tag on write-back teachings.
pub const GENERATED_TAG: &str = "ai_reply";

/// A teach operation as handed over by the routing collaborator.
#[derive(Debug, Clone, Default)]
pub struct TeachRequest {
    pub text: String,
    pub tags: Vec<String>,
    /// Defaults to `Session` when absent.
    pub scope: Option<Scope>,
    pub session_id: Option<String>,
}

/// A respond operation as handed over by the routing collaborator.
#[derive(Debug, Clone, Default)]
pub struct RespondRequest {
    pub input: String,
    pub session_id: Option<String>,
    pub top_k: Option<usize>,
}

/// The tiered retrieval-and-write-back engine.
///
/// Owns its collaborators; construct once at startup and share behind an
/// `Arc`. Each teach/respond call is an independent request with no shared
/// mutable state beyond the two stores.
pub struct Engine {
    config: EngineConfig,
    store: Arc<KnowledgeStore>,
    embedder: Arc<dyn Embedder>,
    index: Option<Arc<dyn VectorIndex>>,
    responder: Option<Arc<dyn Responder>>,
    /// Outstanding fire-and-forget tasks (vector upserts, write-backs),
    /// drained by [`Engine::shutdown`].
    background: std::sync::Mutex<tokio::task::JoinSet<()>>,
}

impl Engine {
    /// Wire up an engine from configuration: hosted embedder + generative
    /// collaborator when an API key is present, the deterministic local
    /// embedder (and no generative tier) otherwise.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let store = Arc::new(KnowledgeStore::open(&config.database_path)?);
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let embedder: Arc<dyn Embedder> = if config.has_hosted_provider() {
            Arc::new(OpenAiEmbedder::new(
                config.openai_endpoint.clone(),
                config.openai_api_key.clone(),
                config.embed_model.clone(),
                config.embed_dimensions,
                timeout,
            ))
        } else {
            Arc::new(HashEmbedder::new(config.fallback_dimensions))
        };

        let index: Option<Arc<dyn VectorIndex>> = if config.has_vector_index() {
            Some(Arc::new(QdrantIndex::new(
                config.qdrant_url.clone(),
                config.collection.clone(),
                embedder.dimensions(),
                timeout,
            )))
        } else {
            None
        };

        // The generative tier exists only behind a hosted embedding stack;
        // the deterministic local embedder never implies it.
        let responder: Option<Arc<dyn Responder>> = if embedder.is_remote() {
            Some(Arc::new(OpenAiResponder::new(
                config.openai_endpoint.clone(),
                config.openai_api_key.clone(),
                config.chat_model.clone(),
                Duration::from_secs(config.generate_timeout_secs),
            )))
        } else {
            None
        };

        Ok(Self {
            config,
            store,
            embedder,
            index,
            responder,
            background: std::sync::Mutex::new(tokio::task::JoinSet::new()),
        })
    }

    /// Assemble an engine from explicit parts. This is the injection seam
    /// for tests and for callers that manage collaborator lifecycles
    /// themselves.
    pub fn with_parts(
        config: EngineConfig,
        store: Arc<KnowledgeStore>,
        embedder: Arc<dyn Embedder>,
        index: Option<Arc<dyn VectorIndex>>,
        responder: Option<Arc<dyn Responder>>,
    ) -> Self {
        Self {
            config,
            store,
            embedder,
            index,
            responder,
            background: std::sync::Mutex::new(tokio::task::JoinSet::new()),
        }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Wait for outstanding best-effort tasks to finish. Part of the
    /// graceful shutdown lifecycle: failures stay swallowed, but in-flight
    /// upserts and write-backs get their chance to land.
    pub async fn shutdown(&self) {
        let mut tasks = std::mem::take(
            &mut *self.background.lock().unwrap_or_else(|e| e.into_inner()),
        );
        while tasks.join_next().await.is_some() {}
    }

    fn spawn_background<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.background
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .spawn(task);
    }

    /// Ingest a teaching: durable insert first, then a best-effort vector
    /// upsert that never fails the request.
    pub fn teach(&self, request: TeachRequest) -> Result<TeachReceipt, EngineError> {
        let text = request.text.trim().to_string();
        if text.is_empty() {
            return Err(EngineError::Validation("text must not be empty".to_string()));
        }

        let scope = request.scope.unwrap_or(Scope::Session);
        let session_id = match scope {
            Scope::Session => Some(request.session_id.ok_or_else(|| {
                EngineError::Validation(
                    "session-scoped teaching requires a session id".to_string(),
                )
            })?),
            // A stray session id on a global teach is dropped, not stored.
            Scope::Global => None,
        };

        let teaching = Teaching::new(text, normalize_tags(request.tags), scope, session_id);
        self.store.insert(&teaching)?;
        debug!("teach stored {} ({})", teaching.id, teaching.scope.as_str());

        self.spawn_upsert(teaching.clone());

        Ok(TeachReceipt {
            ok: true,
            id: teaching.id,
            scope: teaching.scope,
            tags: teaching.tags,
        })
    }

    /// Answer a query through the tiered pipeline.
    pub async fn respond(&self, request: RespondRequest) -> Result<Answer, EngineError> {
        let input = request.input.trim();
        if input.is_empty() {
            return Err(EngineError::Validation("input must not be empty".to_string()));
        }
        let session_id = request.session_id.as_deref();
        let top_k = self.config.clamp_top_k(request.top_k);

        let candidates = self.gather(input, session_id, top_k).await?;

        // Confidence gate: trust a stored answer outright. The common,
        // cheap path; no generative call is made.
        if let Some(top) = candidates.first() {
            if top.score >= self.config.high_confidence {
                debug!("gate passed with {} at {:.2}", top.id, top.score);
                return Ok(Answer {
                    reply: top.text.clone(),
                    sources: to_sources(&candidates),
                });
            }
        }

        if let Some(responder) = &self.responder {
            let budget = Duration::from_secs(self.config.generate_timeout_secs);
            match tokio::time::timeout(budget, responder.generate(input)).await {
                Ok(Ok(reply)) => {
                    if self.config.generated_confidence >= self.config.writeback_threshold {
                        self.spawn_write_back(reply.clone());
                    }
                    return Ok(Answer {
                        reply,
                        sources: to_sources(&candidates),
                    });
                }
                Ok(Err(e)) => warn!("generate failed, degrading to placeholder: {e}"),
                Err(_) => warn!("generate timed out after {}s", budget.as_secs()),
            }
        }

        // Zero-confidence path: still hand back whatever context was
        // gathered so the caller gets best-effort sources.
        Ok(Answer {
            reply: PLACEHOLDER_REPLY.to_string(),
            sources: to_sources(&candidates),
        })
    }

    /// Independent liveness of the two stores plus generative capability.
    /// Probing never fails; a probe error reads as "down".
    pub async fn health(&self) -> HealthReport {
        let store = match self.store.ping() {
            Ok(()) => ComponentStatus::Up,
            Err(e) => {
                warn!("store ping failed: {e}");
                ComponentStatus::Down
            }
        };

        let index = match &self.index {
            None => ComponentStatus::Absent,
            Some(index) => match index.ping().await {
                Ok(()) => ComponentStatus::Up,
                Err(e) => {
                    warn!("index ping failed: {e}");
                    ComponentStatus::Down
                }
            },
        };

        HealthReport {
            store,
            index,
            generative: self.responder.is_some(),
        }
    }

    /// Rebuild the vector index from the knowledge store. A single item's
    /// failure is counted, never fatal to the run.
    pub async fn reindex(&self, _force: bool) -> Result<ReindexReport, EngineError> {
        let Some(index) = &self.index else {
            return Err(EngineError::Index(
                "no vector index configured".to_string(),
            ));
        };
        index.ensure_collection().await?;

        let mut report = ReindexReport {
            upserted: 0,
            failed: 0,
        };
        for teaching in self.store.all()? {
            let outcome = match self.embedder.embed(&teaching.text).await {
                Ok(vector) => index.upsert(&teaching, vector).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => report.upserted += 1,
                Err(e) => {
                    warn!("reindex skipped {}: {e}", teaching.id);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Step 1 of the pipeline: vector tier when available and healthy,
    /// lexical scan of the recent window otherwise. Store failures in the
    /// lexical tier are fatal; everything else degrades.
    async fn gather(
        &self,
        input: &str,
        session_id: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<Candidate>, EngineError> {
        if let Some(index) = &self.index {
            match self.embedder.embed(input).await {
                Ok(vector) => match index.search(&vector, top_k).await {
                    Ok(hits) => {
                        let mut candidates: Vec<Candidate> = hits
                            .into_iter()
                            .filter(|c| c.visible_to(session_id))
                            .collect();
                        rank(&mut candidates);
                        return Ok(candidates);
                    }
                    Err(e) => warn!("vector search failed, degrading to lexical tier: {e}"),
                },
                Err(e) => warn!("query embedding failed, degrading to lexical tier: {e}"),
            }
        }

        let filter = ScopeFilter::visible_to(session_id);
        let window = self.store.recent(&filter, self.config.recent_window)?;
        let mut candidates: Vec<Candidate> = window
            .iter()
            .map(|t| Candidate::from_teaching(t, lexical::score(input, &t.text)))
            .collect();
        rank(&mut candidates);
        candidates.truncate(top_k);
        Ok(candidates)
    }

    /// Fire-and-forget vector upsert for a freshly stored teaching.
    fn spawn_upsert(&self, teaching: Teaching) {
        let Some(index) = self.index.clone() else {
            return;
        };
        let embedder = Arc::clone(&self.embedder);
        self.spawn_background(async move {
            upsert_best_effort(embedder.as_ref(), index.as_ref(), &teaching).await;
        });
    }

    /// Fire-and-forget write-back of a generated answer as a new global
    /// teaching. Failure of either store is logged and swallowed: the
    /// answer has already been returned, persistence is a side effect.
    fn spawn_write_back(&self, reply: String) {
        let store = Arc::clone(&self.store);
        let embedder = Arc::clone(&self.embedder);
        let index = self.index.clone();
        self.spawn_background(async move {
            let teaching = Teaching::new(
                reply,
                vec![GENERATED_TAG.to_string()],
                Scope::Global,
                None,
            );
            if let Err(e) = store.insert(&teaching) {
                warn!("write-back insert failed for {}: {e}", teaching.id);
                return;
            }
            debug!("write-back stored {}", teaching.id);
            if let Some(index) = index {
                upsert_best_effort(embedder.as_ref(), index.as_ref(), &teaching).await;
            }
        });
    }
}

async fn upsert_best_effort(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    teaching: &Teaching,
) {
    let vector = match embedder.embed(&teaching.text).await {
        Ok(v) => v,
        Err(e) => {
            warn!("embed failed for {}, vector upsert skipped: {e}", teaching.id);
            return;
        }
    };
    if let Err(e) = index.ensure_collection().await {
        warn!("ensure collection failed, upsert of {} skipped: {e}", teaching.id);
        return;
    }
    if let Err(e) = index.upsert(teaching, vector).await {
        warn!("vector upsert failed for {}: {e}", teaching.id);
    }
}

/// Score descending, most recently created first on equal scores.
fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

fn to_sources(candidates: &[Candidate]) -> Vec<Source> {
    candidates.iter().map(Source::from).collect()
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
