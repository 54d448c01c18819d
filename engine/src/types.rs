use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visibility class of a teaching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Visible to all queries.
    Global,
    /// Visible only to queries carrying the same session id.
    Session,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Session => "session",
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Scope::Global),
            "session" => Ok(Scope::Session),
            other => Err(format!("unknown scope '{other}'")),
        }
    }
}

/// A stored unit of knowledge: text plus retrieval metadata.
///
/// Teachings are never updated in place; corrections are new teachings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teaching {
    /// Globally unique id, assigned at creation, immutable.
    pub id: String,
    /// Non-empty natural-language content.
    pub text: String,
    /// Short labels; duplicates collapsed on insert, may be empty.
    #[serde(default)]
    pub tags: Vec<String>,
    pub scope: Scope,
    /// `Some` exactly when `scope` is `Session`.
    #[serde(default)]
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Teaching {
    /// Build a new teaching with a fresh id and the current timestamp.
    pub fn new(text: String, tags: Vec<String>, scope: Scope, session_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            tags,
            scope,
            session_id,
            created_at: Utc::now(),
        }
    }
}

/// Row visibility filter for recency queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeFilter {
    /// Global rows only.
    GlobalOnly,
    /// Session rows for the given session id only.
    SessionOnly(String),
    /// Everything visible to the given session: global rows plus that
    /// session's rows.
    ForSession(String),
}

impl ScopeFilter {
    /// The filter a query with an optional session id sees.
    pub fn visible_to(session_id: Option<&str>) -> Self {
        match session_id {
            Some(sid) => ScopeFilter::ForSession(sid.to_string()),
            None => ScopeFilter::GlobalOnly,
        }
    }
}

/// A retrieval candidate: a teaching with its similarity score.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub text: String,
    pub tags: Vec<String>,
    pub scope: Scope,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Similarity in [0, 1]; native index score or lexical overlap.
    pub score: f32,
}

impl Candidate {
    pub fn from_teaching(t: &Teaching, score: f32) -> Self {
        Self {
            id: t.id.clone(),
            text: t.text.clone(),
            tags: t.tags.clone(),
            scope: t.scope,
            session_id: t.session_id.clone(),
            created_at: t.created_at,
            score,
        }
    }

    /// Whether a query carrying `session_id` may see this candidate.
    pub fn visible_to(&self, session_id: Option<&str>) -> bool {
        match self.scope {
            Scope::Global => true,
            Scope::Session => self.session_id.as_deref() == session_id,
        }
    }
}

/// A source attached to an answer.
#[derive(Debug, Clone, Serialize)]
pub struct Source {
    pub id: String,
    pub text: String,
    pub tags: Vec<String>,
    pub score: f32,
}

impl From<&Candidate> for Source {
    fn from(c: &Candidate) -> Self {
        Self {
            id: c.id.clone(),
            text: c.text.clone(),
            tags: c.tags.clone(),
            score: c.score,
        }
    }
}

/// The result of a respond operation.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub reply: String,
    /// Ranked sources, score descending, most recent first on ties.
    pub sources: Vec<Source>,
}

/// Receipt for a successful teach.
#[derive(Debug, Clone, Serialize)]
pub struct TeachReceipt {
    pub ok: bool,
    pub id: String,
    pub scope: Scope,
    pub tags: Vec<String>,
}

/// Independent up/down status of the engine's collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub store: ComponentStatus,
    pub index: ComponentStatus,
    /// Whether a generative collaborator is configured at all.
    pub generative: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
    /// Not configured for this deployment.
    Absent,
}

/// Outcome counts of a reindex run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReindexReport {
    pub upserted: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_round_trips_through_str() {
        assert_eq!("global".parse::<Scope>().unwrap(), Scope::Global);
        assert_eq!("session".parse::<Scope>().unwrap(), Scope::Session);
        assert!("world".parse::<Scope>().is_err());
        assert_eq!(Scope::Global.as_str(), "global");
    }

    #[test]
    fn candidate_visibility_follows_scope() {
        let global = Teaching::new("g".into(), vec![], Scope::Global, None);
        let session = Teaching::new("s".into(), vec![], Scope::Session, Some("a".into()));

        let g = Candidate::from_teaching(&global, 0.5);
        let s = Candidate::from_teaching(&session, 0.5);

        assert!(g.visible_to(None));
        assert!(g.visible_to(Some("a")));
        assert!(s.visible_to(Some("a")));
        assert!(!s.visible_to(Some("b")));
        assert!(!s.visible_to(None));
    }

    #[test]
    fn visible_to_builds_the_expected_filter() {
        assert_eq!(ScopeFilter::visible_to(None), ScopeFilter::GlobalOnly);
        assert_eq!(
            ScopeFilter::visible_to(Some("abc")),
            ScopeFilter::ForSession("abc".to_string())
        );
    }
}
