//! Durable knowledge store.
//!
//! SQLite-backed relational record of every teaching. This is the single
//! source of truth: the vector index is a derived, repairable cache of it.
//! Inserts here are the durability boundary for a teach operation.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, ErrorCode, Row};

use crate::error::EngineError;
use crate::types::{ScopeFilter, Teaching};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS teachings (
    id         TEXT PRIMARY KEY,
    text       TEXT NOT NULL,
    tags       TEXT NOT NULL DEFAULT '[]',
    scope      TEXT NOT NULL CHECK (scope IN ('global','session')),
    session_id TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS teachings_scope_created_idx
    ON teachings (scope, created_at DESC);
";

/// SQLite-backed store of teachings.
///
/// Owned and injected; SQLite's own transactional guarantees serialize
/// concurrent inserts, so no additional locking discipline is needed
/// beyond the connection handle itself.
pub struct KnowledgeStore {
    conn: Mutex<Connection>,
}

impl KnowledgeStore {
    /// Open (or create) the store at the given path. `:memory:` works.
    pub fn open(path: &str) -> Result<Self, EngineError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, EngineError> {
        Self::open(":memory:")
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, EngineError> {
        self.conn
            .lock()
            .map_err(|_| EngineError::Store("connection mutex poisoned".to_string()))
    }

    /// Durably persist a teaching.
    ///
    /// Fails with `Validation` on an empty text or a broken scope/session
    /// pairing, `Conflict` on a duplicate id, `Store` on anything else.
    pub fn insert(&self, teaching: &Teaching) -> Result<(), EngineError> {
        validate(teaching)?;

        let tags_json = serde_json::to_string(&teaching.tags)?;
        let result = self.conn()?.execute(
            "INSERT INTO teachings (id, text, tags, scope, session_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                teaching.id,
                teaching.text,
                tags_json,
                teaching.scope.as_str(),
                teaching.session_id,
                teaching.created_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(EngineError::Conflict(format!(
                    "teaching {} already exists",
                    teaching.id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The most recently created teachings visible under `filter`,
    /// newest first, capped at `limit`. Ties on `created_at` break
    /// toward the larger id so the ordering stays deterministic.
    pub fn recent(&self, filter: &ScopeFilter, limit: usize) -> Result<Vec<Teaching>, EngineError> {
        let conn = self.conn()?;
        let limit = limit as i64;

        let rows = match filter {
            ScopeFilter::GlobalOnly => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM teachings WHERE scope = 'global'
                     ORDER BY created_at DESC, id DESC LIMIT ?1",
                )?;
                let out = stmt
                    .query_map(params![limit], teaching_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                out
            }
            ScopeFilter::SessionOnly(sid) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM teachings WHERE scope = 'session' AND session_id = ?1
                     ORDER BY created_at DESC, id DESC LIMIT ?2",
                )?;
                let out = stmt
                    .query_map(params![sid, limit], teaching_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                out
            }
            ScopeFilter::ForSession(sid) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM teachings
                     WHERE scope = 'global' OR (scope = 'session' AND session_id = ?1)
                     ORDER BY created_at DESC, id DESC LIMIT ?2",
                )?;
                let out = stmt
                    .query_map(params![sid, limit], teaching_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                out
            }
        };
        Ok(rows)
    }

    /// Every teaching in creation order, for the reindex job.
    pub fn all(&self) -> Result<Vec<Teaching>, EngineError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT * FROM teachings ORDER BY created_at ASC, id ASC")?;
        let rows = stmt
            .query_map([], teaching_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Total number of stored teachings.
    pub fn count(&self) -> Result<usize, EngineError> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM teachings", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    /// Cheap liveness probe for the health report.
    pub fn ping(&self) -> Result<(), EngineError> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

fn validate(teaching: &Teaching) -> Result<(), EngineError> {
    if teaching.text.trim().is_empty() {
        return Err(EngineError::Validation("text must not be empty".to_string()));
    }
    match (teaching.scope, &teaching.session_id) {
        (crate::types::Scope::Session, None) => Err(EngineError::Validation(
            "session-scoped teaching requires a session id".to_string(),
        )),
        (crate::types::Scope::Global, Some(_)) => Err(EngineError::Validation(
            "global teaching must not carry a session id".to_string(),
        )),
        _ => Ok(()),
    }
}

fn teaching_from_row(row: &Row<'_>) -> Result<Teaching, rusqlite::Error> {
    let tags_json: String = row.get("tags")?;
    let scope_str: String = row.get("scope")?;
    Ok(Teaching {
        id: row.get("id")?,
        text: row.get("text")?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        scope: scope_str.parse().unwrap_or(crate::types::Scope::Global),
        session_id: row.get("session_id")?,
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scope;

    fn global(text: &str) -> Teaching {
        Teaching::new(text.to_string(), vec![], Scope::Global, None)
    }

    fn session(text: &str, sid: &str) -> Teaching {
        Teaching::new(
            text.to_string(),
            vec![],
            Scope::Session,
            Some(sid.to_string()),
        )
    }

    #[test]
    fn insert_then_recent_returns_the_row_exactly_once() {
        let store = KnowledgeStore::open_in_memory().unwrap();
        let t = global("Paris is the capital of France");
        store.insert(&t).unwrap();

        let rows = store.recent(&ScopeFilter::GlobalOnly, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, t.id);
        assert_eq!(rows[0].text, t.text);
    }

    #[test]
    fn empty_text_is_rejected() {
        let store = KnowledgeStore::open_in_memory().unwrap();
        let err = store.insert(&global("   ")).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn scope_session_pairing_is_enforced() {
        let store = KnowledgeStore::open_in_memory().unwrap();

        let mut bad_session = global("x");
        bad_session.scope = Scope::Session;
        assert!(matches!(
            store.insert(&bad_session).unwrap_err(),
            EngineError::Validation(_)
        ));

        let mut bad_global = session("y", "sid-1");
        bad_global.scope = Scope::Global;
        assert!(matches!(
            store.insert(&bad_global).unwrap_err(),
            EngineError::Validation(_)
        ));
    }

    #[test]
    fn duplicate_id_is_a_conflict() {
        let store = KnowledgeStore::open_in_memory().unwrap();
        let t = global("once");
        store.insert(&t).unwrap();
        let err = store.insert(&t).unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn session_rows_are_isolated_between_sessions() {
        let store = KnowledgeStore::open_in_memory().unwrap();
        store.insert(&session("alpha secret", "a")).unwrap();
        store.insert(&session("beta secret", "b")).unwrap();
        store.insert(&global("shared fact")).unwrap();

        let for_a = store
            .recent(&ScopeFilter::ForSession("a".to_string()), 10)
            .unwrap();
        let texts: Vec<&str> = for_a.iter().map(|t| t.text.as_str()).collect();
        assert!(texts.contains(&"alpha secret"));
        assert!(texts.contains(&"shared fact"));
        assert!(!texts.contains(&"beta secret"));

        let global_only = store.recent(&ScopeFilter::GlobalOnly, 10).unwrap();
        assert_eq!(global_only.len(), 1);
        assert_eq!(global_only[0].text, "shared fact");

        let only_b = store
            .recent(&ScopeFilter::SessionOnly("b".to_string()), 10)
            .unwrap();
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].text, "beta secret");
    }

    #[test]
    fn recent_is_newest_first_and_capped() {
        let store = KnowledgeStore::open_in_memory().unwrap();
        for i in 0..5 {
            store.insert(&global(&format!("fact {i}"))).unwrap();
        }

        let rows = store.recent(&ScopeFilter::GlobalOnly, 3).unwrap();
        assert_eq!(rows.len(), 3);
        // Newest first: later inserts sort before earlier ones.
        assert!(rows[0].created_at >= rows[1].created_at);
        assert!(rows[1].created_at >= rows[2].created_at);
    }

    #[test]
    fn all_streams_in_creation_order() {
        let store = KnowledgeStore::open_in_memory().unwrap();
        for i in 0..4 {
            store.insert(&global(&format!("fact {i}"))).unwrap();
        }

        let rows = store.all().unwrap();
        assert_eq!(rows.len(), 4);
        for pair in rows.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }

    #[test]
    fn tags_round_trip() {
        let store = KnowledgeStore::open_in_memory().unwrap();
        let t = Teaching::new(
            "tagged".to_string(),
            vec!["geo".to_string(), "capital".to_string()],
            Scope::Global,
            None,
        );
        store.insert(&t).unwrap();

        let rows = store.recent(&ScopeFilter::GlobalOnly, 1).unwrap();
        assert_eq!(rows[0].tags, vec!["geo", "capital"]);
    }

    #[test]
    fn survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("teachings.db");
        let path = path.to_str().unwrap();

        let t = global("durable fact");
        {
            let store = KnowledgeStore::open(path).unwrap();
            store.insert(&t).unwrap();
        }

        let store = KnowledgeStore::open(path).unwrap();
        let rows = store.recent(&ScopeFilter::GlobalOnly, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, t.id);
    }

    #[test]
    fn ping_succeeds_on_open_store() {
        let store = KnowledgeStore::open_in_memory().unwrap();
        store.ping().unwrap();
    }
}
