//! # Session Id Persistence
//!
//! Mints a session id once per user and reuses it across invocations, so
//! session-scoped teachings stay visible to later queries from the same
//! machine. The id lives at `$HOME/.config/lore/session` (on Windows,
//! `%USERPROFILE%` stands in when `$HOME` is unset).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use uuid::Uuid;

fn session_file() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join("lore").join("session"))
}

/// The persistent session id, minting and storing a fresh one on first use.
///
/// A failure to persist is not fatal: the freshly minted id is still
/// returned, it just won't survive to the next invocation.
pub fn load_or_mint() -> Result<String> {
    let path = session_file()?;

    if let Ok(existing) = fs::read_to_string(&path) {
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
    }

    let minted = Uuid::new_v4().to_string();
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent).and_then(|()| fs::write(&path, &minted)) {
            log::warn!("could not persist session id to {}: {e}", path.display());
        }
    }
    Ok(minted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_are_uuids() {
        // Point HOME at a temp dir so the test never touches the real one.
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("HOME", dir.path());

        let first = load_or_mint().unwrap();
        assert!(Uuid::parse_str(&first).is_ok());

        // Second call reuses the persisted id.
        let second = load_or_mint().unwrap();
        assert_eq!(first, second);
    }
}
