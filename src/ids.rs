//! Identifier allocation against the backing tabular store.
//!
//! Next ID = max existing ID + 1, or 1 on an empty collection. A failed
//! query also falls back to 1 with a printed warning; that silently collides
//! with existing rows if the store was merely unreachable, and re-running
//! later is the only remedy. Allocation is read-then-increment with no
//! locking, so concurrent runs can race (see DESIGN.md).

use crate::config::Config;
use anyhow::{Context, Result};

/// Max-identifier queries over named collections. The seam for fake stores
/// in tests.
pub trait TabularStore {
    /// Largest value of `id_column` in `table`, or `None` when empty.
    fn max_id(&self, table: &str, id_column: &str) -> Result<Option<i64>>;
}

/// PostgREST-backed implementation: `select=<col>&order=<col>.desc&limit=1`.
pub struct SupabaseTables {
    agent: ureq::Agent,
    base_url: String,
    service_key: String,
}

impl SupabaseTables {
    pub fn new(cfg: &Config) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: cfg.storage_url.clone(),
            service_key: cfg.service_key.clone(),
        }
    }
}

impl TabularStore for SupabaseTables {
    fn max_id(&self, table: &str, id_column: &str) -> Result<Option<i64>> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let response = self
            .agent
            .get(&url)
            .query("select", id_column)
            .query("order", &format!("{id_column}.desc"))
            .query("limit", "1")
            .set("apikey", &self.service_key)
            .set("Authorization", &format!("Bearer {}", self.service_key))
            .call()
            .with_context(|| format!("max-id query on '{table}' failed"))?;

        let rows: Vec<serde_json::Value> = response
            .into_json()
            .with_context(|| format!("malformed response from '{table}'"))?;

        Ok(rows
            .first()
            .and_then(|row| row.get(id_column))
            .and_then(|v| v.as_i64()))
    }
}

pub fn next_singer_id(store: &dyn TabularStore) -> i64 {
    next_id(store, "singer", "id_singer")
}

pub fn next_song_id(store: &dyn TabularStore) -> i64 {
    next_id(store, "songs", "id_song")
}

pub fn next_album_id(store: &dyn TabularStore) -> i64 {
    next_id(store, "albums", "id_album")
}

fn next_id(store: &dyn TabularStore, table: &str, id_column: &str) -> i64 {
    match store.max_id(table, id_column) {
        Ok(Some(max)) => max + 1,
        Ok(None) => 1,
        Err(e) => {
            eprintln!("Error getting next ID from '{table}': {e:#}");
            1
        }
    }
}
