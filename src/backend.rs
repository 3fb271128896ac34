// 💾 Persistence backends - the store's injected load/save dependency
//
// The whole collection lives under ONE key ("leases") as a JSON array.
// Every save rewrites the full value.
//
// Corrupt stored data never crashes a load: it is logged and treated as an
// empty collection.

use crate::error::LeaseResult;
use crate::lease::Lease;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Default key the collection is stored under
pub const DEFAULT_COLLECTION_KEY: &str = "leases";

/// Load/save the full lease collection
pub trait LeaseBackend {
    /// Read the stored collection; missing or unreadable data yields an empty Vec
    fn load(&self) -> LeaseResult<Vec<Lease>>;

    /// Replace the stored collection in one write
    fn save(&mut self, leases: &[Lease]) -> LeaseResult<()>;
}

/// Decode a stored value, falling back to empty on corrupt data
pub fn decode_collection(key: &str, raw: Option<&str>) -> Vec<Lease> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<Lease>>(raw) {
        Ok(leases) => leases,
        Err(e) => {
            tracing::warn!(key, error = %e, "stored lease collection is unreadable, starting empty");
            Vec::new()
        }
    }
}

pub fn encode_collection(leases: &[Lease]) -> LeaseResult<String> {
    Ok(serde_json::to_string(leases)?)
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

/// Keeps the serialized collection in memory (test double)
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    raw: Option<String>,
    saves: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary stored value (may be corrupt)
    pub fn with_raw(raw: &str) -> Self {
        MemoryBackend {
            raw: Some(raw.to_string()),
            saves: 0,
        }
    }

    /// Stored value as last written
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl LeaseBackend for MemoryBackend {
    fn load(&self) -> LeaseResult<Vec<Lease>> {
        Ok(decode_collection(DEFAULT_COLLECTION_KEY, self.raw.as_deref()))
    }

    fn save(&mut self, leases: &[Lease]) -> LeaseResult<()> {
        self.raw = Some(encode_collection(leases)?);
        self.saves += 1;
        Ok(())
    }
}

// ============================================================================
// SQLITE KEY-VALUE BACKEND
// ============================================================================

/// Local key-value store on SQLite: one row per key, value is the JSON collection
pub struct SqliteBackend {
    conn: Connection,
    key: String,
}

impl SqliteBackend {
    /// Open (or create) a database file
    pub fn open(path: &Path, key: &str) -> LeaseResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, key)
    }

    /// In-memory database, mostly for tests
    pub fn open_in_memory(key: &str) -> LeaseResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, key)
    }

    fn with_connection(conn: Connection, key: &str) -> LeaseResult<Self> {
        setup_kv_table(&conn)?;
        Ok(SqliteBackend {
            conn,
            key: key.to_string(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw stored value for the collection key
    pub fn read_raw(&self) -> LeaseResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![self.key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Overwrite the raw stored value (no validation)
    pub fn write_raw(&self, value: &str) -> LeaseResult<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![self.key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

fn setup_kv_table(conn: &Connection) -> LeaseResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

impl LeaseBackend for SqliteBackend {
    fn load(&self) -> LeaseResult<Vec<Lease>> {
        let raw = self.read_raw()?;
        Ok(decode_collection(&self.key, raw.as_deref()))
    }

    fn save(&mut self, leases: &[Lease]) -> LeaseResult<()> {
        let value = encode_collection(leases)?;
        self.write_raw(&value)?;
        tracing::debug!(key = %self.key, count = leases.len(), "saved lease collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lease::LeaseDraft;
    use rust_decimal::Decimal;

    fn sample(name: &str) -> Lease {
        LeaseDraft::new(name, Decimal::from(1000), 12)
            .into_lease(uuid::Uuid::new_v4().to_string())
            .unwrap()
    }

    #[test]
    fn test_memory_backend_empty_load() {
        let backend = MemoryBackend::new();
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn test_memory_backend_round_trip_preserves_order() {
        let mut backend = MemoryBackend::new();
        let leases = vec![sample("A"), sample("B"), sample("C")];

        backend.save(&leases).unwrap();
        let loaded = backend.load().unwrap();

        assert_eq!(loaded, leases);
        assert_eq!(backend.save_count(), 1);
    }

    #[test]
    fn test_corrupt_data_falls_back_to_empty() {
        let backend = MemoryBackend::with_raw("{not valid json");
        assert!(backend.load().unwrap().is_empty());

        let backend = MemoryBackend::with_raw(r#"{"id": "an object, not an array"}"#);
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_backend_round_trip() {
        let mut backend = SqliteBackend::open_in_memory(DEFAULT_COLLECTION_KEY).unwrap();
        assert!(backend.load().unwrap().is_empty());

        let leases = vec![sample("Office"), sample("Warehouse")];
        backend.save(&leases).unwrap();
        assert_eq!(backend.load().unwrap(), leases);

        // Second save replaces the whole value
        backend.save(&leases[..1]).unwrap();
        assert_eq!(backend.load().unwrap().len(), 1);
    }

    #[test]
    fn test_sqlite_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leases.db");
        let leases = vec![sample("Office")];

        {
            let mut backend = SqliteBackend::open(&path, "leases").unwrap();
            backend.save(&leases).unwrap();
        }

        let backend = SqliteBackend::open(&path, "leases").unwrap();
        assert_eq!(backend.load().unwrap(), leases);
    }

    #[test]
    fn test_sqlite_backend_corrupt_value() {
        let backend = SqliteBackend::open_in_memory("leases").unwrap();
        backend.write_raw("[{\"id\": 1}]").unwrap();
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_keys_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");

        let mut first = SqliteBackend::open(&path, "leases").unwrap();
        first.save(&[sample("Office")]).unwrap();

        let second = SqliteBackend::open(&path, "archived_leases").unwrap();
        assert!(second.load().unwrap().is_empty());
        assert_eq!(second.key(), "archived_leases");
    }
}
