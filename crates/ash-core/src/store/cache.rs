// ── SQLite cache ──
//
// One table per cached resource type holding the raw JSON record of each
// object, plus a `cache_meta` table recording which types have been
// populated. A type with no meta row is cold and must be fetched; a type
// with a meta row and no records genuinely has no objects remotely.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{Resource, ResourceKind};

pub struct Cache {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Cache {
    /// Bump when the schema changes to force a rebuild.
    const SCHEMA_VERSION: i32 = 1;

    /// Open (or create) the cache database at `path`.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let cache = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        cache.ensure_schema()?;
        debug!(path = %path.display(), "cache opened");
        Ok(cache)
    }

    /// A throwaway cache that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let cache = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        cache.ensure_schema()?;
        Ok(cache)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn ensure_schema(&self) -> Result<(), CoreError> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version != Self::SCHEMA_VERSION {
            info!(from = version, to = Self::SCHEMA_VERSION, "rebuilding cache schema");
            for kind in ResourceKind::CACHED {
                self.conn
                    .execute_batch(&format!("DROP TABLE IF EXISTS {};", kind.collection()))?;
            }
            self.conn.execute_batch("DROP TABLE IF EXISTS cache_meta;")?;
        }

        self.create_tables()?;
        self.conn
            .execute_batch(&format!("PRAGMA user_version = {};", Self::SCHEMA_VERSION))?;
        Ok(())
    }

    /// Ensure every cache table exists. Safe to call repeatedly.
    pub fn create_tables(&self) -> Result<(), CoreError> {
        for kind in ResourceKind::CACHED {
            self.conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    data BLOB NOT NULL
                );",
                kind.collection()
            ))?;
        }
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cache_meta (
                kind TEXT PRIMARY KEY,
                populated_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Append one record and mark its type populated.
    pub fn insert<R: Resource>(&self, resource: &R) -> Result<(), CoreError> {
        let table = table_for(R::KIND)?;
        self.conn.execute(
            &format!("INSERT INTO {table} (data) VALUES (?1)"),
            params![encode(resource)?],
        )?;
        self.mark_populated(R::KIND)
    }

    /// Append a whole fetched collection in one transaction and mark its
    /// type populated, even when `resources` is empty.
    pub fn store<R: Resource>(&mut self, resources: &[R]) -> Result<(), CoreError> {
        let table = table_for(R::KIND)?;
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO {table} (data) VALUES (?1)"))?;
            for resource in resources {
                stmt.execute(params![encode(resource)?])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO cache_meta (kind, populated_at) VALUES (?1, ?2)",
            params![table, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        debug!(kind = table, count = resources.len(), "cache stored");
        Ok(())
    }

    /// Read every cached record of `R`'s type.
    ///
    /// `None` means the type was never populated (cold); `Some` holds the
    /// cached records, possibly none. Rows that no longer decode are
    /// skipped with a warning.
    pub fn load<R: Resource>(&self) -> Result<Option<Vec<R>>, CoreError> {
        let table = table_for(R::KIND)?;
        if self.populated_at(R::KIND)?.is_none() {
            debug!(kind = table, "cache cold");
            return Ok(None);
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT data FROM {table} ORDER BY id"))?;
        let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

        let mut resources = Vec::new();
        for row in rows {
            let bytes = row?;
            match serde_json::from_slice(&bytes)
                .map_err(|e| CoreError::Model {
                    kind: R::KIND,
                    message: e.to_string(),
                })
                .and_then(R::from_value)
            {
                Ok(resource) => resources.push(resource),
                Err(e) => warn!(kind = table, error = %e, "skipping unreadable cache row"),
            }
        }

        debug!(kind = table, count = resources.len(), "cache loaded");
        Ok(Some(resources))
    }

    /// When `kind` was last populated, if ever.
    pub fn populated_at(&self, kind: ResourceKind) -> Result<Option<DateTime<Utc>>, CoreError> {
        let stamp: Option<String> = self
            .conn
            .query_row(
                "SELECT populated_at FROM cache_meta WHERE kind = ?1",
                params![kind.collection()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(stamp
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| t.with_timezone(&Utc)))
    }

    /// Delete every cached record of every type and forget which types
    /// were populated.
    pub fn clean(&self) -> Result<(), CoreError> {
        for kind in ResourceKind::CACHED {
            self.conn
                .execute(&format!("DELETE FROM {}", kind.collection()), [])?;
        }
        self.conn.execute("DELETE FROM cache_meta", [])?;
        info!("cache wiped");
        Ok(())
    }

    fn mark_populated(&self, kind: ResourceKind) -> Result<(), CoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO cache_meta (kind, populated_at) VALUES (?1, ?2)",
            params![kind.collection(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

fn table_for(kind: ResourceKind) -> Result<&'static str, CoreError> {
    if kind.is_cached() {
        Ok(kind.collection())
    } else {
        Err(CoreError::validation(format!(
            "{} records are never cached",
            kind.collection()
        )))
    }
}

fn encode<R: Resource>(resource: &R) -> Result<Vec<u8>, CoreError> {
    serde_json::to_vec(resource.data()).map_err(|e| CoreError::Model {
        kind: R::KIND,
        message: e.to_string(),
    })
}
