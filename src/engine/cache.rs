//! Content cache
//!
//! A single-file SQLite key/value table mapping a plugin's content checksum
//! to its serialized documentation. The reserved `version` key carries the
//! schema marker; a mismatch on first open rebuilds the whole file.
//!
//! The handle is opened lazily and must be released after a batch of reads.
//! [`ContentCache::session`] returns a guard that closes it on drop, including
//! on early return through `?` and on unwinding.

use crate::error::{NavError, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Cache layout version this build reads and writes.
pub const CACHE_VERSION: &str = "1.0";

/// Reserved key holding the layout version marker.
pub const VERSION_KEY: &str = "version";

const CREATE_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL)";

const UPSERT: &str = "INSERT INTO kv (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value";

/// Persistent content-addressed document store.
///
/// Methods take `&self` so the cache can be shared (via `Rc`) by the select
/// callbacks of several steps within one navigation session.
#[derive(Debug)]
pub struct ContentCache {
    path: PathBuf,
    expected_version: String,
    conn: RefCell<Option<Connection>>,
    version_checked: Cell<bool>,
}

impl ContentCache {
    /// Describe a cache at `path` expecting [`CACHE_VERSION`]. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_version(path, CACHE_VERSION)
    }

    /// Describe a cache expecting a specific version marker.
    pub fn with_version(path: impl Into<PathBuf>, expected_version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected_version: expected_version.into(),
            conn: RefCell::new(None),
            version_checked: Cell::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn expected_version(&self) -> &str {
        &self.expected_version
    }

    pub fn is_open(&self) -> bool {
        self.conn.borrow().is_some()
    }

    /// Open the storage handle. Calling it while already open is a no-op.
    ///
    /// The first open in this process also runs the version guard. The handle
    /// is only kept once the guard has passed or the store was rebuilt; a file
    /// that is not a readable cache counts as a version mismatch.
    pub fn open(&self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        if self.version_checked.get() {
            *self.conn.borrow_mut() = Some(Self::connect(&self.path)?);
            return Ok(());
        }

        let checked = Self::connect(&self.path)
            .and_then(|conn| Self::read_version(&conn).map(|stored| (conn, stored)));
        match checked {
            Ok((conn, stored)) => {
                debug!(
                    "Collection doc cache: 'current version' is '{}'",
                    stored.as_deref().unwrap_or("None")
                );
                if stored.as_deref() == Some(self.expected_version.as_str()) {
                    *self.conn.borrow_mut() = Some(conn);
                    self.version_checked.set(true);
                } else {
                    info!("Collection doc cache: version was empty or incorrect, rebuilding");
                    drop(conn);
                    self.rebuild()?;
                }
            }
            Err(NavError::Cache(e)) => {
                info!("Collection doc cache: unreadable ({}), rebuilding", e);
                self.rebuild()?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Release the storage handle. Safe to call when already closed.
    pub fn close(&self) {
        if self.conn.borrow_mut().take().is_some() {
            debug!("Content cache closed: {}", self.path.display());
        }
    }

    /// Open the cache and return a guard that closes it when dropped.
    pub fn session(&self) -> Result<CacheSession<'_>> {
        self.open()?;
        Ok(CacheSession { cache: self })
    }

    /// Fetch the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// [`NavError::CacheEntryNotFound`] when the key is absent.
    pub fn get(&self, key: &str) -> Result<String> {
        let conn = self.conn.borrow();
        let conn = conn
            .as_ref()
            .ok_or_else(|| NavError::contract("content cache read before open()"))?;
        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get::<_, String>(0)
        })
        .optional()?
        .ok_or_else(|| NavError::CacheEntryNotFound(key.to_string()))
    }

    /// Insert or replace the blob stored under `key`.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.borrow();
        let conn = conn
            .as_ref()
            .ok_or_else(|| NavError::contract("content cache write before open()"))?;
        conn.execute(UPSERT, params![key, value])?;
        Ok(())
    }

    /// True if `key` is present.
    pub fn contains(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            Ok(_) => Ok(true),
            Err(NavError::CacheEntryNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Number of stored entries, version marker excluded.
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.borrow();
        let conn = conn
            .as_ref()
            .ok_or_else(|| NavError::contract("content cache read before open()"))?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM kv WHERE key != ?1",
            params![VERSION_KEY],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// The stored version marker, if any.
    pub fn stored_version(&self) -> Result<Option<String>> {
        match self.get(VERSION_KEY) {
            Ok(version) => Ok(Some(version)),
            Err(NavError::CacheEntryNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete the backing file and start over with only the version marker.
    pub fn rebuild(&self) -> Result<()> {
        self.close();
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        let conn = Self::connect(&self.path)?;
        conn.execute(UPSERT, params![VERSION_KEY, self.expected_version])?;
        *self.conn.borrow_mut() = Some(conn);
        self.version_checked.set(true);
        info!(
            "Collection doc cache: 'current version' is '{}'",
            self.expected_version
        );
        Ok(())
    }

    fn connect(path: &Path) -> Result<Connection> {
        let conn = Connection::open(path)?;
        conn.execute(CREATE_TABLE, [])?;
        Ok(conn)
    }

    fn read_version(conn: &Connection) -> Result<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![VERSION_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }
}

/// Scoped cache access; the handle is closed when this guard drops.
#[derive(Debug)]
pub struct CacheSession<'a> {
    cache: &'a ContentCache,
}

impl std::ops::Deref for CacheSession<'_> {
    type Target = ContentCache;

    fn deref(&self) -> &ContentCache {
        self.cache
    }
}

impl Drop for CacheSession<'_> {
    fn drop(&mut self) {
        self.cache.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_cache(dir: &TempDir) -> ContentCache {
        ContentCache::new(dir.path().join("doc_cache.db"))
    }

    #[test]
    fn test_get_before_open_is_contract_violation() {
        let dir = TempDir::new().unwrap();
        let cache = temp_cache(&dir);
        assert!(cache.get("k").unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_fresh_cache_gets_version_marker() {
        let dir = TempDir::new().unwrap();
        let cache = temp_cache(&dir);
        cache.open().unwrap();
        assert_eq!(cache.stored_version().unwrap().as_deref(), Some(CACHE_VERSION));
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let dir = TempDir::new().unwrap();
        let cache = temp_cache(&dir);
        let session = cache.session().unwrap();
        assert!(matches!(
            session.get("nope"),
            Err(NavError::CacheEntryNotFound(key)) if key == "nope"
        ));
    }

    #[test]
    fn test_put_upserts() {
        let dir = TempDir::new().unwrap();
        let cache = temp_cache(&dir);
        let session = cache.session().unwrap();
        session.put("k", "one").unwrap();
        session.put("k", "two").unwrap();
        assert_eq!(session.get("k").unwrap(), "two");
        assert_eq!(session.len().unwrap(), 1);
    }

    #[test]
    fn test_session_closes_on_drop() {
        let dir = TempDir::new().unwrap();
        let cache = temp_cache(&dir);
        {
            let _session = cache.session().unwrap();
            assert!(cache.is_open());
        }
        assert!(!cache.is_open());
    }

    #[test]
    fn test_foreign_schema_is_rebuilt_before_use() {
        let dir = TempDir::new().unwrap();
        let cache = temp_cache(&dir);
        {
            let conn = Connection::open(cache.path()).unwrap();
            conn.execute("CREATE TABLE kv (k TEXT, v BLOB)", []).unwrap();
        }
        cache.open().unwrap();
        assert_eq!(cache.stored_version().unwrap().as_deref(), Some(CACHE_VERSION));
        cache.close();
        cache.open().unwrap();
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_failed_open_leaves_cache_closed() {
        let dir = TempDir::new().unwrap();
        // A directory can be neither opened nor removed as a file
        let cache = ContentCache::new(dir.path());
        assert!(cache.open().is_err());
        assert!(!cache.is_open());
        assert!(cache.open().is_err());
        assert!(!cache.is_open());
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let cache = temp_cache(&dir);
        cache.close();
        cache.open().unwrap();
        cache.close();
        cache.close();
        assert!(!cache.is_open());
    }
}
