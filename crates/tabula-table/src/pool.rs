use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::config::DatabaseConfig;
use crate::engine::SqliteEngine;
use crate::error::TableError;

/// Path-keyed cache of open SQLite engines, one connection per path.
///
/// Handles are shared (`Rc`); callers use them serially.
#[derive(Default)]
pub struct ConnectionPool {
    config: DatabaseConfig,
    connections: HashMap<PathBuf, Rc<SqliteEngine>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool whose new connections get the pragmas from `config`. The
    /// config's own path is ignored; each call names its path.
    pub fn with_config(config: DatabaseConfig) -> Self {
        Self {
            config,
            connections: HashMap::new(),
        }
    }

    /// Returns the cached engine for `path`, opening it on first use.
    pub fn get_connection(&mut self, path: impl AsRef<Path>) -> Result<Rc<SqliteEngine>, TableError> {
        let path = path.as_ref();
        if let Some(engine) = self.connections.get(path) {
            return Ok(Rc::clone(engine));
        }

        let config = self.config.clone().with_path(path);
        let engine = Rc::new(SqliteEngine::open_with(&config)?);
        debug!(path = %path.display(), "cached new connection");
        self.connections.insert(path.to_path_buf(), Rc::clone(&engine));
        Ok(engine)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Drops the cached engine for `path`. The connection closes once the
    /// last outstanding handle is gone.
    pub fn close(&mut self, path: impl AsRef<Path>) -> bool {
        self.connections.remove(path.as_ref()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MEMORY_PATH;

    #[test]
    fn same_path_shares_one_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.db");

        let mut pool = ConnectionPool::new();
        let a = pool.get_connection(&path).unwrap();
        let b = pool.get_connection(&path).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 1);

        let other = pool.get_connection(dir.path().join("other.db")).unwrap();
        assert!(!Rc::ptr_eq(&a, &other));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn close_evicts_the_cached_engine() {
        let mut pool = ConnectionPool::with_config(DatabaseConfig::memory());
        let first = pool.get_connection(MEMORY_PATH).unwrap();
        assert!(pool.close(MEMORY_PATH));
        assert!(!pool.close(MEMORY_PATH));
        assert!(pool.is_empty());

        let second = pool.get_connection(MEMORY_PATH).unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
    }
}
