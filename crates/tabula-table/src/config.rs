//! Database configuration loaded from environment variables.
//!
//! | Variable               | Default     | Description                                   |
//! |------------------------|-------------|-----------------------------------------------|
//! | `TABULA_DB_PATH`       | `tabula.db` | SQLite database file (`:memory:` allowed)     |
//! | `TABULA_CREATE_TABLES` | `true`      | Create missing tables instead of validating   |
//! | `TABULA_FOREIGN_KEYS`  | `true`      | Enforce foreign keys (`PRAGMA foreign_keys`)  |
//! | `TABULA_JOURNAL_MODE`  | `WAL`       | `PRAGMA journal_mode` for file databases      |
//! | `TABULA_LOG_LEVEL`     | `info`      | tracing filter (trace/debug/info/warn/error)  |

use std::path::PathBuf;

pub const MEMORY_PATH: &str = ":memory:";

/// Runtime configuration for opening and bootstrapping a database.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`.
    pub path: PathBuf,

    /// Create missing tables (`true`) or only validate that they exist.
    pub create_tables_if_not_exist: bool,

    pub foreign_keys: bool,

    /// Journal mode applied to file-backed databases.
    pub journal_mode: String,

    /// Tracing filter string, e.g. `"tabula_table=debug,info"`.
    pub log_level: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tabula.db"),
            create_tables_if_not_exist: true,
            foreign_keys: true,
            journal_mode: "WAL".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Load configuration from environment variables, applying defaults where
    /// a variable is absent or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            path:                       PathBuf::from(env_str("TABULA_DB_PATH", "tabula.db")),
            create_tables_if_not_exist: env_bool("TABULA_CREATE_TABLES", defaults.create_tables_if_not_exist),
            foreign_keys:               env_bool("TABULA_FOREIGN_KEYS", defaults.foreign_keys),
            journal_mode:               env_str("TABULA_JOURNAL_MODE", &defaults.journal_mode),
            log_level:                  env_str("TABULA_LOG_LEVEL", &defaults.log_level),
        }
    }

    /// In-memory database with the remaining defaults.
    pub fn memory() -> Self {
        Self {
            path: PathBuf::from(MEMORY_PATH),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn is_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
        Ok(v) if v == "0" || v.eq_ignore_ascii_case("false") => false,
        _ => default,
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
