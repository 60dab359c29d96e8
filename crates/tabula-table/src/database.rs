//! Schema bootstrap: turns a [`DatabaseStructure`] into live [`Table`]s.
//!
//! In create mode every table is created with `CREATE TABLE IF NOT EXISTS`
//! in declaration order. In validate mode each table must already exist.
//! There is no dependency ordering between tables; engines that check
//! foreign key targets at creation time need the schema declared
//! referenced-first.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, error, info, instrument, warn};

use crate::config::DatabaseConfig;
use crate::engine::{SqlEngine, SqliteEngine};
use crate::error::TableError;
use crate::keys::TableLookup;
use crate::pool::ConnectionPool;
use crate::schema::{DatabaseStructure, TableStructure};
use crate::sql;
use crate::table::Table;

/// Anything that names a table: a name, its structure, or the table itself.
pub trait TableRef {
    fn table_name(&self) -> &str;
}

impl TableRef for str {
    fn table_name(&self) -> &str {
        self
    }
}

impl TableRef for String {
    fn table_name(&self) -> &str {
        self
    }
}

impl TableRef for TableStructure {
    fn table_name(&self) -> &str {
        &self.name
    }
}

impl TableRef for Table {
    fn table_name(&self) -> &str {
        self.name()
    }
}

impl<T: TableRef + ?Sized> TableRef for &T {
    fn table_name(&self) -> &str {
        (**self).table_name()
    }
}

/// The set of tables bootstrapped on one engine.
pub struct Database {
    engine: Rc<dyn SqlEngine>,
    tables: Vec<Table>,
}

impl Database {
    /// Bootstraps every table of `structure` on `engine`.
    ///
    /// With `create_tables_if_not_exist` unset, a missing table fails with
    /// `SchemaBootstrap` instead of being created.
    #[instrument(skip_all, fields(tables = structure.tables.len(), create = create_tables_if_not_exist))]
    pub fn new(
        engine: Rc<dyn SqlEngine>,
        structure: &DatabaseStructure,
        create_tables_if_not_exist: bool,
    ) -> Result<Self, TableError> {
        let mut db = Self {
            engine,
            tables: Vec::with_capacity(structure.tables.len()),
        };
        for table in &structure.tables {
            if create_tables_if_not_exist {
                db.create_table(table)?;
            } else {
                db.map_existing_table(table)?;
            }
        }
        info!("Bootstrapped {} tables", db.tables.len());
        Ok(db)
    }

    /// Bootstraps on the pooled connection for `path`.
    pub fn open(
        pool: &mut ConnectionPool,
        path: impl AsRef<Path>,
        structure: &DatabaseStructure,
        create_tables_if_not_exist: bool,
    ) -> Result<Self, TableError> {
        let engine: Rc<dyn SqlEngine> = pool.get_connection(path)?;
        Self::new(engine, structure, create_tables_if_not_exist)
    }

    /// Opens `config.path` with its pragmas and bootstraps per its mode.
    pub fn from_config(config: &DatabaseConfig, structure: &DatabaseStructure) -> Result<Self, TableError> {
        let engine = Rc::new(SqliteEngine::open_with(config)?);
        Self::new(engine, structure, config.create_tables_if_not_exist)
    }

    /// Creates one table (if absent) and adds it to this database.
    #[instrument(skip_all, fields(table = %structure.name))]
    pub fn create_table(&mut self, structure: &TableStructure) -> Result<&Table, TableError> {
        structure.validate()?;
        self.ensure_new(&structure.name)?;
        let statement = sql::create_table_statement(structure, true);
        debug!(sql = %statement, "create table");
        if let Err(e) = self.engine.execute(&statement) {
            error!(sql = %statement, error = %e, "Could not create table");
            return Err(TableError::SchemaBootstrap {
                table: structure.name.clone(),
                reason: e.to_string(),
            });
        }
        self.map_existing_table(structure)
    }

    fn map_existing_table(&mut self, structure: &TableStructure) -> Result<&Table, TableError> {
        self.ensure_new(&structure.name)?;
        if !self.table_exists(&structure.name) {
            return Err(TableError::SchemaBootstrap {
                table: structure.name.clone(),
                reason: "table not found".to_string(),
            });
        }

        let table = Table::new(structure, Rc::clone(&self.engine))?;
        self.tables.push(table);
        Ok(&self.tables[self.tables.len() - 1])
    }

    fn ensure_new(&self, name: &str) -> Result<(), TableError> {
        match self.find_table(name) {
            Some(_) => Err(TableError::InvalidSchema(format!("Duplicate table name: {}", name))),
            None => Ok(()),
        }
    }

    /// Probe errors read as "absent" and are logged.
    fn table_exists(&self, name: &str) -> bool {
        match self.engine.table_exists(name) {
            Ok(exists) => exists,
            Err(e) => {
                warn!(table = name, error = %e, "table existence probe failed");
                false
            }
        }
    }

    /// Linear search by name.
    pub fn get_table(&self, table: impl TableRef) -> Option<&Table> {
        self.find_table(table.table_name())
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn engine(&self) -> &Rc<dyn SqlEngine> {
        &self.engine
    }

    /// The declarative structure of every bootstrapped table.
    pub fn structure(&self) -> DatabaseStructure {
        DatabaseStructure::new(self.tables.iter().map(Table::structure).collect())
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}

impl TableLookup for Database {
    fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }
}
