//! # tabula-table
//!
//! Typed relational schema layer and SQL query builder over SQLite.
//!
//! A declarative [`DatabaseStructure`] (tables, typed columns, primary and
//! foreign keys) is bootstrapped into live [`Table`] handles. Tables insert
//! and scan rows through a pluggable [`SqlEngine`]; [`Query`] builds SELECTs
//! with aliases, aggregates, joins, and sub-selects. Result rows are pulled
//! lazily through [`Rows`].
//!
//! ## Quick start
//!
//! ```no_run
//! use std::rc::Rc;
//! use tabula_table::{
//!     AggregateOperation, ColumnStructure, ColumnType, Database, DatabaseStructure, NewRow,
//!     PrimaryKeyOptions, SqliteEngine, TableStructure,
//! };
//!
//! let structure = DatabaseStructure::new(vec![TableStructure {
//!     name: "orders".into(),
//!     columns: vec![
//!         ColumnStructure::new("id", ColumnType::Integer, false),
//!         ColumnStructure::new("total", ColumnType::Real, false),
//!     ],
//!     primary_key: PrimaryKeyOptions::single("id"),
//!     foreign_keys: vec![],
//! }]);
//!
//! let engine = Rc::new(SqliteEngine::open_memory().unwrap());
//! let db = Database::new(engine, &structure, true).unwrap();
//! let orders = db.get_table("orders").unwrap();
//!
//! orders.insert_single(NewRow::new().with("id", 1).with("total", 9.5)).unwrap();
//!
//! let query = orders.query_as("o");
//! let o = query.reference().clone();
//! for row in query
//!     .select_column(o.column("total").aggregate(AggregateOperation::Sum).with_alias("sum_total"))
//!     .rows()
//! {
//!     println!("{}", row.unwrap().to_json());
//! }
//! ```

pub mod column;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod keys;
pub mod pool;
pub mod query;
pub mod row;
pub mod rows;
pub mod schema;
pub mod sql;
pub mod table;

// Re-exports for convenience.
pub use column::{
    BlobColumn, Column, ColumnLookup, ColumnRef, IntegerColumn, NumericColumn, RealColumn,
    TextColumn, TypedColumn,
};
pub use config::DatabaseConfig;
pub use database::{Database, TableRef};
pub use engine::{SqlEngine, SqliteEngine};
pub use error::TableError;
pub use keys::{ForeignKey, ForeignKeyReferences, PrimaryKey, TableLookup};
pub use pool::ConnectionPool;
pub use query::{
    AggregateOperation, ColumnSource, JoinCondition, JoinOperator, Query, QueryColumn,
    QueryReference,
};
pub use row::{FromValue, NewRow, Record, RowData, Value};
pub use rows::Rows;
pub use schema::{
    ColumnStructure, ColumnType, DatabaseStructure, ForeignKeyOptions,
    ForeignKeyReferencesOptions, PrimaryKeyOptions, TableStructure,
};
pub use table::Table;

#[cfg(test)]
mod testing;
