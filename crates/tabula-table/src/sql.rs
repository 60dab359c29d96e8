//! SQL text generation for DDL, full scans, and inserts.
//!
//! The output is engine-neutral text; engine adapters may translate it to
//! their dialect (see [`SqliteEngine`](crate::SqliteEngine)).

use crate::schema::{ColumnStructure, ForeignKeyOptions, PrimaryKeyOptions, TableStructure};

/// Existence probe for SQLite-family engines. Binds the table name.
pub const TABLE_EXISTS_QUERY: &str = "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?";

/// `CREATE TABLE [IF NOT EXISTS] name (col type [NOT NULL] [UNIQUE], ..., PRIMARY KEY (...)[, FOREIGN KEY ...])`
pub fn create_table_statement(table: &TableStructure, if_not_exists: bool) -> String {
    let columns = table
        .columns
        .iter()
        .map(column_definition)
        .collect::<Vec<_>>()
        .join(", ");

    let foreign_keys = table
        .foreign_keys
        .iter()
        .map(foreign_key_definition)
        .collect::<Vec<_>>();

    let mut sql = format!(
        "CREATE TABLE {}{} ({}, {}",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        table.name,
        columns,
        primary_key_definition(&table.primary_key)
    );
    if !foreign_keys.is_empty() {
        sql.push_str(", ");
        sql.push_str(&foreign_keys.join(", "));
    }
    sql.push(')');
    sql
}

fn column_definition(column: &ColumnStructure) -> String {
    let mut def = format!("{} {}", column.name, column.col_type.as_sql());
    if !column.nullable {
        def.push_str(" NOT NULL");
    }
    if column.unique {
        def.push_str(" UNIQUE");
    }
    def
}

fn primary_key_definition(primary_key: &PrimaryKeyOptions) -> String {
    format!("PRIMARY KEY ({})", primary_key.column_names().join(", "))
}

fn foreign_key_definition(foreign_key: &ForeignKeyOptions) -> String {
    format!(
        "FOREIGN KEY ({}) REFERENCES {}({})",
        foreign_key.column, foreign_key.references.table, foreign_key.references.column
    )
}

pub fn select_all_statement(table_name: &str) -> String {
    format!("SELECT * FROM {}", table_name)
}

/// Multi-row insert with one `?` per value, rows in order.
///
/// `INSERT INTO t (a, b) VALUES (?, ?), (?, ?); RETURNING (a, b)`
pub fn insert_statement(table_name: &str, column_names: &[&str], row_count: usize) -> String {
    let names = format!("({})", column_names.join(", "));
    let placeholders = format!("({})", vec!["?"; column_names.len()].join(", "));
    let values = vec![placeholders.as_str(); row_count.max(1)].join(", ");
    format!(
        "INSERT INTO {} {} VALUES {}; RETURNING {}",
        table_name, names, values, names
    )
}
