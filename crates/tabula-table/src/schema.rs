use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::column::ColumnRef;
use crate::error::TableError;

/// SQLite storage classes a column can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Text,
    Numeric,
    Integer,
    Real,
    Blob,
}

impl ColumnType {
    /// Returns the SQL type literal used in `CREATE TABLE`.
    pub fn as_sql(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Numeric => "NUMERIC",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Blob => "BLOB",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Declarative description of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStructure {
    /// Column name, unique within its table.
    pub name: String,
    /// Declared storage type.
    #[serde(rename = "type")]
    pub col_type: ColumnType,
    /// Whether the column accepts NULL values.
    pub nullable: bool,
    /// Whether the column carries a UNIQUE constraint.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
}

impl ColumnStructure {
    pub fn new(name: impl Into<String>, col_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            col_type,
            nullable,
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Primary key declaration: one column or an ordered list of columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKeyOptions {
    Single { column: String },
    Multiple { columns: Vec<String> },
}

impl PrimaryKeyOptions {
    pub fn single(column: impl ColumnRef) -> Self {
        Self::Single {
            column: column.column_name().to_string(),
        }
    }

    pub fn multiple<C: ColumnRef>(columns: impl IntoIterator<Item = C>) -> Self {
        Self::Multiple {
            columns: columns
                .into_iter()
                .map(|c| c.column_name().to_string())
                .collect(),
        }
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        match self {
            Self::Single { column } => vec![column.as_str()],
            Self::Multiple { columns } => columns.iter().map(String::as_str).collect(),
        }
    }
}

/// Target side of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyReferencesOptions {
    pub table: String,
    pub column: String,
}

/// Declarative foreign key: a local column referencing `table(column)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyOptions {
    pub column: String,
    pub references: ForeignKeyReferencesOptions,
}

impl ForeignKeyOptions {
    pub fn new(
        column: impl ColumnRef,
        table: impl Into<String>,
        references: impl ColumnRef,
    ) -> Self {
        Self {
            column: column.column_name().to_string(),
            references: ForeignKeyReferencesOptions {
                table: table.into(),
                column: references.column_name().to_string(),
            },
        }
    }
}

/// Declarative description of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStructure {
    pub name: String,
    pub columns: Vec<ColumnStructure>,
    pub primary_key: PrimaryKeyOptions,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyOptions>,
}

impl TableStructure {
    /// Checks the invariants a table needs before any SQL is generated:
    /// at least one column, unique column names, a non-empty primary key.
    pub fn validate(&self) -> Result<(), TableError> {
        if self.columns.is_empty() {
            return Err(TableError::InvalidSchema(format!(
                "Table '{}' must have at least one column",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for col in &self.columns {
            if !seen.insert(col.name.as_str()) {
                return Err(TableError::InvalidSchema(format!(
                    "Duplicate column name in '{}': {}",
                    self.name, col.name
                )));
            }
        }

        if self.primary_key.column_names().is_empty() {
            return Err(TableError::InvalidSchema(format!(
                "Table '{}' has an empty primary key",
                self.name
            )));
        }

        Ok(())
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnStructure> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Ordered set of tables making up one database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseStructure {
    pub tables: Vec<TableStructure>,
}

impl DatabaseStructure {
    pub fn new(tables: Vec<TableStructure>) -> Self {
        Self { tables }
    }

    /// Parses a schema from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON schema file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, TableError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_schema() {
        let json = r#"{
            "tables": [{
                "name": "orders",
                "columns": [
                    {"name": "id", "type": "INTEGER", "nullable": false},
                    {"name": "code", "type": "TEXT", "nullable": false, "unique": true},
                    {"name": "user_id", "type": "INTEGER", "nullable": true}
                ],
                "primaryKey": {"column": "id"},
                "foreignKeys": [
                    {"column": "user_id", "references": {"table": "users", "column": "id"}}
                ]
            }]
        }"#;

        let db = DatabaseStructure::from_json_str(json).unwrap();
        let orders = &db.tables[0];
        assert_eq!(orders.name, "orders");
        assert_eq!(orders.columns[0].col_type, ColumnType::Integer);
        assert!(orders.columns[1].unique);
        assert!(!orders.columns[2].unique);
        assert_eq!(orders.primary_key, PrimaryKeyOptions::single("id"));
        assert_eq!(orders.foreign_keys[0].references.table, "users");
    }

    #[test]
    fn parses_multi_column_primary_key_and_missing_foreign_keys() {
        let json = r#"{"tables": [{
            "name": "memberships",
            "columns": [
                {"name": "group_id", "type": "INTEGER", "nullable": false},
                {"name": "user_id", "type": "INTEGER", "nullable": false}
            ],
            "primaryKey": {"columns": ["group_id", "user_id"]}
        }]}"#;

        let db = DatabaseStructure::from_json_str(json).unwrap();
        let table = &db.tables[0];
        assert_eq!(table.primary_key.column_names(), vec!["group_id", "user_id"]);
        assert!(table.foreign_keys.is_empty());
    }

    #[test]
    fn rejects_unknown_column_type() {
        let json = r#"{"tables": [{
            "name": "t",
            "columns": [{"name": "id", "type": "VARCHAR", "nullable": false}],
            "primaryKey": {"column": "id"}
        }]}"#;
        let err = DatabaseStructure::from_json_str(json).unwrap_err();
        assert!(matches!(err, TableError::SerializationError(_)));
    }

    #[test]
    fn validate_rejects_duplicates_and_empty_keys() {
        let mut table = TableStructure {
            name: "t".into(),
            columns: vec![
                ColumnStructure::new("id", ColumnType::Integer, false),
                ColumnStructure::new("id", ColumnType::Text, true),
            ],
            primary_key: PrimaryKeyOptions::single("id"),
            foreign_keys: vec![],
        };
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate column name"));

        table.columns.pop();
        table.primary_key = PrimaryKeyOptions::Multiple { columns: vec![] };
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("empty primary key"));

        table.columns.clear();
        assert!(table.validate().is_err());
    }

    #[test]
    fn json_round_trip_keeps_structure() {
        let db = DatabaseStructure::new(vec![TableStructure {
            name: "t".into(),
            columns: vec![ColumnStructure::new("id", ColumnType::Real, false).unique()],
            primary_key: PrimaryKeyOptions::single("id"),
            foreign_keys: vec![],
        }]);
        let json = db.to_json_string().unwrap();
        assert!(json.contains("\"REAL\""));
        assert!(json.contains("\"primaryKey\""));
        assert_eq!(DatabaseStructure::from_json_str(&json).unwrap(), db);
    }
}
