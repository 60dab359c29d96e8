use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::column::{Column, ColumnLookup, TypedColumn};
use crate::engine::SqlEngine;
use crate::error::TableError;
use crate::keys::{ForeignKey, PrimaryKey};
use crate::query::{JoinCondition, Query, QueryColumn, QueryReference};
use crate::row::{NewRow, RowData, Value};
use crate::rows::Rows;
use crate::schema::TableStructure;
use crate::sql;

/// Schema-bound handle to one table.
///
/// Reads and inserts go through the shared engine; queries are built
/// explicitly with [`query`](Self::query).
pub struct Table {
    name: String,
    columns: Vec<Column>,
    primary_key: PrimaryKey,
    foreign_keys: Vec<ForeignKey>,
    engine: Rc<dyn SqlEngine>,
}

impl Table {
    /// Builds the columns, then the primary key, then each foreign key in
    /// declared order. Foreign keys are not resolved here; the tables they
    /// point at may not exist yet.
    pub fn new(structure: &TableStructure, engine: Rc<dyn SqlEngine>) -> Result<Self, TableError> {
        structure.validate()?;

        let columns = structure
            .columns
            .iter()
            .cloned()
            .map(Column::from_structure)
            .collect::<Result<Vec<_>, _>>()?;

        let table = Self {
            name: structure.name.clone(),
            columns,
            primary_key: PrimaryKey::new(structure.primary_key.clone()),
            foreign_keys: structure.foreign_keys.iter().map(ForeignKey::new).collect(),
            engine,
        };

        // Columns never change after this point, so one successful
        // resolution holds for the table's lifetime.
        table.primary_key.columns(&table)?;
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn engine(&self) -> &Rc<dyn SqlEngine> {
        &self.engine
    }

    pub fn primary_key_columns(&self) -> Result<Vec<&Column>, TableError> {
        self.primary_key.columns(self)
    }

    /// The column called `name`, as the typed handle `C`.
    ///
    /// Fails with `Resolution` if there is no such column and with
    /// `TypeMismatch` if it holds another type.
    pub fn typed_column<C: TypedColumn>(&self, name: &str) -> Result<&C, TableError> {
        let column = self
            .find_column(name)
            .ok_or_else(|| TableError::unresolved("column", format!("{}.{}", self.name, name)))?;
        column.as_typed::<C>().ok_or_else(|| TableError::TypeMismatch {
            column: name.to_string(),
            expected: C::TYPE,
            actual: column.column_type(),
        })
    }

    /// Every row of the table, fetched lazily.
    pub fn rows(&self) -> Rows {
        Rows::new(
            Rc::clone(&self.engine),
            sql::select_all_statement(&self.name),
            Vec::new(),
        )
    }

    /// Inserts all rows in one statement and yields the persisted rows.
    ///
    /// The column list is every name staged by any row, in first-seen
    /// order; each row binds `NULL` for the columns it does not stage. An
    /// empty slice yields nothing and sends nothing to the engine.
    pub fn insert(&self, rows: &[NewRow]) -> Rows {
        if rows.is_empty() {
            return Rows::empty();
        }

        let mut column_names: Vec<&str> = Vec::new();
        for name in rows.iter().flat_map(|row| row.as_row().column_names()) {
            if !column_names.contains(&name) {
                column_names.push(name);
            }
        }
        let params: Vec<Value> = rows
            .iter()
            .flat_map(|row| {
                column_names
                    .iter()
                    .map(move |name| row.as_row().value(*name).cloned().unwrap_or(Value::Null))
            })
            .collect();

        let statement = sql::insert_statement(&self.name, &column_names, rows.len());
        debug!(table = %self.name, rows = rows.len(), "insert");
        Rows::new(Rc::clone(&self.engine), statement, params)
    }

    /// Inserts one row and returns it as persisted.
    pub fn insert_single(&self, row: NewRow) -> Result<RowData, TableError> {
        match self.insert(std::slice::from_ref(&row)).next() {
            Some(result) => result,
            None => Err(TableError::NoRowsReturned(self.name.clone())),
        }
    }

    /// `FROM` target naming this table.
    pub fn reference(&self) -> QueryReference {
        QueryReference::table(&self.name)
    }

    pub fn query(&self) -> Query {
        Query::new(self.reference(), Rc::clone(&self.engine))
    }

    /// Query over this table under an alias.
    pub fn query_as(&self, alias: &str) -> Query {
        Query::new(self.reference().with_alias(alias), Rc::clone(&self.engine))
    }

    /// Shorthand for `self.query().select_column(column)`.
    pub fn select_column(&self, column: QueryColumn) -> Query {
        self.query().select_column(column)
    }

    /// Shorthand for `self.query().join(condition)`.
    pub fn join(&self, condition: JoinCondition) -> Query {
        self.query().join(condition)
    }

    /// The declarative structure this table was built from.
    pub fn structure(&self) -> TableStructure {
        TableStructure {
            name: self.name.clone(),
            columns: self.columns.iter().map(|c| c.structure().clone()).collect(),
            primary_key: self.primary_key.options().clone(),
            foreign_keys: self.foreign_keys.iter().map(ForeignKey::options).collect(),
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` text for this table.
    pub fn create_statement(&self) -> String {
        sql::create_table_statement(&self.structure(), true)
    }
}

impl ColumnLookup for Table {
    fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .field("primary_key", &self.primary_key)
            .field("foreign_keys", &self.foreign_keys)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{IntegerColumn, TextColumn};
    use crate::query::AggregateOperation;
    use crate::schema::{ColumnStructure, ColumnType, ForeignKeyOptions, PrimaryKeyOptions};
    use crate::testing::RecordingEngine;

    fn t_structure() -> TableStructure {
        TableStructure {
            name: "t".into(),
            columns: vec![
                ColumnStructure::new("a", ColumnType::Integer, false),
                ColumnStructure::new("b", ColumnType::Text, true),
            ],
            primary_key: PrimaryKeyOptions::single("a"),
            foreign_keys: vec![ForeignKeyOptions::new("b", "other", "name")],
        }
    }

    #[test]
    fn insert_two_rows_flattens_params_row_major() {
        let engine = RecordingEngine::new();
        let table = Table::new(&t_structure(), engine.clone()).unwrap();

        let rows = [
            NewRow::new().with("a", 1).with("b", "x"),
            NewRow::new().with("b", "y").with("a", 2),
        ];
        let inserted = table.insert(&rows);
        assert!(engine.statements().is_empty());
        assert_eq!(inserted.count(), 0);

        assert_eq!(
            engine.statements(),
            vec!["INSERT INTO t (a, b) VALUES (?, ?), (?, ?); RETURNING (a, b)"]
        );
        assert_eq!(
            engine.params(),
            vec![vec![
                Value::Integer(1),
                Value::Text("x".into()),
                Value::Integer(2),
                Value::Text("y".into()),
            ]]
        );
    }

    #[test]
    fn missing_values_bind_null() {
        let engine = RecordingEngine::new();
        let table = Table::new(&t_structure(), engine.clone()).unwrap();
        let rows = [
            NewRow::new().with("a", 1).with("b", "x"),
            NewRow::new().with("a", 2),
        ];
        let _ = table.insert(&rows).count();
        assert_eq!(engine.params()[0][3], Value::Null);
    }

    #[test]
    fn columns_staged_only_by_later_rows_are_kept() {
        let engine = RecordingEngine::new();
        let table = Table::new(&t_structure(), engine.clone()).unwrap();
        let rows = [
            NewRow::new().with("a", 1),
            NewRow::new().with("a", 2).with("b", "kept"),
        ];
        let _ = table.insert(&rows).count();
        assert_eq!(
            engine.statements(),
            vec!["INSERT INTO t (a, b) VALUES (?, ?), (?, ?); RETURNING (a, b)"]
        );
        assert_eq!(
            engine.params(),
            vec![vec![
                Value::Integer(1),
                Value::Null,
                Value::Integer(2),
                Value::Text("kept".into()),
            ]]
        );
    }

    #[test]
    fn empty_insert_never_calls_engine() {
        let engine = RecordingEngine::new();
        let table = Table::new(&t_structure(), engine.clone()).unwrap();
        assert_eq!(table.insert(&[]).count(), 0);
        assert!(engine.statements().is_empty());
    }

    #[test]
    fn insert_single_without_result_fails() {
        let table = Table::new(&t_structure(), RecordingEngine::new()).unwrap();
        let err = table
            .insert_single(NewRow::new().with("a", 1))
            .unwrap_err();
        assert!(matches!(err, TableError::NoRowsReturned(ref t) if t == "t"));
    }

    #[test]
    fn insert_single_returns_persisted_row() {
        let engine = RecordingEngine::with_responses(vec![vec![vec![
            ("a".into(), Value::Integer(7)),
            ("b".into(), Value::Null),
        ]]]);
        let table = Table::new(&t_structure(), engine).unwrap();
        let row = table.insert_single(NewRow::new().with("a", 7)).unwrap();
        assert_eq!(row.value("a"), Some(&Value::Integer(7)));
    }

    #[test]
    fn rows_selects_everything() {
        let engine = RecordingEngine::new();
        let table = Table::new(&t_structure(), engine.clone()).unwrap();
        assert_eq!(table.rows().count(), 0);
        assert_eq!(engine.statements(), vec!["SELECT * FROM t"]);
    }

    #[test]
    fn construction_rejects_mismatched_or_unknown_columns() {
        let mut structure = t_structure();
        structure.primary_key = PrimaryKeyOptions::single("gone");
        let err = Table::new(&structure, RecordingEngine::new()).unwrap_err();
        assert!(matches!(err, TableError::Resolution { .. }));

        let mut structure = t_structure();
        structure.columns.clear();
        assert!(matches!(
            Table::new(&structure, RecordingEngine::new()),
            Err(TableError::InvalidSchema(_))
        ));
    }

    #[test]
    fn foreign_keys_are_not_resolved_at_construction() {
        let table = Table::new(&t_structure(), RecordingEngine::new()).unwrap();
        let fk = &table.foreign_keys()[0];
        assert_eq!(fk.column(&table).unwrap().name(), "b");
        assert_eq!(fk.references().table_name(), "other");
    }

    #[test]
    fn typed_column_checks_kind() {
        let table = Table::new(&t_structure(), RecordingEngine::new()).unwrap();
        assert_eq!(table.typed_column::<IntegerColumn>("a").unwrap().name(), "a");
        assert!(matches!(
            table.typed_column::<TextColumn>("a"),
            Err(TableError::TypeMismatch { .. })
        ));
        assert!(matches!(
            table.typed_column::<TextColumn>("zz"),
            Err(TableError::Resolution { .. })
        ));
    }

    #[test]
    fn structure_round_trips_and_renders_ddl() {
        let table = Table::new(&t_structure(), RecordingEngine::new()).unwrap();
        assert_eq!(table.structure(), t_structure());
        assert_eq!(
            table.create_statement(),
            "CREATE TABLE IF NOT EXISTS t (a INTEGER NOT NULL, b TEXT, PRIMARY KEY (a), \
             FOREIGN KEY (b) REFERENCES other(name))"
        );
    }

    #[test]
    fn shorthands_start_fresh_queries() {
        let table = Table::new(&t_structure(), RecordingEngine::new()).unwrap();
        let reference = table.reference();
        let first = table.select_column(reference.column("a"));
        let second = table.select_column(reference.column("b"));
        assert_eq!(first.to_sql().unwrap(), "SELECT t.a FROM t");
        assert_eq!(second.to_sql().unwrap(), "SELECT t.b FROM t");

        let aliased = table.query_as("x");
        let x = aliased.reference().clone();
        let sql = aliased
            .select_column(x.column("a").aggregate(AggregateOperation::Count))
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT COUNT(x.a) FROM t as x");
    }
}
