//! SELECT builder with aliases, aggregates, joins, and sub-selects.
//!
//! ```text
//! SELECT <projections> FROM <reference>[ JOIN <reference> ON <path> <op> <path>]...
//! ```
//!
//! A projection is `source.column`, a literal, or `OP(...)` around either,
//! optionally followed by ` as alias`. `source` is the reference's alias when
//! set and the table name otherwise; sub-selects always need an alias.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::column::ColumnRef;
use crate::engine::SqlEngine;
use crate::error::TableError;
use crate::rows::Rows;

/// Reducing operations applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOperation {
    Avg,
    Count,
    Max,
    Min,
    Sum,
    GroupConcat,
}

impl AggregateOperation {
    pub fn as_sql(self) -> &'static str {
        match self {
            AggregateOperation::Avg => "AVG",
            AggregateOperation::Count => "COUNT",
            AggregateOperation::Max => "MAX",
            AggregateOperation::Min => "MIN",
            AggregateOperation::Sum => "SUM",
            AggregateOperation::GroupConcat => "GROUP_CONCAT",
        }
    }
}

impl FromStr for AggregateOperation {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AVG" => Ok(AggregateOperation::Avg),
            "COUNT" => Ok(AggregateOperation::Count),
            "MAX" => Ok(AggregateOperation::Max),
            "MIN" => Ok(AggregateOperation::Min),
            "SUM" => Ok(AggregateOperation::Sum),
            "GROUP_CONCAT" => Ok(AggregateOperation::GroupConcat),
            _ => Err(TableError::unresolved("aggregate operation", s)),
        }
    }
}

/// Comparison used in a join's `ON` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinOperator {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Neq,
    Between,
    Like,
    In,
}

impl JoinOperator {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinOperator::Eq => "=",
            JoinOperator::Gt => ">",
            JoinOperator::Lt => "<",
            JoinOperator::Gte => ">=",
            JoinOperator::Lte => "<=",
            JoinOperator::Neq => "!=",
            JoinOperator::Between => "BETWEEN",
            JoinOperator::Like => "LIKE",
            JoinOperator::In => "IN",
        }
    }
}

/// The target of a `FROM` or `JOIN`: a table or an inlined sub-select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryReference {
    Table { name: String, alias: Option<String> },
    Select { select: String, alias: String },
}

impl QueryReference {
    pub fn table(name: impl Into<String>) -> Self {
        Self::Table {
            name: name.into(),
            alias: None,
        }
    }

    pub fn select(select: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Select {
            select: select.into(),
            alias: alias.into(),
        }
    }

    /// Inlines the text of another query as a sub-select.
    pub fn subquery(query: &Query, alias: impl Into<String>) -> Result<Self, TableError> {
        Ok(Self::select(query.to_sql()?, alias))
    }

    /// Sets (or replaces) the alias. An empty alias counts as none.
    pub fn with_alias(self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        match self {
            Self::Table { name, .. } => Self::Table {
                name,
                alias: Some(alias).filter(|a| !a.is_empty()),
            },
            Self::Select { select, .. } => Self::Select { select, alias },
        }
    }

    pub fn alias(&self) -> Option<&str> {
        let alias = match self {
            Self::Table { alias, .. } => alias.as_deref(),
            Self::Select { alias, .. } => Some(alias.as_str()),
        };
        alias.filter(|a| !a.is_empty())
    }

    /// The name columns of this reference are qualified with.
    pub fn source(&self) -> Result<&str, TableError> {
        if let Some(alias) = self.alias() {
            return Ok(alias);
        }
        match self {
            Self::Table { name, .. } => Ok(name),
            Self::Select { select, .. } => {
                Err(TableError::unresolved("alias for sub-select", select.as_str()))
            }
        }
    }

    /// Projects one of this reference's columns.
    pub fn column(&self, column: impl ColumnRef) -> QueryColumn {
        QueryColumn::column(self, column)
    }

    /// `name[ as alias]` or `(select) as alias`.
    pub fn to_sql(&self) -> Result<String, TableError> {
        match self {
            Self::Table { name, .. } => Ok(match self.alias() {
                Some(alias) => format!("{} as {}", name, alias),
                None => name.clone(),
            }),
            Self::Select { select, .. } => Ok(format!("({}) as {}", select, self.source()?)),
        }
    }
}

/// What a projected column reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    Column {
        source: QueryReference,
        column: String,
    },
    /// Emitted verbatim; callers quote text literals themselves.
    Text(String),
    Numeric(f64),
}

/// One entry of the projection list.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryColumn {
    value: ColumnSource,
    alias: Option<String>,
    operation: Option<AggregateOperation>,
}

impl QueryColumn {
    pub fn column(source: &QueryReference, column: impl ColumnRef) -> Self {
        Self::from_source(ColumnSource::Column {
            source: source.clone(),
            column: column.column_name().to_string(),
        })
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::from_source(ColumnSource::Text(value.into()))
    }

    pub fn numeric(value: impl Into<f64>) -> Self {
        Self::from_source(ColumnSource::Numeric(value.into()))
    }

    fn from_source(value: ColumnSource) -> Self {
        Self {
            value,
            alias: None,
            operation: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into()).filter(|a| !a.is_empty());
        self
    }

    /// Wraps the column in an aggregate.
    pub fn aggregate(mut self, operation: AggregateOperation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn value(&self) -> &ColumnSource {
        &self.value
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn operation(&self) -> Option<AggregateOperation> {
        self.operation
    }

    pub fn is_aggregate(&self) -> bool {
        self.operation.is_some()
    }

    /// The reference this column reads from; `None` for literals.
    pub fn source(&self) -> Option<&QueryReference> {
        match &self.value {
            ColumnSource::Column { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Entry of the `SELECT` list.
    fn projection_sql(&self) -> Result<String, TableError> {
        let target = match &self.value {
            ColumnSource::Column { source, column } => format!("{}.{}", source.source()?, column),
            ColumnSource::Text(text) => text.clone(),
            ColumnSource::Numeric(n) => n.to_string(),
        };
        let expr = match self.operation {
            Some(op) => format!("{}({})", op.as_sql(), target),
            None => target,
        };
        Ok(match &self.alias {
            Some(alias) => format!("{} as {}", expr, alias),
            None => expr,
        })
    }

    /// Operand of a join condition: `source.alias`, `source.column`, or the
    /// literal itself.
    fn path_sql(&self) -> Result<String, TableError> {
        match &self.value {
            ColumnSource::Column { source, column } => Ok(format!(
                "{}.{}",
                source.source()?,
                self.alias.as_deref().unwrap_or(column)
            )),
            ColumnSource::Text(text) => Ok(text.clone()),
            ColumnSource::Numeric(n) => Ok(n.to_string()),
        }
    }
}

/// `JOIN <to.source> ON <to> <operator> <from>`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinCondition {
    pub from: QueryColumn,
    pub operator: JoinOperator,
    pub to: QueryColumn,
}

impl JoinCondition {
    pub fn new(from: QueryColumn, operator: JoinOperator, to: QueryColumn) -> Self {
        Self { from, operator, to }
    }

    pub fn eq(from: QueryColumn, to: QueryColumn) -> Self {
        Self::new(from, JoinOperator::Eq, to)
    }

    fn to_sql(&self) -> Result<String, TableError> {
        let target = self.to.source().ok_or_else(|| {
            TableError::unresolved("join target", self.to.path_sql().unwrap_or_default())
        })?;
        Ok(format!(
            " JOIN {} ON {} {} {}",
            target.to_sql()?,
            self.to.path_sql()?,
            self.operator.as_sql(),
            self.from.path_sql()?
        ))
    }
}

/// Single-use SELECT builder.
///
/// Projections and joins are appended in call order. [`rows`](Self::rows)
/// consumes the builder, so a query runs at most once.
pub struct Query {
    reference: QueryReference,
    columns: Vec<QueryColumn>,
    joins: Vec<JoinCondition>,
    engine: Rc<dyn SqlEngine>,
}

impl Query {
    pub fn new(reference: QueryReference, engine: Rc<dyn SqlEngine>) -> Self {
        Self {
            reference,
            columns: Vec::new(),
            joins: Vec::new(),
            engine,
        }
    }

    pub fn reference(&self) -> &QueryReference {
        &self.reference
    }

    pub fn columns(&self) -> &[QueryColumn] {
        &self.columns
    }

    pub fn joins(&self) -> &[JoinCondition] {
        &self.joins
    }

    pub fn select_column(mut self, column: QueryColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn join(mut self, condition: JoinCondition) -> Self {
        self.joins.push(condition);
        self
    }

    /// Renders the statement text.
    pub fn to_sql(&self) -> Result<String, TableError> {
        let projections = self
            .columns
            .iter()
            .map(QueryColumn::projection_sql)
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");
        let joins = self
            .joins
            .iter()
            .map(JoinCondition::to_sql)
            .collect::<Result<String, _>>()?;
        Ok(format!(
            "SELECT {} FROM {}{}",
            projections,
            self.reference.to_sql()?,
            joins
        ))
    }

    /// Runs the query lazily. With no projected columns nothing is sent to
    /// the engine and the sequence is empty.
    pub fn rows(self) -> Rows {
        if self.columns.is_empty() {
            return Rows::empty();
        }
        match self.to_sql() {
            Ok(sql) => Rows::new(self.engine, sql, Vec::new()),
            Err(e) => Rows::failed(e),
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("reference", &self.reference)
            .field("columns", &self.columns)
            .field("joins", &self.joins)
            .finish_non_exhaustive()
    }
}
