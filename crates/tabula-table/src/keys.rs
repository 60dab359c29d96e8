//! Primary and foreign keys.
//!
//! Keys hold column and table *names*, never references. They are resolved on
//! access against a [`ColumnLookup`] (the owning table) or a [`TableLookup`]
//! (the database), so tables can reference each other in any order, including
//! cycles, without the referenced table existing at construction time.
//!
//! Both key kinds fail with [`TableError::Resolution`] when a name does not
//! resolve.

use crate::column::{Column, ColumnLookup};
use crate::error::TableError;
use crate::schema::{ForeignKeyOptions, ForeignKeyReferencesOptions, PrimaryKeyOptions};
use crate::table::Table;

/// Lookup of tables by name.
pub trait TableLookup {
    fn find_table(&self, name: &str) -> Option<&Table>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    options: PrimaryKeyOptions,
}

impl PrimaryKey {
    pub fn new(options: PrimaryKeyOptions) -> Self {
        Self { options }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.options.column_names()
    }

    /// Resolves every key column, in declaration order.
    pub fn columns<'a, L>(&self, lookup: &'a L) -> Result<Vec<&'a Column>, TableError>
    where
        L: ColumnLookup + ?Sized,
    {
        self.options
            .column_names()
            .into_iter()
            .map(|name| {
                lookup
                    .find_column(name)
                    .ok_or_else(|| TableError::unresolved("primary key column", name))
            })
            .collect()
    }

    pub fn options(&self) -> &PrimaryKeyOptions {
        &self.options
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    column_name: String,
    references: ForeignKeyReferences,
}

impl ForeignKey {
    pub fn new(options: &ForeignKeyOptions) -> Self {
        Self {
            column_name: options.column.clone(),
            references: ForeignKeyReferences::new(&options.references),
        }
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// The local column, resolved through the owning table.
    pub fn column<'a, L>(&self, table: &'a L) -> Result<&'a Column, TableError>
    where
        L: ColumnLookup + ?Sized,
    {
        table
            .find_column(&self.column_name)
            .ok_or_else(|| TableError::unresolved("foreign key column", self.column_name.as_str()))
    }

    pub fn references(&self) -> &ForeignKeyReferences {
        &self.references
    }

    pub fn options(&self) -> ForeignKeyOptions {
        ForeignKeyOptions {
            column: self.column_name.clone(),
            references: ForeignKeyReferencesOptions {
                table: self.references.table_name.clone(),
                column: self.references.column_name.clone(),
            },
        }
    }
}

/// The `table(column)` a foreign key points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyReferences {
    table_name: String,
    column_name: String,
}

impl ForeignKeyReferences {
    pub fn new(options: &ForeignKeyReferencesOptions) -> Self {
        Self {
            table_name: options.table.clone(),
            column_name: options.column.clone(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn table<'a, L>(&self, tables: &'a L) -> Result<&'a Table, TableError>
    where
        L: TableLookup + ?Sized,
    {
        tables
            .find_table(&self.table_name)
            .ok_or_else(|| TableError::unresolved("referenced table", self.table_name.as_str()))
    }

    pub fn column<'a, L>(&self, tables: &'a L) -> Result<&'a Column, TableError>
    where
        L: TableLookup + ?Sized,
    {
        self.table(tables)?.find_column(&self.column_name).ok_or_else(|| {
            TableError::unresolved(
                "referenced column",
                format!("{}.{}", self.table_name, self.column_name),
            )
        })
    }
}
