//! Typed column handles.
//!
//! Each of the five SQLite storage classes has its own handle type whose
//! constructor checks the declared type of the [`ColumnStructure`] it is
//! given. [`Column`] is the closed sum over the five handles and is what a
//! [`Table`](crate::Table) owns.

use crate::error::TableError;
use crate::row::{FromValue, Value};
use crate::schema::{ColumnStructure, ColumnType};

/// Anything that names a column: plain strings, structures, and handles.
pub trait ColumnRef {
    fn column_name(&self) -> &str;
}

impl ColumnRef for str {
    fn column_name(&self) -> &str {
        self
    }
}

impl ColumnRef for String {
    fn column_name(&self) -> &str {
        self
    }
}

impl ColumnRef for ColumnStructure {
    fn column_name(&self) -> &str {
        &self.name
    }
}

impl<T: ColumnRef + ?Sized> ColumnRef for &T {
    fn column_name(&self) -> &str {
        (**self).column_name()
    }
}

/// A column handle whose storage type is known statically.
///
/// `Value` is the Rust type rows yield for this column and the type
/// [`NewRow::set`](crate::NewRow::set) accepts for it.
pub trait TypedColumn: ColumnRef {
    const TYPE: ColumnType;
    type Value: FromValue + Into<Value>;

    /// Borrows the typed handle out of a [`Column`] of the same kind.
    fn from_column(column: &Column) -> Option<&Self>;

    fn structure(&self) -> &ColumnStructure;
}

macro_rules! typed_column {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $value:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            structure: ColumnStructure,
        }

        impl $name {
            /// Fails with [`TableError::TypeMismatch`] unless the structure
            #[doc = concat!("declares `", stringify!($variant), "`.")]
            pub fn new(structure: ColumnStructure) -> Result<Self, TableError> {
                if structure.col_type != ColumnType::$variant {
                    return Err(TableError::TypeMismatch {
                        column: structure.name,
                        expected: ColumnType::$variant,
                        actual: structure.col_type,
                    });
                }
                Ok(Self { structure })
            }

            pub fn name(&self) -> &str {
                &self.structure.name
            }

            pub fn column_type(&self) -> ColumnType {
                ColumnType::$variant
            }

            pub fn nullable(&self) -> bool {
                self.structure.nullable
            }

            pub fn unique(&self) -> bool {
                self.structure.unique
            }
        }

        impl ColumnRef for $name {
            fn column_name(&self) -> &str {
                &self.structure.name
            }
        }

        impl TypedColumn for $name {
            const TYPE: ColumnType = ColumnType::$variant;
            type Value = $value;

            fn from_column(column: &Column) -> Option<&Self> {
                match column {
                    Column::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn structure(&self) -> &ColumnStructure {
                &self.structure
            }
        }

        impl TryFrom<ColumnStructure> for $name {
            type Error = TableError;

            fn try_from(structure: ColumnStructure) -> Result<Self, Self::Error> {
                Self::new(structure)
            }
        }

        impl From<$name> for Column {
            fn from(column: $name) -> Self {
                Column::$variant(column)
            }
        }
    };
}

typed_column!(
    /// A `TEXT` column; values read as `String`.
    TextColumn, Text, String
);
typed_column!(
    /// A `NUMERIC` column; values read as `f64`.
    NumericColumn, Numeric, f64
);
typed_column!(
    /// An `INTEGER` column; values read as `i64`.
    IntegerColumn, Integer, i64
);
typed_column!(
    /// A `REAL` column; values read as `f64`.
    RealColumn, Real, f64
);
typed_column!(
    /// A `BLOB` column; values read as raw bytes.
    BlobColumn, Blob, Vec<u8>
);

/// One column of a table, tagged with its storage type.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(TextColumn),
    Numeric(NumericColumn),
    Integer(IntegerColumn),
    Real(RealColumn),
    Blob(BlobColumn),
}

impl Column {
    /// Builds the handle matching the structure's declared type.
    pub fn from_structure(structure: ColumnStructure) -> Result<Self, TableError> {
        match structure.col_type {
            ColumnType::Text => TextColumn::new(structure).map(Column::Text),
            ColumnType::Numeric => NumericColumn::new(structure).map(Column::Numeric),
            ColumnType::Integer => IntegerColumn::new(structure).map(Column::Integer),
            ColumnType::Real => RealColumn::new(structure).map(Column::Real),
            ColumnType::Blob => BlobColumn::new(structure).map(Column::Blob),
        }
    }

    pub fn structure(&self) -> &ColumnStructure {
        match self {
            Column::Text(c) => c.structure(),
            Column::Numeric(c) => c.structure(),
            Column::Integer(c) => c.structure(),
            Column::Real(c) => c.structure(),
            Column::Blob(c) => c.structure(),
        }
    }

    pub fn name(&self) -> &str {
        &self.structure().name
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Text(_) => ColumnType::Text,
            Column::Numeric(_) => ColumnType::Numeric,
            Column::Integer(_) => ColumnType::Integer,
            Column::Real(_) => ColumnType::Real,
            Column::Blob(_) => ColumnType::Blob,
        }
    }

    pub fn nullable(&self) -> bool {
        self.structure().nullable
    }

    pub fn unique(&self) -> bool {
        self.structure().unique
    }

    /// Borrows the typed handle if this column is of kind `C`.
    pub fn as_typed<C: TypedColumn>(&self) -> Option<&C> {
        C::from_column(self)
    }
}

impl ColumnRef for Column {
    fn column_name(&self) -> &str {
        self.name()
    }
}

/// Lookup of a table's columns by name.
pub trait ColumnLookup {
    fn find_column(&self, name: &str) -> Option<&Column>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [ColumnType; 5] = [
        ColumnType::Text,
        ColumnType::Numeric,
        ColumnType::Integer,
        ColumnType::Real,
        ColumnType::Blob,
    ];

    /// Builds the handle for `kind` from `structure` and reports its type.
    fn construct(kind: ColumnType, structure: ColumnStructure) -> Result<ColumnType, TableError> {
        match kind {
            ColumnType::Text => TextColumn::new(structure).map(|c| c.column_type()),
            ColumnType::Numeric => NumericColumn::new(structure).map(|c| c.column_type()),
            ColumnType::Integer => IntegerColumn::new(structure).map(|c| c.column_type()),
            ColumnType::Real => RealColumn::new(structure).map(|c| c.column_type()),
            ColumnType::Blob => BlobColumn::new(structure).map(|c| c.column_type()),
        }
    }

    #[test]
    fn matching_variant_succeeds_and_others_fail() {
        for declared in ALL_TYPES {
            let structure = ColumnStructure::new("c", declared, true);
            for kind in ALL_TYPES {
                let result = construct(kind, structure.clone());
                if kind == declared {
                    assert_eq!(result.unwrap(), declared);
                } else {
                    match result {
                        Err(TableError::TypeMismatch { column, expected, actual }) => {
                            assert_eq!(column, "c");
                            assert_eq!(expected, kind);
                            assert_eq!(actual, declared);
                        }
                        other => panic!("expected TypeMismatch, got {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn type_mismatch_message_names_both_types() {
        let err = TextColumn::new(ColumnStructure::new("age", ColumnType::Integer, false))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type mismatch for column 'age': expected TEXT, got INTEGER"
        );
    }

    #[test]
    fn from_structure_dispatches_on_declared_type() {
        let column =
            Column::from_structure(ColumnStructure::new("price", ColumnType::Real, true).unique())
                .unwrap();
        assert_eq!(column.name(), "price");
        assert_eq!(column.column_type(), ColumnType::Real);
        assert!(column.nullable());
        assert!(column.unique());
        assert!(column.as_typed::<RealColumn>().is_some());
        assert!(column.as_typed::<NumericColumn>().is_none());
    }

    #[test]
    fn column_ref_covers_all_naming_forms() {
        fn name_of(c: impl ColumnRef) -> String {
            c.column_name().to_string()
        }
        let structure = ColumnStructure::new("id", ColumnType::Integer, false);
        let typed = IntegerColumn::new(structure.clone()).unwrap();
        let column = Column::from(typed.clone());

        assert_eq!(name_of("id"), "id");
        assert_eq!(name_of(String::from("id")), "id");
        assert_eq!(name_of(&structure), "id");
        assert_eq!(name_of(&typed), "id");
        assert_eq!(name_of(&column), "id");
    }
}
