//! Row values as read from and written to the engine.

use serde_json::{Map, Value as JsonValue};

use crate::column::{ColumnRef, TypedColumn};

/// One physical row as returned by the engine: column name → value, in
/// result-set order.
pub type Record = Vec<(String, Value)>;

/// A single SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `NULL`, zero, NaN, the empty string and the empty blob.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Integer(n) => *n == 0,
            Value::Real(f) => *f == 0.0 || f.is_nan(),
            Value::Text(s) => s.is_empty(),
            Value::Blob(b) => b.is_empty(),
        }
    }

    /// JSON rendering; blobs become lower-case hex strings.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Integer(n) => JsonValue::from(*n),
            Value::Real(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Blob(b) => JsonValue::String(b.iter().map(|byte| format!("{byte:02x}")).collect()),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Integer(b as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Best-effort cast from a stored [`Value`] to a Rust type.
///
/// The engine's type affinity decides what actually comes back, so this is a
/// cast rather than a check: integers read as reals, numeric text parses.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(n) => Some(*n),
            Value::Real(f) => Some(*f as i64),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null | Value::Blob(_) => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(n) => Some(*n as f64),
            Value::Real(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null | Value::Blob(_) => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Real(f) => Some(f.to_string()),
            Value::Blob(b) => String::from_utf8(b.clone()).ok(),
            Value::Null => None,
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Blob(b) => Some(b.clone()),
            Value::Text(s) => Some(s.as_bytes().to_vec()),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// Read-only view over one result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowData {
    data: Record,
}

impl RowData {
    pub fn new(data: Record) -> Self {
        Self { data }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.data.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn values(&self) -> Vec<&Value> {
        self.data.iter().map(|(_, value)| value).collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Exact lookup: `Some(Value::Integer(0))` stays distinguishable from an
    /// absent column.
    pub fn value(&self, column: impl ColumnRef) -> Option<&Value> {
        let name = column.column_name();
        self.data.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Lookup by name where falsy values (`NULL`, `0`, `""`, ...) read as
    /// `None`, exactly like an absent column.
    pub fn get_by_name(&self, column: impl ColumnRef) -> Option<&Value> {
        self.value(column).filter(|v| !v.is_falsy())
    }

    /// Typed lookup through a column handle. Same falsy rule as
    /// [`get_by_name`](Self::get_by_name).
    pub fn get<C: TypedColumn>(&self, column: &C) -> Option<C::Value> {
        self.get_by_name(column.column_name())
            .and_then(<C::Value as FromValue>::from_value)
    }

    /// JSON object with keys in result-set column order.
    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .data
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        JsonValue::Object(map)
    }

    pub fn into_record(self) -> Record {
        self.data
    }

    fn put(&mut self, name: &str, value: Value) {
        match self.data.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.data.push((name.to_string(), value)),
        }
    }
}

impl From<Record> for RowData {
    fn from(data: Record) -> Self {
        Self::new(data)
    }
}

/// A row being staged for insertion.
///
/// Values are not checked against the column's declared type; the engine
/// decides what it accepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRow {
    row: RowData,
}

impl NewRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a value for a typed column, replacing any earlier value.
    pub fn set<C: TypedColumn>(&mut self, column: &C, value: impl Into<C::Value>) -> &mut Self {
        let value: C::Value = value.into();
        self.row.put(column.column_name(), value.into());
        self
    }

    /// Stages an untyped value under a column name.
    pub fn set_value(&mut self, column: impl ColumnRef, value: impl Into<Value>) -> &mut Self {
        self.row.put(column.column_name(), value.into());
        self
    }

    /// Builder form of [`set_value`](Self::set_value).
    pub fn with(mut self, column: impl ColumnRef, value: impl Into<Value>) -> Self {
        self.set_value(column, value);
        self
    }

    pub fn as_row(&self) -> &RowData {
        &self.row
    }
}

impl From<NewRow> for RowData {
    fn from(new_row: NewRow) -> Self {
        new_row.row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{IntegerColumn, TextColumn};
    use crate::schema::{ColumnStructure, ColumnType};

    fn row() -> RowData {
        RowData::new(vec![
            ("id".into(), Value::Integer(7)),
            ("count".into(), Value::Integer(0)),
            ("label".into(), Value::Text(String::new())),
            ("score".into(), Value::Real(2.5)),
            ("note".into(), Value::Null),
        ])
    }

    #[test]
    fn falsy_values_read_like_absent_columns() {
        let row = row();
        assert_eq!(row.get_by_name("count"), None);
        assert_eq!(row.get_by_name("missing"), None);
        assert_eq!(row.get_by_name("count"), row.get_by_name("missing"));
        assert_eq!(row.get_by_name("label"), None);
        assert_eq!(row.get_by_name("note"), None);
        assert_eq!(row.get_by_name("id"), Some(&Value::Integer(7)));
    }

    #[test]
    fn exact_lookup_keeps_falsy_values() {
        let row = row();
        assert_eq!(row.value("count"), Some(&Value::Integer(0)));
        assert_eq!(row.value("note"), Some(&Value::Null));
        assert_eq!(row.value("missing"), None);
    }

    #[test]
    fn typed_get_casts_to_the_column_value_type() {
        let row = row();
        let id = IntegerColumn::new(ColumnStructure::new("id", ColumnType::Integer, false)).unwrap();
        let count =
            IntegerColumn::new(ColumnStructure::new("count", ColumnType::Integer, false)).unwrap();
        let score = TextColumn::new(ColumnStructure::new("score", ColumnType::Text, true)).unwrap();

        assert_eq!(row.get(&id), Some(7));
        assert_eq!(row.get(&count), None);
        assert_eq!(row.get(&score).as_deref(), Some("2.5"));
    }

    #[test]
    fn new_row_set_replaces_in_place() {
        let name = TextColumn::new(ColumnStructure::new("name", ColumnType::Text, false)).unwrap();
        let mut new_row = NewRow::new();
        new_row.set(&name, "first").set_value("age", 30).set(&name, "second");

        let row = new_row.as_row();
        assert_eq!(row.column_names(), vec!["name", "age"]);
        assert_eq!(row.get(&name).as_deref(), Some("second"));
        assert_eq!(row.values(), vec![&Value::Text("second".into()), &Value::Integer(30)]);
    }

    #[test]
    fn to_json_keeps_column_order() {
        let row = RowData::new(vec![
            ("id".into(), Value::Integer(1)),
            ("user_id".into(), Value::Integer(2)),
            ("total".into(), Value::Real(1.5)),
        ]);
        assert_eq!(row.to_json().to_string(), r#"{"id":1,"user_id":2,"total":1.5}"#);
    }

    #[test]
    fn to_json_renders_blobs_as_hex() {
        let row = RowData::new(vec![
            ("data".into(), Value::Blob(vec![0xde, 0xad, 0x01])),
            ("n".into(), Value::Integer(3)),
            ("none".into(), Value::from(None::<i64>)),
        ]);
        assert_eq!(
            row.to_json(),
            serde_json::json!({"data": "dead01", "n": 3, "none": null})
        );
    }
}
