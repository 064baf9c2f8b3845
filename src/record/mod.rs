//! Lua-table record format
//!
//! Project and config files are a restricted subset of Lua: a sequence of
//! `name = value` assignments where values are numbers, strings, booleans,
//! `nil` or table constructors. No code is executed; the text is parsed
//! straight into a [`Table`] tree.
//!
//! Reading goes through [`Record`], which tracks the dotted path of the
//! table being read so that errors name the exact field at fault.

mod lexer;
mod parser;
mod writer;

pub use parser::parse;
pub use writer::{
    boolean, color, integer, number, pair_f32, pair_i32, rect, string, vec2, RecordWriter,
};

use std::collections::BTreeMap;
use thiserror::Error;

/// Syntax error in a record file
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self { message: message.into(), line }
    }
}

/// Missing or mistyped field
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum FieldError {
    #[error("missing field '{path}'")]
    Missing { path: String },
    #[error("field '{path}' should be {expected}, found {found}")]
    WrongType { path: String, expected: &'static str, found: &'static str },
}

impl FieldError {
    /// Dotted path of the offending field
    pub fn path(&self) -> &str {
        match self {
            FieldError::Missing { path } => path,
            FieldError::WrongType { path, .. } => path,
        }
    }
}

/// A parsed value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Table(Table),
}

impl Value {
    /// Lua-style type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "number",
            Value::Str(_) => "string",
            Value::Table(_) => "table",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view; floats with an integral value are accepted
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }
}

/// A table constructor: named fields plus a positional array part
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    fields: BTreeMap<String, Value>,
    array: Vec<Value>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        match self.fields.get_mut(name) {
            Some(Value::Table(t)) => Some(t),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Assign a named field. Assigning `nil` removes it.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if value == Value::Nil {
            self.fields.remove(&name);
        } else {
            self.fields.insert(name, value);
        }
    }

    /// Insert only when the field is absent
    pub fn insert_default(&mut self, name: &str, value: Value) {
        if !self.fields.contains_key(name) {
            self.insert(name, value);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn push(&mut self, value: Value) {
        self.array.push(value);
    }

    pub fn array(&self) -> &[Value] {
        &self.array
    }

    pub fn array_mut(&mut self) -> &mut Vec<Value> {
        &mut self.array
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Build a table of named fields
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        for (name, value) in fields {
            table.insert(name, value);
        }
        table
    }
}

/// Conversion from a parsed [`Value`]
pub trait FromValue: Sized {
    /// Description of the accepted shape, for error messages
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for f32 {
    const EXPECTED: &'static str = "a number";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64().map(|v| v as f32)
    }
}

impl FromValue for i32 {
    const EXPECTED: &'static str = "an integer";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|v| i32::try_from(v).ok())
    }
}

impl FromValue for u32 {
    const EXPECTED: &'static str = "a non-negative integer";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|v| u32::try_from(v).ok())
    }
}

impl FromValue for u64 {
    const EXPECTED: &'static str = "a non-negative integer";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|v| u64::try_from(v).ok())
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "a string";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Read cursor over a table, carrying its path for error messages
#[derive(Debug, Clone)]
pub struct Record<'a> {
    table: &'a Table,
    path: String,
}

impl<'a> Record<'a> {
    /// Cursor over the top level of a file
    pub fn root(table: &'a Table) -> Self {
        Self { table, path: String::new() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    fn field_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path, name)
        }
    }

    fn element_path(&self, index: usize) -> String {
        // Arrays are 1-based in the file format
        format!("{}[{}]", self.path, index + 1)
    }

    fn convert<T: FromValue>(value: &Value, path: String) -> Result<T, FieldError> {
        T::from_value(value).ok_or(FieldError::WrongType {
            path,
            expected: T::EXPECTED,
            found: value.type_name(),
        })
    }

    /// Read an optional field. Absent is `Ok(None)`, present but of the
    /// wrong type is an error.
    pub fn try_field<T: FromValue>(&self, name: &str) -> Result<Option<T>, FieldError> {
        match self.table.get(name) {
            None => Ok(None),
            Some(value) => Self::convert(value, self.field_path(name)).map(Some),
        }
    }

    /// Read a mandatory field
    pub fn field<T: FromValue>(&self, name: &str) -> Result<T, FieldError> {
        self.try_field(name)?.ok_or_else(|| FieldError::Missing { path: self.field_path(name) })
    }

    /// Read an optional field, falling back to `default` when absent
    pub fn field_or<T: FromValue>(&self, name: &str, default: T) -> Result<T, FieldError> {
        Ok(self.try_field(name)?.unwrap_or(default))
    }

    /// Descend into an optional nested table
    pub fn try_record(&self, name: &str) -> Result<Option<Record<'a>>, FieldError> {
        match self.table.get(name) {
            None => Ok(None),
            Some(Value::Table(table)) => Ok(Some(Record { table, path: self.field_path(name) })),
            Some(other) => Err(FieldError::WrongType {
                path: self.field_path(name),
                expected: "a table",
                found: other.type_name(),
            }),
        }
    }

    /// Descend into a mandatory nested table
    pub fn record(&self, name: &str) -> Result<Record<'a>, FieldError> {
        self.try_record(name)?.ok_or_else(|| FieldError::Missing { path: self.field_path(name) })
    }

    /// Length of the positional part
    pub fn len(&self) -> usize {
        self.table.array().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.array().is_empty()
    }

    /// Read the positional element at zero-based `index`
    pub fn element<T: FromValue>(&self, index: usize) -> Result<T, FieldError> {
        match self.table.array().get(index) {
            None => Err(FieldError::Missing { path: self.element_path(index) }),
            Some(value) => Self::convert(value, self.element_path(index)),
        }
    }

    /// Descend into the positional table element at zero-based `index`
    pub fn element_record(&self, index: usize) -> Result<Record<'a>, FieldError> {
        match self.table.array().get(index) {
            None => Err(FieldError::Missing { path: self.element_path(index) }),
            Some(Value::Table(table)) => Ok(Record { table, path: self.element_path(index) }),
            Some(other) => Err(FieldError::WrongType {
                path: self.element_path(index),
                expected: "a table",
                found: other.type_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        parse("a = 1\nb = { c = true, \"x\", 2.5 }\ns = 'hi'\n").unwrap()
    }

    #[test]
    fn test_try_field_absent_and_present() {
        let table = sample();
        let root = Record::root(&table);
        assert_eq!(root.try_field::<i32>("a"), Ok(Some(1)));
        assert_eq!(root.try_field::<i32>("zzz"), Ok(None));
        assert_eq!(root.field_or("zzz", 7i32), Ok(7));
    }

    #[test]
    fn test_field_missing_reports_path() {
        let table = sample();
        let b = Record::root(&table).record("b").unwrap();
        let err = b.field::<bool>("d").unwrap_err();
        assert_eq!(err, FieldError::Missing { path: "b.d".to_string() });
        assert_eq!(err.to_string(), "missing field 'b.d'");
    }

    #[test]
    fn test_wrong_type() {
        let table = sample();
        let err = Record::root(&table).field::<bool>("s").unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 's' should be a boolean, found string"
        );
    }

    #[test]
    fn test_positional_elements() {
        let table = sample();
        let b = Record::root(&table).record("b").unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b.element::<String>(0), Ok("x".to_string()));
        assert_eq!(b.element::<f32>(1), Ok(2.5));
        assert_eq!(b.element::<f32>(2).unwrap_err().path(), "b[3]");
        assert!(b.element_record(0).is_err());
    }

    #[test]
    fn test_integral_float_reads_as_integer() {
        let table = parse("n = 3.0\nm = 3.5\nneg = -1").unwrap();
        let root = Record::root(&table);
        assert_eq!(root.field::<i32>("n"), Ok(3));
        assert!(root.field::<i32>("m").is_err());
        assert!(root.field::<u32>("neg").is_err());
        assert_eq!(root.field::<i32>("neg"), Ok(-1));
    }

    #[test]
    fn test_insert_nil_removes() {
        let mut table = sample();
        table.insert("a", Value::Nil);
        assert!(!table.contains("a"));
        table.insert_default("s", Value::Int(1));
        assert_eq!(table.get("s"), Some(&Value::Str("hi".to_string())));
    }
}
