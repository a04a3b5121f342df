//! Canonical in-memory values
//!
//! Every grammar type converts the input it accepts into one of the variants of
//! [`Value`]. Homogeneous arrays, plain lists, tuples and named tuples are kept
//! apart, since grammar types validate the container as well as the contents.

use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::format::float_repr;

/// Element type of an array-like value (the dtype of the array)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Int,
    Float,
    Bool,
    Date,
    Str,
    Complex,
    Object,
}

impl Kind {
    /// The kind of a scalar value; collections are `Object`
    pub fn of(value: &Value) -> Kind {
        match value {
            Value::Integer(_) => Kind::Int,
            Value::Real(_) => Kind::Float,
            Value::Bool(_) => Kind::Bool,
            Value::Date(_) => Kind::Date,
            Value::String(_) => Kind::Str,
            Value::Complex(_) => Kind::Complex,
            _ => Kind::Object,
        }
    }

    /// The value a freshly allocated array of this kind is filled with
    pub fn zero(self) -> Value {
        match self {
            Kind::Int => Value::Integer(0),
            Kind::Float => Value::Real(0.0),
            Kind::Bool => Value::Bool(false),
            Kind::Str => Value::String(String::new()),
            Kind::Complex => Value::Complex(Complex::new(0.0, 0.0)),
            Kind::Date | Kind::Object => Value::Null,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Bool => "bool",
            Kind::Date => "date",
            Kind::Str => "str",
            Kind::Complex => "complex",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A complex number, written as two reals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.im < 0.0 { '-' } else { '+' };
        write!(
            f,
            "({}{}{}j)",
            float_repr(self.re),
            sign,
            float_repr(self.im.abs())
        )
    }
}

/// A tuple whose fields can also be reached by name
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    names: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    pub fn new(names: Arc<[String]>, values: Vec<Value>) -> Self {
        Record { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn shared_names(&self) -> Arc<[String]> {
        self.names.clone()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values.get(i))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.names.iter().zip(&self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Layout of a table value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Dtype {
    /// A 2-D array with one element kind: shape `(rows, columns)`
    Homogeneous(Kind),
    /// A 1-D array of records, one named field per column
    Structured(Vec<(String, Kind)>),
}

impl Dtype {
    pub fn ndim(&self) -> usize {
        match self {
            Dtype::Homogeneous(_) => 2,
            Dtype::Structured(_) => 1,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dtype::Homogeneous(kind) => write!(f, "{}", kind),
            Dtype::Structured(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(name, kind)| format!("('{}', {})", name, kind))
                    .collect();
                write!(f, "[{}]", fields.join(", "))
            }
        }
    }
}

/// The value of a table: rows of cells sharing one dtype
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableValue {
    dtype: Dtype,
    rows: Vec<Vec<Value>>,
}

impl TableValue {
    pub fn new(dtype: Dtype, rows: Vec<Vec<Value>>) -> Self {
        TableValue { dtype, rows }
    }

    pub fn dtype(&self) -> &Dtype {
        &self.dtype
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ndim(&self) -> usize {
        self.dtype.ndim()
    }

    /// All the values of one column (or field)
    pub fn column(&self, index: usize) -> Option<Vec<Value>> {
        self.rows
            .iter()
            .map(|row| row.get(index).cloned())
            .collect()
    }

    /// All the values of a named field of a structured table
    pub fn field(&self, name: &str) -> Option<Vec<Value>> {
        match &self.dtype {
            Dtype::Structured(fields) => {
                let index = fields.iter().position(|(n, _)| n == name)?;
                self.column(index)
            }
            Dtype::Homogeneous(_) => None,
        }
    }
}

/// A canonical value of some grammar type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Complex(Complex),
    Date(NaiveDate),
    String(String),
    /// A homogeneous fixed-dtype array
    Array(Vec<Value>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Record(Record),
    Table(TableValue),
}

impl Value {
    /// Short name of the value's own type, used in error messages
    pub fn type_label(&self) -> &'static str {
        match self {
            Value::Null => "none",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "int",
            Value::Real(_) => "float",
            Value::Complex(_) => "complex",
            Value::Date(_) => "date",
            Value::String(_) => "str",
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Record(_) => "named tuple",
            Value::Table(_) => "table",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Lists, tuples and arrays are accepted wherever a collection is expected
    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Array(_) | Value::List(_) | Value::Tuple(_))
    }

    /// The elements of a collection or a named tuple
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::List(items) | Value::Tuple(items) => Some(items),
            Value::Record(record) => Some(record.values()),
            _ => None,
        }
    }

    pub fn into_elements(self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) | Value::List(items) | Value::Tuple(items) => Some(items),
            Value::Record(record) => Some(record.into_values()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an integer or a real
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableValue> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Ordering of comparable scalars; integers and reals compare numerically
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

/// Array-equality of two values
///
/// Collections are equal when they have the same length and their elements are
/// pairwise equal, whatever the container; integers equal reals of the same
/// magnitude.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Table(a), Value::Table(b)) => {
            a.rows.len() == b.rows.len()
                && a.rows.iter().zip(&b.rows).all(|(ra, rb)| {
                    ra.len() == rb.len() && ra.iter().zip(rb).all(|(x, y)| values_equal(x, y))
                })
        }
        (Value::Integer(_) | Value::Real(_), Value::Integer(_) | Value::Real(_)) => {
            a.compare(b) == Some(Ordering::Equal)
        }
        _ => match (a.elements(), b.elements()) {
            (Some(xs), Some(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
            }
            _ => a == b,
        },
    }
}

fn join(items: &[Value], separator: &str) -> String {
    items
        .iter()
        .map(|v| match v {
            Value::String(s) => format!("'{}'", s),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => f.write_str(&float_repr(*r)),
            Value::Complex(c) => write!(f, "{}", c),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => write!(f, "[{}]", join(items, " ")),
            Value::List(items) => write!(f, "[{}]", join(items, ", ")),
            Value::Tuple(items) => write!(f, "({})", join(items, ", ")),
            Value::Record(record) => {
                let fields: Vec<String> = record
                    .names
                    .iter()
                    .zip(&record.values)
                    .map(|(n, v)| format!("{}={}", n, v))
                    .collect();
                write!(f, "({})", fields.join(", "))
            }
            Value::Table(table) => {
                let rows: Vec<String> = table
                    .rows
                    .iter()
                    .map(|row| format!("[{}]", join(row, " ")))
                    .collect();
                write!(f, "[{}]", rows.join(" "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<Complex> for Value {
    fn from(value: Complex) -> Self {
        Value::Complex(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<TableValue> for Value {
    fn from(value: TableValue) -> Self {
        Value::Table(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_equals_real_in_arrays() {
        let a = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        let b = Value::List(vec![Value::Real(1.0), Value::Real(2.0)]);
        assert!(values_equal(&a, &b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_arrays_of_different_length_differ() {
        let a = Value::Array(vec![Value::Integer(1)]);
        let b = Value::Array(vec![Value::Integer(1), Value::Integer(1)]);
        assert!(!values_equal(&a, &b));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Real(1.0).to_string(), "1.0");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(
            Value::Array(vec![Value::Integer(1), Value::Integer(2)]).to_string(),
            "[1 2]"
        );
        assert_eq!(Value::Complex(Complex::new(1.0, -2.0)).to_string(), "(1.0-2.0j)");
    }

    #[test]
    fn test_table_columns() {
        let table = TableValue::new(
            Dtype::Structured(vec![("IQ".into(), Kind::Int), ("CONC".into(), Kind::Float)]),
            vec![
                vec![Value::Integer(1), Value::Real(1.0)],
                vec![Value::Integer(2), Value::Real(0.5)],
            ],
        );
        assert_eq!(table.column(0), Some(vec![Value::Integer(1), Value::Integer(2)]));
        assert_eq!(table.field("CONC"), Some(vec![Value::Real(1.0), Value::Real(0.5)]));
        assert_eq!(table.ndim(), 1);
    }

    #[test]
    fn test_record_serializes_as_map() {
        let record = Record::new(
            Arc::from(vec!["a".to_string(), "b".to_string()]),
            vec![Value::Integer(3), Value::Real(4.5)],
        );
        let json = serde_json::to_string(&Value::Record(record)).unwrap();
        assert_eq!(json, r#"{"a":3,"b":4.5}"#);
    }
}
