//! Heterogeneous tuples

use chumsky::prelude::*;
use std::sync::Arc;

use super::base::base_accessors;
use super::inference::{type_from_type, ColumnSpec};
use super::{Base, GrammarType, TypeRef, Why};
use crate::error::{GrammarError, Result};
use crate::format::{FormatRule, Rendered};
use crate::grammar::{Grammar, GrammarContext};
use crate::value::{values_equal, Record, Value};

/// A tuple of values of given types, optionally with named fields
#[derive(Debug, Clone)]
pub struct Sequence {
    base: Base,
    types: Vec<TypeRef>,
    names: Option<Arc<[String]>>,
    allowed_values: Option<Vec<Value>>,
    default_values: bool,
}

impl Sequence {
    pub fn new(types: Vec<TypeRef>) -> Self {
        Sequence {
            base: Base::default(),
            types,
            names: None,
            allowed_values: None,
            default_values: false,
        }
    }

    /// A sequence of columns given by types, kinds or default values
    pub fn from_columns(columns: Vec<ColumnSpec>, format: &FormatRule, format_all: bool) -> Result<Self> {
        let types = columns
            .into_iter()
            .map(|column| type_from_type(column, format, format_all))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(types))
    }

    /// Values are named tuples with these field names
    pub fn with_names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        self.names = Some(names.into());
        self
    }

    /// The first element has to be one of the values
    pub fn with_allowed_values(mut self, values: Vec<Value>) -> Self {
        self.allowed_values = Some(values);
        self
    }

    /// A missing element with a default value is replaced by the default
    pub fn with_default_values(mut self, default_values: bool) -> Self {
        self.default_values = default_values;
        self
    }

    pub fn types(&self) -> &[TypeRef] {
        &self.types
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    fn construct(&self, values: Vec<Value>) -> Value {
        match &self.names {
            Some(names) => Value::Record(Record::new(names.clone(), values)),
            None => Value::Tuple(values),
        }
    }

    fn element_grammar(&self, ty: &TypeRef, ctx: &GrammarContext) -> Grammar {
        let grammar = ty.grammar(ctx);
        match ty.default_value() {
            Some(default) if self.default_values => grammar.or(empty().to(default.clone())).boxed(),
            _ => grammar,
        }
    }
}

impl GrammarType for Sequence {
    base_accessors!();

    fn type_name(&self) -> String {
        "Sequence".to_string()
    }

    fn grammar_name(&self) -> String {
        self.types
            .iter()
            .map(|t| t.grammar_name())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn value_grammar(&self, ctx: &GrammarContext) -> Grammar {
        let elements = self
            .types
            .iter()
            .fold(empty().to(Vec::new()).boxed(), |acc, ty| {
                acc.then(self.element_grammar(ty, ctx))
                    .map(|(mut values, value)| {
                        values.push(value);
                        values
                    })
                    .boxed()
            });
        let this = self.clone();
        let grammar = elements.map(move |values| this.construct(values));
        match self.allowed_values.clone() {
            Some(allowed) => grammar
                .try_map(move |value, span| {
                    let first = value.elements().and_then(|e| e.first()).cloned().unwrap_or(Value::Null);
                    if allowed.iter().any(|a| values_equal(a, &first)) {
                        Ok(value)
                    } else {
                        Err(Simple::custom(span, format!("{} is not in the list of allowed values", first)))
                    }
                })
                .boxed(),
            None => grammar.boxed(),
        }
    }

    fn coerce(&self, value: Value) -> Value {
        match value {
            Value::Array(items) | Value::List(items) | Value::Tuple(items) if items.len() == self.types.len() => {
                let values = items
                    .into_iter()
                    .zip(&self.types)
                    .map(|(v, t)| t.convert(v))
                    .collect();
                self.construct(values)
            }
            Value::Record(record) if self.names.is_none() => Value::Tuple(record.into_values()),
            other => other,
        }
    }

    fn check(&self, value: &Value, why: Why) -> std::result::Result<(), String> {
        let items = match (value, &self.names) {
            (Value::Record(record), Some(_)) => record.values(),
            (Value::Tuple(items), None) => items.as_slice(),
            _ => return Err(format!("A tuple of {} values is required", self.types.len())),
        };
        if items.len() != self.types.len() {
            return Err(format!("A tuple of {} values is required", self.types.len()));
        }
        for (ty, item) in self.types.iter().zip(items) {
            ty.validate(item, None, why).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn render(&self, value: &Value) -> Rendered {
        let out: String = self
            .types
            .iter()
            .zip(value.elements().unwrap_or_default())
            .map(|(ty, v)| format!(" {}", ty.string(v)))
            .collect();
        Rendered::Text(out)
    }

    fn is_the_same_value(&self, a: &Value, b: &Value) -> bool {
        values_equal(a, b)
    }

    fn field_access(&self) -> Option<FieldAccess> {
        Some(FieldAccess {
            names: self.names.clone(),
            len: self.types.len(),
        })
    }
}

/// A field of a sequence value, by name or by position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for FieldKey<'a> {
    fn from(name: &'a str) -> Self {
        FieldKey::Name(name)
    }
}

impl From<usize> for FieldKey<'_> {
    fn from(index: usize) -> Self {
        FieldKey::Index(index)
    }
}

/// Access to the fields of the values of a sequence type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAccess {
    names: Option<Arc<[String]>>,
    len: usize,
}

impl FieldAccess {
    pub fn index_of(&self, key: FieldKey<'_>) -> Result<usize> {
        match key {
            FieldKey::Index(i) if i < self.len => Ok(i),
            FieldKey::Index(i) => Err(GrammarError::NoField(i.to_string())),
            FieldKey::Name(name) => self
                .names
                .as_ref()
                .and_then(|names| names.iter().position(|n| n == name))
                .ok_or_else(|| GrammarError::NoField(name.to_string())),
        }
    }

    pub fn get<'v>(&self, value: &'v Value, key: FieldKey<'_>) -> Result<&'v Value> {
        let index = self.index_of(key)?;
        value
            .elements()
            .and_then(|items| items.get(index))
            .ok_or_else(|| GrammarError::NoField(index.to_string()))
    }

    /// A copy of the value with one field replaced
    pub fn with_field(&self, value: &Value, key: FieldKey<'_>, field: Value) -> Result<Value> {
        let index = self.index_of(key)?;
        let mut items = value
            .elements()
            .map(<[Value]>::to_vec)
            .ok_or_else(|| GrammarError::NoField(index.to_string()))?;
        let slot = items
            .get_mut(index)
            .ok_or_else(|| GrammarError::NoField(index.to_string()))?;
        *slot = field;
        Ok(match value {
            Value::Record(record) => Value::Record(Record::new(record.shared_names(), items)),
            _ => Value::Tuple(items),
        })
    }
}
