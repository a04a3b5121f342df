//! Grammar types guessed from kinds and values

use super::standard;
use super::{reformat, with_default_value, GrammarType, TypeRef, Why};
use crate::error::{GrammarError, Result};
use crate::format::{FormatRule, FormatSpec};
use crate::value::{Kind, Value};

/// A column (or sequence element) given by its grammar type, by the kind of
/// its values, or by its default value
#[derive(Debug, Clone)]
pub enum ColumnSpec {
    Type(TypeRef),
    Kind(Kind),
    Default(Value),
}

impl From<TypeRef> for ColumnSpec {
    fn from(ty: TypeRef) -> Self {
        ColumnSpec::Type(ty)
    }
}

impl From<Kind> for ColumnSpec {
    fn from(kind: Kind) -> Self {
        ColumnSpec::Kind(kind)
    }
}

impl From<Value> for ColumnSpec {
    fn from(value: Value) -> Self {
        ColumnSpec::Default(value)
    }
}

macro_rules! default_column {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ColumnSpec {
                fn from(value: $ty) -> Self {
                    ColumnSpec::Default(value.into())
                }
            }
        )*
    };
}

default_column!(i64, f64, bool, &str, String);

/// The format of the given kind; an empty format means none
pub fn format_for_kind(format: &FormatRule, kind: Kind) -> Result<Option<FormatSpec>> {
    format.spec_for(kind)
}

/// The standard grammar type for values of a kind
pub fn type_from_kind(kind: Kind) -> Result<TypeRef> {
    match kind {
        Kind::Float => Ok(standard::real()),
        Kind::Complex => Ok(standard::complex_number()),
        Kind::Int => Ok(standard::integer()),
        Kind::Bool => Ok(standard::boolean()),
        Kind::Str => Ok(standard::string()),
        Kind::Date | Kind::Object => Err(GrammarError::UnknownType(format!("type {}", kind))),
    }
}

/// The grammar type of a column
///
/// A given grammar type is kept as it is, unless `format_all` asks for a
/// reformatted copy; a kind selects the standard type with the format applied.
pub fn type_from_type(spec: ColumnSpec, format: &FormatRule, format_all: bool) -> Result<TypeRef> {
    match spec {
        ColumnSpec::Type(ty) if format_all => {
            let spec = format_for_kind(format, ty.kind())?;
            Ok(reformat(&ty, spec))
        }
        ColumnSpec::Type(ty) => Ok(ty),
        ColumnSpec::Kind(kind) => {
            let ty = type_from_kind(kind)?;
            Ok(match format_for_kind(format, kind)? {
                Some(spec) => reformat(&ty, Some(spec)),
                None => ty,
            })
        }
        ColumnSpec::Default(value) => type_from_default_value(&value, format),
    }
}

/// Guess the grammar type of a value
///
/// Collections become sets of their first element's kind (sets of integers
/// when empty); strings a bare string when they can be written as a word, a
/// quoted one otherwise.
pub fn type_from_value(value: &Value) -> Result<TypeRef> {
    if let Some(items) = value.elements() {
        return match items.first().map(Kind::of) {
            None | Some(Kind::Int) => Ok(standard::set_of_integers()),
            Some(Kind::Float) => Ok(standard::set_of_reals()),
            Some(kind) => Err(GrammarError::UnknownType(format!("a set of {} values", kind))),
        };
    }
    if let Value::String(_) = value {
        let string = standard::string();
        return Ok(if string.check(value, Why::Set).is_ok() {
            string
        } else {
            standard::qstring()
        });
    }
    let ty = type_from_kind(Kind::of(value)).map_err(|_| GrammarError::UnknownType(format!("value {}", value)))?;
    Ok(with_default_value(&ty, value.clone()))
}

/// A new grammar type with the value as its default, formatted by the kind
/// of the value
pub fn type_from_default_value(value: &Value, format: &FormatRule) -> Result<TypeRef> {
    let kind = Kind::of(value);
    let ty = type_from_kind(kind).map_err(|_| GrammarError::UnknownType(format!("value {}", value)))?;
    let ty = reformat(&ty, format_for_kind(format, kind)?);
    Ok(with_default_value(&ty, value.clone()))
}
