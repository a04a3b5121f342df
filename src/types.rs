//! Grammar types
//!
//! A grammar type describes one textual construct of the configuration files:
//! how to parse it, which values it accepts and how to write them back.
//!
//! ```text
//!   User input:  convert -> validate(Why::Set)
//!   Output:      string  -> render, then prefix/postfix and format
//!   Parsing:     parse   -> value_grammar actions -> validate(Why::Parse)
//! ```
//!
//! The types are immutable once shared as a [`TypeRef`]; per-use-site changes
//! (another format, a default value) are made on a [`GrammarType::copy`].

pub mod array;
pub mod base;
pub mod inference;
pub mod keyword;
pub mod markers;
pub mod mixed;
pub mod numbers;
pub mod sequence;
pub mod standard;
pub mod strings;
pub mod table;

use chumsky::prelude::*;
use std::fmt;
use std::io;
use std::sync::Arc;

use crate::error::{GrammarError, Result};
use crate::format::{FormatSpec, Rendered};
use crate::grammar::rules::{line_end, literal, token, ws};
use crate::grammar::{Grammar, GrammarContext};
use crate::value::{Kind, Value};

pub use array::{Array, ComplexNumber, Container};
pub use base::{Base, MissingValue, Why};
pub use inference::{type_from_default_value, type_from_kind, type_from_type, type_from_value, ColumnSpec};
pub use keyword::{def_keyword, Keyword};
pub use markers::{Flag, Separator};
pub use mixed::{Dispatch, ShapeRule, Variant};
pub use numbers::{Bool, Date, Integer, Real, RealWithUnits, Unsigned};
pub use sequence::{FieldAccess, FieldKey, Sequence};
pub use strings::{StringStyle, StringType};
pub use table::{FreeHeader, Table, TableBuilder};

/// A shared grammar type
pub type TypeRef = Arc<dyn GrammarType>;

/// The contract every grammar type implements
///
/// Implementors provide the type-specific parts (`value_grammar`, `coerce`,
/// `check`, `render`); the provided methods add the common behavior around
/// them and are not meant to be overridden.
pub trait GrammarType: fmt::Debug + Send + Sync + 'static {
    fn base(&self) -> &Base;

    fn base_mut(&mut self) -> &mut Base;

    fn box_clone(&self) -> Box<dyn GrammarType>;

    /// The name of the type used in error messages
    fn type_name(&self) -> String;

    /// Short human-readable description of the textual form
    fn grammar_name(&self) -> String;

    /// The kind of the elements of arrays holding values of this type
    fn kind(&self) -> Kind {
        Kind::Object
    }

    /// The rule matching the bare value, without prefix and postfix
    fn value_grammar(&self, ctx: &GrammarContext) -> Grammar;

    /// The rule used when the type is a candidate of a variant type
    fn variant_grammar(&self, ctx: &GrammarContext) -> Grammar {
        self.grammar(ctx)
    }

    /// The chance to alter the prefixed grammar
    fn transform_grammar(&self, grammar: Grammar, _ctx: &GrammarContext) -> Grammar {
        grammar
    }

    /// Coerce an alternative representation to the canonical one
    fn coerce(&self, value: Value) -> Value {
        value
    }

    /// Type, range, choice and length checks; the error is the reason
    fn check(&self, _value: &Value, _why: Why) -> std::result::Result<(), String> {
        Ok(())
    }

    /// The value as text, before prefix, postfix and format are applied
    fn render(&self, value: &Value) -> Rendered;

    fn missing_value(&self) -> MissingValue {
        MissingValue::required()
    }

    /// False for pure syntactic elements, which yield no value
    fn has_value(&self) -> bool {
        true
    }

    /// Whether the name of an option of this type appears in the text
    fn name_in_grammar(&self) -> bool {
        true
    }

    fn is_the_same_value(&self, a: &Value, b: &Value) -> bool {
        a == b
    }

    /// Named access to the parts of the values, if the type has any
    fn field_access(&self) -> Option<FieldAccess> {
        None
    }

    /// Multi-line description of the type (e.g. the possible choices)
    fn additional_description(&self, prefix: &str) -> String {
        let description = self.base().description.clone();
        if prefix.is_empty() {
            description
        } else {
            description.replace('\n', &format!("\n{}", prefix))
        }
    }

    fn default_value(&self) -> Option<&Value> {
        self.base().default_value.as_ref()
    }

    /// The complete rule: prefix, value and postfix, validating the result
    fn grammar(&self, ctx: &GrammarContext) -> Grammar {
        self.wrap_grammar(self.value_grammar(ctx), ctx)
    }

    /// Surround a value rule with the common parts of [`GrammarType::grammar`]
    fn wrap_grammar(&self, value: Grammar, ctx: &GrammarContext) -> Grammar {
        log::trace!("Building grammar for {}", self.type_name());
        let base = self.base();
        let mut grammar = token(ctx, value).boxed();
        if let Some(prefix) = base.prefix.as_deref().filter(|p| !p.is_empty()) {
            grammar = token(ctx, literal(prefix)).ignore_then(grammar).boxed();
        }
        if let Some(postfix) = base.postfix.as_deref().filter(|p| !p.is_empty()) {
            grammar = grammar.then_ignore(token(ctx, literal(postfix))).boxed();
        }
        grammar = self.transform_grammar(grammar, ctx);
        if self.has_value() {
            let ty = self.box_clone();
            grammar = grammar
                .try_map(move |value, span| match ty.validate(&value, None, Why::Parse) {
                    Ok(()) => Ok(value),
                    Err(e) => Err(Simple::custom(
                        span,
                        format!("{}\nValidating of the parsed value failed", e),
                    )),
                })
                .boxed();
        }
        grammar
    }

    /// Parse the whole string with the default context
    fn parse(&self, text: &str) -> Result<Value> {
        self.parse_with(text, &GrammarContext::default(), true)
    }

    fn parse_with(&self, text: &str, ctx: &GrammarContext, whole_string: bool) -> Result<Value> {
        let grammar = self.grammar(ctx);
        let result = if whole_string {
            let trailing = if ctx.allow_trailing_newlines {
                line_end(ctx).repeated().ignored().boxed()
            } else {
                empty().boxed()
            };
            grammar
                .then_ignore(trailing)
                .then_ignore(ws(ctx))
                .then_ignore(end())
                .parse(text)
        } else {
            grammar.parse(text)
        };
        result.map_err(|errors| GrammarError::from_parse_errors(text, errors))
    }

    /// Convert a user value to the canonical form
    fn convert(&self, value: Value) -> Value {
        let value = self.coerce(value);
        match &self.base().after_convert {
            Some(after) => after(value),
            None => value,
        }
    }

    /// Validate a parsed or user-given value
    fn validate(&self, value: &Value, param_name: Option<&str>, why: Why) -> Result<()> {
        let fail = |reason: String| GrammarError::validation(value, self.type_name(), param_name, reason);
        self.check(value, why).map_err(fail)?;
        if let Some(condition) = &self.base().condition {
            condition(value).map_err(fail)?;
        }
        Ok(())
    }

    /// The value as it is written to the file
    fn string(&self, value: &Value) -> String {
        let base = self.base();
        let mut rendered = self.render(value);
        if base.prefix.is_some() || base.postfix.is_some() {
            rendered = Rendered::Text(format!(
                "{}{}{}",
                base.prefix.as_deref().unwrap_or_default(),
                rendered,
                base.postfix.as_deref().unwrap_or_default()
            ));
        }
        match &base.format {
            Some(spec) => spec.apply(&rendered),
            None => rendered.to_string(),
        }
    }

    fn write(&self, out: &mut dyn io::Write, value: &Value) -> Result<()> {
        out.write_all(self.string(value).as_bytes())?;
        Ok(())
    }

    fn print(&self, value: &Value) {
        println!("{}", self.string(value));
    }

    /// An independent copy, that can be altered without touching the shared type
    fn copy(&self) -> Box<dyn GrammarType> {
        self.box_clone()
    }
}

/// Fluent construction of grammar types
pub trait Builder: GrammarType + Sized {
    fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.base_mut().prefix = Some(prefix.into());
        self
    }

    fn with_postfix(mut self, postfix: impl Into<String>) -> Self {
        self.base_mut().postfix = Some(postfix.into());
        self
    }

    fn with_format(mut self, format: FormatSpec) -> Self {
        self.base_mut().format = Some(format);
        self
    }

    /// The default value is stored converted
    fn with_default(mut self, value: impl Into<Value>) -> Self {
        let value = self.convert(value.into());
        self.base_mut().default_value = Some(value);
        self
    }

    fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.base_mut().condition = Some(Arc::new(condition));
        self
    }

    fn with_after_convert<F>(mut self, after: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.base_mut().after_convert = Some(Arc::new(after));
        self
    }

    fn with_description(mut self, description: impl Into<String>) -> Self {
        self.base_mut().description = description.into();
        self
    }

    fn shared(self) -> TypeRef {
        Arc::new(self)
    }
}

impl<T: GrammarType + Sized> Builder for T {}

/// A copy of the type with another output format
pub fn reformat(ty: &TypeRef, format: Option<FormatSpec>) -> TypeRef {
    let mut copy = ty.copy();
    copy.base_mut().format = format;
    Arc::from(copy)
}

/// A copy of the type with another default value
pub fn with_default_value(ty: &TypeRef, value: Value) -> TypeRef {
    let mut copy = ty.copy();
    let value = copy.convert(value);
    copy.base_mut().default_value = Some(value);
    Arc::from(copy)
}

/// The message of a failed type check
pub(crate) fn type_required(value: &Value, type_name: &str) -> String {
    format!(
        "An {} value is required, a value {} of type {} have been given",
        type_name,
        value,
        value.type_label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::standard;

    #[test]
    fn test_prefix_and_postfix_framing() {
        let ty = Integer::new().with_prefix("<").with_postfix(">");
        assert_eq!(ty.parse("< 5 >").unwrap(), Value::Integer(5));
        assert_eq!(ty.string(&Value::Integer(5)), "<5>");
        assert!(ty.parse("5").is_err());
    }

    #[test]
    fn test_format_applies_after_framing() {
        let ty = Integer::new().with_prefix("#").with_format(">5".parse().unwrap());
        assert_eq!(ty.string(&Value::Integer(3)), "   #3");
    }

    #[test]
    fn test_condition_failure_is_reported() {
        let ty = Integer::new().with_condition(|v| match v.as_i64() {
            Some(i) if i % 2 == 0 => Ok(()),
            _ => Err("An even value required".to_string()),
        });
        let err = ty.validate(&Value::Integer(3), Some("NE"), Why::Set).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Value '3' for parameter NE of type Integer is not valid: An even value required"
        );
        assert!(ty.parse("3").is_err());
        assert_eq!(ty.parse("4").unwrap(), Value::Integer(4));
    }

    #[test]
    fn test_after_convert_runs_after_coercion() {
        let ty = Real::new().with_after_convert(|v| match v {
            Value::Real(r) => Value::Real(r * 2.0),
            other => other,
        });
        assert_eq!(ty.convert(Value::Integer(2)), Value::Real(4.0));
    }

    #[test]
    fn test_default_is_stored_converted() {
        let ty = Real::new().with_default(1);
        assert_eq!(ty.default_value(), Some(&Value::Real(1.0)));
    }

    #[test]
    fn test_reformat_leaves_shared_type_alone() {
        let shared = standard::integer();
        let copy = reformat(&shared, Some(">4".parse().unwrap()));
        assert_eq!(copy.string(&Value::Integer(1)), "   1");
        assert_eq!(shared.string(&Value::Integer(1)), "1");
    }

    #[test]
    fn test_partial_parse() {
        let ctx = GrammarContext::default();
        let value = standard::integer().parse_with("12 rest", &ctx, false).unwrap();
        assert_eq!(value, Value::Integer(12));
        assert!(standard::integer().parse("12 rest").is_err());
    }

    #[test]
    fn test_trailing_newlines() {
        assert!(standard::integer().parse("12\n\n").is_ok());
        let strict = GrammarContext {
            allow_trailing_newlines: false,
            ..GrammarContext::default()
        };
        assert!(standard::integer().parse_with("12\n", &strict, true).is_err());
    }
}
