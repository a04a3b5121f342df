//! Types whose presence in the text is the information

use chumsky::prelude::*;

use super::base::base_accessors;
use super::{Base, GrammarType, MissingValue, Why};
use crate::format::Rendered;
use crate::grammar::rules::separator_banner;
use crate::grammar::{Grammar, GrammarContext};
use crate::value::{Kind, Value};

/// A boolean given by the presence of the option's name
#[derive(Debug, Clone, Default)]
pub struct Flag {
    base: Base,
}

impl Flag {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GrammarType for Flag {
    base_accessors!();

    fn type_name(&self) -> String {
        "Flag".to_string()
    }

    fn grammar_name(&self) -> String {
        "(Flag)".to_string()
    }

    fn kind(&self) -> Kind {
        Kind::Bool
    }

    fn value_grammar(&self, _ctx: &GrammarContext) -> Grammar {
        empty().to(Value::Bool(true)).boxed()
    }

    fn check(&self, value: &Value, _why: Why) -> Result<(), String> {
        match value {
            Value::Bool(_) | Value::Null => Ok(()),
            _ => Err("This is Flag with no value, please set to True to be present or to False/None to not".to_string()),
        }
    }

    /// A present flag has no text of its own
    fn render(&self, value: &Value) -> Rendered {
        match value {
            Value::Bool(true) => Rendered::Text(String::new()),
            _ => Rendered::Text(value.to_string()),
        }
    }

    fn missing_value(&self) -> MissingValue {
        MissingValue::flag()
    }
}

const SEPARATOR_WIDTH: usize = 79;

/// The `*****` banner dividing a section; it carries no value
#[derive(Debug, Clone, Default)]
pub struct Separator {
    base: Base,
}

impl Separator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GrammarType for Separator {
    base_accessors!();

    fn type_name(&self) -> String {
        "Separator".to_string()
    }

    fn grammar_name(&self) -> String {
        "****...****\n".to_string()
    }

    fn value_grammar(&self, _ctx: &GrammarContext) -> Grammar {
        separator_banner().to(Value::Null).boxed()
    }

    fn check(&self, _value: &Value, _why: Why) -> Result<(), String> {
        Err("Can not set a value to a separator".to_string())
    }

    fn render(&self, _value: &Value) -> Rendered {
        Rendered::Text("*".repeat(SEPARATOR_WIDTH))
    }

    fn has_value(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_parses_to_true() {
        let flag = Flag::new();
        assert_eq!(flag.parse("").unwrap(), Value::Bool(true));
        assert_eq!(flag.missing_value(), MissingValue::flag());
        assert!(flag.validate(&Value::Bool(false), None, Why::Set).is_ok());
        assert!(flag.validate(&Value::Integer(1), None, Why::Set).is_err());
        assert_eq!(flag.parse(&flag.string(&Value::Bool(true))).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_separator() {
        let separator = Separator::new();
        assert_eq!(separator.parse(&"*".repeat(79)).unwrap(), Value::Null);
        assert!(separator.parse("***").is_err());
        assert_eq!(separator.string(&Value::Null).len(), 79);
        assert!(!separator.has_value());
        assert!(separator.validate(&Value::Integer(1), None, Why::Set).is_err());
    }
}
