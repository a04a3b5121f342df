//! String types

use chumsky::prelude::*;

use super::base::base_accessors;
use super::{type_required, Base, GrammarType, Why};
use crate::format::Rendered;
use crate::grammar::rules::{is_word_char, quoted, rest_of_line, word};
use crate::grammar::{Grammar, GrammarContext};
use crate::value::{Kind, Value};

/// How a string is delimited in the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringStyle {
    /// A word of printable characters, without `,;{}`
    Word,
    /// A word, or anything on one line enclosed in `'`
    Quoted,
    /// The rest of the line
    Line,
}

#[derive(Debug, Clone)]
pub struct StringType {
    base: Base,
    style: StringStyle,
}

impl StringType {
    pub fn new(style: StringStyle) -> Self {
        StringType {
            base: Base::default(),
            style,
        }
    }

    pub fn word() -> Self {
        Self::new(StringStyle::Word)
    }

    pub fn quoted() -> Self {
        Self::new(StringStyle::Quoted)
    }

    pub fn line() -> Self {
        Self::new(StringStyle::Line)
    }

    pub fn style(&self) -> StringStyle {
        self.style
    }

    /// The first character the style can not represent
    fn forbidden_char(&self, text: &str) -> Option<char> {
        match self.style {
            StringStyle::Word => text.chars().find(|c| !is_word_char(*c)),
            // a bare word read back through the quoted branch loses its quotes
            StringStyle::Quoted if is_word(text) => {
                (text.starts_with('\'') || text.ends_with('\'')).then_some('\'')
            }
            StringStyle::Quoted => text.chars().find(|c| *c == '\'' || *c == '\n'),
            StringStyle::Line => text.chars().find(|c| *c == '\n' || *c == '\r'),
        }
    }
}

fn is_word(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_word_char)
}

impl GrammarType for StringType {
    base_accessors!();

    fn type_name(&self) -> String {
        match self.style {
            StringStyle::Word => "String",
            StringStyle::Quoted => "QString",
            StringStyle::Line => "LineString",
        }
        .to_string()
    }

    fn grammar_name(&self) -> String {
        match self.style {
            StringStyle::Word => "<str>",
            StringStyle::Quoted => "'<str>'",
            StringStyle::Line => "'<str....>\n'",
        }
        .to_string()
    }

    fn kind(&self) -> Kind {
        Kind::Str
    }

    fn value_grammar(&self, _ctx: &GrammarContext) -> Grammar {
        match self.style {
            StringStyle::Word => word().map(Value::String).boxed(),
            StringStyle::Quoted => quoted('\'').or(word()).map(Value::String).boxed(),
            StringStyle::Line => rest_of_line().map(Value::String).boxed(),
        }
    }

    fn check(&self, value: &Value, why: Why) -> Result<(), String> {
        let Value::String(text) = value else {
            return Err(type_required(value, "string"));
        };
        if why == Why::Parse {
            return Ok(());
        }
        if self.style == StringStyle::Word && text.is_empty() {
            return Err("An empty string is not allowed".to_string());
        }
        match self.forbidden_char(text) {
            Some(c) => Err(format!("Forbidden character '{}' in the string", c.escape_default())),
            None => Ok(()),
        }
    }

    fn render(&self, value: &Value) -> Rendered {
        match (value, self.style) {
            (Value::String(text), StringStyle::Quoted) if !is_word(text) => {
                Rendered::Text(format!("'{}'", text))
            }
            (Value::String(text), _) => Rendered::Text(text.clone()),
            (other, _) => Rendered::Text(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_stops_at_special_chars() {
        let ty = StringType::word();
        assert_eq!(ty.parse("abc").unwrap(), Value::from("abc"));
        assert!(ty.parse("ab,c").is_err());
        assert!(ty.parse("a b").is_err());
    }

    #[test]
    fn test_word_validation() {
        let ty = StringType::word();
        let err = ty.validate(&Value::from("a b"), None, Why::Set).unwrap_err();
        assert!(err.to_string().ends_with("Forbidden character ' ' in the string"));
        assert!(ty.validate(&Value::from("a b"), None, Why::Parse).is_ok());
        assert!(ty.validate(&Value::Integer(1), None, Why::Set).is_err());
    }

    #[test]
    fn test_qstring_quotes_when_needed() {
        let ty = StringType::quoted();
        assert_eq!(ty.parse("'two words'").unwrap(), Value::from("two words"));
        assert_eq!(ty.parse("word").unwrap(), Value::from("word"));
        assert_eq!(ty.string(&Value::from("two words")), "'two words'");
        assert_eq!(ty.string(&Value::from("word")), "word");
        assert_eq!(ty.string(&Value::from("")), "''");
        assert!(ty.validate(&Value::from("it's a"), None, Why::Set).is_err());
    }

    #[test]
    fn test_qstring_rejects_words_wrapped_in_apostrophes() {
        let ty = StringType::quoted();
        for text in ["'x'", "'x", "x'"] {
            let err = ty.validate(&Value::from(text), None, Why::Set).unwrap_err();
            assert!(err.to_string().contains("Forbidden character"), "{}", text);
        }
        let inner = Value::from("it's");
        assert!(ty.validate(&inner, None, Why::Set).is_ok());
        assert_eq!(ty.parse(&ty.string(&inner)).unwrap(), inner);
    }

    #[test]
    fn test_line_string_takes_the_rest_of_line() {
        let ty = StringType::line();
        assert_eq!(ty.parse("  free, text {x}  ").unwrap(), Value::from("free, text {x}"));
        let ctx = GrammarContext::default();
        let value = ty.parse_with("first line\nsecond", &ctx, false).unwrap();
        assert_eq!(value, Value::from("first line"));
    }
}
