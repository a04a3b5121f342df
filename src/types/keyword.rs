//! Enumerated keywords

use chumsky::prelude::*;

use super::base::base_accessors;
use super::{Base, Builder, GrammarType, Why};
use crate::format::Rendered;
use crate::grammar::rules::{any_keyword, optional_quote};
use crate::grammar::{Grammar, GrammarContext};
use crate::value::{Kind, Value};

/// One of a fixed set of keywords, matched case-insensitively
///
/// The canonical value is the upper-cased keyword.
#[derive(Debug, Clone)]
pub struct Keyword {
    base: Base,
    keywords: Vec<String>,
    /// Descriptions of the keywords, listed in the help
    choices: Option<Vec<(String, String)>>,
}

impl Keyword {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Keyword {
            base: Base::default(),
            keywords: keywords.into_iter().map(|k| k.as_ref().to_uppercase()).collect(),
            choices: None,
        }
    }

    /// Keywords with their descriptions
    pub fn with_choices<K: AsRef<str>, D: AsRef<str>>(choices: Vec<(K, D)>) -> Self {
        let choices: Vec<(String, String)> = choices
            .into_iter()
            .map(|(k, d)| (k.as_ref().to_string(), d.as_ref().to_string()))
            .collect();
        let mut keyword = Self::new(choices.iter().map(|(k, _)| k));
        keyword.choices = Some(choices);
        keyword
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// A keyword type whose first keyword is the default value
pub fn def_keyword<I, S>(keywords: I) -> Keyword
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let keyword = Keyword::new(keywords);
    match keyword.keywords.first().cloned() {
        Some(first) => keyword.with_default(first),
        None => keyword,
    }
}

impl GrammarType for Keyword {
    base_accessors!();

    fn type_name(&self) -> String {
        self.grammar_name()
    }

    fn grammar_name(&self) -> String {
        match self.keywords.as_slice() {
            [single] => format!("FixedValue({})", single),
            keywords => format!("AnyOf({})", keywords.join(",")),
        }
    }

    fn kind(&self) -> Kind {
        Kind::Str
    }

    fn value_grammar(&self, _ctx: &GrammarContext) -> Grammar {
        optional_quote()
            .ignore_then(any_keyword(&self.keywords))
            .then_ignore(optional_quote())
            .map(Value::String)
            .boxed()
    }

    fn coerce(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(s.to_uppercase()),
            Value::Null => Value::Null,
            other => Value::String(other.to_string().to_uppercase()),
        }
    }

    fn check(&self, value: &Value, _why: Why) -> Result<(), String> {
        match value {
            Value::String(s) if self.keywords.contains(s) => Ok(()),
            _ => Err(format!("Required one of [{}]", self.keywords.join("|"))),
        }
    }

    fn render(&self, value: &Value) -> Rendered {
        Rendered::Text(value.to_string())
    }

    fn additional_description(&self, prefix: &str) -> String {
        let own = self.base.description.replace('\n', &format!("\n{}", prefix));
        let Some(choices) = &self.choices else {
            return own;
        };
        let mut out = format!("\n{}Possible values:\n", prefix);
        let lines: Vec<String> = choices
            .iter()
            .map(|(k, d)| format!("{}  {:<10}{}", prefix, k, d))
            .collect();
        out.push_str(&lines.join("\n"));
        if !own.is_empty() {
            out.push_str(&format!("\n\n{}{}", prefix, own));
        }
        out
    }
}
