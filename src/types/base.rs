//! Attributes shared by all grammar types

use std::fmt;
use std::sync::Arc;

use crate::format::FormatSpec;
use crate::value::Value;

/// Why a value is being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Why {
    /// A value set by the user; strict
    Set,
    /// A value produced by the grammar; checks the grammar enforces are skipped
    Parse,
    /// A value about to be written; strict
    Save,
}

/// What happens when an option's value is left out of the text
#[derive(Debug, Clone, PartialEq)]
pub struct MissingValue {
    /// The option can be given by its name only
    pub can_be_omitted: bool,
    /// The value of an option given by its name only
    pub default_if_omitted: Option<Value>,
    /// The option is not written at all when it has this value
    pub suppress_output_for: Option<Value>,
}

impl MissingValue {
    pub fn required() -> Self {
        MissingValue {
            can_be_omitted: false,
            default_if_omitted: None,
            suppress_output_for: None,
        }
    }

    /// Presence of the name means true, absence false
    pub fn flag() -> Self {
        MissingValue {
            can_be_omitted: true,
            default_if_omitted: Some(Value::Bool(true)),
            suppress_output_for: Some(Value::Bool(false)),
        }
    }
}

pub type Condition = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;
pub type AfterConvert = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// The attributes every grammar type carries
#[derive(Clone, Default)]
pub struct Base {
    pub prefix: Option<String>,
    pub postfix: Option<String>,
    pub format: Option<FormatSpec>,
    /// Always in the canonical form
    pub default_value: Option<Value>,
    pub condition: Option<Condition>,
    pub after_convert: Option<AfterConvert>,
    pub description: String,
}

impl Base {
    pub fn framed(prefix: &str, postfix: &str) -> Self {
        Base {
            prefix: Some(prefix.to_string()),
            postfix: Some(postfix.to_string()),
            ..Base::default()
        }
    }
}

impl fmt::Debug for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Base")
            .field("prefix", &self.prefix)
            .field("postfix", &self.postfix)
            .field("format", &self.format.as_ref().map(|s| s.to_string()))
            .field("default_value", &self.default_value)
            .field("condition", &self.condition.is_some())
            .field("after_convert", &self.after_convert.is_some())
            .finish()
    }
}

/// Implements the accessors of [`GrammarType`](super::GrammarType) that only
/// touch the `base` field
macro_rules! base_accessors {
    () => {
        fn base(&self) -> &$crate::types::Base {
            &self.base
        }

        fn base_mut(&mut self) -> &mut $crate::types::Base {
            &mut self.base
        }

        fn box_clone(&self) -> Box<dyn $crate::types::GrammarType> {
            Box::new(self.clone())
        }
    };
}

pub(crate) use base_accessors;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_missing_value() {
        let flag = MissingValue::flag();
        assert!(flag.can_be_omitted);
        assert_eq!(flag.default_if_omitted, Some(Value::Bool(true)));
        assert_eq!(flag.suppress_output_for, Some(Value::Bool(false)));
        assert!(!MissingValue::required().can_be_omitted);
    }

    #[test]
    fn test_framed_base() {
        let base = Base::framed("{", "}");
        assert_eq!(base.prefix.as_deref(), Some("{"));
        assert!(base.default_value.is_none());
    }
}
