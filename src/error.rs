//! Error types for parsing, validation and option handling

use chumsky::error::{Simple, SimpleReason};
use thiserror::Error;

/// Errors raised by grammar types and the option container
#[derive(Debug, Error)]
pub enum GrammarError {
    /// The text does not match the grammar
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A structurally valid value failed a type, range, choice or length check
    #[error("Value '{value}' {} is not valid: {reason}", target(.param, .type_name))]
    Validation {
        value: String,
        type_name: String,
        param: Option<String>,
        reason: String,
    },

    /// No grammar type corresponds to the given value or kind
    #[error("Cannot determine grammar type from {0}")]
    UnknownType(String),

    /// A malformed output format specification
    #[error("Invalid format specification '{0}'")]
    InvalidFormat(String),

    /// A named or positional field that a sequence does not have
    #[error("No field {0} in the sequence")]
    NoField(String),

    /// Misuse of a configuration option (e.g. array access to a scalar option)
    #[error("{0}")]
    Option(String),

    /// The stream ended before the delimiter was read
    #[error("The stream ended before the delimiter {0:?} was found")]
    UnexpectedEof(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GrammarError>;

fn target(param: &Option<String>, type_name: &str) -> String {
    match param {
        Some(param) => format!("for parameter {} of type {}", param, type_name),
        None => format!("for type {}", type_name),
    }
}

impl GrammarError {
    /// Build a validation error the way every grammar type reports it
    pub fn validation(
        value: impl ToString,
        type_name: impl Into<String>,
        param: Option<&str>,
        reason: impl Into<String>,
    ) -> Self {
        GrammarError::Validation {
            value: value.to_string(),
            type_name: type_name.into(),
            param: param.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// Convert the errors of a failed chumsky parse into a positioned parse error
    ///
    /// Spans of a `&str` stream are char offsets; they are mapped to 1-based
    /// line and column numbers.
    pub fn from_parse_errors(source: &str, errors: Vec<Simple<char>>) -> Self {
        let Some(error) = errors.into_iter().next() else {
            return GrammarError::Parse {
                line: 1,
                column: 1,
                message: "Unknown parse failure".to_string(),
            };
        };
        let (line, column) = line_and_column(source, error.span().start);
        GrammarError::Parse {
            line,
            column,
            message: describe(&error),
        }
    }

    /// Whether this is a parse-time (structural) failure
    pub fn is_parse_error(&self) -> bool {
        matches!(self, GrammarError::Parse { .. })
    }
}

fn line_and_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for c in source.chars().take(offset) {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

fn describe(error: &Simple<char>) -> String {
    match error.reason() {
        SimpleReason::Custom(message) => message.clone(),
        SimpleReason::Unclosed { delimiter, .. } => {
            format!("Unclosed delimiter '{}'", delimiter)
        }
        SimpleReason::Unexpected => {
            let mut expected: Vec<String> = error
                .expected()
                .map(|e| match e {
                    Some(c) => format!("{:?}", c),
                    None => "end of input".to_string(),
                })
                .collect();
            expected.sort();
            expected.dedup();
            let found = match error.found() {
                Some(c) => format!("{:?}", c),
                None => "end of input".to_string(),
            };
            match (error.label(), expected.is_empty()) {
                (Some(label), _) => format!("Expected {}, found {}", label, found),
                (None, true) => format!("Unexpected {}", found),
                (None, false) => format!("Expected one of {}, found {}", expected.join(", "), found),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_with_parameter() {
        let err = GrammarError::validation(5, "Unsigned", Some("NKTAB"), "A positive value required");
        assert_eq!(
            err.to_string(),
            "Value '5' for parameter NKTAB of type Unsigned is not valid: A positive value required"
        );
    }

    #[test]
    fn test_validation_message_without_parameter() {
        let err = GrammarError::validation("x", "Integer", None, "invalid value");
        assert_eq!(err.to_string(), "Value 'x' for type Integer is not valid: invalid value");
    }

    #[test]
    fn test_line_and_column() {
        assert_eq!(line_and_column("ab\ncd", 0), (1, 1));
        assert_eq!(line_and_column("ab\ncd", 4), (2, 2));
    }

    #[test]
    fn test_custom_reason_is_kept() {
        let err = GrammarError::from_parse_errors(
            "1 2\n3",
            vec![Simple::custom(4..5, "First column should contain row numbering")],
        );
        match err {
            GrammarError::Parse { line, column, message } => {
                assert_eq!((line, column), (2, 1));
                assert_eq!(message, "First column should contain row numbering");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
