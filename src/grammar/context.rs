//! Whitespace configuration of generated grammars

use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

/// Controls what the generated rules treat as insignificant
///
/// Line ends are never skipped: they delimit table rows and line strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GrammarContext {
    /// Characters skipped before every token
    pub whitespace: String,
    /// Accept trailing empty lines after a whole-string parse
    pub allow_trailing_newlines: bool,
}

impl Default for GrammarContext {
    fn default() -> Self {
        GrammarContext {
            whitespace: " \t".to_string(),
            allow_trailing_newlines: true,
        }
    }
}

impl GrammarContext {
    pub fn whitespace_chars(&self) -> Vec<char> {
        self.whitespace.chars().filter(|c| *c != '\n').collect()
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load the context from a YAML file, e.g.
    ///
    /// ```yaml
    /// whitespace: " \t"
    /// allow_trailing_newlines: false
    /// ```
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}
