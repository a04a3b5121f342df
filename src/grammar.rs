//! Parsing rules shared by the grammar types
//!
//! Grammar types build their rules from the combinators in [`rules`]; the
//! whitespace they skip is configured by a [`GrammarContext`] passed down
//! explicitly through every `grammar(ctx)` call.

pub mod context;
pub mod rules;

use chumsky::prelude::*;

use crate::value::Value;

pub use context::GrammarContext;

/// The parsing rule of a grammar type
pub type Grammar = BoxedParser<'static, char, Value, Simple<char>>;
