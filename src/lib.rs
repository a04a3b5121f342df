//! # grammar-types
//!
//! Bidirectional grammar types for the line-oriented configuration and potential
//! files of the SPR-KKR package.
//!
//! Every grammar type is a self-contained descriptor that knows how to build a
//! parsing rule for its textual form, convert loosely-typed input into a
//! canonical [`Value`], validate such a value and render it back to text. Types
//! compose: arrays, sets, sequences and tables wrap other grammar types, and the
//! variant types try several candidates in a fixed priority order.
//!
//! ```text
//!   user input:  convert -> validate
//!   output:      string  -> render (+ prefix, postfix, format)
//!   parsing:     parse   -> grammar actions -> validate(Why::Parse)
//! ```
//!
//! The standard shared instances live in [`types::standard`].

pub mod error;
pub mod format;
pub mod grammar;
pub mod option;
pub mod stream;
pub mod types;
pub mod value;

pub use error::{GrammarError, Result};
pub use format::{FormatRule, FormatSpec, Rendered};
pub use grammar::{Grammar, GrammarContext};
pub use option::{ArrayIndex, ConfigOption, DangerousValue, OptionValue, ValueDefinition};
pub use stream::parse_from_stream;
pub use types::{Builder, GrammarType, MissingValue, TypeRef, Why};
pub use value::{Complex, Dtype, Kind, Record, TableValue, Value};
