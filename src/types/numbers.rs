//! Numbers, booleans and dates

use chrono::NaiveDate;
use chumsky::prelude::*;
use chumsky::primitive::filter;
use std::cmp::Ordering;

use super::base::base_accessors;
use super::{type_required, Base, GrammarType, Why};
use crate::format::Rendered;
use crate::grammar::rules::{any_keyword, caseless_keyword, real, signed_integer, token, unsigned_integer};
use crate::grammar::{Grammar, GrammarContext};
use crate::value::{Kind, Value};

/// Rydberg constant in eV
pub const RYDBERG: f64 = 13.605_693_009;

/// Optional inclusive limits of a number
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    pub min: Option<Value>,
    pub max: Option<Value>,
}

impl Bounds {
    fn check(&self, value: &Value) -> Result<(), String> {
        if let Some(min) = &self.min {
            if value.compare(min) == Some(Ordering::Less) {
                return Err(format!(
                    "A value greater that or equal to {} is required, {} have been given.",
                    min, value
                ));
            }
        }
        if let Some(max) = &self.max {
            if value.compare(max) == Some(Ordering::Greater) {
                return Err(format!(
                    "A value less than or equal to {} is required, {} have been given.",
                    max, value
                ));
            }
        }
        Ok(())
    }
}

macro_rules! bounded {
    ($ty:ty, $bound:ty) => {
        impl $ty {
            pub fn with_min(mut self, min: $bound) -> Self {
                self.bounds.min = Some(min.into());
                self
            }

            pub fn with_max(mut self, max: $bound) -> Self {
                self.bounds.max = Some(max.into());
                self
            }
        }
    };
}

/// Signed integer
#[derive(Debug, Clone, Default)]
pub struct Integer {
    base: Base,
    bounds: Bounds,
}

impl Integer {
    pub fn new() -> Self {
        Self::default()
    }
}

bounded!(Integer, i64);

impl GrammarType for Integer {
    base_accessors!();

    fn type_name(&self) -> String {
        "Integer".to_string()
    }

    fn grammar_name(&self) -> String {
        "<int>".to_string()
    }

    fn kind(&self) -> Kind {
        Kind::Int
    }

    fn value_grammar(&self, _ctx: &GrammarContext) -> Grammar {
        signed_integer().map(Value::Integer).boxed()
    }

    fn check(&self, value: &Value, _why: Why) -> Result<(), String> {
        match value {
            Value::Integer(_) => self.bounds.check(value),
            _ => Err(type_required(value, "integer")),
        }
    }

    fn render(&self, value: &Value) -> Rendered {
        match value {
            Value::Integer(i) => Rendered::Int(*i),
            other => Rendered::Text(other.to_string()),
        }
    }
}

/// Non-negative integer
#[derive(Debug, Clone, Default)]
pub struct Unsigned {
    base: Base,
    bounds: Bounds,
}

impl Unsigned {
    pub fn new() -> Self {
        Self::default()
    }
}

bounded!(Unsigned, i64);

impl GrammarType for Unsigned {
    base_accessors!();

    fn type_name(&self) -> String {
        "Unsigned".to_string()
    }

    fn grammar_name(&self) -> String {
        "<+int>".to_string()
    }

    fn kind(&self) -> Kind {
        Kind::Int
    }

    fn value_grammar(&self, _ctx: &GrammarContext) -> Grammar {
        unsigned_integer().map(Value::Integer).boxed()
    }

    fn check(&self, value: &Value, _why: Why) -> Result<(), String> {
        match value {
            Value::Integer(i) => {
                self.bounds.check(value)?;
                if *i < 0 {
                    return Err("A positive value required".to_string());
                }
                Ok(())
            }
            _ => Err(type_required(value, "unsigned integer")),
        }
    }

    fn render(&self, value: &Value) -> Rendered {
        match value {
            Value::Integer(i) => Rendered::Int(*i),
            other => Rendered::Text(other.to_string()),
        }
    }
}

fn coerce_real(value: Value) -> Value {
    match value {
        Value::Integer(i) => Value::Real(i as f64),
        other => other,
    }
}

fn render_real(value: &Value) -> Rendered {
    match value.as_f64() {
        Some(r) => Rendered::Float(r),
        None => Rendered::Text(value.to_string()),
    }
}

/// A real number
#[derive(Debug, Clone, Default)]
pub struct Real {
    base: Base,
    bounds: Bounds,
}

impl Real {
    pub fn new() -> Self {
        Self::default()
    }
}

bounded!(Real, f64);

impl GrammarType for Real {
    base_accessors!();

    fn type_name(&self) -> String {
        "Real".to_string()
    }

    fn grammar_name(&self) -> String {
        "<float>".to_string()
    }

    fn kind(&self) -> Kind {
        Kind::Float
    }

    fn value_grammar(&self, _ctx: &GrammarContext) -> Grammar {
        real(false).map(Value::Real).boxed()
    }

    /// Integer-looking text is left to the integer candidates
    fn variant_grammar(&self, ctx: &GrammarContext) -> Grammar {
        self.wrap_grammar(real(true).map(Value::Real).boxed(), ctx)
    }

    fn coerce(&self, value: Value) -> Value {
        coerce_real(value)
    }

    fn check(&self, value: &Value, _why: Why) -> Result<(), String> {
        match value {
            Value::Real(_) | Value::Integer(_) => self.bounds.check(value),
            _ => Err(type_required(value, "real")),
        }
    }

    fn render(&self, value: &Value) -> Rendered {
        render_real(value)
    }
}

/// A date written as `DD.MM.YYYY`
#[derive(Debug, Clone, Default)]
pub struct Date {
    base: Base,
    bounds: Bounds,
}

impl Date {
    pub fn new() -> Self {
        Self::default()
    }
}

bounded!(Date, NaiveDate);

fn date_field(len: usize) -> impl Parser<char, u32, Error = Simple<char>> + Clone {
    filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .exactly(len)
        .collect::<String>()
        .try_map(|text, span| {
            text.parse::<u32>()
                .map_err(|e| Simple::custom(span, e.to_string()))
        })
}

impl GrammarType for Date {
    base_accessors!();

    fn type_name(&self) -> String {
        "Date".to_string()
    }

    fn grammar_name(&self) -> String {
        "<dd.mm.yyyy>".to_string()
    }

    fn kind(&self) -> Kind {
        Kind::Date
    }

    fn value_grammar(&self, _ctx: &GrammarContext) -> Grammar {
        date_field(2)
            .then_ignore(any())
            .then(date_field(2))
            .then_ignore(any())
            .then(date_field(4))
            .try_map(|((day, month), year), span| {
                NaiveDate::from_ymd_opt(year as i32, month, day)
                    .map(Value::Date)
                    .ok_or_else(|| Simple::custom(span, format!("Invalid date {:02}.{:02}.{}", day, month, year)))
            })
            .boxed()
    }

    fn check(&self, value: &Value, _why: Why) -> Result<(), String> {
        match value {
            Value::Date(_) => self.bounds.check(value),
            _ => Err(type_required(value, "date")),
        }
    }

    fn render(&self, value: &Value) -> Rendered {
        match value {
            Value::Date(d) => Rendered::Text(d.format("%d.%m.%Y").to_string()),
            other => Rendered::Text(other.to_string()),
        }
    }
}

/// A boolean written as `T` or `F`
#[derive(Debug, Clone, Default)]
pub struct Bool {
    base: Base,
}

impl Bool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GrammarType for Bool {
    base_accessors!();

    fn type_name(&self) -> String {
        "Bool".to_string()
    }

    fn grammar_name(&self) -> String {
        "<T|F>".to_string()
    }

    fn kind(&self) -> Kind {
        Kind::Bool
    }

    fn value_grammar(&self, _ctx: &GrammarContext) -> Grammar {
        caseless_keyword("T")
            .to(Value::Bool(true))
            .or(caseless_keyword("F").to(Value::Bool(false)))
            .boxed()
    }

    fn check(&self, value: &Value, _why: Why) -> Result<(), String> {
        match value {
            Value::Bool(_) => Ok(()),
            _ => Err(type_required(value, "boolean")),
        }
    }

    fn render(&self, value: &Value) -> Rendered {
        match value {
            Value::Bool(true) => Rendered::Text("T".to_string()),
            Value::Bool(false) => Rendered::Text("F".to_string()),
            other => Rendered::Text(other.to_string()),
        }
    }
}

/// A real number optionally followed by a unit
///
/// The value is stored in the base unit (factor 1); the unit is never written.
#[derive(Debug, Clone)]
pub struct RealWithUnits {
    base: Base,
    bounds: Bounds,
    label: Option<String>,
    /// Unit labels with their factors; `None` is the bare number
    units: Vec<(Option<String>, f64)>,
}

bounded!(RealWithUnits, f64);

impl RealWithUnits {
    pub fn new<S: AsRef<str>>(units: Vec<(Option<S>, f64)>) -> Self {
        RealWithUnits {
            base: Base::default(),
            bounds: Bounds::default(),
            label: None,
            units: units
                .into_iter()
                .map(|(unit, factor)| (unit.map(|u| u.as_ref().to_string()), factor))
                .collect(),
        }
    }

    /// Energy in Rydbergs, optionally given in eV
    pub fn energy() -> Self {
        let mut energy = Self::new(vec![(Some("Ry"), 1.0), (Some("eV"), 1.0 / RYDBERG), (None, 1.0)]);
        energy.label = Some("Energy (<Real> [Ry|eV])".to_string());
        energy
    }

    pub fn units(&self) -> &[(Option<String>, f64)] {
        &self.units
    }

    fn labelled_units(&self) -> Option<BoxedParser<'static, char, f64, Simple<char>>> {
        let (labels, factors): (Vec<String>, Vec<f64>) = self
            .units
            .iter()
            .filter_map(|(unit, factor)| unit.clone().map(|u| (u, *factor)))
            .unzip();
        if labels.is_empty() {
            return None;
        }
        Some(
            any_keyword(&labels)
                .map(move |unit| {
                    labels
                        .iter()
                        .position(|l| l.to_uppercase() == unit)
                        .map(|i| factors[i])
                        .unwrap_or(1.0)
                })
                .boxed(),
        )
    }

    fn bare_factor(&self) -> Option<f64> {
        self.units
            .iter()
            .find(|(unit, _)| unit.is_none())
            .map(|(_, factor)| *factor)
    }

    fn units_grammar(&self, ctx: &GrammarContext, strict_bare: bool) -> Grammar {
        let with_unit = self
            .labelled_units()
            .map(|units| real(false).then(token(ctx, units)).map(|(x, f)| x * f).boxed());
        let bare = self
            .bare_factor()
            .map(|factor| real(strict_bare).map(move |x| x * factor).boxed());
        let number = match (with_unit, bare) {
            (Some(with_unit), Some(bare)) => with_unit.or(bare).boxed(),
            (Some(with_unit), None) => with_unit,
            (None, Some(bare)) => bare,
            (None, None) => real(false).boxed(),
        };
        number.map(Value::Real).boxed()
    }
}

impl GrammarType for RealWithUnits {
    base_accessors!();

    fn type_name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("RealWithUnits ({})", self.grammar_name()))
    }

    fn grammar_name(&self) -> String {
        let units: Vec<&str> = self
            .units
            .iter()
            .map(|(unit, _)| unit.as_deref().unwrap_or(""))
            .collect();
        format!("<float>[{}]", units.join("|"))
    }

    fn kind(&self) -> Kind {
        Kind::Float
    }

    fn value_grammar(&self, ctx: &GrammarContext) -> Grammar {
        self.units_grammar(ctx, false)
    }

    /// A bare number has to look like a real
    fn variant_grammar(&self, ctx: &GrammarContext) -> Grammar {
        self.wrap_grammar(self.units_grammar(ctx, true), ctx)
    }

    fn coerce(&self, value: Value) -> Value {
        coerce_real(value)
    }

    fn check(&self, value: &Value, _why: Why) -> Result<(), String> {
        match value {
            Value::Real(_) => self.bounds.check(value),
            _ => Err("A float value required".to_string()),
        }
    }

    fn render(&self, value: &Value) -> Rendered {
        render_real(value)
    }
}
