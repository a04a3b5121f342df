//! Variant types: a value of any of several candidate types
//!
//! Parsing tries the candidates in their declared order and takes the first
//! one that matches. Values set by the user are routed to a candidate by an
//! explicit, ordered list of [`Dispatch`] rules on the shape of the value.

use chumsky::prelude::*;

use super::base::base_accessors;
use super::standard::LeafTypes;
use super::{Array, Base, Builder, GrammarType, MissingValue, TypeRef, Why};
use crate::format::Rendered;
use crate::grammar::{Grammar, GrammarContext};
use crate::value::{values_equal, Kind, Value};

/// The shape of the values a dispatch rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeRule {
    /// A scalar of the given kind
    Scalar(Kind),
    /// Any value that is not a collection
    AnyScalar,
    /// A collection whose first element is of the kind; `None` is an empty one
    Collection(Option<Kind>),
    AnyCollection,
}

impl ShapeRule {
    pub fn matches(self, value: &Value) -> bool {
        match (self, value.elements()) {
            (ShapeRule::Scalar(kind), None) => Kind::of(value) == kind,
            (ShapeRule::AnyScalar, None) => true,
            (ShapeRule::Collection(kind), Some(items)) if value.is_collection() => {
                items.first().map(Kind::of) == kind
            }
            (ShapeRule::AnyCollection, Some(_)) => value.is_collection(),
            _ => false,
        }
    }
}

/// Values of the shape are handled by the target type
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub rule: ShapeRule,
    pub target: TypeRef,
}

impl Dispatch {
    pub fn new(rule: ShapeRule, target: TypeRef) -> Self {
        Dispatch { rule, target }
    }
}

#[derive(Debug, Clone)]
pub struct Variant {
    base: Base,
    name: String,
    candidates: Vec<TypeRef>,
    dispatch: Vec<Dispatch>,
    missing: MissingValue,
}

impl Variant {
    pub fn new(name: impl Into<String>, candidates: Vec<TypeRef>, dispatch: Vec<Dispatch>) -> Self {
        Variant {
            base: Base::default(),
            name: name.into(),
            candidates,
            dispatch,
            missing: MissingValue::required(),
        }
    }

    pub fn with_missing_value(mut self, missing: MissingValue) -> Self {
        self.missing = missing;
        self
    }

    /// The variant of custom options in input files; unknown words are quoted strings
    pub fn mixed(leaf: &LeafTypes) -> Self {
        let candidates = vec![
            leaf.energy.clone(),
            leaf.real.clone(),
            leaf.integer.clone(),
            leaf.set_of_integers.clone(),
            leaf.set_of_reals.clone(),
            leaf.qstring.clone(),
            leaf.flag.clone(),
        ];
        Variant::new("Mixed", candidates, Self::scalar_dispatch(leaf, &leaf.qstring, &leaf.flag))
            .with_missing_value(MissingValue::flag())
    }

    /// The variant of custom options in potential files; unknown text is the
    /// rest of the line
    pub fn pot_mixed(leaf: &LeafTypes) -> Self {
        let candidates = vec![
            leaf.energy.clone(),
            leaf.real.clone(),
            leaf.integer.clone(),
            leaf.boolean.clone(),
            leaf.set_of_integers.clone(),
            leaf.set_of_reals.clone(),
            leaf.line_string.clone(),
        ];
        Variant::new(
            "PotMixed",
            candidates,
            Self::scalar_dispatch(leaf, &leaf.line_string, &leaf.boolean),
        )
    }

    /// Either a single value, or a closed interval given as a set of two values
    pub fn range(ty: TypeRef) -> Self {
        let interval: TypeRef = Array::set_of(ty.clone()).with_length(2).shared();
        Variant::new(
            format!("Range(of {})", ty.type_name()),
            vec![ty.clone(), interval.clone()],
            vec![
                Dispatch::new(ShapeRule::AnyCollection, interval),
                Dispatch::new(ShapeRule::AnyScalar, ty),
            ],
        )
    }

    fn scalar_dispatch(leaf: &LeafTypes, string: &TypeRef, boolean: &TypeRef) -> Vec<Dispatch> {
        vec![
            Dispatch::new(ShapeRule::Scalar(Kind::Str), string.clone()),
            Dispatch::new(ShapeRule::Scalar(Kind::Bool), boolean.clone()),
            Dispatch::new(ShapeRule::Scalar(Kind::Int), leaf.integer.clone()),
            Dispatch::new(ShapeRule::Scalar(Kind::Float), leaf.real.clone()),
            Dispatch::new(ShapeRule::Scalar(Kind::Complex), leaf.complex_number.clone()),
            Dispatch::new(ShapeRule::Collection(None), leaf.set_of_integers.clone()),
            Dispatch::new(ShapeRule::Collection(Some(Kind::Int)), leaf.set_of_integers.clone()),
            Dispatch::new(ShapeRule::Collection(Some(Kind::Float)), leaf.set_of_reals.clone()),
        ]
    }

    pub fn candidates(&self) -> &[TypeRef] {
        &self.candidates
    }

    pub fn dispatch_rules(&self) -> &[Dispatch] {
        &self.dispatch
    }

    /// The candidate handling the value, by the first matching dispatch rule
    pub fn type_for(&self, value: &Value) -> Option<&TypeRef> {
        let target = self
            .dispatch
            .iter()
            .find(|d| d.rule.matches(value))
            .map(|d| &d.target);
        if let Some(target) = target {
            log::trace!("{} value {} dispatched to {}", self.name, value, target.type_name());
        }
        target
    }

    /// Whether the candidates read the text back as the value
    fn reads_back(&self, text: &str, value: &Value) -> bool {
        self.value_grammar(&GrammarContext::default())
            .then_ignore(end())
            .parse(text)
            .is_ok_and(|parsed| parsed == *value)
    }
}

impl GrammarType for Variant {
    base_accessors!();

    fn type_name(&self) -> String {
        self.name.clone()
    }

    fn grammar_name(&self) -> String {
        "<mixed>".to_string()
    }

    fn value_grammar(&self, ctx: &GrammarContext) -> Grammar {
        let mut candidates = self.candidates.iter().map(|c| c.variant_grammar(ctx));
        let first = match candidates.next() {
            Some(first) => first,
            None => return empty().to(Value::Null).boxed(),
        };
        candidates.fold(first, |acc, grammar| acc.or(grammar).boxed())
    }

    fn coerce(&self, value: Value) -> Value {
        if value.is_null() {
            return value;
        }
        match self.type_for(&value) {
            Some(target) => target.convert(value),
            None => value,
        }
    }

    fn check(&self, value: &Value, why: Why) -> Result<(), String> {
        if value.is_null() {
            return Ok(());
        }
        match self.type_for(value) {
            Some(target) => target.validate(value, None, why).map_err(|e| e.to_string()),
            None => Err(format!("Can not determine the type of value {}", value)),
        }
    }

    /// Strings that an earlier candidate would take (`5`, `1.5`) are
    /// written quoted, if quoting keeps them strings
    fn render(&self, value: &Value) -> Rendered {
        if value.is_null() {
            return Rendered::Text(String::new());
        }
        let Some(target) = self.type_for(value) else {
            return Rendered::Text(value.to_string());
        };
        let text = target.string(value);
        if target.kind() == Kind::Str && !self.reads_back(&text, value) {
            let quoted = format!("'{}'", text);
            if self.reads_back(&quoted, value) {
                log::trace!("{} string {} written quoted", self.name, text);
                return Rendered::Text(quoted);
            }
        }
        Rendered::Text(text)
    }

    fn missing_value(&self) -> MissingValue {
        self.missing.clone()
    }

    fn is_the_same_value(&self, a: &Value, b: &Value) -> bool {
        values_equal(a, b)
    }
}
