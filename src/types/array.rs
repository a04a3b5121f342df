//! Homogeneous collections: arrays, sets and complex numbers

use chumsky::prelude::*;

use super::base::base_accessors;
use super::{Base, GrammarType, TypeRef, Why};
use crate::format::Rendered;
use crate::grammar::rules::{delimited, token, ws1};
use crate::grammar::{Grammar, GrammarContext};
use crate::value::{values_equal, Complex, Kind, Value};

/// The canonical container of an array value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// A fixed-dtype array
    Array,
    List,
}

impl Container {
    fn wrap(self, items: Vec<Value>) -> Value {
        match self {
            Container::Array => Value::Array(items),
            Container::List => Value::List(items),
        }
    }

    fn holds(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Container::Array, Value::Array(_)) | (Container::List, Value::List(_))
        )
    }

    fn name(self) -> &'static str {
        match self {
            Container::Array => "array",
            Container::List => "list",
        }
    }
}

/// How the items are delimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    /// `1 2 3`
    Plain,
    /// `{1,2;3}`, or a single bare value
    Set,
}

/// An array of values of one type
#[derive(Debug, Clone)]
pub struct Array {
    base: Base,
    item: TypeRef,
    min_length: Option<usize>,
    max_length: Option<usize>,
    container: Container,
    style: Style,
}

impl Array {
    pub fn new(item: TypeRef) -> Self {
        Array {
            base: Base::default(),
            item,
            min_length: None,
            max_length: None,
            container: Container::Array,
            style: Style::Plain,
        }
    }

    /// A set of values: `{1,2,3}`
    pub fn set_of(item: TypeRef) -> Self {
        Array {
            base: Base::framed("{", "}"),
            style: Style::Set,
            ..Self::new(item)
        }
    }

    /// Both the minimal and the maximal length
    pub fn with_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self.max_length = Some(length);
        self
    }

    pub fn with_min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    pub fn with_max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }

    /// Hold the values in a plain list instead of an array
    pub fn as_list(mut self) -> Self {
        self.container = Container::List;
        self
    }

    pub fn item_type(&self) -> &TypeRef {
        &self.item
    }

    fn delimiter_str(&self) -> &'static str {
        match self.style {
            Style::Plain => " ",
            Style::Set => ",",
        }
    }

    fn delimiter(&self, ctx: &GrammarContext) -> BoxedParser<'static, char, (), Simple<char>> {
        match self.style {
            Style::Plain => ws1(ctx).boxed(),
            Style::Set => token(ctx, one_of(",;"))
                .ignored()
                .or(ws1(ctx))
                .boxed(),
        }
    }

    fn length_description(&self) -> String {
        match (self.min_length, self.max_length) {
            (Some(min), Some(max)) if min == max => format!(" of length {}", min),
            (None, None) => String::new(),
            (min, max) => format!(
                " with length {}n{}",
                min.map(|m| format!("{}<=", m)).unwrap_or_default(),
                max.map(|m| format!("<={}", m)).unwrap_or_default()
            ),
        }
    }
}

impl GrammarType for Array {
    base_accessors!();

    fn type_name(&self) -> String {
        let name = match self.style {
            Style::Plain => "Array",
            Style::Set => "SetOf",
        };
        format!("{}(of {}{})", name, self.item.type_name(), self.length_description())
    }

    fn grammar_name(&self) -> String {
        let item = self.item.grammar_name();
        match (self.min_length, self.max_length) {
            (Some(min), Some(max)) if min == max => format!("{}*{}", min, item),
            _ => {
                let d = self.delimiter_str();
                format!("{}{}{}{}...", item, d, item, d)
            }
        }
    }

    fn value_grammar(&self, ctx: &GrammarContext) -> Grammar {
        let container = self.container;
        delimited(self.item.grammar(ctx), self.delimiter(ctx))
            .map(move |items| container.wrap(items))
            .boxed()
    }

    /// A set can also be given by a bare single value
    fn transform_grammar(&self, grammar: Grammar, ctx: &GrammarContext) -> Grammar {
        match self.style {
            Style::Plain => grammar,
            Style::Set => {
                let container = self.container;
                grammar
                    .or(self.item.grammar(ctx).map(move |item| container.wrap(vec![item])))
                    .boxed()
            }
        }
    }

    fn coerce(&self, value: Value) -> Value {
        if self.container.holds(&value) {
            return value;
        }
        match value {
            Value::Array(items) | Value::List(items) | Value::Tuple(items) => self
                .container
                .wrap(items.into_iter().map(|v| self.item.convert(v)).collect()),
            Value::Null => Value::Null,
            scalar if self.container == Container::Array => {
                self.container.wrap(vec![self.item.convert(scalar)])
            }
            other => other,
        }
    }

    fn check(&self, value: &Value, _why: Why) -> Result<(), String> {
        if !self.container.holds(value) {
            return Err(format!(
                "A value of the {} type is required, a {} is given",
                self.container.name(),
                value.type_label()
            ));
        }
        let items = value.elements().unwrap_or_default();
        for (i, item) in items.iter().enumerate() {
            self.item
                .validate(item, None, Why::Set)
                .map_err(|e| format!("Value {} in the set is incorrect: {}", i, e))?;
        }
        if let Some(min) = self.min_length.filter(|min| items.len() < *min) {
            return Err(format!(
                "The array should be at least {} items long, it has {} items",
                min,
                items.len()
            ));
        }
        if let Some(max) = self.max_length.filter(|max| items.len() > *max) {
            return Err(format!(
                "The array can not have more than {} items, it has {} items",
                max,
                items.len()
            ));
        }
        Ok(())
    }

    fn render(&self, value: &Value) -> Rendered {
        let items: Vec<String> = value
            .elements()
            .unwrap_or_default()
            .iter()
            .map(|item| self.item.string(item))
            .collect();
        Rendered::Text(items.join(self.delimiter_str()))
    }

    fn is_the_same_value(&self, a: &Value, b: &Value) -> bool {
        values_equal(a, b)
    }
}

/// A complex number given as a set of two reals: `{re im}`
#[derive(Debug, Clone)]
pub struct ComplexNumber {
    base: Base,
    real: TypeRef,
}

impl ComplexNumber {
    pub fn new(real: TypeRef) -> Self {
        ComplexNumber {
            base: Base::framed("{", "}"),
            real,
        }
    }
}

impl GrammarType for ComplexNumber {
    base_accessors!();

    fn type_name(&self) -> String {
        "Complex".to_string()
    }

    fn grammar_name(&self) -> String {
        "{complex (as 2 reals)}".to_string()
    }

    fn kind(&self) -> Kind {
        Kind::Complex
    }

    fn value_grammar(&self, ctx: &GrammarContext) -> Grammar {
        let delimiter = token(ctx, one_of(",;")).ignored().or(ws1(ctx));
        self.real
            .grammar(ctx)
            .then_ignore(delimiter)
            .then(self.real.grammar(ctx))
            .try_map(|(re, im), span| match (re.as_f64(), im.as_f64()) {
                (Some(re), Some(im)) => Ok(Value::Complex(Complex::new(re, im))),
                _ => Err(Simple::custom(span, "Two reals expected")),
            })
            .boxed()
    }

    fn coerce(&self, value: Value) -> Value {
        match &value {
            Value::Integer(_) | Value::Real(_) => {
                Value::Complex(Complex::new(value.as_f64().unwrap_or_default(), 0.0))
            }
            Value::Array(items) | Value::List(items) | Value::Tuple(items) if items.len() == 2 => {
                match (items[0].as_f64(), items[1].as_f64()) {
                    (Some(re), Some(im)) => Value::Complex(Complex::new(re, im)),
                    _ => value,
                }
            }
            _ => value,
        }
    }

    fn check(&self, value: &Value, _why: Why) -> Result<(), String> {
        match value {
            Value::Complex(_) => Ok(()),
            other => Err(format!("A complex value required, {} given.", other)),
        }
    }

    fn render(&self, value: &Value) -> Rendered {
        match value {
            Value::Complex(c) => Rendered::Text(format!(
                "{} {}",
                self.real.string(&Value::Real(c.re)),
                self.real.string(&Value::Real(c.im))
            )),
            other => Rendered::Text(other.to_string()),
        }
    }
}
