//! Configuration options: one named value of a grammar type
//!
//! A [`ConfigOption`] holds the value of one option of an input or potential
//! file, as described by its [`ValueDefinition`]. Numbered arrays hold one
//! value per integer index plus the `def` wildcard used for all the other
//! indexes.
//!
//! A value can be set as a [`DangerousValue`], which bypasses the checks of
//! the option's type; it is checked only against a looser (variant) type.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{GrammarError, Result};
use crate::types::{standard, FieldAccess, FieldKey, GrammarType, TypeRef, Why};
use crate::value::Value;

/// The description of one option: its name, type and default
#[derive(Debug, Clone)]
pub struct ValueDefinition {
    pub name: String,
    pub ty: TypeRef,
    /// Always in the canonical form of the type
    pub default_value: Option<Value>,
    /// The value can not be cleared, unless there is a default
    pub required: bool,
    /// The value can be missing when the option is saved
    pub optional: bool,
    /// Expert options are not written when they have the default value
    pub expert: bool,
    pub is_numbered_array: bool,
    /// The type the dangerous values are checked against; `None` accepts anything
    pub type_of_dangerous: Option<TypeRef>,
}

impl ValueDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        let default_value = ty.default_value().cloned();
        ValueDefinition {
            name: name.into(),
            ty,
            default_value,
            required: false,
            optional: true,
            expert: false,
            is_numbered_array: false,
            type_of_dangerous: Some(standard::mixed()),
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(self.ty.convert(value.into()));
        self
    }

    /// A required option is also not optional
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self.optional = !required;
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn expert(mut self, expert: bool) -> Self {
        self.expert = expert;
        self
    }

    pub fn numbered_array(mut self, numbered: bool) -> Self {
        self.is_numbered_array = numbered;
        self
    }

    pub fn type_of_dangerous(mut self, ty: Option<TypeRef>) -> Self {
        self.type_of_dangerous = ty;
        self
    }

    pub fn convert_and_validate(&self, value: Value) -> Result<Value> {
        let value = self.ty.convert(value);
        self.ty.validate(&value, Some(&self.name), Why::Set)?;
        Ok(value)
    }

    /// Write `NAME=value`, or just `NAME` for a flag set to its omitted value
    pub fn write(&self, out: &mut dyn io::Write, value: &Value) -> Result<()> {
        self.write_as(out, &self.name, value, self.ty.as_ref())
    }

    fn write_as(&self, out: &mut dyn io::Write, label: &str, value: &Value, ty: &dyn GrammarType) -> Result<()> {
        if !ty.has_value() {
            return ty.write(out, value);
        }
        let missing = ty.missing_value();
        if let Some(suppressed) = &missing.suppress_output_for {
            if ty.is_the_same_value(value, suppressed) {
                return Ok(());
            }
        }
        let omitted = missing
            .default_if_omitted
            .as_ref()
            .is_some_and(|omitted| ty.is_the_same_value(value, omitted));
        if missing.can_be_omitted && omitted {
            write!(out, "{}", label)?;
            return Ok(());
        }
        if ty.name_in_grammar() {
            write!(out, "{}=", label)?;
        }
        ty.write(out, value)
    }
}

/// A value excluded from the checks of the option's type
#[derive(Debug, Clone)]
pub struct DangerousValue {
    value: Value,
    ty: Option<TypeRef>,
}

impl DangerousValue {
    /// Without a type, the value is kept as its text
    pub fn new(value: Value, ty: Option<TypeRef>, validate: bool) -> Result<Self> {
        let value = match (&ty, validate) {
            (Some(ty), true) => {
                let value = ty.convert(value);
                ty.validate(&value, None, Why::Set)?;
                value
            }
            (None, true) => Value::String(value.to_string()),
            (_, false) => value,
        };
        Ok(DangerousValue { value, ty })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_type(&self) -> Option<&TypeRef> {
        self.ty.as_ref()
    }
}

/// An index into a numbered array
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArrayIndex {
    /// The `def` wildcard
    Default,
    At(i64),
}

impl fmt::Display for ArrayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayIndex::Default => f.write_str("def"),
            ArrayIndex::At(i) => write!(f, "{}", i),
        }
    }
}

impl From<i64> for ArrayIndex {
    fn from(index: i64) -> Self {
        ArrayIndex::At(index)
    }
}

impl FromStr for ArrayIndex {
    type Err = GrammarError;

    fn from_str(text: &str) -> Result<Self> {
        if text == "def" {
            return Ok(ArrayIndex::Default);
        }
        text.trim()
            .parse()
            .map(ArrayIndex::At)
            .map_err(|_| GrammarError::Option(format!("Numbered array indexes can be only integers, {} given", text)))
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Plain(Value),
    Dangerous(DangerousValue),
}

impl Slot {
    fn value(&self) -> &Value {
        match self {
            Slot::Plain(value) => value,
            Slot::Dangerous(dangerous) => dangerous.value(),
        }
    }
}

#[derive(Debug, Clone)]
enum Stored {
    Single(Slot),
    Numbered(BTreeMap<ArrayIndex, Slot>),
}

/// The value of an option: numbered arrays have one value per index
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Single(Value),
    Numbered(BTreeMap<ArrayIndex, Value>),
}

/// One option of a configuration file
#[derive(Debug, Clone)]
pub struct ConfigOption {
    definition: Arc<ValueDefinition>,
    value: Option<Stored>,
    result: Option<Value>,
}

impl ConfigOption {
    pub fn new(definition: Arc<ValueDefinition>) -> Self {
        ConfigOption {
            definition,
            value: None,
            result: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &ValueDefinition {
        &self.definition
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.definition.default_value.as_ref()
    }

    /// The value, or the `def` wildcard of a numbered array
    pub fn get(&self) -> Option<Value> {
        let value = match &self.value {
            Some(Stored::Single(slot)) => Some(slot.value()),
            Some(Stored::Numbered(map)) => map.get(&ArrayIndex::Default).map(Slot::value),
            None => None,
        };
        value.or(self.default_value()).cloned()
    }

    /// All the values; for numbered arrays including the explicit indexes
    pub fn get_all(&self) -> Option<OptionValue> {
        match &self.value {
            Some(Stored::Single(slot)) => Some(OptionValue::Single(slot.value().clone())),
            Some(Stored::Numbered(map)) => Some(OptionValue::Numbered(
                map.iter().map(|(i, slot)| (*i, slot.value().clone())).collect(),
            )),
            None => self.default_as_option_value(),
        }
    }

    fn default_as_option_value(&self) -> Option<OptionValue> {
        let default = self.default_value()?.clone();
        Some(if self.definition.is_numbered_array {
            OptionValue::Numbered(BTreeMap::from([(ArrayIndex::Default, default)]))
        } else {
            OptionValue::Single(default)
        })
    }

    /// Set the value; `Null` clears it and numbered arrays set the wildcard
    pub fn set(&mut self, value: Value) -> Result<()> {
        if value.is_null() {
            return self.clear();
        }
        if self.definition.is_numbered_array {
            return self.set_item(ArrayIndex::Default, value);
        }
        let value = self.definition.convert_and_validate(value)?;
        self.value = Some(Stored::Single(Slot::Plain(value)));
        self.post_set();
        Ok(())
    }

    /// Replace all the values of a numbered array
    pub fn set_all(&mut self, values: BTreeMap<ArrayIndex, Value>) -> Result<()> {
        self.check_array_access()?;
        let slots = values
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(i, value)| Ok((i, Slot::Plain(self.definition.convert_and_validate(value)?))))
            .collect::<Result<BTreeMap<_, _>>>()?;
        self.value = (!slots.is_empty()).then_some(Stored::Numbered(slots));
        self.post_set();
        Ok(())
    }

    /// Set a value bypassing the checks of the option's type
    pub fn set_dangerous(&mut self, value: Value, index: Option<ArrayIndex>) -> Result<()> {
        let dangerous = DangerousValue::new(value, self.definition.type_of_dangerous.clone(), true)?;
        match index {
            Some(index) => {
                self.check_array_access()?;
                self.store_item(index, Slot::Dangerous(dangerous));
            }
            None if self.definition.is_numbered_array => {
                self.store_item(ArrayIndex::Default, Slot::Dangerous(dangerous));
            }
            None => self.value = Some(Stored::Single(Slot::Dangerous(dangerous))),
        }
        self.post_set();
        Ok(())
    }

    pub fn is_dangerous(&self) -> bool {
        match &self.value {
            Some(Stored::Single(slot)) => matches!(slot, Slot::Dangerous(_)),
            Some(Stored::Numbered(map)) => map.values().any(|slot| matches!(slot, Slot::Dangerous(_))),
            None => false,
        }
    }

    fn check_array_access(&self) -> Result<()> {
        if self.definition.is_numbered_array {
            Ok(())
        } else {
            Err(GrammarError::Option(format!(
                "It is not allowed to access {} as array",
                self.definition.name
            )))
        }
    }

    fn store_item(&mut self, index: ArrayIndex, slot: Slot) {
        match &mut self.value {
            Some(Stored::Numbered(map)) => {
                map.insert(index, slot);
            }
            _ => self.value = Some(Stored::Numbered(BTreeMap::from([(index, slot)]))),
        }
    }

    /// Set one item of a numbered array; `Null` removes the item
    pub fn set_item(&mut self, index: impl Into<ArrayIndex>, value: Value) -> Result<()> {
        self.check_array_access()?;
        let index = index.into();
        if value.is_null() {
            if let Some(Stored::Numbered(map)) = &mut self.value {
                map.remove(&index);
                if map.is_empty() {
                    self.value = None;
                }
            }
        } else {
            let value = self.definition.convert_and_validate(value)?;
            self.store_item(index, Slot::Plain(value));
        }
        self.post_set();
        Ok(())
    }

    /// An item of a numbered array; unset items have the default value
    pub fn get_item(&self, index: impl Into<ArrayIndex>) -> Result<Option<Value>> {
        self.check_array_access()?;
        let Some(Stored::Numbered(map)) = &self.value else {
            return Ok(None);
        };
        Ok(map
            .get(&index.into())
            .map(Slot::value)
            .or(self.default_value())
            .cloned())
    }

    /// Unset the value
    pub fn clear(&mut self) -> Result<()> {
        if !self.definition.ty.has_value() {
            return Ok(());
        }
        if self.definition.default_value.is_none() && self.definition.required {
            return Err(GrammarError::Option(format!(
                "Option {} must have a value",
                self.definition.name
            )));
        }
        self.value = None;
        self.post_set();
        Ok(())
    }

    fn post_set(&mut self) {
        self.result = None;
    }

    /// Check the values before they are saved
    pub fn validate(&self, why: Why) -> Result<()> {
        let definition = &self.definition;
        if !definition.ty.has_value() {
            return Ok(());
        }
        let name = Some(definition.name.as_str());
        match &self.value {
            Some(Stored::Single(Slot::Dangerous(_))) => Ok(()),
            Some(Stored::Single(Slot::Plain(value))) => definition.ty.validate(value, name, why),
            Some(Stored::Numbered(map)) => map
                .values()
                .filter_map(|slot| match slot {
                    Slot::Plain(value) => Some(value),
                    Slot::Dangerous(_) => None,
                })
                .try_for_each(|value| definition.ty.validate(value, name, why)),
            None => match self.default_value() {
                Some(default) => definition.ty.validate(default, name, why),
                None if definition.optional => Ok(()),
                None => Err(GrammarError::Option(format!(
                    "Value {} is None and it is not an optional value",
                    definition.name
                ))),
            },
        }
    }

    /// Whether the value is set and differs from the default
    pub fn is_changed(&self) -> bool {
        self.value_and_changed().1
    }

    pub fn value_and_changed(&self) -> (Option<OptionValue>, bool) {
        match self.get_all() {
            Some(value) if self.value.is_some() => {
                let changed = !self.is_it_the_default_value(&value);
                (Some(value), changed)
            }
            default => (default, false),
        }
    }

    /// For numbered arrays, only a sole wildcard can be the default
    pub fn is_it_the_default_value(&self, value: &OptionValue) -> bool {
        let ty = &self.definition.ty;
        match (value, self.default_value()) {
            (OptionValue::Single(value), Some(default)) => ty.is_the_same_value(value, default),
            (OptionValue::Numbered(map), Some(default)) => {
                map.len() == 1
                    && map
                        .get(&ArrayIndex::Default)
                        .is_some_and(|value| ty.is_the_same_value(value, default))
            }
            (_, None) => false,
        }
    }

    /// The value written to the file instead of the option's value
    pub fn set_result(&mut self, value: Value) {
        self.result = Some(value);
    }

    pub fn result(&self) -> Option<OptionValue> {
        match &self.result {
            Some(result) => Some(OptionValue::Single(result.clone())),
            None => self.get_all(),
        }
    }

    /// Write the option, unless it has no value or is an expert option left
    /// at its default
    pub fn write(&self, out: &mut dyn io::Write) -> Result<()> {
        let definition = &self.definition;
        if !definition.ty.has_value() {
            return definition.write(out, &Value::Null);
        }
        if let (Some(Stored::Single(Slot::Dangerous(dangerous))), None) = (&self.value, &self.result) {
            return self.write_dangerous(out, &definition.name, dangerous);
        }
        let Some(value) = self.result() else {
            return Ok(());
        };
        if definition.expert && self.is_it_the_default_value(&value) {
            return Ok(());
        }
        match value {
            OptionValue::Single(value) => definition.write(out, &value),
            OptionValue::Numbered(map) => {
                let slots = match &self.value {
                    Some(Stored::Numbered(slots)) => Some(slots),
                    _ => None,
                };
                for (n, (index, value)) in map.iter().enumerate() {
                    if n > 0 {
                        writeln!(out)?;
                    }
                    let label = match index {
                        ArrayIndex::Default => definition.name.clone(),
                        ArrayIndex::At(i) => format!("{}({})", definition.name, i),
                    };
                    match slots.and_then(|s| s.get(index)) {
                        Some(Slot::Dangerous(dangerous)) => self.write_dangerous(out, &label, dangerous)?,
                        _ => definition.write_as(out, &label, value, definition.ty.as_ref())?,
                    }
                }
                Ok(())
            }
        }
    }

    fn write_dangerous(&self, out: &mut dyn io::Write, label: &str, dangerous: &DangerousValue) -> Result<()> {
        match dangerous.value_type() {
            Some(ty) => self.definition.write_as(out, label, dangerous.value(), ty.as_ref()),
            None => {
                write!(out, "{}={}", label, dangerous.value())?;
                Ok(())
            }
        }
    }

    /// A named (or positional) field of a sequence-typed value
    pub fn field<'k>(&self, key: impl Into<FieldKey<'k>>) -> Result<Value> {
        let access = self.field_access()?;
        let value = self
            .get()
            .ok_or_else(|| GrammarError::Option(format!("Option {} has no value", self.definition.name)))?;
        access.get(&value, key.into()).cloned()
    }

    pub fn set_field<'k>(&mut self, key: impl Into<FieldKey<'k>>, field: Value) -> Result<()> {
        let access = self.field_access()?;
        let value = self
            .get()
            .ok_or_else(|| GrammarError::Option(format!("Option {} has no value", self.definition.name)))?;
        let updated = access.with_field(&value, key.into(), field)?;
        self.set(updated)
    }

    fn field_access(&self) -> Result<FieldAccess> {
        self.definition.ty.field_access().ok_or_else(|| {
            GrammarError::Option(format!("Option {} has no named fields", self.definition.name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Builder, Integer, Sequence};

    fn option(definition: ValueDefinition) -> ConfigOption {
        ConfigOption::new(Arc::new(definition))
    }

    fn written(option: &ConfigOption) -> String {
        let mut out = Vec::new();
        option.write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_set_converts_and_validates() {
        let mut energy = option(ValueDefinition::new("ImE", standard::energy()).with_default(0.0));
        assert_eq!(energy.get(), Some(Value::Real(0.0)));
        energy.set(Value::Integer(5)).unwrap();
        assert_eq!(energy.get(), Some(Value::Real(5.0)));
        assert!(energy.is_changed());
        assert!(energy.set(Value::from("abc")).is_err());
        assert_eq!(written(&energy), "ImE=5.0");
    }

    #[test]
    fn test_clear_required() {
        let mut required = option(ValueDefinition::new("NKTAB", standard::unsigned()).required(true));
        required.set(Value::Integer(3)).unwrap();
        assert!(required.clear().is_err());
        assert!(required.set(Value::Null).is_err());

        let mut with_default = option(
            ValueDefinition::new("NE", standard::unsigned())
                .required(true)
                .with_default(30),
        );
        with_default.set(Value::Integer(3)).unwrap();
        with_default.clear().unwrap();
        assert_eq!(with_default.get(), Some(Value::Integer(30)));
        assert!(!with_default.is_changed());
    }

    #[test]
    fn test_numbered_array() {
        let mut numbered = option(
            ValueDefinition::new("MUEM", standard::real())
                .numbered_array(true)
                .with_default(1.0),
        );
        numbered.set_item(2i64, Value::Real(0.5)).unwrap();
        assert_eq!(numbered.get_item(2i64).unwrap(), Some(Value::Real(0.5)));
        assert_eq!(numbered.get_item(3i64).unwrap(), Some(Value::Real(1.0)));
        assert_eq!(numbered.get(), Some(Value::Real(1.0)));
        numbered.set(Value::Real(2.0)).unwrap();
        assert_eq!(numbered.get(), Some(Value::Real(2.0)));
        assert_eq!(written(&numbered), "MUEM=2.0\nMUEM(2)=0.5");
        numbered.set_item(2i64, Value::Null).unwrap();
        numbered.set_item(ArrayIndex::Default, Value::Null).unwrap();
        assert_eq!(numbered.get_item(2i64).unwrap(), None);
        assert!(!numbered.is_changed());
    }

    #[test]
    fn test_array_access_to_scalar() {
        let mut scalar = option(ValueDefinition::new("NE", standard::integer()));
        let err = scalar.set_item(1i64, Value::Integer(1)).unwrap_err();
        assert_eq!(err.to_string(), "It is not allowed to access NE as array");
        assert!(scalar.get_item(ArrayIndex::Default).is_err());
    }

    #[test]
    fn test_array_index_from_str() {
        assert_eq!("def".parse::<ArrayIndex>().unwrap(), ArrayIndex::Default);
        assert_eq!("3".parse::<ArrayIndex>().unwrap(), ArrayIndex::At(3));
        assert!("x".parse::<ArrayIndex>().is_err());
    }

    #[test]
    fn test_dangerous_value() {
        let mut ime = option(ValueDefinition::new("ImE", standard::energy()));
        assert!(ime.set(Value::from("1J")).is_err());
        ime.set_dangerous(Value::from("1J"), None).unwrap();
        assert!(ime.is_dangerous());
        assert_eq!(ime.get(), Some(Value::from("1J")));
        assert!(ime.validate(Why::Save).is_ok());
        assert_eq!(written(&ime), "ImE=1J");
    }

    #[test]
    fn test_validate_missing_value() {
        let mandatory = option(ValueDefinition::new("NKTAB", standard::unsigned()).optional(false));
        assert!(mandatory.validate(Why::Save).is_err());
        let optional = option(ValueDefinition::new("NKTAB", standard::unsigned()));
        assert!(optional.validate(Why::Save).is_ok());
        assert_eq!(written(&optional), "");
    }

    #[test]
    fn test_flag_output() {
        let mut flag = option(ValueDefinition::new("NONMAG", standard::flag()));
        flag.set(Value::Bool(true)).unwrap();
        assert_eq!(written(&flag), "NONMAG");
        flag.set(Value::Bool(false)).unwrap();
        assert_eq!(written(&flag), "");
    }

    #[test]
    fn test_expert_default_is_not_written() {
        let mut expert = option(
            ValueDefinition::new("NITER", Integer::new().shared())
                .with_default(200)
                .expert(true),
        );
        assert_eq!(written(&expert), "");
        expert.set(Value::Integer(100)).unwrap();
        assert_eq!(written(&expert), "NITER=100");
    }

    #[test]
    fn test_result_overrides_output() {
        let mut site = option(ValueDefinition::new("SITE", standard::integer()));
        site.set(Value::Integer(1)).unwrap();
        site.set_result(Value::Integer(7));
        assert_eq!(written(&site), "SITE=7");
        site.set(Value::Integer(2)).unwrap();
        assert_eq!(written(&site), "SITE=2");
    }

    #[test]
    fn test_named_fields() {
        let ty = Sequence::new(vec![standard::integer(), standard::real()])
            .with_names(&["n", "x"])
            .shared();
        let mut pair = option(ValueDefinition::new("PAIR", ty));
        pair.set(Value::List(vec![1.into(), 2.into()])).unwrap();
        assert_eq!(pair.field("x").unwrap(), Value::Real(2.0));
        pair.set_field("n", Value::Integer(5)).unwrap();
        assert_eq!(pair.field(0usize).unwrap(), Value::Integer(5));
        assert!(pair.field("y").is_err());

        let scalar = option(ValueDefinition::new("NE", standard::integer()));
        assert!(scalar.field("x").is_err());
    }
}
