//! Configuration options holding values of grammar types

use std::collections::BTreeMap;
use std::sync::Arc;

use grammar_types::types::{standard, Builder, Table};
use grammar_types::{ArrayIndex, ConfigOption, GrammarType, Kind, OptionValue, Value, ValueDefinition, Why};

fn option(definition: ValueDefinition) -> ConfigOption {
    ConfigOption::new(Arc::new(definition))
}

fn written(options: &[&ConfigOption]) -> String {
    let mut out = Vec::new();
    for option in options {
        option.write(&mut out).unwrap();
        out.push(b'\n');
    }
    String::from_utf8(out).unwrap()
}

#[test]
fn test_section_output() {
    let mut nktab = option(ValueDefinition::new("NKTAB", standard::unsigned()).with_default(250));
    let mut nonmag = option(ValueDefinition::new("NONMAG", standard::flag()));
    let mut mode = option(ValueDefinition::new("MODE", standard::string()));
    nktab.set(Value::Integer(500)).unwrap();
    nonmag.set(Value::Bool(true)).unwrap();
    mode.set(Value::from("SP-SREL")).unwrap();
    insta::assert_snapshot!(written(&[&nktab, &nonmag, &mode]).trim_end(), @r###"
    NKTAB=500
    NONMAG
    MODE=SP-SREL
    "###);
}

#[test]
fn test_set_all_replaces_numbered_values() {
    let mut muem = option(ValueDefinition::new("MUEM", standard::real()).numbered_array(true));
    muem.set_item(5i64, Value::Real(0.1)).unwrap();
    muem.set_all(BTreeMap::from([
        (ArrayIndex::Default, Value::Integer(1)),
        (ArrayIndex::At(3), Value::Real(0.2)),
    ]))
    .unwrap();
    let expected = BTreeMap::from([
        (ArrayIndex::Default, Value::Real(1.0)),
        (ArrayIndex::At(3), Value::Real(0.2)),
    ]);
    assert_eq!(muem.get_all(), Some(OptionValue::Numbered(expected)));
    assert_eq!(muem.get_item(5i64).unwrap(), None);
}

#[test]
fn test_dangerous_item_of_numbered_array() {
    let mut muem = option(ValueDefinition::new("MUEM", standard::real()).numbered_array(true));
    muem.set(Value::Real(2.0)).unwrap();
    muem.set_dangerous(Value::from("x"), Some(ArrayIndex::At(2))).unwrap();
    assert!(muem.is_dangerous());
    assert!(muem.validate(Why::Save).is_ok());
    assert_eq!(written(&[&muem]), "MUEM=2.0\nMUEM(2)=x\n");
}

#[test]
fn test_dangerous_value_still_checked_by_loose_type() {
    let mut ne = option(ValueDefinition::new("NE", standard::unsigned()));
    let not_a_value = Value::List(vec![Value::from("a")]);
    assert!(ne.set_dangerous(not_a_value.clone(), None).is_err());

    let mut anything = option(ValueDefinition::new("NE", standard::unsigned()).type_of_dangerous(None));
    anything.set_dangerous(not_a_value, None).unwrap();
    assert_eq!(anything.get(), Some(Value::from("['a']")));
}

#[test]
fn test_value_and_changed() {
    let mut ne = option(ValueDefinition::new("NE", standard::unsigned()).with_default(30));
    assert_eq!(ne.value_and_changed(), (Some(OptionValue::Single(Value::Integer(30))), false));
    ne.set(Value::Integer(30)).unwrap();
    assert!(!ne.is_changed());
    ne.set(Value::Integer(31)).unwrap();
    assert_eq!(ne.value_and_changed(), (Some(OptionValue::Single(Value::Integer(31))), true));
}

#[test]
fn test_table_option_is_written_without_name() {
    let table = Table::named(vec![("IQ", Kind::Int), ("CONC", Kind::Float)])
        .build()
        .unwrap()
        .shared();
    let mut occupation = option(ValueDefinition::new("OCCUPATION", table.clone()));
    occupation
        .set(Value::List(vec![
            Value::List(vec![1.into(), 1.0.into()]),
            Value::List(vec![2.into(), 0.5.into()]),
        ]))
        .unwrap();
    let text = written(&[&occupation]);
    assert!(text.trim_start().starts_with("IQ"));
    assert!(!text.contains("OCCUPATION"));
    let value = occupation.get().unwrap();
    assert_eq!(table.parse(&text).unwrap(), value);
}
