//! Scalar grammar types: parsing, validation and output

use grammar_types::types::{def_keyword, standard, Builder, Integer, Keyword, Real, RealWithUnits};
use grammar_types::{GrammarContext, GrammarError, GrammarType, MissingValue, Value, Why};
use rstest::rstest;

#[rstest]
#[case("integer", "42", Value::Integer(42))]
#[case("integer", "-7", Value::Integer(-7))]
#[case("unsigned", "3", Value::Integer(3))]
#[case("real", "2.5e-3", Value::Real(0.0025))]
#[case("real", "-1", Value::Real(-1.0))]
#[case("boolean", "F", Value::Bool(false))]
#[case("string", "Fe_3", Value::from("Fe_3"))]
#[case("qstring", "'two words'", Value::from("two words"))]
#[case("line_string", "the rest of the line", Value::from("the rest of the line"))]
fn test_standard_types_parse(#[case] name: &str, #[case] text: &str, #[case] expected: Value) {
    let ty = standard::by_name(name).unwrap();
    assert_eq!(ty.parse(text).unwrap(), expected);
}

#[rstest]
#[case("unsigned", "-1")]
#[case("integer", "1.5")]
#[case("integer", "12abc")]
#[case("boolean", "X")]
#[case("string", "a,b")]
fn test_standard_types_reject(#[case] name: &str, #[case] text: &str) {
    let ty = standard::by_name(name).unwrap();
    let err = ty.parse(text).unwrap_err();
    assert!(err.is_parse_error(), "{} is not a parse error", err);
}

#[test]
fn test_parse_error_has_position() {
    let err = standard::integer().parse("12\n x").unwrap_err();
    match err {
        GrammarError::Parse { line, column, .. } => assert_eq!((line, column), (2, 2)),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_validation_inside_parse_is_noted() {
    let ty = Integer::new().with_min(10);
    let err = ty.parse("5").unwrap_err();
    assert!(err.is_parse_error());
    assert!(err.to_string().contains("Validating of the parsed value failed"));
}

#[test]
fn test_validation_message_names_parameter() {
    let err = standard::unsigned()
        .validate(&Value::Integer(-3), Some("NKTAB"), Why::Set)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Value '-3' for parameter NKTAB of type Unsigned is not valid: A positive value required"
    );
}

#[test]
fn test_keyword_is_caseless_and_canonical() {
    let ty = Keyword::new(["Ry", "eV"]);
    assert_eq!(ty.parse("ry").unwrap(), Value::from("RY"));
    assert_eq!(ty.parse("EV").unwrap(), Value::from("EV"));
    assert!(Keyword::new(["Ry"]).parse("xx").is_err());
    assert_eq!(ty.convert(Value::from("ev")), Value::from("EV"));
    assert!(ty.validate(&Value::from("J"), None, Why::Set).is_err());
}

#[test]
fn test_def_keyword_defaults_to_first() {
    let ty = def_keyword(["SCF", "DOS"]);
    assert_eq!(ty.default_value(), Some(&Value::from("SCF")));
}

#[test]
fn test_flag() {
    let flag = standard::flag();
    assert_eq!(
        flag.missing_value(),
        MissingValue {
            can_be_omitted: true,
            default_if_omitted: Some(Value::Bool(true)),
            suppress_output_for: Some(Value::Bool(false)),
        }
    );
    assert_eq!(flag.parse("").unwrap(), Value::Bool(true));
}

#[test]
fn test_energy_scenario() {
    let energy = standard::energy();
    assert_eq!(energy.parse("1.0 eV").unwrap(), Value::Real(1.0 / 13.605_693_009));
    assert_eq!(energy.parse("2.0").unwrap(), Value::Real(2.0));
    assert_eq!(energy.string(&Value::Real(2.0)), "2.0");
}

#[test]
fn test_units_table() {
    let ty = RealWithUnits::new(vec![(Some("Ry"), 1.0), (Some("mRy"), 0.001), (None, 1.0)]);
    assert_eq!(ty.parse("5 mRy").unwrap(), Value::Real(0.005));
    assert_eq!(ty.grammar_name(), "<float>[Ry|mRy|]");
}

#[test]
fn test_whitespace_context() {
    let tabs_only = GrammarContext {
        whitespace: "\t".to_string(),
        ..GrammarContext::default()
    };
    let ty = Real::new().with_prefix("=");
    assert!(ty.parse_with("=\t1.5", &tabs_only, true).is_ok());
    assert!(ty.parse_with("= 1.5", &tabs_only, true).is_err());
}

#[test]
fn test_grammar_names() {
    let names: Vec<(String, String)> = ["integer", "unsigned", "real", "boolean", "date", "energy", "mixed"]
        .iter()
        .map(|n| (n.to_string(), standard::by_name(n).unwrap().grammar_name()))
        .collect();
    insta::assert_debug_snapshot!(names, @r###"
    [
        (
            "integer",
            "<int>",
        ),
        (
            "unsigned",
            "<+int>",
        ),
        (
            "real",
            "<float>",
        ),
        (
            "boolean",
            "<T|F>",
        ),
        (
            "date",
            "<dd.mm.yyyy>",
        ),
        (
            "energy",
            "<float>[Ry|eV|]",
        ),
        (
            "mixed",
            "<mixed>",
        ),
    ]
    "###);
}
