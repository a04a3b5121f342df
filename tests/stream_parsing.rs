//! Reading values from async streams

use grammar_types::stream::parse_from_stream_with;
use grammar_types::types::{standard, Table};
use grammar_types::{parse_from_stream, GrammarContext, GrammarError, Kind, Value};
use tokio::io::BufReader;

#[tokio::test]
async fn test_consecutive_values() {
    let mut reader = BufReader::new(&b"5;2.5;word;"[..]);
    let integer = parse_from_stream(standard::integer().as_ref(), &mut reader, ";", None)
        .await
        .unwrap();
    let real = parse_from_stream(standard::real().as_ref(), &mut reader, ";", None)
        .await
        .unwrap();
    let word = parse_from_stream(standard::string().as_ref(), &mut reader, ";", None)
        .await
        .unwrap();
    assert_eq!((integer, real, word), (Value::Integer(5), Value::Real(2.5), Value::from("word")));
}

#[tokio::test]
async fn test_table_up_to_end_marker() {
    let table = Table::named(vec![("IQ", Kind::Int), ("CONC", Kind::Float)])
        .build()
        .unwrap();
    let mut reader = BufReader::new(&b"IQ CONC\n1 1.0\n2 0.5\nEND\n"[..]);
    let value = parse_from_stream(&table, &mut reader, "\nEND\n", None).await.unwrap();
    assert_eq!(value.as_table().unwrap().len(), 2);
}

#[tokio::test]
async fn test_start_is_prepended() {
    let mut reader = BufReader::new(&b"2}"[..]);
    let value = parse_from_stream(standard::set_of_integers().as_ref(), &mut reader, "}", Some("{1,"))
        .await;
    // the delimiter is consumed, so the closing brace has to be given again
    assert!(value.is_err());

    let mut reader = BufReader::new(&b"2};"[..]);
    let value = parse_from_stream(standard::set_of_integers().as_ref(), &mut reader, ";", Some("{1,"))
        .await
        .unwrap();
    assert_eq!(value, Value::Array(vec![1.into(), 2.into()]));
}

#[tokio::test]
async fn test_partial_parse_of_stream() {
    let ctx = GrammarContext::default();
    let mut reader = BufReader::new(&b"12 trailing\n"[..]);
    let value = parse_from_stream_with(standard::integer().as_ref(), &mut reader, "\n", None, &ctx, false)
        .await
        .unwrap();
    assert_eq!(value, Value::Integer(12));
}

#[tokio::test]
async fn test_empty_delimiter() {
    let mut reader = BufReader::new(&b"12"[..]);
    let err = parse_from_stream(standard::integer().as_ref(), &mut reader, "", None)
        .await
        .unwrap_err();
    assert!(matches!(err, GrammarError::Option(_)));
}
