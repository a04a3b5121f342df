//! Tables: blocks of rows sharing one sequence of column types
//!
//! ```text
//!   IQ     IREFQ       IMQ       NOQ  ITOQ  CONC
//!    1         1         1         1     1 1.000
//!    2         2         2         1     2 1.000
//! ```

use chumsky::prelude::*;
use std::fmt;
use std::sync::Arc;

use super::base::{base_accessors, Condition};
use super::inference::ColumnSpec;
use super::{reformat, standard, Base, GrammarType, Sequence, TypeRef, Why};
use crate::error::Result;
use crate::format::{FormatRule, FormatSpec, Rendered};
use crate::grammar::rules::{boundary, caseless_keyword, delimited, line_ends, rest_of_line, token};
use crate::grammar::{Grammar, GrammarContext};
use crate::value::{values_equal, Dtype, Kind, TableValue, Value};

type HeaderCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// How the header line of a table is matched
#[derive(Clone, Default)]
pub enum FreeHeader {
    /// The header has to list the column names, case-insensitively
    #[default]
    Strict,
    /// Any single line
    Any,
    /// Any single line the check accepts
    Checked(HeaderCheck),
}

impl FreeHeader {
    pub fn checked<F>(check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        FreeHeader::Checked(Arc::new(check))
    }
}

impl fmt::Debug for FreeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreeHeader::Strict => f.write_str("Strict"),
            FreeHeader::Any => f.write_str("Any"),
            FreeHeader::Checked(_) => f.write_str("Checked(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    base: Base,
    names: Option<Vec<String>>,
    header: Option<Vec<String>>,
    free_header: FreeHeader,
    sequence: Sequence,
    numbering: Option<TypeRef>,
    numbering_label: Option<String>,
    named_result: bool,
    length: Option<usize>,
}

impl Table {
    /// A table with named columns; the names make up the header line
    pub fn named<S, C>(columns: Vec<(S, C)>) -> TableBuilder
    where
        S: Into<String>,
        C: Into<ColumnSpec>,
    {
        let (names, columns): (Vec<String>, Vec<ColumnSpec>) =
            columns.into_iter().map(|(n, c)| (n.into(), c.into())).unzip();
        TableBuilder::new(Some(names), columns)
    }

    /// A table with anonymous columns and no header
    pub fn positional<C: Into<ColumnSpec>>(columns: Vec<C>) -> TableBuilder {
        TableBuilder::new(None, columns.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn number_of_columns(&self) -> usize {
        self.sequence.types().len()
    }

    /// The layout of the values: homogeneous when all the columns are of one
    /// kind, unless named results are required
    pub fn dtype(&self) -> Dtype {
        let kinds: Vec<Kind> = self.sequence.types().iter().map(|t| t.kind()).collect();
        let named = self.names.is_some() && self.named_result;
        if !named {
            if let Some(first) = kinds.first() {
                if kinds.iter().all(|k| k == first) {
                    return Dtype::Homogeneous(*first);
                }
            }
        }
        let fields = kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| {
                let name = self
                    .names
                    .as_ref()
                    .and_then(|names| names.get(i).cloned())
                    .unwrap_or_else(|| format!("f{}", i));
                (name, kind)
            })
            .collect();
        Dtype::Structured(fields)
    }

    /// A table of the given number of rows filled with zeros
    pub fn zero_data(&self, rows: usize) -> Value {
        let row: Vec<Value> = self.sequence.types().iter().map(|t| t.kind().zero()).collect();
        Value::Table(TableValue::new(self.dtype(), vec![row; rows]))
    }

    fn header_grammar(&self, ctx: &GrammarContext) -> Option<BoxedParser<'static, char, (), Simple<char>>> {
        let header = self.header.as_ref()?;
        let grammar = match &self.free_header {
            FreeHeader::Strict => {
                // the column names are matched even under custom labels
                let labels = self.names.as_ref().unwrap_or(header);
                let words = self
                    .numbering_label
                    .iter()
                    .chain(labels)
                    .flat_map(|name| name.split_whitespace())
                    .map(str::to_string)
                    .collect::<Vec<_>>();
                words
                    .into_iter()
                    .fold(empty().boxed(), |acc, word| {
                        acc.then_ignore(token(ctx, caseless_keyword(&word).then_ignore(boundary())))
                            .boxed()
                    })
                    .then_ignore(line_ends(ctx))
                    .boxed()
            }
            FreeHeader::Any => rest_of_line().ignored().then_ignore(line_ends(ctx)).boxed(),
            FreeHeader::Checked(check) => {
                let check = check.clone();
                rest_of_line()
                    .try_map(move |line, span| {
                        if check(&line) {
                            Ok(())
                        } else {
                            Err(Simple::custom(
                                span,
                                format!("This is not an allowed header for the table: {}", line),
                            ))
                        }
                    })
                    .then_ignore(line_ends(ctx))
                    .boxed()
            }
        };
        Some(grammar)
    }

    fn header_string(&self, header: &[String]) -> String {
        let columns: String = header
            .iter()
            .zip(self.sequence.types())
            .map(|(name, ty)| {
                let name = Rendered::Text(name.clone());
                match &ty.base().format {
                    Some(spec) => format!(" {}", spec.apply(&name)),
                    None => format!(" {}", name),
                }
            })
            .collect();
        match &self.numbering {
            Some(numbering) => {
                let label = Value::from(self.numbering_label.clone().unwrap_or_default());
                format!("{}{}", numbering.string(&label), columns)
            }
            None => columns.chars().skip(1).collect(),
        }
    }
}

impl GrammarType for Table {
    base_accessors!();

    fn type_name(&self) -> String {
        "Table".to_string()
    }

    fn grammar_name(&self) -> String {
        let data = match &self.names {
            Some(names) => names
                .iter()
                .zip(self.sequence.types())
                .map(|(name, ty)| format!("{}:{}", name, ty.grammar_name()))
                .collect::<Vec<_>>()
                .join(" "),
            None => self.sequence.grammar_name(),
        };
        format!("<TABLE of {}>", data)
    }

    fn value_grammar(&self, ctx: &GrammarContext) -> Grammar {
        let row = self.sequence.grammar(ctx);
        let line = match &self.numbering {
            Some(numbering) => numbering.grammar(ctx).map(Some).then(row).boxed(),
            None => row.map(|row| (None, row)).boxed(),
        };
        let dtype = self.dtype();
        let rows = delimited(line, line_ends(ctx)).try_map(move |lines, span| {
            let mut rows = Vec::with_capacity(lines.len());
            for (i, (number, row)) in lines.into_iter().enumerate() {
                let expected = i as i64 + 1;
                if let Some(number) = number.filter(|n| n.as_i64() != Some(expected)) {
                    log::debug!("Table row {} is numbered {}", expected, number);
                    return Err(Simple::custom(
                        span,
                        format!(
                            "First column should contain row numbering (row {} is numbered {})",
                            expected, number
                        ),
                    ));
                }
                rows.push(row.into_elements().unwrap_or_default());
            }
            Ok(Value::Table(TableValue::new(dtype.clone(), rows)))
        });
        match self.header_grammar(ctx) {
            Some(header) => header.ignore_then(rows).boxed(),
            None => rows.boxed(),
        }
    }

    fn coerce(&self, value: Value) -> Value {
        let rows = match value {
            Value::Table(table) => table.into_rows(),
            Value::Array(rows) | Value::List(rows) | Value::Tuple(rows)
                if rows.iter().all(|r| r.elements().is_some()) =>
            {
                rows.into_iter().filter_map(Value::into_elements).collect()
            }
            other => return other,
        };
        let types = self.sequence.types();
        let rows = rows
            .into_iter()
            .map(|row| {
                if row.len() != types.len() {
                    return row;
                }
                row.into_iter().zip(types).map(|(v, t)| t.convert(v)).collect()
            })
            .collect();
        Value::Table(TableValue::new(self.dtype(), rows))
    }

    fn check(&self, value: &Value, why: Why) -> std::result::Result<(), String> {
        let Value::Table(table) = value else {
            return Err(format!("An array as a value required, {} given", value.type_label()));
        };
        let dtype = self.dtype();
        if table.ndim() != dtype.ndim() {
            return Err(format!(
                "The array should have dimension={}, it has dimension {}",
                dtype.ndim(),
                table.ndim()
            ));
        }
        if table.dtype() != &dtype {
            return Err(format!(
                "The data type of the value should be {}, it is {}",
                dtype,
                table.dtype()
            ));
        }
        let columns = self.number_of_columns();
        if let Some(row) = table.rows().iter().find(|row| row.len() != columns) {
            return Err(format!(
                "The array is required to have {} columns, it has {}",
                columns,
                row.len()
            ));
        }
        if let Some(length) = self.length.filter(|l| *l != table.len()) {
            return Err(format!(
                "The array is required to have {} rows, it has {}",
                length,
                table.len()
            ));
        }
        if why != Why::Parse {
            for (i, row) in table.rows().iter().enumerate() {
                self.sequence
                    .validate(&Value::Tuple(row.clone()), None, why)
                    .map_err(|e| format!("Row {}: {}", i + 1, e))?;
            }
        }
        Ok(())
    }

    fn render(&self, value: &Value) -> Rendered {
        let mut out = Vec::new();
        if let Some(header) = &self.header {
            out.push(self.header_string(header));
        }
        if let Some(table) = value.as_table() {
            for (i, row) in table.rows().iter().enumerate() {
                let number = match &self.numbering {
                    Some(numbering) => numbering.string(&Value::Integer(i as i64 + 1)),
                    None => String::new(),
                };
                out.push(format!("{}{}", number, self.sequence.string(&Value::Tuple(row.clone()))));
            }
        }
        Rendered::Text(out.join("\n"))
    }

    fn name_in_grammar(&self) -> bool {
        false
    }

    fn is_the_same_value(&self, a: &Value, b: &Value) -> bool {
        values_equal(a, b)
    }
}

const NUMBERING_FORMAT: &str = "<4";

/// Construction of a [`Table`]
pub struct TableBuilder {
    names: Option<Vec<String>>,
    columns: Vec<ColumnSpec>,
    header: Option<Vec<String>>,
    free_header: FreeHeader,
    numbering: Option<TypeRef>,
    numbering_label: Option<String>,
    /// `None` until set; `Some(None)` keeps the numbering type's format
    numbering_format: Option<Option<String>>,
    length: Option<usize>,
    format: FormatRule,
    format_all: bool,
    named_result: bool,
    default_values: bool,
    row_condition: Option<Condition>,
}

impl TableBuilder {
    fn new(names: Option<Vec<String>>, columns: Vec<ColumnSpec>) -> Self {
        TableBuilder {
            header: names.clone(),
            names,
            columns,
            free_header: FreeHeader::Strict,
            numbering: None,
            numbering_label: None,
            numbering_format: None,
            length: None,
            format: FormatRule::table_default(),
            format_all: true,
            named_result: false,
            default_values: false,
            row_condition: None,
        }
    }

    /// Labels of the header line, instead of the column names
    pub fn header<S: Into<String>>(mut self, header: Vec<S>) -> Self {
        self.header = Some(header.into_iter().map(Into::into).collect());
        self
    }

    /// Neither read nor write a header line
    pub fn no_header(mut self) -> Self {
        self.header = None;
        self
    }

    pub fn free_header(mut self, free_header: FreeHeader) -> Self {
        self.free_header = free_header;
        self
    }

    /// Prefix every row with its number, counting from 1
    pub fn numbering(mut self, numbering: bool) -> Self {
        self.numbering = numbering.then(standard::unsigned);
        self
    }

    pub fn numbering_type(mut self, numbering: TypeRef) -> Self {
        self.numbering = Some(numbering);
        self
    }

    /// The header label of the numbering column; enables the numbering
    pub fn numbering_label(mut self, label: impl Into<String>) -> Self {
        self.numbering_label = Some(label.into());
        if self.numbering.is_none() {
            self.numbering = Some(standard::unsigned());
        }
        self
    }

    /// The format of the row numbers; `None` keeps the numbering type's own.
    /// Unless set, a numbering type without a format gets `<4`.
    pub fn numbering_format(mut self, format: Option<&str>) -> Self {
        self.numbering_format = Some(format.map(str::to_string));
        self
    }

    /// The exact number of rows
    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn format(mut self, format: impl Into<FormatRule>) -> Self {
        self.format = format.into();
        self
    }

    /// Reformat also the columns given by a grammar type
    pub fn format_all(mut self, format_all: bool) -> Self {
        self.format_all = format_all;
        self
    }

    /// Structured rows even when all the columns are of one kind
    pub fn named_result(mut self, named_result: bool) -> Self {
        self.named_result = named_result;
        self
    }

    pub fn default_values(mut self, default_values: bool) -> Self {
        self.default_values = default_values;
        self
    }

    /// A check of every row, given as a tuple
    pub fn row_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.row_condition = Some(Arc::new(condition));
        self
    }

    pub fn build(self) -> Result<Table> {
        let mut sequence = Sequence::from_columns(self.columns, &self.format, self.format_all)?
            .with_default_values(self.default_values);
        sequence.base_mut().condition = self.row_condition;
        let numbering = match self.numbering {
            Some(numbering) => {
                let format = match self.numbering_format {
                    Some(format) => format,
                    None => numbering
                        .base()
                        .format
                        .is_none()
                        .then(|| NUMBERING_FORMAT.to_string()),
                };
                match format {
                    Some(format) => Some(reformat(&numbering, Some(format.parse::<FormatSpec>()?))),
                    None => Some(numbering),
                }
            }
            None => None,
        };
        Ok(Table {
            base: Base::default(),
            names: self.names,
            header: self.header,
            free_header: self.free_header,
            sequence,
            numbering,
            numbering_label: self.numbering_label,
            named_result: self.named_result,
            length: self.length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Builder, Unsigned};

    fn occupation() -> Table {
        Table::named(vec![
            ("IQ", ColumnSpec::from(standard::unsigned())),
            ("CONC", standard::real().into()),
        ])
        .build()
        .unwrap()
    }

    #[test]
    fn test_named_table_with_header() {
        let table = occupation();
        let value = table.parse("IQ CONC\n1 1.000\n2 0.500").unwrap();
        let data = value.as_table().unwrap();
        assert_eq!(data.column(0).unwrap(), vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(data.column(1).unwrap(), vec![Value::Real(1.0), Value::Real(0.5)]);
        assert_eq!(
            data.dtype(),
            &Dtype::Structured(vec![("IQ".to_string(), Kind::Int), ("CONC".to_string(), Kind::Float)])
        );
        assert!(table.parse("IQ CON\n1 1.000").is_err());
        assert_eq!(table.grammar_name(), "<TABLE of IQ:<+int> CONC:<float>>");
    }

    #[test]
    fn test_header_is_caseless_and_may_span_words() {
        let table = Table::named(vec![("IQ IREFQ", Kind::Int), ("CONC", Kind::Float)])
            .build()
            .unwrap();
        assert!(table.parse("iq irefq conc\n1 2.0").is_ok());
        assert!(table.parse("IQ CONC\n1 2.0").is_err());
    }

    #[test]
    fn test_row_numbering() {
        let table = Table::positional(vec![Kind::Float]).numbering(true).build().unwrap();
        assert!(table.parse("1 0.5\n2 0.25\n3 1.0").is_ok());
        let err = table.parse("1 0.5\n3 0.25\n2 1.0").unwrap_err();
        assert!(err.to_string().contains("First column should contain row numbering"));
        assert!(table.parse("1 0.5\n2 0.25\n4 1.0").is_err());
    }

    #[test]
    fn test_free_header() {
        let any = Table::named(vec![("A", Kind::Int)])
            .free_header(FreeHeader::Any)
            .build()
            .unwrap();
        assert!(any.parse("whatever here\n1\n2").is_ok());
        let checked = Table::named(vec![("A", Kind::Int)])
            .free_header(FreeHeader::checked(|h| h.starts_with('#')))
            .build()
            .unwrap();
        assert!(checked.parse("# ok\n1").is_ok());
        assert!(checked.parse("no\n1").is_err());
    }

    #[test]
    fn test_homogeneous_dtype_and_validation() {
        let table = Table::positional(vec![Kind::Int, Kind::Int]).length(2).build().unwrap();
        assert_eq!(table.dtype(), Dtype::Homogeneous(Kind::Int));
        let value = table.convert(Value::List(vec![
            Value::List(vec![1.into(), 2.into()]),
            Value::List(vec![3.into(), 4.into()]),
        ]));
        assert!(table.validate(&value, None, Why::Set).is_ok());
        let err = table.validate(&table.zero_data(3), None, Why::Set).unwrap_err();
        assert!(err.to_string().ends_with("The array is required to have 2 rows, it has 3"));
        assert!(table.validate(&Value::Integer(1), None, Why::Set).is_err());
    }

    #[test]
    fn test_dtype_mismatch() {
        let ints = Table::positional(vec![Kind::Int, Kind::Int]).build().unwrap();
        let named = Table::named(vec![("A", Kind::Int), ("B", Kind::Int)])
            .named_result(true)
            .build()
            .unwrap();
        let err = named.validate(&ints.zero_data(1), None, Why::Set).unwrap_err();
        assert!(err.to_string().contains("The array should have dimension=1"));
    }

    #[test]
    fn test_render_with_numbering() {
        let table = Table::named(vec![("A", Kind::Int), ("B", Kind::Int)])
            .numbering_label("N")
            .format(">3")
            .build()
            .unwrap();
        let value = table.parse("N A B\n1 5 6\n2 7 8").unwrap();
        assert_eq!(table.string(&value), "N      A   B\n1      5   6\n2      7   8");
        assert_eq!(table.parse(&table.string(&value)).unwrap(), value);
    }

    #[test]
    fn test_custom_header_reads_column_names() {
        let table = Table::named(vec![("IQ", Kind::Int), ("CONC", Kind::Float)])
            .header(vec!["A", "B"])
            .build()
            .unwrap();
        let value = table.parse("IQ CONC\n1 1.0").unwrap();
        assert_eq!(value.as_table().unwrap().rows()[0], vec![Value::Integer(1), Value::Real(1.0)]);
        assert!(table.parse("A B\n1 1.0").is_err());
        assert!(table.string(&value).trim_start().starts_with('A'));
    }

    #[test]
    fn test_numbering_type_keeps_its_format() {
        let numbering = Unsigned::new().with_format(">2".parse().unwrap()).shared();
        let value = Value::List(vec![Value::List(vec![5.into()]), Value::List(vec![7.into()])]);

        let own = Table::positional(vec![Kind::Int])
            .numbering_type(numbering.clone())
            .build()
            .unwrap();
        let value = own.convert(value);
        let text = own.string(&value);
        assert!(text.starts_with(" 1"), "{:?}", text);
        assert!(values_equal(&own.parse(&text).unwrap(), &value));

        let explicit = Table::positional(vec![Kind::Int])
            .numbering_type(numbering)
            .numbering_format(Some("<4"))
            .build()
            .unwrap();
        assert!(explicit.string(&value).starts_with("1   "));

        let plain = Table::positional(vec![Kind::Int]).numbering(true).build().unwrap();
        assert!(plain.string(&value).starts_with("1   "));
    }

    #[test]
    fn test_zero_data() {
        let table = occupation();
        let zeros = table.zero_data(2);
        let data = zeros.as_table().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.rows()[0], vec![Value::Integer(0), Value::Real(0.0)]);
        assert_eq!(table.number_of_columns(), 2);
    }
}
