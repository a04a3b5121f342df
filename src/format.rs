//! Output formatting of rendered values
//!
//! Column layouts are described by compact format specifications (`>21.17`,
//! `<4`, `>16`), which [`FormatSpec`] parses and applies:
//!
//! ```text
//! [[fill]align][sign][#][0][width][,][.precision][type]
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::{GrammarError, Result};
use crate::value::Kind;

static SPEC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?P<fill>.)?(?P<align>[<>=^]))?(?P<sign>[+\- ])?(?P<alt>#)?(?P<zero>0)?(?P<width>\d+)?(?P<group>,)?(?:\.(?P<prec>\d+))?(?P<type>[bcdeEfFgGnosxX%])?$",
    )
    .unwrap()
});

/// What a grammar type renders before the prefix, postfix and format are applied
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Text(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendered::Text(s) => f.write_str(s),
            Rendered::Int(i) => write!(f, "{}", i),
            Rendered::Float(x) => f.write_str(&float_repr(*x)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
    /// Padding goes between the sign and the digits
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sign {
    #[default]
    Negative,
    Always,
    Space,
}

/// A parsed format specification
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormatSpec {
    fill: Option<char>,
    align: Option<Align>,
    sign: Sign,
    alternate: bool,
    zero: bool,
    width: usize,
    grouping: bool,
    precision: Option<usize>,
    kind: Option<char>,
}

impl FromStr for FormatSpec {
    type Err = GrammarError;

    fn from_str(spec: &str) -> Result<Self> {
        let caps = SPEC_RE
            .captures(spec)
            .ok_or_else(|| GrammarError::InvalidFormat(spec.to_string()))?;
        let number = |name: &str| -> Result<Option<usize>> {
            caps.name(name)
                .map(|m| {
                    m.as_str()
                        .parse::<usize>()
                        .map_err(|_| GrammarError::InvalidFormat(spec.to_string()))
                })
                .transpose()
        };
        Ok(FormatSpec {
            fill: caps.name("fill").and_then(|m| m.as_str().chars().next()),
            align: caps.name("align").map(|m| match m.as_str() {
                "<" => Align::Left,
                ">" => Align::Right,
                "^" => Align::Center,
                _ => Align::AfterSign,
            }),
            sign: match caps.name("sign").map(|m| m.as_str()) {
                Some("+") => Sign::Always,
                Some(" ") => Sign::Space,
                _ => Sign::Negative,
            },
            alternate: caps.name("alt").is_some(),
            zero: caps.name("zero").is_some(),
            width: number("width")?.unwrap_or(0),
            grouping: caps.name("group").is_some(),
            precision: number("prec")?,
            kind: caps.name("type").and_then(|m| m.as_str().chars().next()),
        })
    }
}

impl FormatSpec {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn precision(&self) -> Option<usize> {
        self.precision
    }

    /// Format a rendered value
    pub fn apply(&self, value: &Rendered) -> String {
        match value {
            Rendered::Text(text) => {
                let text = match self.precision {
                    Some(p) => text.chars().take(p).collect(),
                    None => text.clone(),
                };
                self.pad(String::new(), text, Align::Left)
            }
            Rendered::Int(i) => match self.kind {
                Some('e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') => self.apply_float(*i as f64),
                _ => {
                    let digits = match self.kind {
                        Some('x') => format!("{:x}", i.unsigned_abs()),
                        Some('X') => format!("{:X}", i.unsigned_abs()),
                        Some('o') => format!("{:o}", i.unsigned_abs()),
                        Some('b') => format!("{:b}", i.unsigned_abs()),
                        _ => i.unsigned_abs().to_string(),
                    };
                    let digits = if self.grouping { group_thousands(&digits) } else { digits };
                    self.pad(self.sign_prefix(*i < 0), digits, Align::Right)
                }
            },
            Rendered::Float(x) => self.apply_float(*x),
        }
    }

    fn apply_float(&self, x: f64) -> String {
        let negative = x.is_sign_negative() && !x.is_nan();
        let x = x.abs();
        let body = if x.is_nan() {
            "nan".to_string()
        } else if x.is_infinite() {
            "inf".to_string()
        } else {
            match self.kind {
                Some('f' | 'F') => format!("{:.*}", self.precision.unwrap_or(6), x),
                Some('e') => exponent_form(x, self.precision.unwrap_or(6)),
                Some('E') => exponent_form(x, self.precision.unwrap_or(6)).to_uppercase(),
                Some('g') => general_form(x, self.precision.unwrap_or(6), self.alternate, false),
                Some('G') => {
                    general_form(x, self.precision.unwrap_or(6), self.alternate, false).to_uppercase()
                }
                Some('%') => format!("{:.*}%", self.precision.unwrap_or(6), x * 100.0),
                _ => match self.precision {
                    Some(p) => general_form(x, p, self.alternate, true),
                    None => float_repr(x),
                },
            }
        };
        let body = if self.grouping { group_float(&body) } else { body };
        self.pad(self.sign_prefix(negative), body, Align::Right)
    }

    fn sign_prefix(&self, negative: bool) -> String {
        match (negative, self.sign) {
            (true, _) => "-".to_string(),
            (false, Sign::Always) => "+".to_string(),
            (false, Sign::Space) => " ".to_string(),
            (false, Sign::Negative) => String::new(),
        }
    }

    fn pad(&self, sign: String, body: String, natural: Align) -> String {
        let len = sign.chars().count() + body.chars().count();
        if len >= self.width {
            return sign + &body;
        }
        let missing = self.width - len;
        let (fill, align) = match (self.align, self.zero) {
            (Some(align), _) => (self.fill.unwrap_or(' '), align),
            (None, true) if natural == Align::Right => (self.fill.unwrap_or('0'), Align::AfterSign),
            (None, _) => (self.fill.unwrap_or(' '), natural),
        };
        let padding = |n: usize| std::iter::repeat(fill).take(n).collect::<String>();
        match align {
            Align::Left => sign + &body + &padding(missing),
            Align::Right => padding(missing) + &sign + &body,
            Align::Center => {
                let left = missing / 2;
                padding(left) + &sign + &body + &padding(missing - left)
            }
            Align::AfterSign => sign + &padding(missing) + &body,
        }
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(align) = self.align {
            if let Some(fill) = self.fill {
                write!(f, "{}", fill)?;
            }
            let align = match align {
                Align::Left => '<',
                Align::Right => '>',
                Align::Center => '^',
                Align::AfterSign => '=',
            };
            write!(f, "{}", align)?;
        }
        match self.sign {
            Sign::Always => f.write_str("+")?,
            Sign::Space => f.write_str(" ")?,
            Sign::Negative => {}
        }
        if self.alternate {
            f.write_str("#")?;
        }
        if self.zero {
            f.write_str("0")?;
        }
        if self.width > 0 {
            write!(f, "{}", self.width)?;
        }
        if self.grouping {
            f.write_str(",")?;
        }
        if let Some(p) = self.precision {
            write!(f, ".{}", p)?;
        }
        if let Some(kind) = self.kind {
            write!(f, "{}", kind)?;
        }
        Ok(())
    }
}

/// Shortest round-trip representation of a float, as the files expect it:
/// `1.0`, `0.5`, `1e-05`, `1.5e+20`
pub fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let exponent = decimal_exponent(&format!("{:e}", x));
    if x != 0.0 && !(-4..16).contains(&exponent) {
        let scientific = format!("{:e}", x);
        let (mantissa, _) = scientific.split_once('e').unwrap_or((&scientific, "0"));
        return format!("{}e{}", mantissa, exponent_suffix(exponent));
    }
    let plain = format!("{}", x);
    if plain.contains('.') {
        plain
    } else {
        plain + ".0"
    }
}

fn decimal_exponent(scientific: &str) -> i32 {
    scientific
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0)
}

fn exponent_suffix(exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}{:02}", sign, exponent.abs())
}

fn exponent_form(x: f64, precision: usize) -> String {
    let scientific = format!("{:.*e}", precision, x);
    let (mantissa, _) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    format!("{}e{}", mantissa, exponent_suffix(decimal_exponent(&scientific)))
}

/// The `g` presentation; `min_decimal` keeps one digit after the point when no
/// type is given
fn general_form(x: f64, precision: usize, keep_zeros: bool, min_decimal: bool) -> String {
    let precision = precision.max(1);
    let exponent = if x == 0.0 {
        0
    } else {
        decimal_exponent(&format!("{:.*e}", precision - 1, x))
    };
    if exponent >= -4 && (exponent as i64) < precision as i64 {
        let decimals = (precision as i64 - 1 - exponent as i64).max(0) as usize;
        let mut fixed = format!("{:.*}", decimals, x);
        if !keep_zeros {
            fixed = strip_zeros(fixed);
        }
        if min_decimal && !fixed.contains('.') {
            fixed.push_str(".0");
        }
        fixed
    } else {
        let scientific = format!("{:.*e}", precision - 1, x);
        let (mantissa, _) = scientific.split_once('e').unwrap_or((&scientific, "0"));
        let mantissa = if keep_zeros {
            mantissa.to_string()
        } else {
            strip_zeros(mantissa.to_string())
        };
        format!("{}e{}", mantissa, exponent_suffix(exponent))
    }
}

fn strip_zeros(number: String) -> String {
    if !number.contains('.') {
        return number;
    }
    number.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::new();
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn group_float(body: &str) -> String {
    let split = body.find(|c: char| !c.is_ascii_digit()).unwrap_or(body.len());
    group_thousands(&body[..split]) + &body[split..]
}

/// The output format of a column: one spec for all kinds, or a spec per kind
/// with a fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatRule {
    Fixed(String),
    PerKind {
        kinds: Vec<(Kind, String)>,
        fallback: String,
    },
}

impl FormatRule {
    /// The default column layout of tables: wide reals, right-aligned rest
    pub fn table_default() -> Self {
        FormatRule::PerKind {
            kinds: vec![(Kind::Float, ">21.17".to_string())],
            fallback: ">16".to_string(),
        }
    }

    /// The format appropriate to the given kind
    pub fn for_kind(&self, kind: Kind) -> &str {
        match self {
            FormatRule::Fixed(spec) => spec,
            FormatRule::PerKind { kinds, fallback } => kinds
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, spec)| spec.as_str())
                .unwrap_or(fallback),
        }
    }

    /// Parsed spec for a kind, `None` when the rule leaves the kind unformatted
    pub fn spec_for(&self, kind: Kind) -> Result<Option<FormatSpec>> {
        let spec = self.for_kind(kind);
        if spec.is_empty() {
            Ok(None)
        } else {
            spec.parse().map(Some)
        }
    }
}

impl Default for FormatRule {
    fn default() -> Self {
        FormatRule::Fixed(String::new())
    }
}

impl From<&str> for FormatRule {
    fn from(spec: &str) -> Self {
        FormatRule::Fixed(spec.to_string())
    }
}

impl From<String> for FormatRule {
    fn from(spec: String) -> Self {
        FormatRule::Fixed(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn spec(s: &str) -> FormatSpec {
        s.parse().unwrap()
    }

    #[rstest]
    #[case(1.0, "1.0")]
    #[case(0.5, "0.5")]
    #[case(1e-5, "1e-05")]
    #[case(1.5e20, "1.5e+20")]
    #[case(123.456, "123.456")]
    #[case(-2.0, "-2.0")]
    #[case(1e16, "1e+16")]
    fn test_float_repr(#[case] x: f64, #[case] expected: &str) {
        assert_eq!(float_repr(x), expected);
    }

    #[rstest]
    #[case(">21.17", 1.0, "                  1.0")]
    #[case(">21.17", 0.1, "  0.10000000000000001")]
    #[case(".3", 1234.5, "1.23e+03")]
    #[case(".3f", 2.0, "2.000")]
    #[case(".2e", 12346.0, "1.23e+04")]
    #[case("g", 0.0001, "0.0001")]
    #[case("+.1f", 3.0, "+3.0")]
    #[case("010.2f", -3.5, "-000003.50")]
    fn test_float_formats(#[case] format: &str, #[case] x: f64, #[case] expected: &str) {
        assert_eq!(spec(format).apply(&Rendered::Float(x)), expected);
    }

    #[rstest]
    #[case("<4", Rendered::Int(1), "1   ")]
    #[case(">16", Rendered::Int(42), "              42")]
    #[case(">5", Rendered::Text("T".into()), "    T")]
    #[case("5", Rendered::Text("ab".into()), "ab   ")]
    #[case(">6.3", Rendered::Text("CONCENTRATION".into()), "   CON")]
    #[case("*^7", Rendered::Text("IQ".into()), "**IQ***")]
    #[case(",", Rendered::Int(1234567), "1,234,567")]
    fn test_other_formats(#[case] format: &str, #[case] value: Rendered, #[case] expected: &str) {
        assert_eq!(spec(format).apply(&value), expected);
    }

    #[test]
    fn test_invalid_spec() {
        assert!("><<".parse::<FormatSpec>().is_err());
    }

    #[test]
    fn test_spec_display_round_trip() {
        for s in [">21.17", "<4", ">16", "+010.3e"] {
            assert_eq!(spec(s).to_string(), s);
        }
    }

    #[test]
    fn test_table_default_rule() {
        let rule = FormatRule::table_default();
        assert_eq!(rule.for_kind(Kind::Float), ">21.17");
        assert_eq!(rule.for_kind(Kind::Int), ">16");
        assert_eq!(FormatRule::from("").spec_for(Kind::Int).unwrap(), None);
    }
}
