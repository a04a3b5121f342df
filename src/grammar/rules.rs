//! Combinators the grammar types are built from
//!
//! None of these rules skip leading whitespace on their own; grammar types
//! wrap their rules with [`ws`] where a token may start.

use chumsky::prelude::*;
use chumsky::primitive::filter;

use crate::grammar::GrammarContext;

pub type Error = Simple<char>;

/// Characters that continue an identifier or a keyword
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Skippable whitespace, possibly none
pub fn ws(ctx: &GrammarContext) -> impl Parser<char, (), Error = Error> + Clone {
    one_of(ctx.whitespace_chars()).repeated().ignored()
}

/// At least one skippable whitespace character
pub fn ws1(ctx: &GrammarContext) -> impl Parser<char, (), Error = Error> + Clone {
    one_of(ctx.whitespace_chars()).repeated().at_least(1).ignored()
}

/// A token: the parser preceded by optional whitespace
pub fn token<O, P>(ctx: &GrammarContext, parser: P) -> impl Parser<char, O, Error = Error> + Clone
where
    P: Parser<char, O, Error = Error> + Clone,
{
    ws(ctx).ignore_then(parser)
}

/// An exact, case-sensitive literal
pub fn literal(text: &str) -> impl Parser<char, (), Error = Error> + Clone {
    just(text.to_string()).ignored()
}

/// Succeeds, without consuming anything, when no identifier character follows
pub fn boundary() -> impl Parser<char, (), Error = Error> + Clone {
    filter(|c: &char| !is_ident_char(*c))
        .ignored()
        .or(end())
        .rewind()
}

/// Like [`boundary`], but a decimal point can not follow a number either
fn numeric_boundary() -> impl Parser<char, (), Error = Error> + Clone {
    filter(|c: &char| !is_ident_char(*c) && *c != '.')
        .ignored()
        .or(end())
        .rewind()
}

/// A case-insensitive keyword, yielding its upper-cased form
pub fn caseless_keyword(word: &str) -> impl Parser<char, String, Error = Error> + Clone {
    let upper = word.to_uppercase();
    any()
        .repeated()
        .exactly(word.chars().count())
        .collect::<String>()
        .try_map(move |text, span| {
            if text.to_uppercase() == upper {
                Ok(upper.clone())
            } else {
                Err(Simple::custom(span, format!("Expected {}", upper)))
            }
        })
        .then_ignore(boundary())
}

/// The first of the keywords that matches, case-insensitively
pub fn any_keyword(words: &[String]) -> BoxedParser<'static, char, String, Error> {
    let mut rules = words.iter().map(|w| caseless_keyword(w).boxed());
    let first = rules
        .next()
        .unwrap_or_else(|| {
            empty()
                .try_map(|_, span| Err::<String, _>(Simple::custom(span, "No keyword allowed")))
                .boxed()
        });
    rules.fold(first, |acc, rule| acc.or(rule).boxed())
}

pub fn optional_quote() -> impl Parser<char, (), Error = Error> + Clone {
    one_of("'\"").or_not().ignored()
}

pub fn digits() -> impl Parser<char, String, Error = Error> + Clone {
    filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .collect::<String>()
}

/// Integer literal without a sign
pub fn unsigned_integer() -> impl Parser<char, i64, Error = Error> + Clone {
    digits().then_ignore(numeric_boundary()).try_map(|text, span| {
        text.parse::<i64>()
            .map_err(|e| Simple::custom(span, format!("Invalid integer {}: {}", text, e)))
    })
}

/// Integer literal with an optional sign
pub fn signed_integer() -> impl Parser<char, i64, Error = Error> + Clone {
    one_of("+-")
        .or_not()
        .then(digits())
        .then_ignore(numeric_boundary())
        .try_map(|(sign, text), span| {
            let text = match sign {
                Some('-') => format!("-{}", text),
                _ => text,
            };
            text.parse::<i64>()
                .map_err(|e| Simple::custom(span, format!("Invalid integer {}: {}", text, e)))
        })
}

/// Real literal: `1`, `-1.5`, `.5`, `2.`, `1e-3`
///
/// A `strict` real must carry a decimal point or an exponent, so it never
/// matches what an integer literal would.
pub fn real(strict: bool) -> impl Parser<char, f64, Error = Error> + Clone {
    let fraction = just('.').ignore_then(digits().or_not());
    let mantissa = digits()
        .then(fraction.or_not())
        .map(|(whole, fraction)| (whole, fraction.map(Option::unwrap_or_default)))
        .or(just('.')
            .ignore_then(digits())
            .map(|fraction| (String::new(), Some(fraction))));
    let exponent = one_of("eE")
        .ignore_then(one_of("+-").or_not())
        .then(digits());

    one_of("+-")
        .or_not()
        .then(mantissa)
        .then(exponent.or_not())
        .then_ignore(numeric_boundary())
        .try_map(move |((sign, (whole, fraction)), exponent), span| {
            if strict && fraction.is_none() && exponent.is_none() {
                return Err(Simple::custom(
                    span,
                    "A real number with a decimal point or an exponent expected",
                ));
            }
            let mut text = String::new();
            if let Some(sign) = sign {
                text.push(sign);
            }
            text.push_str(if whole.is_empty() { "0" } else { &whole });
            if let Some(fraction) = fraction {
                text.push('.');
                text.push_str(&fraction);
            }
            if let Some((exp_sign, exp)) = exponent {
                text.push('e');
                if let Some(exp_sign) = exp_sign {
                    text.push(exp_sign);
                }
                text.push_str(&exp);
            }
            text.parse::<f64>()
                .map_err(|e| Simple::custom(span, format!("Invalid real {}: {}", text, e)))
        })
}

/// Characters a bare word can not contain besides whitespace
pub const WORD_EXCLUDED: &str = ",;{}";

pub fn is_word_char(c: char) -> bool {
    c.is_ascii_graphic() && !WORD_EXCLUDED.contains(c)
}

/// A run of printable characters
pub fn word() -> impl Parser<char, String, Error = Error> + Clone {
    filter(|c: &char| is_word_char(*c))
        .repeated()
        .at_least(1)
        .collect::<String>()
}

/// A string enclosed in the given quote, not spanning lines
pub fn quoted(quote: char) -> impl Parser<char, String, Error = Error> + Clone {
    just(quote)
        .ignore_then(
            filter(move |c: &char| *c != quote && *c != '\n')
                .repeated()
                .collect::<String>(),
        )
        .then_ignore(just(quote))
}

/// Everything up to the end of the line, trailing whitespace trimmed
pub fn rest_of_line() -> impl Parser<char, String, Error = Error> + Clone {
    filter(|c: &char| *c != '\n' && *c != '\r')
        .repeated()
        .collect::<String>()
        .map(|text| text.trim_end().to_string())
}

/// End of a line, including the whitespace before it
pub fn line_end(ctx: &GrammarContext) -> impl Parser<char, (), Error = Error> + Clone {
    ws(ctx)
        .ignore_then(just('\r').or_not())
        .ignore_then(just('\n'))
        .ignored()
}

/// One or more line ends; blank lines are skipped
pub fn line_ends(ctx: &GrammarContext) -> impl Parser<char, (), Error = Error> + Clone {
    line_end(ctx).repeated().at_least(1).ignored()
}

/// A `*****...` banner line
pub fn separator_banner() -> impl Parser<char, (), Error = Error> + Clone {
    just('*').repeated().at_least(10).ignored()
}

/// One or more items divided by the delimiter
pub fn delimited<O, D, P, Q>(item: P, delimiter: Q) -> impl Parser<char, Vec<O>, Error = Error> + Clone
where
    P: Parser<char, O, Error = Error> + Clone,
    Q: Parser<char, D, Error = Error> + Clone,
{
    item.clone()
        .then(delimiter.ignore_then(item).repeated())
        .map(|(first, rest)| {
            let mut items = Vec::with_capacity(rest.len() + 1);
            items.push(first);
            items.extend(rest);
            items
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full<O, P: Parser<char, O, Error = Error>>(parser: P, text: &str) -> Result<O, Vec<Error>> {
        parser.then_ignore(end()).parse(text)
    }

    #[test]
    fn test_integers() {
        assert_eq!(full(signed_integer(), "-12"), Ok(-12));
        assert_eq!(full(signed_integer(), "007"), Ok(7));
        assert_eq!(full(unsigned_integer(), "42"), Ok(42));
        assert!(full(unsigned_integer(), "-1").is_err());
        assert!(full(signed_integer(), "1.5").is_err());
        assert!(full(signed_integer(), "12ab").is_err());
    }

    #[test]
    fn test_reals() {
        assert_eq!(full(real(false), "1"), Ok(1.0));
        assert_eq!(full(real(false), "-1.5e2"), Ok(-150.0));
        assert_eq!(full(real(false), ".5"), Ok(0.5));
        assert_eq!(full(real(false), "2."), Ok(2.0));
        assert_eq!(full(real(true), "2.0"), Ok(2.0));
        assert_eq!(full(real(true), "1E3"), Ok(1000.0));
        assert!(full(real(true), "2").is_err());
        assert!(full(real(false), "1.2.3").is_err());
    }

    #[test]
    fn test_caseless_keyword_needs_boundary() {
        assert_eq!(full(caseless_keyword("Ry"), "rY"), Ok("RY".to_string()));
        assert!(full(caseless_keyword("Ry"), "Ryd").is_err());
        assert!(caseless_keyword("Ry").parse("Ryd").is_err());
        assert!(caseless_keyword("T").parse("T ").is_ok());
    }

    #[test]
    fn test_any_keyword_prefers_boundary_match() {
        let words = vec!["E".to_string(), "EV".to_string()];
        assert_eq!(full(any_keyword(&words), "ev"), Ok("EV".to_string()));
    }

    #[test]
    fn test_words_and_quotes() {
        assert_eq!(word().parse("abc,def"), Ok("abc".to_string()));
        assert_eq!(full(quoted('\''), "'a b'"), Ok("a b".to_string()));
        assert_eq!(full(rest_of_line(), "free text  "), Ok("free text".to_string()));
    }

    #[test]
    fn test_delimited_leaves_trailing_delimiter() {
        let ctx = GrammarContext::default();
        let list = delimited(token(&ctx, signed_integer()), ws1(&ctx));
        assert_eq!(list.then_ignore(ws(&ctx)).then_ignore(end()).parse("1 2  3 "), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn test_line_ends_skip_blank_lines() {
        let ctx = GrammarContext::default();
        let rows = delimited(token(&ctx, signed_integer()), line_ends(&ctx));
        assert_eq!(full(rows, "1 \n\n 2"), Ok(vec![1, 2]));
    }
}
