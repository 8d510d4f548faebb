//! S-expression reader for call expressions and lambdas.
//!
//! Parsing only builds syntax: lists stay lists and arity is checked when the
//! expression is evaluated. Literals become length 1 vectors.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0, multispace1, one_of},
    combinator::{opt, recognize, value},
    error::ErrorKind,
    multi::separated_list0,
    sequence::{pair, preceded, terminated},
};

use crate::Error;
use crate::MAX_PARSE_DEPTH;
use crate::ast::{FloatType, NumberType, SYMBOL_SPECIAL_CHARS, Value, is_valid_symbol, sym};

/// Convert nom parsing errors to user-friendly messages
fn parse_error_to_message(input: &str, error: nom::Err<nom::error::Error<&str>>) -> String {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            match e.code {
                ErrorKind::Char => format!("Expected character at position {position}"),
                ErrorKind::Tag => format!("Unexpected token at position {position}"),
                ErrorKind::TooLarge => {
                    format!("Expression too deeply nested (max depth: {MAX_PARSE_DEPTH})")
                }
                _ => {
                    if position < input.len() {
                        let remaining_chars: String =
                            input.chars().skip(position).take(10).collect();
                        format!("Invalid syntax near '{remaining_chars}'")
                    } else {
                        "Unexpected end of input".into()
                    }
                }
            }
        }
        nom::Err::Incomplete(_) => "Incomplete input".into(),
    }
}

fn digits(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_digit()).parse(input)
}

/// Parse a number: hexadecimal, floating point or decimal integer
fn parse_number(input: &str) -> IResult<&str, Value> {
    alt((parse_hexadecimal, parse_float, parse_decimal)).parse(input)
}

/// Parse a floating point literal (`1.5`, `-0.25`, `2.0e10`)
fn parse_float(input: &str) -> IResult<&str, Value> {
    let (input, number_str) = recognize((
        opt(char('-')),
        digits,
        char('.'),
        digits,
        opt((one_of("eE"), opt(one_of("+-")), digits)),
    ))
    .parse(input)?;

    match number_str.parse::<FloatType>() {
        Ok(x) => Ok((input, Value::from(x))),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

/// Parse a decimal integer
fn parse_decimal(input: &str) -> IResult<&str, Value> {
    let (input, number_str) = recognize(pair(opt(char('-')), digits)).parse(input)?;

    match number_str.parse::<NumberType>() {
        Ok(n) => Ok((input, Value::from(n))),
        Err(_) => {
            // Overflow; symbol parsing rejects a leading digit anyway
            Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Digit,
            )))
        }
    }
}

/// Parse a hexadecimal number (#x or #X prefix)
fn parse_hexadecimal(input: &str) -> IResult<&str, Value> {
    let (input, _) = char('#').parse(input)?;
    let (input, _) = alt((char('x'), char('X'))).parse(input)?;
    let (input, hex_digits) = take_while1(|c: char| c.is_ascii_hexdigit()).parse(input)?;

    match NumberType::from_str_radix(hex_digits, 16) {
        Ok(n) => Ok((input, Value::from(n))),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::HexDigit,
        ))),
    }
}

/// Parse a boolean (#t or #f)
fn parse_bool(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::from(true), tag("#t")),
        value(Value::from(false), tag("#f")),
    ))
    .parse(input)
}

/// Parse a symbol (identifier)
fn parse_symbol(input: &str) -> IResult<&str, Value> {
    let mut symbol_chars =
        take_while1(|c: char| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c));

    let (remaining, candidate) = symbol_chars.parse(input)?;

    if is_valid_symbol(candidate) {
        Ok((remaining, sym(candidate)))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Alpha,
        )))
    }
}

/// Parse a string literal
fn parse_string(input: &str) -> IResult<&str, Value> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut text = String::new();

    loop {
        let mut char_iter = remaining.chars();
        match char_iter.next() {
            Some('"') => return Ok((char_iter.as_str(), Value::from(text))),
            Some('\\') => {
                let escaped = match char_iter.next() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('\\') => '\\',
                    Some('"') => '"',
                    // Unknown escape, or a backslash at the end of input
                    Some(_) | None => {
                        return Err(nom::Err::Error(nom::error::Error::new(
                            remaining,
                            nom::error::ErrorKind::Char,
                        )));
                    }
                };
                text.push(escaped);
                remaining = char_iter.as_str();
            }
            Some(ch) => {
                text.push(ch);
                remaining = char_iter.as_str();
            }
            None => {
                // Unterminated
                return Err(nom::Err::Error(nom::error::Error::new(
                    remaining,
                    nom::error::ErrorKind::Char,
                )));
            }
        }
    }
}

/// Parse a parenthesized list
fn parse_list(input: &str, depth: usize) -> IResult<&str, Value> {
    let (input, _) = char('(').parse(input)?;
    let (input, _) = multispace0.parse(input)?;

    let (input, elements) =
        separated_list0(multispace1, |input| parse_sexpr(input, depth + 1)).parse(input)?;

    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char(')').parse(input)?;

    Ok((input, Value::List(elements)))
}

/// Parse quoted expression ('expr -> (quote expr))
fn parse_quote(input: &str, depth: usize) -> IResult<&str, Value> {
    let (input, _) = char('\'').parse(input)?;
    let (input, expr) = parse_sexpr(input, depth + 1)?;
    Ok((input, Value::List(vec![sym("quote"), expr])))
}

fn parse_sexpr(input: &str, depth: usize) -> IResult<&str, Value> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TooLarge,
        )));
    }
    preceded(
        multispace0,
        alt((
            |input| parse_quote(input, depth),
            |input| parse_list(input, depth),
            parse_number,
            parse_bool,
            parse_string,
            parse_symbol,
        )),
    )
    .parse(input)
}

/// Parse a complete S-expression from input.
///
/// ```
/// use mapxp::scheme::parse_scheme;
///
/// let expr = parse_scheme("(lambda (v ...) (+ v 1.5))").unwrap();
/// assert_eq!(expr.to_string(), "(lambda (v ...) (+ v 1.5))");
/// ```
pub fn parse_scheme(input: &str) -> Result<Value, Error> {
    match terminated(|input| parse_sexpr(input, 0), multispace0).parse(input) {
        Ok(("", value)) => Ok(value),
        Ok((remaining, _)) => Err(Error::ParseError(format!(
            "Unexpected remaining input: '{remaining}'"
        ))),
        Err(e) => Err(Error::ParseError(parse_error_to_message(input, e))),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::val;

    /// Test result variants for comprehensive parsing tests
    #[derive(Debug)]
    enum ParseTestResult {
        Success(Value),              // Parsing should succeed with this value
        SpecificError(&'static str), // Parsing should fail with error containing this string
        Error,                       // Parsing should fail (any error)
    }
    use ParseTestResult::*;

    fn success<T: Into<Value>>(value: T) -> ParseTestResult {
        Success(value.into())
    }

    fn list<const N: usize>(items: [Value; N]) -> Value {
        Value::List(items.into())
    }

    /// Run parse tests, checking that every successful parse survives display -> parse
    fn run_parse_tests(test_cases: Vec<(&str, ParseTestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Parse test #{}", i + 1);
            let result = parse_scheme(input);

            match (result, expected) {
                (Ok(actual), Success(expected_val)) => {
                    assert_eq!(actual, *expected_val, "{test_id}: value mismatch");

                    let displayed = format!("{actual}");
                    let reparsed = parse_scheme(&displayed).unwrap_or_else(|e| {
                        panic!("{test_id}: round-trip parse failed for '{displayed}': {e:?}")
                    });
                    assert_eq!(
                        displayed,
                        format!("{reparsed}"),
                        "{test_id}: round-trip display mismatch for '{input}'"
                    );
                }
                (Err(_), Error) => {}
                (Err(err), SpecificError(expected_text)) => {
                    let error_msg = format!("{err:?}");
                    assert!(
                        error_msg.contains(expected_text),
                        "{test_id}: error '{error_msg}' should contain '{expected_text}'"
                    );
                }
                (Ok(actual), Error | SpecificError(_)) => {
                    panic!("{test_id}: expected error for '{input}', got {actual:?}");
                }
                (Err(err), Success(_)) => {
                    panic!("{test_id}: expected success for '{input}', got error {err:?}");
                }
            }
        }
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_parser_comprehensive() {
        let test_cases = vec![
            // ===== NUMBER PARSING =====
            ("42", success(42)),
            ("-5", success(-5)),
            ("0", success(0)),
            ("-0", success(0)),
            ("#x1A", success(26)),
            ("#X1a", success(26)),
            ("#xff", success(255)),
            ("9223372036854775807", success(i64::MAX)),
            ("-9223372036854775808", success(i64::MIN)),
            ("2.5", success(2.5)),
            ("-0.125", success(-0.125)),
            ("1.5e3", success(1500.0)),
            ("10.0", success(10.0)),
            ("#xG", Error),
            ("#x", Error),
            ("#y123", Error),
            ("123abc", Error),
            ("1.", Error),
            ("99999999999999999999", Error),
            ("-99999999999999999999", Error),
            // ===== SYMBOL PARSING =====
            ("foo", success(sym("foo"))),
            ("+", success(sym("+"))),
            (">=", success(sym(">="))),
            ("test-name", success(sym("test-name"))),
            ("test*name", success(sym("test*name"))),
            ("test/name", success(sym("test/name"))),
            ("test?name", success(sym("test?name"))),
            ("test_name", success(sym("test_name"))),
            ("test$name", success(sym("test$name"))),
            ("var123", success(sym("var123"))),
            ("-", success(sym("-"))),
            ("-abc", success(sym("-abc"))),
            // Dotted names and the forwarding symbol
            ("...", success(sym("..."))),
            (".x", success(sym(".x"))),
            ("seq.len", success(sym("seq.len"))),
            ("123var", Error),
            ("-42name", Error),
            ("test space", Error),
            ("test@home", Error),
            ("test#tag", Error),
            ("test%percent", Error),
            // ===== BOOLEAN PARSING =====
            ("#t", success(true)),
            ("#f", success(false)),
            ("#T", Error),
            ("#true", Error),
            // ===== STRING PARSING =====
            ("\"hello\"", success("hello")),
            ("\"hello world\"", success("hello world")),
            (r#""hello\nworld""#, success("hello\nworld")),
            (r#""tab\there""#, success("tab\there")),
            (r#""carriage\rreturn""#, success("carriage\rreturn")),
            (r#""quote\"test""#, success("quote\"test")),
            (r#""backslash\\test""#, success("backslash\\test")),
            ("\"\"", success("")),
            (r#""other\xchar""#, Error),
            (r#""unterminated"#, Error),
            (r#""unterminated\"#, Error),
            // ===== LIST PARSING =====
            ("()", success(list([]))),
            ("(   )", success(list([]))),
            ("(42)", success(list([val(42)]))),
            (
                "(1 hello \"world\" #t)",
                success(list([val(1), sym("hello"), val("world"), val(true)])),
            ),
            // Operator names are plain symbols until evaluation
            ("(+ 1 2)", success(list([sym("+"), val(1), val(2)]))),
            (
                "(if #t 1 2)",
                success(list([sym("if"), val(true), val(1), val(2)])),
            ),
            // Arity is checked at evaluation time, not here
            ("(if #t)", success(list([sym("if"), val(true)]))),
            ("(not)", success(list([sym("not")]))),
            (
                "(lambda (v ...) (f v ...))",
                success(list([
                    sym("lambda"),
                    list([sym("v"), sym("...")]),
                    list([sym("f"), sym("v"), sym("...")]),
                ])),
            ),
            (
                "((1 2) (3 4))",
                success(list([list([val(1), val(2)]), list([val(3), val(4)])])),
            ),
            ("(((1)))", success(list([list([list([val(1)])])]))),
            // ===== QUOTE PARSING =====
            ("'foo", success(list([sym("quote"), sym("foo")]))),
            ("(quote foo)", success(list([sym("quote"), sym("foo")]))),
            (
                "'(1 2)",
                success(list([sym("quote"), list([val(1), val(2)])])),
            ),
            ("'()", success(list([sym("quote"), list([])]))),
            // ===== WHITESPACE HANDLING =====
            ("  42  ", success(42)),
            ("\t#t\n", success(true)),
            ("\r\n  foo  \t", success(sym("foo"))),
            ("( 1   2\t\n3 )", success(list([val(1), val(2), val(3)]))),
            // ===== ERRORS =====
            ("(1 2 3", Error),
            ("((1 2)", Error),
            ("(+ 1 (- 2", SpecificError("ParseError")),
            ("1 2 3)", SpecificError("ParseError")),
            ("(1 2))", SpecificError("ParseError")),
            (")", SpecificError("ParseError")),
            ("@invalid", SpecificError("ParseError")),
            ("", SpecificError("ParseError")),
            ("   ", SpecificError("ParseError")),
            ("1 2", SpecificError("ParseError")),
            ("(+ 1 2) (+ 3 4)", SpecificError("ParseError")),
        ];

        run_parse_tests(test_cases);
    }

    #[test]
    fn test_parser_depth_limits() {
        let parens_under_limit = format!(
            "{}unbound{}",
            "(".repeat(MAX_PARSE_DEPTH - 1),
            ")".repeat(MAX_PARSE_DEPTH - 1)
        );
        let quotes_under_limit = format!("{}unbound", "'".repeat(MAX_PARSE_DEPTH - 1));
        let deep_parens_at_limit = format!(
            "{}1{}",
            "(".repeat(MAX_PARSE_DEPTH),
            ")".repeat(MAX_PARSE_DEPTH)
        );
        let deep_quotes_at_limit = format!("{}a", "'".repeat(MAX_PARSE_DEPTH));

        run_parse_tests(vec![
            (
                deep_parens_at_limit.as_str(),
                SpecificError("Invalid syntax"),
            ),
            (
                deep_quotes_at_limit.as_str(),
                SpecificError("Invalid syntax"),
            ),
        ]);

        assert!(parse_scheme(&parens_under_limit).is_ok());
        assert!(parse_scheme(&quotes_under_limit).is_ok());
    }
}
