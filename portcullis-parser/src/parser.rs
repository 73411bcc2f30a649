//! nom parsers for credentials and challenges
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_while1},
    character::complete::{char, space0, space1},
    combinator::{cut, eof, map, opt, value},
    error::{ErrorKind, FromExternalError, ParseError},
    multi::separated_list1,
    sequence::{delimited, preceded},
    IResult,
};
use thiserror::Error;

/// parse serialized credentials: `<scheme><single space><value>`
///
/// The grammar is strict: the scheme and the value must both be present, and
/// neither of them may contain whitespace. Leading or trailing whitespace, or
/// more than one separator, is rejected.
pub fn credentials(i: &str) -> IResult<&str, (&str, &str), Error> {
    let (i, scheme) = error(
        take_while1(is_credentials_char),
        |input| format!("expected a credentials scheme, got '{}'", input),
        "",
    )(i)?;

    let (i, _) = error(
        char(' '),
        |input| format!("expected a single space after the scheme, got '{}'", input),
        "",
    )(i)?;

    let (i, value) = error(
        take_while1(is_credentials_char),
        |input| format!("expected a credentials value, got '{}'", input),
        "",
    )(i)?;

    let (i, _) = error(
        eof,
        |input| format!("unexpected trailing data after credentials: '{}'", input),
        "",
    )(i)?;

    Ok((i, (scheme, value)))
}

fn is_credentials_char(c: char) -> bool {
    !c.is_whitespace()
}

/// parse a challenge: `<scheme> <name>=<value>[, <name>=<value>...]`
///
/// parameter values are either tokens or quoted strings, quoted strings are
/// returned unescaped
pub fn challenge(i: &str) -> IResult<&str, (&str, Vec<(&str, String)>), Error> {
    let (i, scheme) = error(
        token,
        |input| format!("expected a challenge scheme, got '{}'", input),
        " ,",
    )(i)?;

    let (i, params) = opt(preceded(
        space1,
        separated_list1(delimited(space0, char(','), space0), auth_param),
    ))(i)?;

    let (i, _) = error(
        preceded(space0, eof),
        |input| format!("unexpected trailing data after challenge: '{}'", input),
        "",
    )(i)?;

    Ok((i, (scheme, params.unwrap_or_default())))
}

fn auth_param(i: &str) -> IResult<&str, (&str, String), Error> {
    let (i, name) = token(i)?;
    let (i, _) = delimited(space0, char('='), space0)(i)?;

    let (i, value) = error(
        cut(alt((quoted_string, map(token, str::to_string)))),
        |input| format!("expected a token or a quoted string, got '{}'", input),
        ",",
    )(i)?;

    Ok((i, (name, value)))
}

/// parse an RFC 7230 token
pub fn token(i: &str) -> IResult<&str, &str, Error> {
    take_while1(is_tchar)(i)
}

/// characters allowed in an RFC 7230 token
pub fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// returns true if the whole string is a non empty RFC 7230 token
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_tchar)
}

/// parse a quoted string, resolving `\"` and `\\` escapes
pub fn quoted_string(i: &str) -> IResult<&str, String, Error> {
    alt((
        value(String::new(), tag("\"\"")),
        delimited(char('"'), quoted_string_internal, char('"')),
    ))(i)
}

fn quoted_string_internal(i: &str) -> IResult<&str, String, Error> {
    escaped_transform(
        qdtext,
        '\\',
        alt((map(char('\\'), |_| "\\"), map(char('"'), |_| "\""))),
    )(i)
}

fn qdtext(i: &str) -> IResult<&str, &str, Error> {
    take_while1(|c: char| c != '\\' && c != '"')(i)
}

/// writes `s` as a quoted string, the inverse of [`quoted_string`]
pub fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unexpected input {input:?}: {message:?}")]
pub struct Error<'a> {
    pub input: &'a str,
    pub code: ErrorKind,
    pub message: Option<String>,
}

impl<'a> Error<'a> {
    fn new(input: &'a str, code: ErrorKind) -> Self {
        Error {
            input,
            code,
            message: None,
        }
    }

    fn annotate<F: Fn(&'a str) -> String>(mut self, context: &F, reducer: &str) -> Self {
        if let Some(index) = self.input.find(|c| reducer.contains(c)) {
            self.input = &self.input[..index];
        }
        if self.message.is_none() {
            self.message = Some(context(self.input));
        }
        self
    }
}

impl<'a> ParseError<&'a str> for Error<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Error::new(input, kind)
    }

    // the innermost error is the most precise one
    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a, E> FromExternalError<&'a str, E> for Error<'a> {
    fn from_external_error(input: &'a str, kind: ErrorKind, _e: E) -> Self {
        Error::new(input, kind)
    }
}

/// attaches a message to the errors of `parser`, cutting the reported input
/// at the first character found in `reducer`
fn error<'a, F, O, P>(
    mut parser: P,
    context: F,
    reducer: &'static str,
) -> impl FnMut(&'a str) -> IResult<&'a str, O, Error<'a>>
where
    P: nom::Parser<&'a str, O, Error<'a>>,
    F: Fn(&'a str) -> String,
{
    move |i: &'a str| {
        parser
            .parse(i)
            .map_err(|err| err.map(|e| e.annotate(&context, reducer)))
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn credentials() {
        assert_eq!(
            super::credentials("Basic dXNlcjpwYXNz"),
            Ok(("", ("Basic", "dXNlcjpwYXNz")))
        );
        assert_eq!(
            super::credentials("Bearer a.b.c"),
            Ok(("", ("Bearer", "a.b.c")))
        );
    }

    #[test]
    fn credentials_are_strict() {
        for raw in &[
            "",
            "Basic",
            "Basic ",
            " Basic abc",
            "Basic  abc",
            "Basic abc ",
            "Basic abc def",
            "Basic\tabc",
        ] {
            assert!(super::credentials(raw).is_err(), "{:?} was accepted", raw);
        }
    }

    #[test]
    fn credentials_error_message() {
        let err = super::credentials("Basic abc def").unwrap_err();
        match err {
            nom::Err::Error(e) => assert_eq!(
                e.message.as_deref(),
                Some("unexpected trailing data after credentials: ' def'")
            ),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn quoted_string() {
        assert_eq!(
            super::quoted_string("\"test@example.com\""),
            Ok(("", "test@example.com".to_string()))
        );
        assert_eq!(super::quoted_string("\"\""), Ok(("", String::new())));
        assert_eq!(
            super::quoted_string(r#""a \"b\" \\ c""#),
            Ok(("", r#"a "b" \ c"#.to_string()))
        );
    }

    #[test]
    fn quote() {
        assert_eq!(super::quote("realm"), "\"realm\"");
        assert_eq!(super::quote(r#"a "b" \ c"#), r#""a \"b\" \\ c""#);
    }

    #[test]
    fn challenge() {
        assert_eq!(
            super::challenge(r#"Basic realm="test@example.com", charset="UTF-8""#),
            Ok((
                "",
                (
                    "Basic",
                    vec![
                        ("realm", "test@example.com".to_string()),
                        ("charset", "UTF-8".to_string()),
                    ]
                )
            ))
        );

        assert_eq!(
            super::challenge(r#"Bearer realm="api",scope=read"#),
            Ok((
                "",
                (
                    "Bearer",
                    vec![("realm", "api".to_string()), ("scope", "read".to_string())]
                )
            ))
        );

        assert_eq!(super::challenge("Negotiate"), Ok(("", ("Negotiate", vec![]))));
    }

    #[test]
    fn challenge_errors() {
        assert!(super::challenge(r#"Basic realm="unterminated"#).is_err());
        assert!(super::challenge(r#"Basic realm="a" junk"#).is_err());
        assert!(super::challenge(r#""Basic" realm="a""#).is_err());
    }

    #[test]
    fn challenge_error_input_is_cut() {
        match super::challenge("Basic realm=@bad, charset=x").unwrap_err() {
            nom::Err::Failure(e) => {
                assert_eq!(e.input, "@bad");
                assert_eq!(
                    e.message.as_deref(),
                    Some("expected a token or a quoted string, got '@bad'")
                );
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn tokens() {
        assert!(super::is_token("Basic"));
        assert!(super::is_token("x-custom_scheme.1"));
        assert!(!super::is_token(""));
        assert!(!super::is_token("a b"));
        assert!(!super::is_token("a=b"));
    }
}
