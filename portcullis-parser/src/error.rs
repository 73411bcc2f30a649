use thiserror::Error;

/// owned version of a parse failure, detached from the parsed input
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("could not parse {input:?}: {}", .message.as_deref().unwrap_or("unexpected input"))]
pub struct ParseError {
    pub input: String,
    pub message: Option<String>,
}

impl<'a> From<crate::parser::Error<'a>> for ParseError {
    fn from(e: crate::parser::Error<'a>) -> Self {
        ParseError {
            input: e.input.to_string(),
            message: e.message,
        }
    }
}

impl<'a> From<nom::Err<crate::parser::Error<'a>>> for ParseError {
    fn from(e: nom::Err<crate::parser::Error<'a>>) -> Self {
        match e {
            nom::Err::Error(e) | nom::Err::Failure(e) => e.into(),
            nom::Err::Incomplete(_) => ParseError {
                input: String::new(),
                message: Some("incomplete input".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_nom_error() {
        let err: ParseError = crate::parser::credentials("Basic").unwrap_err().into();
        assert_eq!(err.input, "");
        assert_eq!(
            err.message.as_deref(),
            Some("expected a single space after the scheme, got ''")
        );
    }

    #[test]
    fn display() {
        let err = ParseError {
            input: "abc".to_string(),
            message: None,
        };
        assert_eq!(err.to_string(), "could not parse \"abc\": unexpected input");
    }
}
