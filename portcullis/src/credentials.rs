//! raw credentials and the parsers splitting them into a scheme and a value
use std::{borrow::Cow, fmt, str::FromStr};

use portcullis_parser::parser;

use crate::{context::Context, error::Error};

/// a tag selecting which parser applies to a credential or a challenge
///
/// schemes are compared exactly, `Basic` and `basic` are different schemes
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scheme(Cow<'static, str>);

impl Scheme {
    pub const BASIC: Scheme = Scheme(Cow::Borrowed("Basic"));
    pub const BEARER: Scheme = Scheme(Cow::Borrowed("Bearer"));

    pub fn new<S: Into<Cow<'static, str>>>(scheme: S) -> Self {
        Scheme(scheme.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Scheme {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Scheme {
    fn from(scheme: &'static str) -> Self {
        Scheme(Cow::Borrowed(scheme))
    }
}

impl From<String> for Scheme {
    fn from(scheme: String) -> Self {
        Scheme(Cow::Owned(scheme))
    }
}

/// a credential extracted from a request, split into its scheme and its value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub scheme: Scheme,
    pub value: String,
}

impl Credentials {
    pub fn new<S: Into<Scheme>, V: Into<String>>(scheme: S, value: V) -> Self {
        Credentials {
            scheme: scheme.into(),
            value: value.into(),
        }
    }
}

impl FromStr for Credentials {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (_, (scheme, value)) = parser::credentials(raw).map_err(|e| {
            tracing::trace!(error = %portcullis_parser::error::ParseError::from(e), "rejected credentials");
            Error::InvalidCredentials {
                raw: raw.to_string(),
            }
        })?;

        Ok(Credentials::new(scheme.to_string(), value))
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.scheme, self.value)
    }
}

/// turns a raw serialized string into [`Credentials`]
pub trait CredentialsParser: Send + Sync {
    fn parse(&self, ctx: &Context, raw: &str) -> Result<Credentials, Error>;
}

/// the strict `<scheme><single space><value>` parser
///
/// any input that does not follow the format exactly fails with
/// [`Error::InvalidCredentials`], which reports the raw input
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCredentialsParser;

impl CredentialsParser for DefaultCredentialsParser {
    fn parse(&self, _ctx: &Context, raw: &str) -> Result<Credentials, Error> {
        raw.parse()
    }
}

impl CredentialsParser for Box<dyn CredentialsParser> {
    fn parse(&self, ctx: &Context, raw: &str) -> Result<Credentials, Error> {
        self.as_ref().parse(ctx, raw)
    }
}

impl CredentialsParser for std::sync::Arc<dyn CredentialsParser> {
    fn parse(&self, ctx: &Context, raw: &str) -> Result<Credentials, Error> {
        self.as_ref().parse(ctx, raw)
    }
}

impl<F: Fn(&Context, &str) -> Result<Credentials, Error> + Send + Sync> CredentialsParser for F {
    fn parse(&self, ctx: &Context, raw: &str) -> Result<Credentials, Error> {
        self(ctx, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parser() {
        let ctx = Context::new();
        assert_eq!(
            DefaultCredentialsParser.parse(&ctx, "Basic dXNlcjpwYXNz"),
            Ok(Credentials::new(Scheme::BASIC, "dXNlcjpwYXNz"))
        );
        assert_eq!(
            DefaultCredentialsParser.parse(&ctx, "Custom abc.def"),
            Ok(Credentials::new("Custom", "abc.def"))
        );
    }

    #[test]
    fn invalid_credentials_report_the_raw_string() {
        let ctx = Context::new();
        for raw in &["", "Basic", " Basic abc", "Basic  abc", "Basic abc ", "Basic a b"] {
            assert_eq!(
                DefaultCredentialsParser.parse(&ctx, raw),
                Err(Error::InvalidCredentials {
                    raw: raw.to_string()
                })
            );
        }
    }

    #[test]
    fn schemes_are_case_sensitive() {
        assert_ne!(Scheme::from("basic"), Scheme::BASIC);
        assert_eq!(Scheme::from("Basic".to_string()), Scheme::BASIC);
    }

    #[test]
    fn closure_parser() {
        let parser = |_: &Context, raw: &str| -> Result<Credentials, Error> {
            Ok(Credentials::new("Token", raw.to_string()))
        };
        assert_eq!(
            CredentialsParser::parse(&parser, &Context::new(), "abc"),
            Ok(Credentials::new("Token", "abc"))
        );
    }
}
