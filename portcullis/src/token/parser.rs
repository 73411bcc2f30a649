//! the scheme to parser registry
use std::{collections::HashMap, fmt, sync::Arc};

use super::Token;
use crate::{
    context::Context,
    credentials::{Credentials, Scheme},
    error::{self, Error},
};

/// turns credentials of one scheme into a token
pub trait TokenParser: Send + Sync {
    fn parse(&self, ctx: &Context, credentials: &Credentials) -> Result<Arc<dyn Token>, Error>;
}

impl TokenParser for Box<dyn TokenParser> {
    fn parse(&self, ctx: &Context, credentials: &Credentials) -> Result<Arc<dyn Token>, Error> {
        self.as_ref().parse(ctx, credentials)
    }
}

impl TokenParser for Arc<dyn TokenParser> {
    fn parse(&self, ctx: &Context, credentials: &Credentials) -> Result<Arc<dyn Token>, Error> {
        self.as_ref().parse(ctx, credentials)
    }
}

impl<F> TokenParser for F
where
    F: Fn(&Context, &Credentials) -> Result<Arc<dyn Token>, Error> + Send + Sync,
{
    fn parse(&self, ctx: &Context, credentials: &Credentials) -> Result<Arc<dyn Token>, Error> {
        self(ctx, credentials)
    }
}

/// dispatches credentials to the parser registered for their scheme
///
/// the lookup is an exact match on the scheme, there is no fallback
#[derive(Clone, Default)]
pub struct TokenParsers {
    parsers: Arc<HashMap<Scheme, Arc<dyn TokenParser>>>,
}

impl TokenParsers {
    pub fn builder() -> TokenParsersBuilder {
        TokenParsersBuilder::default()
    }

    pub fn contains(&self, scheme: &Scheme) -> bool {
        self.parsers.contains_key(scheme)
    }

    pub fn schemes(&self) -> impl Iterator<Item = &Scheme> {
        self.parsers.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl TokenParser for TokenParsers {
    fn parse(&self, ctx: &Context, credentials: &Credentials) -> Result<Arc<dyn Token>, Error> {
        match self.parsers.get(&credentials.scheme) {
            Some(parser) => parser.parse(ctx, credentials),
            None => Err(Error::UnsupportedScheme(credentials.scheme.clone())),
        }
    }
}

impl fmt::Debug for TokenParsers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut schemes: Vec<_> = self.parsers.keys().collect();
        schemes.sort();
        f.debug_struct("TokenParsers")
            .field("schemes", &schemes)
            .finish()
    }
}

#[derive(Default)]
pub struct TokenParsersBuilder {
    parsers: HashMap<Scheme, Arc<dyn TokenParser>>,
}

impl TokenParsersBuilder {
    pub fn new() -> Self {
        TokenParsersBuilder::default()
    }

    /// registers the parser for a scheme
    ///
    /// each scheme can only be registered once
    pub fn register<S, P>(&mut self, scheme: S, parser: P) -> Result<(), error::Config>
    where
        S: Into<Scheme>,
        P: TokenParser + 'static,
    {
        let scheme = scheme.into();
        if self.parsers.contains_key(&scheme) {
            return Err(error::Config::DuplicateScheme(scheme));
        }

        self.parsers.insert(scheme, Arc::new(parser));
        Ok(())
    }

    pub fn build(self) -> TokenParsers {
        TokenParsers {
            parsers: Arc::new(self.parsers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{BasicTokenParser, ClaimsToken};

    #[test]
    fn unsupported_scheme() {
        let mut builder = TokenParsers::builder();
        builder.register(Scheme::BASIC, BasicTokenParser).unwrap();
        let parsers = builder.build();

        assert_eq!(
            parsers
                .parse(&Context::new(), &Credentials::new(Scheme::BEARER, "abc"))
                .unwrap_err(),
            Error::UnsupportedScheme(Scheme::BEARER)
        );

        // no case folding
        assert_eq!(
            parsers
                .parse(&Context::new(), &Credentials::new("basic", "am9lOnBhc3M="))
                .unwrap_err(),
            Error::UnsupportedScheme(Scheme::from("basic"))
        );
    }

    #[test]
    fn delegates_to_the_scheme_parser() {
        let mut builder = TokenParsers::builder();
        builder.register(Scheme::BASIC, BasicTokenParser).unwrap();
        builder
            .register(
                Scheme::BEARER,
                |_: &Context, credentials: &Credentials| -> Result<Arc<dyn Token>, Error> {
                    if credentials.value == "good" {
                        Ok(Arc::new(ClaimsToken::new("bearer-user")))
                    } else {
                        Err(Error::BadCredentials("unknown token".to_string()))
                    }
                },
            )
            .unwrap();
        let parsers = builder.build();
        let ctx = Context::new();

        let token = parsers
            .parse(&ctx, &Credentials::new(Scheme::BASIC, "am9lOnBhc3M="))
            .unwrap();
        assert_eq!(token.principal(), "joe");

        let token = parsers
            .parse(&ctx, &Credentials::new(Scheme::BEARER, "good"))
            .unwrap();
        assert_eq!(token.principal(), "bearer-user");

        // parser errors are propagated untouched
        assert_eq!(
            parsers
                .parse(&ctx, &Credentials::new(Scheme::BEARER, "bad"))
                .unwrap_err(),
            Error::BadCredentials("unknown token".to_string())
        );
    }

    #[test]
    fn duplicate_scheme() {
        let mut builder = TokenParsers::builder();
        builder.register(Scheme::BASIC, BasicTokenParser).unwrap();
        assert_eq!(
            builder.register("Basic", BasicTokenParser),
            Err(error::Config::DuplicateScheme(Scheme::BASIC))
        );
    }

    #[test]
    fn debug_lists_schemes() {
        let mut builder = TokenParsers::builder();
        builder.register(Scheme::BEARER, BasicTokenParser).unwrap();
        builder.register(Scheme::BASIC, BasicTokenParser).unwrap();
        assert_eq!(
            format!("{:?}", builder.build()),
            "TokenParsers { schemes: [Scheme(\"Basic\"), Scheme(\"Bearer\")] }"
        );
    }
}
