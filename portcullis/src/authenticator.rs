//! turns a raw credential into an authenticated token
use std::{fmt, sync::Arc};

use crate::{
    context::Context,
    credentials::{CredentialsParser, DefaultCredentialsParser},
    error::Error,
    listener::{Event, EventKind, Listener, Listeners},
    token::{Token, TokenParser, TokenParsers},
    validator::{Validator, Validators},
};

/// parses, validates, then reports the outcome to its listeners
///
/// an `Authenticator` is immutable once built and can be shared between
/// threads
///
/// ```rust
/// use portcullis::{
///     token::{BasicTokenParser, Token, TokenParsers},
///     validator::NonEmptyPrincipal,
///     Authenticator, Context, Scheme,
/// };
///
/// let mut parsers = TokenParsers::builder();
/// parsers.register(Scheme::BASIC, BasicTokenParser).unwrap();
///
/// let mut builder = Authenticator::builder();
/// builder.set_token_parsers(parsers.build());
/// builder.add_validator(NonEmptyPrincipal);
/// let authenticator = builder.build();
///
/// let token = authenticator
///     .authenticate(&Context::new(), "Basic am9lOnBhc3M=")
///     .unwrap();
/// assert_eq!(token.principal(), "joe");
/// ```
#[derive(Clone)]
pub struct Authenticator {
    credentials_parser: Arc<dyn CredentialsParser>,
    token_parsers: TokenParsers,
    validators: Validators,
    listeners: Listeners<str>,
}

impl Authenticator {
    pub fn builder() -> AuthenticatorBuilder {
        AuthenticatorBuilder::default()
    }

    pub fn token_parsers(&self) -> &TokenParsers {
        &self.token_parsers
    }

    pub fn validators(&self) -> &Validators {
        &self.validators
    }

    /// authenticates the raw credential `source`
    ///
    /// parsing failures stop the pipeline before validation. In every case a
    /// single [`EventKind::Authenticate`] event is dispatched, holding the
    /// final token if there is one and the error if there is one.
    pub fn authenticate(&self, ctx: &Context, source: &str) -> Result<Arc<dyn Token>, Error> {
        let token = match self.parse(ctx, source) {
            Ok(token) => token,
            Err(e) => {
                self.dispatch(source, None, Some(&e));
                return Err(e);
            }
        };

        let (token, result) = self.validators.run(ctx, token);
        self.dispatch(source, Some(&token), result.as_ref().err());

        result.map(|()| token)
    }

    fn parse(&self, ctx: &Context, source: &str) -> Result<Arc<dyn Token>, Error> {
        ctx.check()?;
        let credentials = self.credentials_parser.parse(ctx, source)?;
        self.token_parsers.parse(ctx, &credentials)
    }

    fn dispatch(&self, source: &str, token: Option<&Arc<dyn Token>>, err: Option<&Error>) {
        self.listeners.dispatch(&Event {
            kind: EventKind::Authenticate,
            subject: source,
            token,
            err,
        });
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("token_parsers", &self.token_parsers)
            .field("validators", &self.validators)
            .field("listeners", &self.listeners)
            .finish()
    }
}

#[derive(Default)]
pub struct AuthenticatorBuilder {
    credentials_parser: Option<Arc<dyn CredentialsParser>>,
    token_parsers: TokenParsers,
    validators: Vec<Arc<dyn Validator>>,
    listeners: Vec<Arc<dyn Listener<str>>>,
}

impl AuthenticatorBuilder {
    pub fn new() -> Self {
        AuthenticatorBuilder::default()
    }

    /// replaces the default strict `<scheme> <value>` parser
    pub fn set_credentials_parser<P: CredentialsParser + 'static>(&mut self, parser: P) {
        self.credentials_parser = Some(Arc::new(parser));
    }

    pub fn set_token_parsers(&mut self, parsers: TokenParsers) {
        self.token_parsers = parsers;
    }

    pub fn add_validator<V: Validator + 'static>(&mut self, validator: V) {
        self.validators.push(Arc::new(validator));
    }

    pub fn add_listener<L: Listener<str> + 'static>(&mut self, listener: L) {
        self.listeners.push(Arc::new(listener));
    }

    pub fn build(self) -> Authenticator {
        if self.token_parsers.is_empty() {
            tracing::warn!(
                "authenticator built without token parsers, every credential will be rejected"
            );
        }

        Authenticator {
            credentials_parser: self
                .credentials_parser
                .unwrap_or_else(|| Arc::new(DefaultCredentialsParser)),
            token_parsers: self.token_parsers,
            validators: Validators::new(self.validators),
            listeners: Listeners::new(self.listeners),
        }
    }
}
