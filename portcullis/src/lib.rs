//! Portcullis: a pluggable authentication and authorization pipeline
//!
//! Portcullis turns the raw credential attached to a request into a structured
//! token, authenticates that token through composable rules, then authorizes
//! its access to a resource.
//!
//! The pipeline is made of:
//!
//! * a [credentials parser](`crate::credentials::CredentialsParser`) splitting a raw string into a scheme and a value;
//! * a [token parser registry](`crate::token::TokenParsers`) turning credentials into a [Token](`crate::token::Token`) according to their scheme;
//! * [validators](`crate::validator::Validators`), authentication rules that all run, so every failure is reported;
//! * the [Authenticator](`crate::Authenticator`), chaining parsing and validation;
//! * [approvers](`crate::approver::Approvers`), authorization rules combined with a logical AND that stops at the first denial, or a logical OR with [`Approvers::any`](`crate::approver::Approvers::any`);
//! * the [Authorizer](`crate::Authorizer`), running approvers against a resource;
//! * [listeners](`crate::listener::Listener`), notified once after each authentication and authorization.
//!
//! Non goals:
//!
//! * this is not a new authentication protocol, scheme specific formats like JWT are decoded by the token parsers you register;
//! * there is no transport layer, the `portcullis-http` crate maps results to HTTP.
//!
//! Every pipeline object is immutable once built and can be shared between
//! threads. Every call takes a [Context](`crate::Context`) carrying
//! cancellation and deadlines.
//!
//! # Usage
//!
//! ```rust
//! use portcullis::{
//!     error,
//!     listener::TraceListener,
//!     token::{get_capabilities, BasicTokenParser, Token, TokenParsers},
//!     validator::NonEmptyPrincipal,
//!     Authenticator, Authorizer, Context, Scheme,
//! };
//!
//! fn main() -> Result<(), error::Error> {
//!   let mut parsers = TokenParsers::builder();
//!   parsers.register(Scheme::BASIC, BasicTokenParser)?;
//!
//!   let mut authenticator = Authenticator::builder();
//!   authenticator.set_token_parsers(parsers.build());
//!   authenticator.add_validator(NonEmptyPrincipal);
//!   authenticator.add_listener(TraceListener);
//!   let authenticator = authenticator.build();
//!
//!   // the resource here is a plain path
//!   let mut authorizer = Authorizer::<str>::builder();
//!   authorizer.add_approver(|_: &Context, path: &str, token: &dyn Token| {
//!     if token.principal() == "joe" && path.starts_with("/joe/") {
//!       Ok(())
//!     } else {
//!       Err(error::Error::Unauthorized)
//!     }
//!   });
//!   authorizer.add_listener(TraceListener);
//!   let authorizer = authorizer.build();
//!
//!   let ctx = Context::new();
//!   // "joe:pass"
//!   let token = authenticator.authenticate(&ctx, "Basic am9lOnBhc3M=")?;
//!   assert!(get_capabilities(token.as_ref()).is_none());
//!
//!   authorizer.authorize(&ctx, "/joe/profile", &token)?;
//!   assert_eq!(
//!     authorizer.authorize(&ctx, "/ann/profile", &token),
//!     Err(error::Error::Unauthorized)
//!   );
//!
//!   Ok(())
//! }
//! ```
pub mod approver;
pub mod authenticator;
pub mod authorizer;
pub mod context;
pub mod credentials;
pub mod error;
pub mod listener;
pub mod resolver;
pub mod token;
pub mod validator;

pub use approver::{AnyApprovers, Approver, Approvers};
pub use authenticator::{Authenticator, AuthenticatorBuilder};
pub use authorizer::{Authorizer, AuthorizerBuilder};
pub use context::Context;
pub use credentials::{Credentials, CredentialsParser, DefaultCredentialsParser, Scheme};
pub use error::{Error, ErrorKind};
pub use listener::{Event, EventKind, Listener, Listeners};
pub use resolver::KeyResolver;
pub use token::Token;
pub use validator::{Validator, Validators};
