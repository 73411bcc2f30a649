//! error types
//!
//! Every failure in the pipeline is an [`Error`]. Errors carry a broad
//! [`ErrorKind`], a suggested HTTP status code and, for most variants, a
//! machine readable reason usable as a metrics label.

use crate::credentials::Scheme;
use std::fmt;
use thiserror::Error;

/// the broad category of a failure, independent of the concrete error value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// no credentials were presented
    MissingCredentials,
    /// the credentials could not be parsed
    InvalidCredentials,
    /// the credentials were understood but did not authenticate
    Unauthenticated,
    /// the authenticated token is not allowed to access the resource
    Unauthorized,
    /// the request context was cancelled or ran past its deadline
    Cancelled,
    Internal,
}

impl ErrorKind {
    /// suggested HTTP status code for this kind of failure
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::MissingCredentials => 401,
            ErrorKind::InvalidCredentials => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::Unauthorized => 403,
            ErrorKind::Cancelled => 503,
            ErrorKind::Internal => 500,
        }
    }
}

/// the global error type for the pipeline
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Error {
    #[error("missing credentials")]
    MissingCredentials,
    #[error("invalid credentials: {raw:?}")]
    InvalidCredentials { raw: String },
    #[error("bad credentials: {0}")]
    BadCredentials(String),
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(Scheme),
    #[error("unknown key id: {0}")]
    UnknownKey(String),
    #[error("token validation failed: {0}")]
    Validation(#[from] Validation),
    #[error("token has no capabilities")]
    MissingCapabilities,
    #[error("unauthorized")]
    Unauthorized,
    #[error("unauthorized: {0}")]
    Capability(#[from] Capability),
    #[error("operation cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("{0}")]
    Multiple(Errors),
    #[error("{source}")]
    Reasoned {
        reason: String,
        #[source]
        source: Box<Error>,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] Config),
    #[error("{message}")]
    Other { kind: ErrorKind, message: String },
}

impl Error {
    /// creates an error of the given kind from any displayable failure
    ///
    /// this is the entry point for validators, approvers and parsers that
    /// wrap errors from their own collaborators
    pub fn other<M: fmt::Display>(kind: ErrorKind, message: M) -> Self {
        Error::Other {
            kind,
            message: message.to_string(),
        }
    }

    /// wraps this error with a machine readable reason
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Error::Reasoned {
            reason: reason.into(),
            source: Box::new(self),
        }
    }

    /// the broad category of this error
    ///
    /// wrappers report the kind of the error they wrap, aggregates report the
    /// kind of their first member
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingCredentials => ErrorKind::MissingCredentials,
            Error::InvalidCredentials { .. } | Error::BadCredentials(_) => {
                ErrorKind::InvalidCredentials
            }
            Error::UnsupportedScheme(_) | Error::UnknownKey(_) | Error::Validation(_) => {
                ErrorKind::Unauthenticated
            }
            Error::MissingCapabilities | Error::Unauthorized | Error::Capability(_) => {
                ErrorKind::Unauthorized
            }
            Error::Cancelled | Error::DeadlineExceeded => ErrorKind::Cancelled,
            Error::Multiple(errors) => errors
                .first()
                .map(Error::kind)
                .unwrap_or(ErrorKind::Internal),
            Error::Reasoned { source, .. } => source.kind(),
            Error::Config(_) => ErrorKind::Internal,
            Error::Other { kind, .. } => *kind,
        }
    }

    /// returns true if this error, or anything it wraps or aggregates, is of
    /// the given kind
    pub fn is(&self, kind: ErrorKind) -> bool {
        match self {
            Error::Multiple(errors) => errors.iter().any(|e| e.is(kind)),
            Error::Reasoned { source, .. } => source.is(kind),
            _ => self.kind() == kind,
        }
    }

    /// machine readable failure reason, usable as a metrics label
    pub fn reason(&self) -> Option<&str> {
        match self {
            Error::MissingCredentials => Some("missing_credentials"),
            Error::InvalidCredentials { .. } => Some("invalid_credentials"),
            Error::BadCredentials(_) => Some("bad_credentials"),
            Error::UnsupportedScheme(_) => Some("unsupported_scheme"),
            Error::UnknownKey(_) => Some("unknown_key"),
            Error::Validation(v) => Some(v.reason()),
            Error::MissingCapabilities => Some("missing_capabilities"),
            Error::Unauthorized => Some("unauthorized"),
            Error::Capability(c) => Some(c.reason()),
            Error::Cancelled => Some("cancelled"),
            Error::DeadlineExceeded => Some("deadline_exceeded"),
            Error::Multiple(errors) => errors.first().and_then(Error::reason),
            Error::Reasoned { reason, .. } => Some(reason),
            Error::Config(_) => Some("invalid_configuration"),
            Error::Other { .. } => None,
        }
    }

    /// suggested HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Error::DeadlineExceeded => 504,
            Error::Multiple(errors) => errors
                .first()
                .map(Error::status_code)
                .unwrap_or_else(|| ErrorKind::Internal.status_code()),
            Error::Reasoned { source, .. } => source.status_code(),
            _ => self.kind().status_code(),
        }
    }

    /// combines the errors collected by a composite rule
    ///
    /// returns `None` if there are no errors, the error itself if there is
    /// exactly one, and [`Error::Multiple`] otherwise
    pub fn aggregate(mut errors: Vec<Error>) -> Option<Error> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Error::Multiple(Errors(errors))),
        }
    }
}

/// an ordered collection of errors reported together
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Errors(Vec<Error>);

impl Errors {
    pub fn first(&self) -> Option<&Error> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Error> {
        self.0
    }
}

impl From<Vec<Error>> for Errors {
    fn from(errors: Vec<Error>) -> Self {
        Errors(errors)
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

/// authentication rule failures
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Validation {
    #[error("the token principal is empty")]
    EmptyPrincipal,
    #[error("missing attribute {0}")]
    MissingAttribute(String),
    #[error("attribute {0} does not hold the expected value")]
    AttributeMismatch(String),
    #[error("the token has expired")]
    Expired,
    #[error("the token is not valid yet")]
    NotYetValid,
    #[error("{0}")]
    Rejected(String),
}

impl Validation {
    pub fn reason(&self) -> &'static str {
        match self {
            Validation::EmptyPrincipal => "empty_principal",
            Validation::MissingAttribute(_) => "missing_attribute",
            Validation::AttributeMismatch(_) => "attribute_mismatch",
            Validation::Expired => "expired",
            Validation::NotYetValid => "not_yet_valid",
            Validation::Rejected(_) => "rejected",
        }
    }
}

/// capability check failures
///
/// all of them deny access, they differ in which part of the check failed
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Capability {
    #[error("no capabilities match")]
    NoCapabilitiesMatch,
    #[error("the request is missing the values needed to check capabilities")]
    MissingValues,
    #[error("could not determine the token capabilities")]
    UndeterminedCapabilities,
    #[error("could not determine the partner ids of the token")]
    UndeterminedPartner,
    #[error("capability {capability:?} does not allow method {method}")]
    MethodMismatch { capability: String, method: String },
    #[error("capability {capability:?} does not match path {path}")]
    UrlMismatch { capability: String, path: String },
    #[error("capability {capability:?} holds an invalid url pattern: {message}")]
    InvalidPattern { capability: String, message: String },
}

impl Capability {
    pub fn reason(&self) -> &'static str {
        match self {
            Capability::NoCapabilitiesMatch => "no_capabilities_match",
            Capability::MissingValues => "missing_values",
            Capability::UndeterminedCapabilities => "undetermined_capabilities",
            Capability::UndeterminedPartner => "undetermined_partner",
            Capability::MethodMismatch { .. } => "method_mismatch",
            Capability::UrlMismatch { .. } => "url_mismatch",
            Capability::InvalidPattern { .. } => "invalid_pattern",
        }
    }
}

/// errors raised while building a pipeline component
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Config {
    #[error("scheme {0} is registered twice")]
    DuplicateScheme(Scheme),
    #[error("invalid capability prefix {prefix:?}: {message}")]
    InvalidPrefix { prefix: String, message: String },
    #[error("capability prefix {prefix:?} must not contain capture groups")]
    PrefixCaptureGroups { prefix: String },
    #[error("invalid endpoint pattern {pattern:?}: {message}")]
    InvalidEndpoint { pattern: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_format_strings() {
        assert_eq!(
            format!(
                "{}",
                Error::InvalidCredentials {
                    raw: "Basic".to_string()
                }
            ),
            "invalid credentials: \"Basic\""
        );

        assert_eq!(
            format!("{}", Error::UnsupportedScheme(Scheme::BEARER)),
            "unsupported scheme: Bearer"
        );

        assert_eq!(
            format!(
                "{}",
                Error::Multiple(Errors::from(vec![
                    Error::Validation(Validation::EmptyPrincipal),
                    Error::Validation(Validation::Expired),
                ]))
            ),
            "token validation failed: the token principal is empty; token validation failed: the token has expired"
        );
    }

    #[test]
    fn kinds_and_statuses() {
        assert_eq!(Error::MissingCredentials.status_code(), 401);
        assert_eq!(Error::BadCredentials("x".to_string()).status_code(), 400);
        assert_eq!(Error::UnsupportedScheme(Scheme::BASIC).status_code(), 401);
        assert_eq!(Error::MissingCapabilities.status_code(), 403);
        assert_eq!(
            Error::Capability(Capability::NoCapabilitiesMatch).status_code(),
            403
        );
        assert_eq!(Error::DeadlineExceeded.status_code(), 504);
        assert_eq!(Error::DeadlineExceeded.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn chain() {
        let err = Error::Capability(Capability::MethodMismatch {
            capability: "x1:webpa:api:.*:put".to_string(),
            method: "GET".to_string(),
        })
        .with_reason("custom_reason");

        assert!(err.is(ErrorKind::Unauthorized));
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.reason(), Some("custom_reason"));
        assert_eq!(err.status_code(), 403);

        let source = std::error::Error::source(&err).expect("wrapped error");
        assert_eq!(
            source.to_string(),
            "unauthorized: capability \"x1:webpa:api:.*:put\" does not allow method GET"
        );
        let cause = source.source().expect("capability cause");
        assert_eq!(
            cause.to_string(),
            "capability \"x1:webpa:api:.*:put\" does not allow method GET"
        );
    }

    #[test]
    fn aggregate() {
        assert_eq!(Error::aggregate(vec![]), None);
        assert_eq!(
            Error::aggregate(vec![Error::Unauthorized]),
            Some(Error::Unauthorized)
        );

        let err = Error::aggregate(vec![Error::Cancelled, Error::Unauthorized]).unwrap();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(err.is(ErrorKind::Unauthorized));
        assert_eq!(err.reason(), Some("cancelled"));
    }

    #[test]
    fn other_errors() {
        let err = Error::other(ErrorKind::Unauthenticated, "introspection refused the token");
        assert_eq!(err.to_string(), "introspection refused the token");
        assert_eq!(err.reason(), None);
        assert_eq!(err.status_code(), 401);
        assert_eq!(
            err.with_reason("introspection").reason(),
            Some("introspection")
        );
    }
}
