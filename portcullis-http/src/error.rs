//! errors specific to the HTTP adapters
use portcullis_parser::error::ParseError;
use thiserror::Error;

/// failures building, parsing or writing a challenge
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Challenge {
    #[error("invalid challenge scheme {0:?}")]
    InvalidScheme(String),
    #[error("invalid challenge parameter name {0:?}")]
    InvalidParameterName(String),
    #[error("the {0:?} parameter is reserved")]
    ReservedParameter(String),
    #[error("the challenge has no realm")]
    MissingRealm,
    #[error("invalid challenge: {0}")]
    Parse(#[from] ParseError),
    #[error("challenge {0:?} is not a valid header value")]
    InvalidHeaderValue(String),
}
