//! reading credentials out of request headers
use http::{header::AUTHORIZATION, HeaderMap, HeaderName, Request};
use portcullis::error::Error;

/// the raw credentials of the `Authorization` header
///
/// the value is returned as is, splitting it into a scheme and a value is
/// the job of the authenticator's credentials parser
pub fn credentials_from_headers(headers: &HeaderMap) -> Result<&str, Error> {
    credentials_from_header(headers, &AUTHORIZATION)
}

/// the raw credentials of a custom header
pub fn credentials_from_header<'h>(
    headers: &'h HeaderMap,
    name: &HeaderName,
) -> Result<&'h str, Error> {
    let value = headers.get(name).ok_or(Error::MissingCredentials)?;

    value.to_str().map_err(|_| Error::InvalidCredentials {
        raw: String::from_utf8_lossy(value.as_bytes()).into_owned(),
    })
}

pub fn credentials_from_request<B>(request: &Request<B>) -> Result<&str, Error> {
    credentials_from_headers(request.headers())
}
