//! mapping pipeline failures to HTTP responses
use http::{Response, StatusCode};
use portcullis::error::{Error, ErrorKind};

use crate::{challenge::Challenges, error};

/// the status code of a failed request
///
/// missing credentials are a 401 only when the client is told how to
/// authenticate, otherwise a 403. Every other failure uses
/// [`Error::status_code`].
pub fn status_for(err: &Error, challenges: &Challenges) -> StatusCode {
    if err.kind() == ErrorKind::MissingCredentials {
        return if challenges.is_empty() {
            StatusCode::FORBIDDEN
        } else {
            StatusCode::UNAUTHORIZED
        };
    }

    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// an empty response for a failed request, carrying the challenges when the
/// status is 401
pub fn error_response(err: &Error, challenges: &Challenges) -> Result<Response<()>, error::Challenge> {
    let mut response = Response::new(());
    *response.status_mut() = status_for(err, challenges);

    if response.status() == StatusCode::UNAUTHORIZED {
        challenges.write_headers(response.headers_mut())?;
    }

    Ok(response)
}
