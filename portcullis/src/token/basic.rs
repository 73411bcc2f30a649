//! the `Basic` scheme: base64 encoded `user:password` pairs
use std::{fmt, sync::Arc};

use zeroize::Zeroizing;

use super::{parser::TokenParser, Token};
use crate::{context::Context, credentials::Credentials, error::Error};

/// a user and password pair
///
/// the password is wiped from memory when the token is dropped
#[derive(Clone)]
pub struct BasicToken {
    user: String,
    password: Zeroizing<String>,
}

impl BasicToken {
    pub fn new<U: Into<String>, P: Into<String>>(user: U, password: P) -> Self {
        BasicToken {
            user: user.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// decodes the value of a `Basic` credential
    pub fn from_value(value: &str) -> Result<Self, Error> {
        let decoded = Zeroizing::new(
            base64::decode(value)
                .map_err(|e| Error::BadCredentials(format!("invalid base64: {}", e)))?,
        );

        let decoded = std::str::from_utf8(&decoded)
            .map_err(|_| Error::BadCredentials("credentials are not valid UTF-8".to_string()))?;

        let (user, password) = decoded.split_once(':').ok_or_else(|| {
            Error::BadCredentials("expected credentials of the form user:password".to_string())
        })?;

        Ok(BasicToken::new(user, password))
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// encodes the token as the value of a `Basic` credential
    pub fn to_value(&self) -> String {
        let pair = Zeroizing::new(format!("{}:{}", self.user, self.password.as_str()));
        base64::encode(pair.as_bytes())
    }
}

impl fmt::Debug for BasicToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BasicToken")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Token for BasicToken {
    fn principal(&self) -> &str {
        &self.user
    }

    fn password(&self) -> Option<&str> {
        Some(self.password.as_str())
    }
}

/// parses `Basic` credentials into a [`BasicToken`]
///
/// the password is not checked here, that is the job of a validator
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicTokenParser;

impl TokenParser for BasicTokenParser {
    fn parse(&self, _ctx: &Context, credentials: &Credentials) -> Result<Arc<dyn Token>, Error> {
        Ok(Arc::new(BasicToken::from_value(&credentials.value)?))
    }
}
