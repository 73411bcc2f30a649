use serde_json::Value;

use super::{Attributes, Token};
use crate::error::Error;

/// a token made of a principal and a set of claims
///
/// this is what scheme parsers decoding claim based credentials (JWT
/// payloads, introspection responses) usually produce
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClaimsToken {
    principal: String,
    capabilities: Option<Vec<String>>,
    attributes: Attributes,
}

impl ClaimsToken {
    pub fn new<P: Into<String>>(principal: P) -> Self {
        ClaimsToken {
            principal: principal.into(),
            capabilities: None,
            attributes: Attributes::new(),
        }
    }

    /// builds a token from decoded claims, reading the principal from the
    /// `principal_claim` string claim
    pub fn from_claims(claims: Attributes, principal_claim: &str) -> Result<Self, Error> {
        let principal = claims
            .get(principal_claim)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::BadCredentials(format!("missing string claim {:?}", principal_claim))
            })?
            .to_string();

        Ok(ClaimsToken {
            principal,
            capabilities: None,
            attributes: claims,
        })
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = Some(capabilities.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_attribute<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl Token for ClaimsToken {
    fn principal(&self) -> &str {
        &self.principal
    }

    fn capabilities(&self) -> Option<&[String]> {
        self.capabilities.as_deref()
    }

    fn attributes(&self) -> Option<&Attributes> {
        Some(&self.attributes)
    }
}
