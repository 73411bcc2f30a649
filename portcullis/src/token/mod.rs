//! tokens, their optional facets, and the parsers producing them
//!
//! A [`Token`] is the structured form of a credential. The only thing every
//! token must provide is a principal. Capabilities, a password and arbitrary
//! attributes are optional facets: a token opts into one by overriding the
//! corresponding method, and code that needs a facet goes through the
//! discovery functions of this module, which also look for the facet in the
//! token attributes.
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod basic;
pub mod claims;
pub mod parser;

pub use basic::{BasicToken, BasicTokenParser};
pub use claims::ClaimsToken;
pub use parser::{TokenParser, TokenParsers, TokenParsersBuilder};

/// arbitrary token data, usually the claims of a decoded credential
pub type Attributes = serde_json::Map<String, Value>;

/// attribute key holding capabilities when a token does not expose them directly
pub const CAPABILITIES_KEY: &str = "capabilities";
/// attribute key holding a password when a token does not expose it directly
pub const PASSWORD_KEY: &str = "password";

/// the structured representation of a credential
///
/// tokens are created once per request and are read only afterwards
pub trait Token: fmt::Debug + Send + Sync {
    /// the identity this token was issued to
    fn principal(&self) -> &str;

    fn capabilities(&self) -> Option<&[String]> {
        None
    }

    fn password(&self) -> Option<&str> {
        None
    }

    fn attributes(&self) -> Option<&Attributes> {
        None
    }
}

/// finds the capabilities of a token
///
/// In order:
/// 1. the token's own [`Token::capabilities`]
/// 2. the [`CAPABILITIES_KEY`] attribute, converted with [`capabilities_from_value`]
pub fn get_capabilities(token: &dyn Token) -> Option<Vec<String>> {
    if let Some(capabilities) = token.capabilities() {
        return Some(capabilities.to_vec());
    }

    token
        .attributes()
        .and_then(|attributes| attributes.get(CAPABILITIES_KEY))
        .and_then(capabilities_from_value)
}

/// converts an attribute value into a list of capabilities
///
/// an array qualifies only if every element is a string, a single string is
/// a list of one capability, anything else does not qualify
pub fn capabilities_from_value(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(values) => values
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

/// finds the password of a token, from [`Token::password`] first, then from
/// the [`PASSWORD_KEY`] string attribute
pub fn get_password(token: &dyn Token) -> Option<&str> {
    token.password().or_else(|| {
        token
            .attributes()
            .and_then(|attributes| attributes.get(PASSWORD_KEY))
            .and_then(Value::as_str)
    })
}

/// follows a path of keys through nested attribute objects
pub fn get_nested_attribute<'t>(token: &'t dyn Token, keys: &[&str]) -> Option<&'t Value> {
    let (first, rest) = keys.split_first()?;
    let mut value = token.attributes()?.get(*first)?;
    for key in rest {
        value = value.as_object()?.get(*key)?;
    }

    Some(value)
}

/// reads a nested attribute as a typed value
///
/// returns `None` if the attribute is missing or does not deserialize to `T`
pub fn get_attribute<T: DeserializeOwned>(token: &dyn Token, keys: &[&str]) -> Option<T> {
    get_nested_attribute(token, keys).and_then(|value| T::deserialize(value).ok())
}
