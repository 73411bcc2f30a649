use std::sync::Arc;

use serde_json::Value;

use super::Validator;
use crate::{
    context::Context,
    error::{Error, Validation},
    token::{get_nested_attribute, Token},
};

/// requires a nested attribute to hold an exact value
///
/// the path is a list of keys through nested attribute objects, like
/// `["allowedResources", "tier"]`
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeEquals {
    keys: Vec<String>,
    expected: Value,
}

impl AttributeEquals {
    pub fn new<I, K, V>(keys: I, expected: V) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
        V: Into<Value>,
    {
        AttributeEquals {
            keys: keys.into_iter().map(Into::into).collect(),
            expected: expected.into(),
        }
    }

    fn path(&self) -> String {
        self.keys.join(".")
    }
}

impl Validator for AttributeEquals {
    fn validate(
        &self,
        _ctx: &Context,
        token: &Arc<dyn Token>,
    ) -> Result<Option<Arc<dyn Token>>, Error> {
        let keys: Vec<&str> = self.keys.iter().map(String::as_str).collect();

        match get_nested_attribute(token.as_ref(), &keys) {
            None => Err(Validation::MissingAttribute(self.path()).into()),
            Some(value) if *value == self.expected => Ok(None),
            Some(_) => Err(Validation::AttributeMismatch(self.path()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::ClaimsToken;
    use serde_json::json;

    #[test]
    fn nested_values() {
        let token: Arc<dyn Token> = Arc::new(
            ClaimsToken::new("joe").with_attribute("account", json!({ "tier": "gold" })),
        );
        let ctx = Context::new();

        assert!(AttributeEquals::new(["account", "tier"], "gold")
            .validate(&ctx, &token)
            .unwrap()
            .is_none());
        assert_eq!(
            AttributeEquals::new(["account", "tier"], "silver")
                .validate(&ctx, &token)
                .unwrap_err(),
            Error::Validation(Validation::AttributeMismatch("account.tier".to_string()))
        );
        assert_eq!(
            AttributeEquals::new(["account", "region"], "eu")
                .validate(&ctx, &token)
                .unwrap_err(),
            Error::Validation(Validation::MissingAttribute("account.region".to_string()))
        );
    }
}
