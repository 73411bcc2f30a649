use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::Validator;
use crate::{
    context::Context,
    error::{Error, Validation},
    token::Token,
};

pub const EXPIRATION_KEY: &str = "exp";
pub const NOT_BEFORE_KEY: &str = "nbf";

/// checks the `exp` and `nbf` attributes, as unix timestamps in seconds
///
/// tokens without these attributes pass unless `require_expiry` is set
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeWindow {
    /// allowed clock skew, in seconds
    pub leeway: u64,
    pub require_expiry: bool,
}

impl TimeWindow {
    pub fn new(leeway: u64) -> Self {
        TimeWindow {
            leeway,
            require_expiry: false,
        }
    }

    pub fn require_expiry(mut self) -> Self {
        self.require_expiry = true;
        self
    }

    pub fn check_at(&self, token: &dyn Token, now: OffsetDateTime) -> Result<(), Validation> {
        let now = now.unix_timestamp();
        let leeway = i64::try_from(self.leeway).unwrap_or(i64::MAX);

        match timestamp(token, EXPIRATION_KEY)? {
            Some(exp) if now > exp.saturating_add(leeway) => return Err(Validation::Expired),
            None if self.require_expiry => {
                return Err(Validation::MissingAttribute(EXPIRATION_KEY.to_string()))
            }
            _ => {}
        }

        match timestamp(token, NOT_BEFORE_KEY)? {
            Some(nbf) if now < nbf.saturating_sub(leeway) => Err(Validation::NotYetValid),
            _ => Ok(()),
        }
    }
}

fn timestamp(token: &dyn Token, key: &str) -> Result<Option<i64>, Validation> {
    match token.attributes().and_then(|attributes| attributes.get(key)) {
        None | Some(Value::Null) => Ok(None),
        // NumericDate values may carry fractional seconds
        Some(value) => value
            .as_i64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|seconds| seconds.is_finite())
                    .map(|seconds| seconds.floor() as i64)
            })
            .map(Some)
            .ok_or_else(|| Validation::Rejected(format!("{} is not a numeric timestamp", key))),
    }
}

impl Validator for TimeWindow {
    fn validate(
        &self,
        _ctx: &Context,
        token: &Arc<dyn Token>,
    ) -> Result<Option<Arc<dyn Token>>, Error> {
        self.check_at(token.as_ref(), OffsetDateTime::now_utc())?;
        Ok(None)
    }
}
