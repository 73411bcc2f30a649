use std::sync::Arc;

use super::Validator;
use crate::{
    context::Context,
    error::{Error, Validation},
    token::Token,
};

/// rejects tokens with an empty principal
#[derive(Clone, Copy, Debug, Default)]
pub struct NonEmptyPrincipal;

impl Validator for NonEmptyPrincipal {
    fn validate(
        &self,
        _ctx: &Context,
        token: &Arc<dyn Token>,
    ) -> Result<Option<Arc<dyn Token>>, Error> {
        if token.principal().is_empty() {
            Err(Validation::EmptyPrincipal.into())
        } else {
            Ok(None)
        }
    }
}
