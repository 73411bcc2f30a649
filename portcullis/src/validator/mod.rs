//! authentication rules and their composition
//!
//! A [`Validator`] checks a freshly parsed token. [`Validators`] runs every
//! member, whatever the outcome of the previous ones, so that a failed
//! authentication reports every rule that rejected the token.
use std::{fmt, sync::Arc};

use crate::{context::Context, error::Error, token::Token};

mod attribute;
mod principal;
mod window;

pub use attribute::AttributeEquals;
pub use principal::NonEmptyPrincipal;
pub use window::TimeWindow;

/// an authentication rule
///
/// returns `Ok(None)` when the token passed or the rule does not apply, and
/// `Ok(Some(token))` when the token passed and the rule produced an augmented
/// version of it, which replaces the original for the rest of the pipeline
pub trait Validator: Send + Sync {
    fn validate(&self, ctx: &Context, token: &Arc<dyn Token>)
        -> Result<Option<Arc<dyn Token>>, Error>;
}

impl Validator for Box<dyn Validator> {
    fn validate(
        &self,
        ctx: &Context,
        token: &Arc<dyn Token>,
    ) -> Result<Option<Arc<dyn Token>>, Error> {
        self.as_ref().validate(ctx, token)
    }
}

impl Validator for Arc<dyn Validator> {
    fn validate(
        &self,
        ctx: &Context,
        token: &Arc<dyn Token>,
    ) -> Result<Option<Arc<dyn Token>>, Error> {
        self.as_ref().validate(ctx, token)
    }
}

impl<F> Validator for F
where
    F: Fn(&Context, &Arc<dyn Token>) -> Result<Option<Arc<dyn Token>>, Error> + Send + Sync,
{
    fn validate(
        &self,
        ctx: &Context,
        token: &Arc<dyn Token>,
    ) -> Result<Option<Arc<dyn Token>>, Error> {
        self(ctx, token)
    }
}

/// an ordered, fixed set of validators that all have to pass
#[derive(Clone)]
pub struct Validators {
    validators: Arc<[Arc<dyn Validator>]>,
}

impl Validators {
    pub fn new(validators: Vec<Arc<dyn Validator>>) -> Self {
        Validators {
            validators: validators.into(),
        }
    }

    /// returns a new set with `validator` added at the end
    pub fn append<V: Validator + 'static>(&self, validator: V) -> Self {
        let mut validators = self.validators.to_vec();
        validators.push(Arc::new(validator));
        Validators::new(validators)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// runs every validator in order and returns the final token with the
    /// outcome
    ///
    /// each validator sees the token produced by the previous augmentation.
    /// Errors are collected in registration order and combined with
    /// [`Error::aggregate`]. A validator is not invoked if the context is
    /// done, the cancellation error is recorded in its place.
    pub fn run(&self, ctx: &Context, token: Arc<dyn Token>) -> (Arc<dyn Token>, Result<(), Error>) {
        let mut token = token;
        let mut errors = Vec::new();

        for validator in self.validators.iter() {
            if let Err(e) = ctx.check() {
                errors.push(e);
                continue;
            }

            match validator.validate(ctx, &token) {
                Ok(Some(augmented)) => token = augmented,
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        match Error::aggregate(errors) {
            None => (token, Ok(())),
            Some(e) => (token, Err(e)),
        }
    }
}

impl Validator for Validators {
    fn validate(
        &self,
        ctx: &Context,
        token: &Arc<dyn Token>,
    ) -> Result<Option<Arc<dyn Token>>, Error> {
        let (result_token, result) = self.run(ctx, token.clone());
        result?;

        if Arc::ptr_eq(&result_token, token) {
            Ok(None)
        } else {
            Ok(Some(result_token))
        }
    }
}

impl Default for Validators {
    fn default() -> Self {
        Validators::new(Vec::new())
    }
}

impl fmt::Debug for Validators {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Validators")
            .field("len", &self.validators.len())
            .finish()
    }
}
