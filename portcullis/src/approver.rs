//! authorization rules and their composition
//!
//! [`Approvers`] is a logical AND that stops at the first denial, since
//! approvers may be expensive to run. [`AnyApprovers`] is the logical OR,
//! obtained from [`Approvers::any`].
use std::{fmt, sync::Arc};

use crate::{context::Context, error::Error, token::Token};

/// an authorization rule over a resource and an authenticated token
pub trait Approver<R: ?Sized>: Send + Sync {
    fn approve(&self, ctx: &Context, resource: &R, token: &dyn Token) -> Result<(), Error>;
}

impl<R: ?Sized> Approver<R> for Box<dyn Approver<R>> {
    fn approve(&self, ctx: &Context, resource: &R, token: &dyn Token) -> Result<(), Error> {
        self.as_ref().approve(ctx, resource, token)
    }
}

impl<R: ?Sized> Approver<R> for Arc<dyn Approver<R>> {
    fn approve(&self, ctx: &Context, resource: &R, token: &dyn Token) -> Result<(), Error> {
        self.as_ref().approve(ctx, resource, token)
    }
}

impl<R: ?Sized, F> Approver<R> for F
where
    F: Fn(&Context, &R, &dyn Token) -> Result<(), Error> + Send + Sync,
{
    fn approve(&self, ctx: &Context, resource: &R, token: &dyn Token) -> Result<(), Error> {
        self(ctx, resource, token)
    }
}

/// approves only if every member approves
///
/// members run in registration order, the first denial is returned and the
/// remaining members are not invoked. An empty set approves.
pub struct Approvers<R: ?Sized> {
    approvers: Arc<[Arc<dyn Approver<R>>]>,
}

impl<R: ?Sized> Approvers<R> {
    pub fn new(approvers: Vec<Arc<dyn Approver<R>>>) -> Self {
        Approvers {
            approvers: approvers.into(),
        }
    }

    /// returns a new set with `approver` added at the end
    pub fn append<A: Approver<R> + 'static>(&self, approver: A) -> Self {
        let mut approvers = self.approvers.to_vec();
        approvers.push(Arc::new(approver));
        Approvers::new(approvers)
    }

    pub fn len(&self) -> usize {
        self.approvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approvers.is_empty()
    }

    /// a logical OR over a snapshot of the current members
    pub fn any(&self) -> AnyApprovers<R> {
        AnyApprovers {
            approvers: self.approvers.iter().cloned().collect(),
        }
    }
}

impl<R: ?Sized> Approver<R> for Approvers<R> {
    fn approve(&self, ctx: &Context, resource: &R, token: &dyn Token) -> Result<(), Error> {
        for approver in self.approvers.iter() {
            ctx.check()?;
            approver.approve(ctx, resource, token)?;
        }

        Ok(())
    }
}

impl<R: ?Sized> Clone for Approvers<R> {
    fn clone(&self) -> Self {
        Approvers {
            approvers: self.approvers.clone(),
        }
    }
}

impl<R: ?Sized> Default for Approvers<R> {
    fn default() -> Self {
        Approvers::new(Vec::new())
    }
}

impl<R: ?Sized> fmt::Debug for Approvers<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Approvers")
            .field("len", &self.approvers.len())
            .finish()
    }
}

/// approves as soon as one member approves
///
/// when every member denies, the denials are combined with
/// [`Error::aggregate`]. An empty set denies with [`Error::Unauthorized`].
pub struct AnyApprovers<R: ?Sized> {
    approvers: Arc<[Arc<dyn Approver<R>>]>,
}

impl<R: ?Sized> AnyApprovers<R> {
    pub fn len(&self) -> usize {
        self.approvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approvers.is_empty()
    }
}

impl<R: ?Sized> Approver<R> for AnyApprovers<R> {
    fn approve(&self, ctx: &Context, resource: &R, token: &dyn Token) -> Result<(), Error> {
        let mut errors = Vec::with_capacity(self.approvers.len());

        for approver in self.approvers.iter() {
            ctx.check()?;
            match approver.approve(ctx, resource, token) {
                Ok(()) => return Ok(()),
                Err(e) => errors.push(e),
            }
        }

        Err(Error::aggregate(errors).unwrap_or(Error::Unauthorized))
    }
}

impl<R: ?Sized> Clone for AnyApprovers<R> {
    fn clone(&self) -> Self {
        AnyApprovers {
            approvers: self.approvers.clone(),
        }
    }
}

impl<R: ?Sized> fmt::Debug for AnyApprovers<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AnyApprovers")
            .field("len", &self.approvers.len())
            .finish()
    }
}
