//! checks an authenticated token's access to a resource
use std::{fmt, sync::Arc};

use crate::{
    approver::{Approver, Approvers},
    context::Context,
    error::Error,
    listener::{Event, EventKind, Listener, Listeners},
    token::Token,
};

/// runs its approvers, then reports the outcome to its listeners
///
/// `R` is the resource type, like an HTTP request
pub struct Authorizer<R: ?Sized> {
    approvers: Approvers<R>,
    listeners: Listeners<R>,
}

impl<R: ?Sized> Authorizer<R> {
    pub fn builder() -> AuthorizerBuilder<R> {
        AuthorizerBuilder::default()
    }

    pub fn approvers(&self) -> &Approvers<R> {
        &self.approvers
    }

    /// dispatches exactly one [`EventKind::Authorize`] event, whatever the
    /// outcome
    pub fn authorize(
        &self,
        ctx: &Context,
        resource: &R,
        token: &Arc<dyn Token>,
    ) -> Result<(), Error> {
        let result = self.approvers.approve(ctx, resource, token.as_ref());

        self.listeners.dispatch(&Event {
            kind: EventKind::Authorize,
            subject: resource,
            token: Some(token),
            err: result.as_ref().err(),
        });

        result
    }
}

impl<R: ?Sized> Clone for Authorizer<R> {
    fn clone(&self) -> Self {
        Authorizer {
            approvers: self.approvers.clone(),
            listeners: self.listeners.clone(),
        }
    }
}

impl<R: ?Sized> fmt::Debug for Authorizer<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("approvers", &self.approvers)
            .field("listeners", &self.listeners)
            .finish()
    }
}

pub struct AuthorizerBuilder<R: ?Sized> {
    approvers: Vec<Arc<dyn Approver<R>>>,
    listeners: Vec<Arc<dyn Listener<R>>>,
}

impl<R: ?Sized> AuthorizerBuilder<R> {
    pub fn new() -> Self {
        AuthorizerBuilder::default()
    }

    pub fn add_approver<A: Approver<R> + 'static>(&mut self, approver: A) {
        self.approvers.push(Arc::new(approver));
    }

    pub fn add_listener<L: Listener<R> + 'static>(&mut self, listener: L) {
        self.listeners.push(Arc::new(listener));
    }

    pub fn build(self) -> Authorizer<R> {
        Authorizer {
            approvers: Approvers::new(self.approvers),
            listeners: Listeners::new(self.listeners),
        }
    }
}

impl<R: ?Sized> Default for AuthorizerBuilder<R> {
    fn default() -> Self {
        AuthorizerBuilder {
            approvers: Vec::new(),
            listeners: Vec::new(),
        }
    }
}
