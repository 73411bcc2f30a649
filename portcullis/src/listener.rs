//! event dispatch after each pipeline stage
//!
//! Listeners are where metrics, logging and auditing attach. They are called
//! synchronously, in registration order, once per pipeline invocation, and
//! cannot fail the pipeline. A listener with expensive work to do should hand
//! it off on its own.
use std::{fmt, sync::Arc};

use crate::{error::Error, token::Token};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Authenticate,
    Authorize,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Authenticate => "authenticate",
            EventKind::Authorize => "authorize",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// the outcome of one pipeline invocation
///
/// `subject` is the raw source for authentication events and the resource
/// for authorization events
#[derive(Debug)]
pub struct Event<'a, S: ?Sized> {
    pub kind: EventKind,
    pub subject: &'a S,
    pub token: Option<&'a Arc<dyn Token>>,
    pub err: Option<&'a Error>,
}

impl<'a, S: ?Sized> Event<'a, S> {
    pub fn is_success(&self) -> bool {
        self.err.is_none()
    }
}

impl<'a, S: ?Sized> Clone for Event<'a, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, S: ?Sized> Copy for Event<'a, S> {}

pub trait Listener<S: ?Sized>: Send + Sync {
    fn on_event(&self, event: &Event<'_, S>);
}

impl<S: ?Sized> Listener<S> for Box<dyn Listener<S>> {
    fn on_event(&self, event: &Event<'_, S>) {
        self.as_ref().on_event(event)
    }
}

impl<S: ?Sized> Listener<S> for Arc<dyn Listener<S>> {
    fn on_event(&self, event: &Event<'_, S>) {
        self.as_ref().on_event(event)
    }
}

impl<S: ?Sized, F> Listener<S> for F
where
    F: Fn(&Event<'_, S>) + Send + Sync,
{
    fn on_event(&self, event: &Event<'_, S>) {
        self(event)
    }
}

/// ordered fan-out to a fixed set of listeners
pub struct Listeners<S: ?Sized> {
    listeners: Arc<[Arc<dyn Listener<S>>]>,
}

impl<S: ?Sized> Listeners<S> {
    pub fn new(listeners: Vec<Arc<dyn Listener<S>>>) -> Self {
        Listeners {
            listeners: listeners.into(),
        }
    }

    /// returns a new set with `listener` added at the end
    pub fn append<L: Listener<S> + 'static>(&self, listener: L) -> Self {
        let mut listeners = self.listeners.to_vec();
        listeners.push(Arc::new(listener));
        Listeners::new(listeners)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn dispatch(&self, event: &Event<'_, S>) {
        for listener in self.listeners.iter() {
            listener.on_event(event);
        }
    }
}

impl<S: ?Sized> Listener<S> for Listeners<S> {
    fn on_event(&self, event: &Event<'_, S>) {
        self.dispatch(event)
    }
}

impl<S: ?Sized> Clone for Listeners<S> {
    fn clone(&self) -> Self {
        Listeners {
            listeners: self.listeners.clone(),
        }
    }
}

impl<S: ?Sized> Default for Listeners<S> {
    fn default() -> Self {
        Listeners::new(Vec::new())
    }
}

impl<S: ?Sized> fmt::Debug for Listeners<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

/// restricts a listener to some event kinds
pub struct Filtered<L> {
    kinds: Vec<EventKind>,
    inner: L,
}

impl<L> Filtered<L> {
    pub fn new<I: IntoIterator<Item = EventKind>>(kinds: I, inner: L) -> Self {
        Filtered {
            kinds: kinds.into_iter().collect(),
            inner,
        }
    }
}

impl<S: ?Sized, L: Listener<S>> Listener<S> for Filtered<L> {
    fn on_event(&self, event: &Event<'_, S>) {
        if self.kinds.contains(&event.kind) {
            self.inner.on_event(event)
        }
    }
}

/// logs every event with `tracing`
///
/// the subject is never logged: authentication subjects are raw credentials
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceListener;

impl<S: ?Sized> Listener<S> for TraceListener {
    fn on_event(&self, event: &Event<'_, S>) {
        let principal = event.token.map(|t| t.principal()).unwrap_or_default();

        match event.err {
            None => tracing::debug!(kind = %event.kind, principal, "request allowed"),
            Some(err) => tracing::warn!(
                kind = %event.kind,
                principal,
                reason = err.reason().unwrap_or("unknown"),
                status = err.status_code(),
                error = %err,
                "request denied"
            ),
        }
    }
}
