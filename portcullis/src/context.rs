//! request scoped execution context
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// carries cancellation and an optional deadline through every pipeline call
///
/// rules that call external systems should pass it on and give up when
/// [`Context::check`] fails. Cloning is cheap, clones share cancellation.
#[derive(Clone, Debug)]
pub struct Context {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Context {
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    /// creates a context cancelled together with `token`
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Context {
            cancellation: token,
            deadline: None,
        }
    }

    /// sets a deadline, keeping the earliest one if a deadline is already set
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// creates a context that is cancelled when this one is, but can also be
    /// cancelled on its own
    pub fn child(&self) -> Self {
        Context {
            cancellation: self.cancellation.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// fails with [`Error::Cancelled`] or [`Error::DeadlineExceeded`] if the
    /// work this context covers should stop
    pub fn check(&self) -> Result<(), Error> {
        if self.cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}
