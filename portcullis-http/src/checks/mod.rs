//! capability checking strategies sharing one contract
//!
//! [`CapabilitiesChecker`] is implemented by the
//! [`CapabilityApprover`](crate::capability::CapabilityApprover), where the
//! first capability matching a prefix decides, and by
//! [`CapabilitiesValidator`] and [`CapabilitiesMap`], which try every
//! capability against an [`EndpointChecker`] and accept the first one that
//! authorizes the request.
use std::{fmt, sync::Arc};

use portcullis::{
    approver::Approver,
    context::Context,
    error::{Capability, Error},
    token::{get_capabilities, Token, CAPABILITIES_KEY},
};

use crate::resource::{Endpoint, HttpResource};

mod endpoint;
mod map;
mod metrics;

pub use endpoint::{
    AlwaysEndpointCheck, ConstEndpointCheck, EndpointChecker, RegexEndpointCheck,
};
pub use map::{CapabilitiesMap, CapabilitiesMapBuilder, CapabilitiesMapConfig};
pub use metrics::{
    determine_endpoint, determine_partner, CapabilityCheckCounter, CheckLabels, MetricValidator,
    MetricValidatorBuilder, Outcome, NOT_RECOGNIZED, PARTNER_KEYS,
};

/// what a capability check knows about the request
#[derive(Clone, Copy, Debug)]
pub struct Authentication<'a> {
    pub token: &'a dyn Token,
    pub request: Endpoint<'a>,
}

impl<'a> Authentication<'a> {
    pub fn new<R: HttpResource + ?Sized>(token: &'a dyn Token, resource: &'a R) -> Self {
        Authentication {
            token,
            request: Endpoint::of(resource),
        }
    }

    /// the request method and path, both required to check capabilities
    pub fn method_and_path(&self) -> Result<(&'a str, &'a str), Error> {
        if self.request.method.is_empty() || self.request.path.is_empty() {
            return Err(Capability::MissingValues.into());
        }

        Ok((self.request.method, self.request.path))
    }
}

/// values derived from the request before checking it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedValues {
    /// the endpoint bucket the request path falls in
    pub endpoint: String,
    pub partner: String,
}

/// checks the capabilities of an authenticated request
pub trait CapabilitiesChecker: Send + Sync {
    fn check_authentication(
        &self,
        auth: &Authentication<'_>,
        values: &ParsedValues,
    ) -> Result<(), Error>;
}

impl CapabilitiesChecker for Box<dyn CapabilitiesChecker> {
    fn check_authentication(
        &self,
        auth: &Authentication<'_>,
        values: &ParsedValues,
    ) -> Result<(), Error> {
        self.as_ref().check_authentication(auth, values)
    }
}

impl CapabilitiesChecker for Arc<dyn CapabilitiesChecker> {
    fn check_authentication(
        &self,
        auth: &Authentication<'_>,
        values: &ParsedValues,
    ) -> Result<(), Error> {
        self.as_ref().check_authentication(auth, values)
    }
}

/// reads the capabilities of a token for a checker
///
/// unlike [`get_capabilities`], this tells apart a token without
/// capabilities from a token whose capabilities attribute is malformed
pub fn capabilities_of(token: &dyn Token) -> Result<Vec<String>, Error> {
    if let Some(capabilities) = get_capabilities(token) {
        if capabilities.is_empty() {
            return Err(Error::MissingCapabilities);
        }
        return Ok(capabilities);
    }

    match token
        .attributes()
        .and_then(|attributes| attributes.get(CAPABILITIES_KEY))
    {
        Some(_) => Err(Capability::UndeterminedCapabilities.into()),
        None => Err(Error::MissingCapabilities),
    }
}

/// accepts a request if any capability of the token passes the checker
#[derive(Clone)]
pub struct CapabilitiesValidator {
    checker: Arc<dyn EndpointChecker>,
}

impl CapabilitiesValidator {
    pub fn new<C: EndpointChecker + 'static>(checker: C) -> Self {
        CapabilitiesValidator {
            checker: Arc::new(checker),
        }
    }

    pub fn check_capabilities(
        &self,
        capabilities: &[String],
        path: &str,
        method: &str,
    ) -> Result<(), Error> {
        check_capabilities(self.checker.as_ref(), capabilities, path, method)
    }
}

pub(crate) fn check_capabilities(
    checker: &dyn EndpointChecker,
    capabilities: &[String],
    path: &str,
    method: &str,
) -> Result<(), Error> {
    if capabilities
        .iter()
        .any(|capability| checker.authorized(capability, path, method))
    {
        Ok(())
    } else {
        Err(Capability::NoCapabilitiesMatch.into())
    }
}

impl CapabilitiesChecker for CapabilitiesValidator {
    fn check_authentication(
        &self,
        auth: &Authentication<'_>,
        _values: &ParsedValues,
    ) -> Result<(), Error> {
        let (method, path) = auth.method_and_path()?;
        let capabilities = capabilities_of(auth.token)?;

        self.check_capabilities(&capabilities, path, method)
    }
}

impl<R: HttpResource + ?Sized> Approver<R> for CapabilitiesValidator {
    fn approve(&self, ctx: &Context, resource: &R, token: &dyn Token) -> Result<(), Error> {
        ctx.check()?;
        self.check_authentication(
            &Authentication::new(token, resource),
            &ParsedValues::default(),
        )
    }
}

impl fmt::Debug for CapabilitiesValidator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CapabilitiesValidator")
            .field("checker", &self.checker.name())
            .finish()
    }
}
