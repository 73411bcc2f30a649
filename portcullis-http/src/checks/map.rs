use std::{collections::HashMap, fmt, sync::Arc};

use portcullis::error::{self, Capability, Error};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{
    capabilities_of, check_capabilities, Authentication, CapabilitiesChecker, ConstEndpointCheck,
    EndpointChecker, ParsedValues,
};

/// picks the endpoint checker from the endpoint bucket of the request
///
/// buckets are endpoint regular expressions, usually determined by a
/// [`MetricValidator`](super::MetricValidator). Requests in a bucket without
/// a checker use the default checker; without one they are denied.
#[derive(Clone)]
pub struct CapabilitiesMap {
    endpoints: Arc<[Regex]>,
    checkers: Arc<HashMap<String, Arc<dyn EndpointChecker>>>,
    default_checker: Option<Arc<dyn EndpointChecker>>,
}

impl CapabilitiesMap {
    pub fn builder() -> CapabilitiesMapBuilder {
        CapabilitiesMapBuilder::default()
    }

    /// every endpoint maps to a constant capability check
    pub fn from_config(config: &CapabilitiesMapConfig) -> Result<Self, error::Config> {
        let mut endpoints: Vec<_> = config.endpoints.iter().collect();
        endpoints.sort();

        let mut builder = CapabilitiesMap::builder();
        for (endpoint, capability) in endpoints {
            builder.add_endpoint(endpoint, ConstEndpointCheck::new(capability.as_str()))?;
        }

        if !config.default.is_empty() {
            builder.set_default(ConstEndpointCheck::new(config.default.as_str()));
        }

        Ok(builder.build())
    }

    /// the endpoint regular expressions, in registration order
    pub fn endpoints(&self) -> &[Regex] {
        &self.endpoints
    }

    fn checker(&self, endpoint: &str) -> Option<&Arc<dyn EndpointChecker>> {
        self.checkers
            .get(endpoint)
            .or(self.default_checker.as_ref())
    }
}

impl CapabilitiesChecker for CapabilitiesMap {
    fn check_authentication(
        &self,
        auth: &Authentication<'_>,
        values: &ParsedValues,
    ) -> Result<(), Error> {
        let (method, path) = auth.method_and_path()?;
        let capabilities = capabilities_of(auth.token)?;

        match self.checker(&values.endpoint) {
            Some(checker) => check_capabilities(checker.as_ref(), &capabilities, path, method),
            None => {
                tracing::debug!(endpoint = %values.endpoint, "no capability checker for endpoint");
                Err(Capability::NoCapabilitiesMatch.into())
            }
        }
    }
}

impl fmt::Debug for CapabilitiesMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut checkers: Vec<_> = self
            .checkers
            .iter()
            .map(|(endpoint, checker)| (endpoint.as_str(), checker.name()))
            .collect();
        checkers.sort();

        f.debug_struct("CapabilitiesMap")
            .field("checkers", &checkers)
            .field(
                "default_checker",
                &self.default_checker.as_ref().map(|c| c.name()),
            )
            .finish()
    }
}

#[derive(Default)]
pub struct CapabilitiesMapBuilder {
    endpoints: Vec<Regex>,
    checkers: HashMap<String, Arc<dyn EndpointChecker>>,
    default_checker: Option<Arc<dyn EndpointChecker>>,
}

impl CapabilitiesMapBuilder {
    pub fn new() -> Self {
        CapabilitiesMapBuilder::default()
    }

    /// sets the checker for an endpoint regular expression, replacing any
    /// previous one
    pub fn add_endpoint<C: EndpointChecker + 'static>(
        &mut self,
        endpoint: &str,
        checker: C,
    ) -> Result<(), error::Config> {
        let re = Regex::new(endpoint).map_err(|e| error::Config::InvalidEndpoint {
            pattern: endpoint.to_string(),
            message: e.to_string(),
        })?;

        if !self.checkers.contains_key(endpoint) {
            self.endpoints.push(re);
        }
        self.checkers.insert(endpoint.to_string(), Arc::new(checker));
        Ok(())
    }

    pub fn set_default<C: EndpointChecker + 'static>(&mut self, checker: C) {
        self.default_checker = Some(Arc::new(checker));
    }

    pub fn build(self) -> CapabilitiesMap {
        CapabilitiesMap {
            endpoints: self.endpoints.into(),
            checkers: Arc::new(self.checkers),
            default_checker: self.default_checker,
        }
    }
}

/// serializable configuration of a [`CapabilitiesMap`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitiesMapConfig {
    /// endpoint regular expression to the capability it requires
    pub endpoints: HashMap<String, String>,
    /// capability required outside of the configured endpoints
    pub default: String,
}
