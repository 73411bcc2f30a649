use std::{fmt, sync::Arc};

use portcullis::{
    approver::Approver,
    context::Context,
    error::{self, Capability, Error},
    token::{get_attribute, Token},
};
use regex::Regex;

use super::{Authentication, CapabilitiesChecker, ParsedValues};
use crate::resource::HttpResource;

/// endpoint label of requests outside every configured endpoint
pub const NOT_RECOGNIZED: &str = "not_recognized";

/// attribute path of the partner ids a token is allowed to act for
pub const PARTNER_KEYS: [&str; 2] = ["allowedResources", "allowedPartners"];

/// the first endpoint regex matching the path from its start, as a label
pub fn determine_endpoint(endpoints: &[Regex], path: &str) -> String {
    endpoints
        .iter()
        .find(|re| re.find(path).map(|m| m.start() == 0).unwrap_or(false))
        .map(|re| re.as_str().to_string())
        .unwrap_or_else(|| NOT_RECOGNIZED.to_string())
}

/// reduces a list of partner ids to a low cardinality label
pub fn determine_partner(partners: &[String]) -> String {
    match partners {
        [] => "none".to_string(),
        _ if partners.iter().any(|p| p == "*") => "wildcard".to_string(),
        [partner] => partner.clone(),
        _ => "many".to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Accepted,
    Rejected,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// labels of one capability check measurement
///
/// the reason is empty for accepted checks. Partner and endpoint are empty
/// when the request could not be inspected far enough to determine them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckLabels<'a> {
    pub server: &'a str,
    pub outcome: Outcome,
    pub reason: &'a str,
    pub client: &'a str,
    pub partner: &'a str,
    pub endpoint: &'a str,
    pub method: &'a str,
}

/// counts capability check outcomes
///
/// implement it over the metrics library in use
pub trait CapabilityCheckCounter: Send + Sync {
    fn increment(&self, labels: &CheckLabels<'_>);
}

impl CapabilityCheckCounter for Box<dyn CapabilityCheckCounter> {
    fn increment(&self, labels: &CheckLabels<'_>) {
        self.as_ref().increment(labels)
    }
}

impl CapabilityCheckCounter for Arc<dyn CapabilityCheckCounter> {
    fn increment(&self, labels: &CheckLabels<'_>) {
        self.as_ref().increment(labels)
    }
}

impl<F> CapabilityCheckCounter for F
where
    F: Fn(&CheckLabels<'_>) + Send + Sync,
{
    fn increment(&self, labels: &CheckLabels<'_>) {
        self(labels)
    }
}

/// measures capability checks
///
/// determines the endpoint and partner of the request, runs the wrapped
/// [`CapabilitiesChecker`] and counts the outcome. When `error_out` is
/// unset, failures are only counted and the request is let through, which
/// allows measuring a capability policy before enforcing it.
#[derive(Clone)]
pub struct MetricValidator {
    checker: Arc<dyn CapabilitiesChecker>,
    counter: Arc<dyn CapabilityCheckCounter>,
    endpoints: Arc<[Regex]>,
    server: String,
    error_out: bool,
}

struct Prepared<'a> {
    client: &'a str,
    method: &'a str,
    path: &'a str,
    partner: String,
    endpoint: String,
}

impl MetricValidator {
    pub fn builder<C, M>(checker: C, counter: M) -> MetricValidatorBuilder
    where
        C: CapabilitiesChecker + 'static,
        M: CapabilityCheckCounter + 'static,
    {
        MetricValidatorBuilder {
            checker: Arc::new(checker),
            counter: Arc::new(counter),
            endpoints: Vec::new(),
            server: String::new(),
            error_out: true,
        }
    }

    pub fn endpoints(&self) -> &[Regex] {
        &self.endpoints
    }

    pub fn errors_out(&self) -> bool {
        self.error_out
    }

    /// checks and counts an authenticated request
    pub fn check(&self, auth: &Authentication<'_>) -> Result<(), Error> {
        let client = auth.token.principal();

        let prepared = match self.prepare(auth) {
            Ok(prepared) => prepared,
            Err(err) => {
                self.count(&CheckLabels {
                    server: &self.server,
                    outcome: Outcome::Rejected,
                    reason: err.reason().unwrap_or("unknown"),
                    client,
                    partner: "",
                    endpoint: "",
                    method: auth.request.method,
                });
                return self.outcome(err);
            }
        };

        let values = ParsedValues {
            endpoint: prepared.endpoint,
            partner: prepared.partner,
        };
        let result = self.checker.check_authentication(auth, &values);

        let reason = match &result {
            Ok(()) => String::new(),
            Err(err) => err.reason().unwrap_or("unknown").to_string(),
        };
        self.count(&CheckLabels {
            server: &self.server,
            outcome: if result.is_ok() {
                Outcome::Accepted
            } else {
                Outcome::Rejected
            },
            reason: &reason,
            client: prepared.client,
            partner: &values.partner,
            endpoint: &values.endpoint,
            method: prepared.method,
        });

        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::debug!(
                    client = prepared.client,
                    endpoint = %values.endpoint,
                    path = prepared.path,
                    reason = %reason,
                    "capability check rejected"
                );
                self.outcome(err)
            }
        }
    }

    fn prepare<'a>(&self, auth: &Authentication<'a>) -> Result<Prepared<'a>, Error> {
        let client = auth.token.principal();
        if auth.token.attributes().is_none() {
            return Err(Capability::MissingValues.into());
        }

        let (method, path) = auth.method_and_path()?;
        let endpoint = determine_endpoint(&self.endpoints, path);

        let partners: Vec<String> = get_attribute(auth.token, &PARTNER_KEYS)
            .ok_or(Error::Capability(Capability::UndeterminedPartner))?;

        Ok(Prepared {
            client,
            method,
            path,
            partner: determine_partner(&partners),
            endpoint,
        })
    }

    fn count(&self, labels: &CheckLabels<'_>) {
        self.counter.increment(labels)
    }

    fn outcome(&self, err: Error) -> Result<(), Error> {
        if self.error_out {
            Err(err)
        } else {
            Ok(())
        }
    }
}

impl<R: HttpResource + ?Sized> Approver<R> for MetricValidator {
    fn approve(&self, ctx: &Context, resource: &R, token: &dyn Token) -> Result<(), Error> {
        ctx.check()?;
        self.check(&Authentication::new(token, resource))
    }
}

impl fmt::Debug for MetricValidator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MetricValidator")
            .field(
                "endpoints",
                &self.endpoints.iter().map(Regex::as_str).collect::<Vec<_>>(),
            )
            .field("server", &self.server)
            .field("error_out", &self.error_out)
            .finish()
    }
}

pub struct MetricValidatorBuilder {
    checker: Arc<dyn CapabilitiesChecker>,
    counter: Arc<dyn CapabilityCheckCounter>,
    endpoints: Vec<Regex>,
    server: String,
    error_out: bool,
}

impl MetricValidatorBuilder {
    /// adds an endpoint bucket, tried in insertion order
    pub fn add_endpoint(&mut self, endpoint: &str) -> Result<(), error::Config> {
        let re = Regex::new(endpoint).map_err(|e| error::Config::InvalidEndpoint {
            pattern: endpoint.to_string(),
            message: e.to_string(),
        })?;
        self.endpoints.push(re);
        Ok(())
    }

    /// adds already compiled endpoint buckets, such as the ones of a
    /// [`CapabilitiesMap`](super::CapabilitiesMap)
    pub fn extend_endpoints<I: IntoIterator<Item = Regex>>(&mut self, endpoints: I) {
        self.endpoints.extend(endpoints);
    }

    pub fn set_server<S: Into<String>>(&mut self, server: S) {
        self.server = server.into();
    }

    /// whether failures are returned, defaults to true
    pub fn set_error_out(&mut self, error_out: bool) {
        self.error_out = error_out;
    }

    pub fn build(self) -> MetricValidator {
        MetricValidator {
            checker: self.checker,
            counter: self.counter,
            endpoints: self.endpoints.into(),
            server: self.server,
            error_out: self.error_out,
        }
    }
}
