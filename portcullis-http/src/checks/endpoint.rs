use std::{collections::HashSet, fmt};

use portcullis::error;
use regex::Regex;

use crate::capability::{method_matches, prefix_matcher, split_capability, url_matches};

/// decides whether a single capability allows a request
pub trait EndpointChecker: Send + Sync {
    fn authorized(&self, capability: &str, path: &str, method: &str) -> bool;

    /// a short description, for logs
    fn name(&self) -> String;
}

/// always gives the same answer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlwaysEndpointCheck(pub bool);

impl EndpointChecker for AlwaysEndpointCheck {
    fn authorized(&self, _capability: &str, _path: &str, _method: &str) -> bool {
        self.0
    }

    fn name(&self) -> String {
        format!("always {}", self.0)
    }
}

/// accepts one exact capability, whatever the request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstEndpointCheck(String);

impl ConstEndpointCheck {
    pub fn new<S: Into<String>>(capability: S) -> Self {
        ConstEndpointCheck(capability.into())
    }
}

impl EndpointChecker for ConstEndpointCheck {
    fn authorized(&self, capability: &str, _path: &str, _method: &str) -> bool {
        self.0 == capability
    }

    fn name(&self) -> String {
        format!("const {}", self.0)
    }
}

/// checks capabilities written as `<prefix><url pattern>:<method>`
#[derive(Clone)]
pub struct RegexEndpointCheck {
    matcher: Regex,
    match_all: HashSet<String>,
}

impl RegexEndpointCheck {
    pub fn new(prefix: &str, accept_all_method: &str) -> Result<Self, error::Config> {
        Ok(RegexEndpointCheck {
            matcher: prefix_matcher(prefix)?,
            match_all: std::iter::once(accept_all_method.to_string()).collect(),
        })
    }
}

impl EndpointChecker for RegexEndpointCheck {
    fn authorized(&self, capability: &str, path: &str, method: &str) -> bool {
        match split_capability(&self.matcher, capability) {
            Some((pattern, allowed)) => {
                method_matches(&self.match_all, allowed, method)
                    && url_matches(pattern, path).unwrap_or(false)
            }
            None => false,
        }
    }

    fn name(&self) -> String {
        format!("regex {}", self.matcher.as_str())
    }
}

impl fmt::Debug for RegexEndpointCheck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RegexEndpointCheck")
            .field("matcher", &self.matcher.as_str())
            .field("match_all", &self.match_all)
            .finish()
    }
}
