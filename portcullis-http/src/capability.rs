//! the capability approver
//!
//! Capabilities are strings of the form `<prefix><url pattern>:<method>`:
//!
//! * the prefix is a literal or a regular expression without capture groups,
//!   it scopes the capability to a service, like `x1:webpa:api:`;
//! * the url pattern is an unanchored regular expression, matched against the
//!   request path from its start;
//! * the method is a lower case HTTP method, or a match-all token (by default
//!   `all` or `*`).
//!
//! The [`CapabilityApprover`] tries its prefixes in the configured order and,
//! for each prefix, the token capabilities in their order. **The first
//! capability matching a prefix decides**: if its url pattern or method does
//! not match the request, the request is denied even if a later capability
//! would have allowed it.
use std::{collections::HashSet, sync::Arc};

use portcullis::{
    approver::Approver,
    context::Context,
    error::{self, Capability, Error},
    token::{get_capabilities, Token},
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    checks::{capabilities_of, Authentication, CapabilitiesChecker, ParsedValues},
    resource::HttpResource,
};

/// method tokens matching any request method when no other set is configured
pub const DEFAULT_MATCH_ALL: [&str; 2] = ["all", "*"];

/// compiles the regular expression splitting capabilities with `prefix` into
/// their url pattern and method
pub fn prefix_matcher(prefix: &str) -> Result<Regex, error::Config> {
    let matcher = Regex::new(&format!("^(?:{})(.+):(.+?)$", prefix)).map_err(|e| {
        error::Config::InvalidPrefix {
            prefix: prefix.to_string(),
            message: e.to_string(),
        }
    })?;

    // the whole match, the url pattern and the method
    if matcher.captures_len() != 3 {
        return Err(error::Config::PrefixCaptureGroups {
            prefix: prefix.to_string(),
        });
    }

    Ok(matcher)
}

/// splits a capability into its url pattern and method, if `matcher` accepts it
pub(crate) fn split_capability<'c>(
    matcher: &Regex,
    capability: &'c str,
) -> Option<(&'c str, &'c str)> {
    let captures = matcher.captures(capability)?;
    Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

pub(crate) fn method_matches(match_all: &HashSet<String>, allowed: &str, method: &str) -> bool {
    match_all.contains(allowed) || allowed.eq_ignore_ascii_case(method)
}

/// returns true if `pattern` matches `path` from its start, after giving both
/// a leading `/`
pub(crate) fn url_matches(pattern: &str, path: &str) -> Result<bool, regex::Error> {
    let pattern = with_leading_slash(pattern);
    let path = with_leading_slash(path);

    let re = Regex::new(&pattern)?;
    Ok(re.find(&path).map(|m| m.start() == 0).unwrap_or(false))
}

fn with_leading_slash(s: &str) -> std::borrow::Cow<'_, str> {
    if s.starts_with('/') {
        s.into()
    } else {
        format!("/{}", s).into()
    }
}

/// approves requests according to the token capabilities
///
/// ```rust
/// use portcullis::{approver::Approver, token::ClaimsToken, Context};
/// use portcullis_http::{capability::CapabilityApprover, resource::Endpoint};
///
/// let mut builder = CapabilityApprover::builder();
/// builder.add_prefix("x1:webpa:api:").unwrap();
/// let approver = builder.build();
///
/// let token = ClaimsToken::new("joe").with_capabilities(["x1:webpa:api:device/.*/config:all"]);
/// assert!(approver
///     .approve(&Context::new(), &Endpoint::new("PUT", "/device/ABC/config"), &token)
///     .is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct CapabilityApprover {
    matchers: Arc<[Regex]>,
    match_all: Arc<HashSet<String>>,
}

impl CapabilityApprover {
    pub fn builder() -> CapabilityApproverBuilder {
        CapabilityApproverBuilder::default()
    }

    pub fn from_config(config: &CapabilitiesConfig) -> Result<Self, error::Config> {
        let mut builder = CapabilityApprover::builder();
        for prefix in &config.prefixes {
            builder.add_prefix(prefix)?;
        }
        for token in &config.accept_all_methods {
            builder.add_match_all(token);
        }

        Ok(builder.build())
    }

    pub fn matchers(&self) -> &[Regex] {
        &self.matchers
    }

    pub fn match_all(&self) -> &HashSet<String> {
        &self.match_all
    }

    /// checks a list of capabilities against a request method and path
    pub fn check(&self, capabilities: &[String], method: &str, path: &str) -> Result<(), Error> {
        for matcher in self.matchers.iter() {
            for capability in capabilities {
                if let Some((pattern, allowed)) = split_capability(matcher, capability) {
                    return self.check_capability(capability, pattern, allowed, method, path);
                }
            }
        }

        Err(Error::Unauthorized)
    }

    fn check_capability(
        &self,
        capability: &str,
        pattern: &str,
        allowed: &str,
        method: &str,
        path: &str,
    ) -> Result<(), Error> {
        if !method_matches(&self.match_all, allowed, method) {
            return Err(Capability::MethodMismatch {
                capability: capability.to_string(),
                method: method.to_string(),
            }
            .into());
        }

        match url_matches(pattern, path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Capability::UrlMismatch {
                capability: capability.to_string(),
                path: path.to_string(),
            }
            .into()),
            Err(e) => Err(Capability::InvalidPattern {
                capability: capability.to_string(),
                message: e.to_string(),
            }
            .into()),
        }
    }
}

impl<R: HttpResource + ?Sized> Approver<R> for CapabilityApprover {
    fn approve(&self, ctx: &Context, resource: &R, token: &dyn Token) -> Result<(), Error> {
        ctx.check()?;

        let capabilities = match get_capabilities(token) {
            Some(capabilities) if !capabilities.is_empty() => capabilities,
            _ => return Err(Error::MissingCapabilities),
        };

        let result = self.check(&capabilities, resource.method(), resource.path());
        if let Err(e) = &result {
            tracing::debug!(
                principal = token.principal(),
                method = resource.method(),
                path = resource.path(),
                error = %e,
                "capability check failed"
            );
        }

        result
    }
}

impl CapabilitiesChecker for CapabilityApprover {
    fn check_authentication(
        &self,
        auth: &Authentication<'_>,
        _values: &ParsedValues,
    ) -> Result<(), Error> {
        let (method, path) = auth.method_and_path()?;
        let capabilities = capabilities_of(auth.token)?;

        self.check(&capabilities, method, path)
    }
}

#[derive(Clone, Debug, Default)]
pub struct CapabilityApproverBuilder {
    matchers: Vec<Regex>,
    match_all: Option<HashSet<String>>,
}

impl CapabilityApproverBuilder {
    pub fn new() -> Self {
        CapabilityApproverBuilder::default()
    }

    /// adds a prefix, tried after the ones already added
    pub fn add_prefix(&mut self, prefix: &str) -> Result<(), error::Config> {
        self.matchers.push(prefix_matcher(prefix)?);
        Ok(())
    }

    /// adds a method token matching every request method
    ///
    /// the first call replaces the default `all` and `*` tokens
    pub fn add_match_all<S: Into<String>>(&mut self, token: S) {
        self.match_all
            .get_or_insert_with(HashSet::new)
            .insert(token.into());
    }

    pub fn build(self) -> CapabilityApprover {
        if self.matchers.is_empty() {
            tracing::warn!(
                "capability approver built without prefixes, every request will be denied"
            );
        }

        let match_all = self
            .match_all
            .unwrap_or_else(|| DEFAULT_MATCH_ALL.iter().map(|s| s.to_string()).collect());

        CapabilityApprover {
            matchers: self.matchers.into(),
            match_all: Arc::new(match_all),
        }
    }
}

/// serializable configuration of a [`CapabilityApprover`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitiesConfig {
    pub prefixes: Vec<String>,
    /// replaces the default match-all method tokens when not empty
    pub accept_all_methods: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Endpoint;
    use portcullis::token::ClaimsToken;

    fn approver(prefixes: &[&str]) -> CapabilityApprover {
        let mut builder = CapabilityApprover::builder();
        for prefix in prefixes {
            builder.add_prefix(prefix).unwrap();
        }
        builder.build()
    }

    fn approve(
        approver: &CapabilityApprover,
        capabilities: &[&str],
        method: &str,
        path: &str,
    ) -> Result<(), Error> {
        let token = ClaimsToken::new("joe").with_capabilities(capabilities.iter().copied());
        approver.approve(&Context::new(), &Endpoint::new(method, path), &token)
    }

    #[test]
    fn matching_capability() {
        let approver = approver(&["x1:webpa:api:"]);
        assert_eq!(
            approve(
                &approver,
                &["x1:webpa:api:device/.*/config:all"],
                "PUT",
                "/device/ABC/config"
            ),
            Ok(())
        );
        assert_eq!(
            approve(&approver, &["x1:webpa:api:.*:get"], "GET", "/test"),
            Ok(())
        );
        assert_eq!(
            approve(&approver, &["x1:webpa:api:/test:*"], "DELETE", "test"),
            Ok(())
        );
    }

    #[test]
    fn method_mismatch() {
        let approver = approver(&["x1:webpa:api:"]);
        assert_eq!(
            approve(&approver, &["x1:webpa:api:.*:put"], "GET", "/test"),
            Err(Error::Capability(Capability::MethodMismatch {
                capability: "x1:webpa:api:.*:put".to_string(),
                method: "GET".to_string(),
            }))
        );
    }

    #[test]
    fn url_must_match_from_the_start() {
        let approver = approver(&["x1:webpa:api:"]);
        assert_eq!(
            approve(&approver, &["x1:webpa:api:config:all"], "GET", "/device/config"),
            Err(Error::Capability(Capability::UrlMismatch {
                capability: "x1:webpa:api:config:all".to_string(),
                path: "/device/config".to_string(),
            }))
        );
    }

    #[test]
    fn invalid_url_pattern() {
        let approver = approver(&["x1:webpa:api:"]);
        match approve(&approver, &["x1:webpa:api:device/(:all"], "GET", "/device/") {
            Err(Error::Capability(Capability::InvalidPattern { capability, .. })) => {
                assert_eq!(capability, "x1:webpa:api:device/(:all")
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn first_match_wins() {
        let approver = approver(&["x1:webpa:api:"]);
        let result = approve(
            &approver,
            &["x1:webpa:api:/test/.*:custom", "x1:webpa:api:/test/.*:all"],
            "GET",
            "/test/x",
        );
        assert!(matches!(
            result,
            Err(Error::Capability(Capability::MethodMismatch { .. }))
        ));

        // the same capabilities in the other order are accepted
        assert_eq!(
            approve(
                &approver,
                &["x1:webpa:api:/test/.*:all", "x1:webpa:api:/test/.*:custom"],
                "GET",
                "/test/x",
            ),
            Ok(())
        );
    }

    #[test]
    fn prefixes_are_tried_in_order() {
        let approver = approver(&["x1:webpa:api:", "x1:webpa:"]);
        // "x1:webpa:" would accept the first capability, but the first
        // prefix finds the second one
        assert!(approve(
            &approver,
            &["x1:webpa:other:.*:all", "x1:webpa:api:/nope:all"],
            "GET",
            "/test",
        )
        .is_err());
    }

    #[test]
    fn no_match() {
        let approver = approver(&["x1:webpa:api:"]);
        assert_eq!(
            approve(&approver, &["x1:other:api:.*:all"], "GET", "/test"),
            Err(Error::Unauthorized)
        );
        assert_eq!(
            approve(&approver, &[], "GET", "/test"),
            Err(Error::MissingCapabilities)
        );
        assert_eq!(
            approver.approve(
                &Context::new(),
                &Endpoint::new("GET", "/test"),
                &ClaimsToken::new("joe")
            ),
            Err(Error::MissingCapabilities)
        );

        let empty = approver_without_prefixes();
        assert_eq!(
            approve(&empty, &["x1:webpa:api:.*:all"], "GET", "/test"),
            Err(Error::Unauthorized)
        );
    }

    fn approver_without_prefixes() -> CapabilityApprover {
        CapabilityApprover::builder().build()
    }

    #[test]
    fn custom_match_all() {
        let mut builder = CapabilityApprover::builder();
        builder.add_prefix("svc:").unwrap();
        builder.add_match_all("any");
        let approver = builder.build();

        assert_eq!(approve(&approver, &["svc:.*:any"], "POST", "/x"), Ok(()));
        // the defaults are replaced
        assert!(approve(&approver, &["svc:.*:all"], "POST", "/x").is_err());
    }

    #[test]
    fn prefix_validation() {
        assert!(matches!(
            prefix_matcher("x1:(webpa|xmidt):"),
            Err(error::Config::PrefixCaptureGroups { .. })
        ));
        assert!(prefix_matcher("x1:(?:webpa|xmidt):").is_ok());
        assert!(prefix_matcher("x1:webpa:api:|x1:xmidt:api:").is_ok());
        assert!(matches!(
            prefix_matcher("x1:[webpa"),
            Err(error::Config::InvalidPrefix { .. })
        ));
    }

    #[test]
    fn alternation_prefix_is_anchored() {
        let approver = approver(&["x1:webpa:api:|x1:xmidt:api:"]);

        assert_eq!(
            approve(&approver, &["x1:webpa:api:.*:all"], "GET", "/device/ABC"),
            Ok(())
        );
        assert_eq!(
            approve(&approver, &["x1:xmidt:api:.*:all"], "GET", "/device/ABC"),
            Ok(())
        );
        assert_eq!(
            approve(&approver, &["evil:x1:xmidt:api:.*:all"], "DELETE", "/device/ABC"),
            Err(Error::Unauthorized)
        );
    }

    #[test]
    fn from_config() {
        let config: CapabilitiesConfig = serde_json::from_str(
            r#"{ "prefixes": ["x1:webpa:api:"], "accept_all_methods": ["all"] }"#,
        )
        .unwrap();
        let approver = CapabilityApprover::from_config(&config).unwrap();
        assert_eq!(approver.matchers().len(), 1);
        assert_eq!(approver.match_all().len(), 1);
        assert!(approve(&approver, &["x1:webpa:api:.*:*"], "GET", "/").is_err());
    }
}
