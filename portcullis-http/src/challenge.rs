//! `WWW-Authenticate` challenges
//!
//! A [`Challenge`] tells a client which scheme and realm it should
//! authenticate with. It formats as
//! `<Scheme> realm="<realm>"[, <name>="<value>"...]`, with the realm always
//! first and every value quoted, and parses back from that form.
//!
//! ```rust
//! use portcullis_http::challenge::{BasicChallenge, Challenge};
//!
//! let challenge: Challenge = BasicChallenge::new("test@example.com").utf8().into();
//! assert_eq!(
//!     challenge.to_string(),
//!     r#"Basic realm="test@example.com", charset="UTF-8""#
//! );
//!
//! let parsed: Challenge = challenge.to_string().parse().unwrap();
//! assert_eq!(parsed, challenge);
//! ```
use std::{fmt, slice, str::FromStr};

use http::{header::WWW_AUTHENTICATE, HeaderMap, HeaderValue};
use portcullis::credentials::Scheme;
use portcullis_parser::{error::ParseError, parser};

use crate::error;

pub const REALM: &str = "realm";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    scheme: Scheme,
    realm: String,
    params: Vec<(String, String)>,
}

impl Challenge {
    /// the scheme must be a valid token, the realm can hold any text
    pub fn new<S: Into<Scheme>, R: Into<String>>(
        scheme: S,
        realm: R,
    ) -> Result<Self, error::Challenge> {
        let scheme = scheme.into();
        if !parser::is_token(scheme.as_str()) {
            return Err(error::Challenge::InvalidScheme(scheme.to_string()));
        }

        Ok(Challenge {
            scheme,
            realm: realm.into(),
            params: Vec::new(),
        })
    }

    /// adds a parameter, replacing any parameter of the same name
    ///
    /// names are tokens compared without case, `realm` is reserved
    pub fn with_param<N: Into<String>, V: Into<String>>(
        mut self,
        name: N,
        value: V,
    ) -> Result<Self, error::Challenge> {
        let name = name.into();
        if !parser::is_token(&name) {
            return Err(error::Challenge::InvalidParameterName(name));
        }
        if name.eq_ignore_ascii_case(REALM) {
            return Err(error::Challenge::ReservedParameter(name));
        }

        self.set_param(name, value.into());
        Ok(self)
    }

    fn set_param(&mut self, name: String, value: String) {
        match self
            .params
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(param) => *param = (name, value),
            None => self.params.push((name, value)),
        }
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// the parameters other than the realm, in insertion order
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn to_header_value(&self) -> Result<HeaderValue, error::Challenge> {
        let formatted = self.to_string();
        HeaderValue::from_str(&formatted).map_err(|_| error::Challenge::InvalidHeaderValue(formatted))
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}={}", self.scheme, REALM, parser::quote(&self.realm))?;
        for (name, value) in &self.params {
            write!(f, ", {}={}", name, parser::quote(value))?;
        }
        Ok(())
    }
}

impl FromStr for Challenge {
    type Err = error::Challenge;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, (scheme, params)) = parser::challenge(s).map_err(ParseError::from)?;

        let mut realm = None;
        let mut others = Vec::with_capacity(params.len());
        for (name, value) in params {
            if name.eq_ignore_ascii_case(REALM) {
                if realm.is_some() {
                    return Err(error::Challenge::ReservedParameter(name.to_string()));
                }
                realm = Some(value);
            } else {
                others.push((name, value));
            }
        }

        let realm = realm.ok_or(error::Challenge::MissingRealm)?;
        let mut challenge = Challenge::new(scheme.to_string(), realm)?;
        for (name, value) in others {
            challenge.set_param(name.to_string(), value);
        }

        Ok(challenge)
    }
}

/// challenge of the `Basic` scheme
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicChallenge {
    pub realm: String,
    /// announces `charset="UTF-8"`
    pub utf8: bool,
}

impl BasicChallenge {
    pub fn new<R: Into<String>>(realm: R) -> Self {
        BasicChallenge {
            realm: realm.into(),
            utf8: false,
        }
    }

    pub fn utf8(mut self) -> Self {
        self.utf8 = true;
        self
    }
}

impl From<BasicChallenge> for Challenge {
    fn from(basic: BasicChallenge) -> Self {
        let mut challenge = Challenge {
            scheme: Scheme::BASIC,
            realm: basic.realm,
            params: Vec::new(),
        };
        if basic.utf8 {
            challenge.set_param("charset".to_string(), "UTF-8".to_string());
        }
        challenge
    }
}

/// challenge of the `Bearer` scheme, as described in RFC 6750
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BearerChallenge {
    pub realm: String,
    pub scope: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl BearerChallenge {
    pub fn new<R: Into<String>>(realm: R) -> Self {
        BearerChallenge {
            realm: realm.into(),
            ..Default::default()
        }
    }
}

impl From<BearerChallenge> for Challenge {
    fn from(bearer: BearerChallenge) -> Self {
        let mut challenge = Challenge {
            scheme: Scheme::BEARER,
            realm: bearer.realm,
            params: Vec::new(),
        };

        let params = [
            ("scope", bearer.scope),
            ("error", bearer.error),
            ("error_description", bearer.error_description),
        ];
        for (name, value) in params {
            if let Some(value) = value {
                challenge.set_param(name.to_string(), value);
            }
        }
        challenge
    }
}

/// the ordered challenges sent with an authentication failure
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Challenges(Vec<Challenge>);

impl Challenges {
    pub fn new() -> Self {
        Challenges::default()
    }

    pub fn add<C: Into<Challenge>>(&mut self, challenge: C) {
        self.0.push(challenge.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Challenge> {
        self.0.iter()
    }

    /// appends one `WWW-Authenticate` header per challenge
    ///
    /// nothing is written if any challenge is not a valid header value
    pub fn write_headers(&self, headers: &mut HeaderMap) -> Result<(), error::Challenge> {
        let values = self
            .0
            .iter()
            .map(Challenge::to_header_value)
            .collect::<Result<Vec<_>, _>>()?;

        for value in values {
            headers.append(WWW_AUTHENTICATE, value);
        }
        Ok(())
    }
}

impl<C: Into<Challenge>> FromIterator<C> for Challenges {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Challenges(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a Challenges {
    type Item = &'a Challenge;
    type IntoIter = slice::Iter<'a, Challenge>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_challenge() {
        let challenge: Challenge = BasicChallenge::new("test@example.com").utf8().into();
        assert_eq!(
            challenge.to_string(),
            r#"Basic realm="test@example.com", charset="UTF-8""#
        );

        let challenge: Challenge = BasicChallenge::new("test@example.com").into();
        assert_eq!(challenge.to_string(), r#"Basic realm="test@example.com""#);
    }

    #[test]
    fn bearer_challenge() {
        let challenge: Challenge = BearerChallenge {
            realm: "api".to_string(),
            scope: Some("read write".to_string()),
            error: Some("invalid_token".to_string()),
            error_description: None,
        }
        .into();

        assert_eq!(
            challenge.to_string(),
            r#"Bearer realm="api", scope="read write", error="invalid_token""#
        );
        assert_eq!(challenge.param("SCOPE"), Some("read write"));
    }

    #[test]
    fn quoting() {
        let challenge = Challenge::new("Custom", r#"a "quoted" \ realm"#)
            .unwrap()
            .with_param("note", "x")
            .unwrap();
        let formatted = challenge.to_string();
        assert_eq!(formatted, r#"Custom realm="a \"quoted\" \\ realm", note="x""#);
        assert_eq!(formatted.parse::<Challenge>(), Ok(challenge));
    }

    #[test]
    fn parameters() {
        assert_eq!(
            Challenge::new("Basic", "r").unwrap().with_param("Realm", "x"),
            Err(error::Challenge::ReservedParameter("Realm".to_string()))
        );
        assert_eq!(
            Challenge::new("Basic", "r").unwrap().with_param("a b", "x"),
            Err(error::Challenge::InvalidParameterName("a b".to_string()))
        );
        assert_eq!(
            Challenge::new("Not a scheme", "r"),
            Err(error::Challenge::InvalidScheme("Not a scheme".to_string()))
        );

        let challenge = Challenge::new("Basic", "r")
            .unwrap()
            .with_param("charset", "latin1")
            .unwrap()
            .with_param("Charset", "UTF-8")
            .unwrap();
        assert_eq!(challenge.params().len(), 1);
        assert_eq!(challenge.to_string(), r#"Basic realm="r", Charset="UTF-8""#);
    }

    #[test]
    fn parse() {
        let challenge: Challenge = "Bearer scope=read, realm=\"api\"".parse().unwrap();
        assert_eq!(challenge.scheme(), &Scheme::BEARER);
        assert_eq!(challenge.realm(), "api");
        assert_eq!(challenge.params(), &[("scope".to_string(), "read".to_string())]);

        assert_eq!(
            "Basic charset=\"UTF-8\"".parse::<Challenge>(),
            Err(error::Challenge::MissingRealm)
        );
        assert_eq!("Negotiate".parse::<Challenge>(), Err(error::Challenge::MissingRealm));
        assert!(matches!(
            "Basic realm=\"a\" junk".parse::<Challenge>(),
            Err(error::Challenge::Parse(_))
        ));
    }

    #[test]
    fn write_headers() {
        let mut challenges = Challenges::new();
        challenges.add(BasicChallenge::new("test@example.com").utf8());
        challenges.add(BearerChallenge::new("api"));

        let mut headers = HeaderMap::new();
        challenges.write_headers(&mut headers).unwrap();

        let values: Vec<_> = headers
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(
            values,
            vec![
                r#"Basic realm="test@example.com", charset="UTF-8""#,
                r#"Bearer realm="api""#,
            ]
        );
    }

    #[test]
    fn invalid_header_value() {
        let challenges: Challenges = vec![
            Challenge::new("Basic", "ok").unwrap(),
            Challenge::new("Basic", "line\nbreak").unwrap(),
        ]
        .into_iter()
        .collect();

        let mut headers = HeaderMap::new();
        assert!(matches!(
            challenges.write_headers(&mut headers),
            Err(error::Challenge::InvalidHeaderValue(_))
        ));
        assert!(headers.is_empty());
    }
}
