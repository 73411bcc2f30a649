//! HTTP adapters for the portcullis pipeline
//!
//! This crate holds everything that knows about HTTP requests:
//!
//! * the [CapabilityApprover](`crate::capability::CapabilityApprover`), authorizing requests from `<prefix><url pattern>:<method>` capabilities;
//! * alternative [capability checks](`crate::checks`), including per endpoint checkers and a [metric validator](`crate::checks::MetricValidator`);
//! * [challenges](`crate::challenge`) written to `WWW-Authenticate` headers;
//! * [credentials extraction](`crate::header`) from request headers;
//! * the [status mapping](`crate::status`) of pipeline failures.
//!
//! Any request type implementing [HttpResource](`crate::resource::HttpResource`)
//! can be authorized, `http::Request` and `http::request::Parts` included.
//!
//! # Usage
//!
//! ```rust
//! use http::{header::AUTHORIZATION, Request, StatusCode};
//! use portcullis::{
//!     token::{ClaimsToken, Token},
//!     Authorizer, Context,
//! };
//! use portcullis_http::{
//!     capability::CapabilityApprover,
//!     challenge::{BasicChallenge, Challenges},
//!     header::credentials_from_request,
//!     status::status_for,
//! };
//! use std::sync::Arc;
//!
//! let mut approver = CapabilityApprover::builder();
//! approver.add_prefix("x1:webpa:api:").unwrap();
//!
//! let mut authorizer = Authorizer::<Request<()>>::builder();
//! authorizer.add_approver(approver.build());
//! let authorizer = authorizer.build();
//!
//! let mut challenges = Challenges::new();
//! challenges.add(BasicChallenge::new("webpa").utf8());
//!
//! let request = Request::get("/device/abc/stat").body(()).unwrap();
//! let err = credentials_from_request(&request).unwrap_err();
//! assert_eq!(status_for(&err, &challenges), StatusCode::UNAUTHORIZED);
//!
//! let token: Arc<dyn Token> = Arc::new(
//!     ClaimsToken::new("joe").with_capabilities(["x1:webpa:api:/device/.*:get"]),
//! );
//! let ctx = Context::new();
//! assert!(authorizer.authorize(&ctx, &request, &token).is_ok());
//!
//! let request = Request::post("/device/abc/stat").body(()).unwrap();
//! let err = authorizer.authorize(&ctx, &request, &token).unwrap_err();
//! assert_eq!(status_for(&err, &challenges), StatusCode::FORBIDDEN);
//! ```
pub mod capability;
pub mod challenge;
pub mod checks;
pub mod error;
pub mod header;
pub mod resource;
pub mod status;

pub use capability::{CapabilitiesConfig, CapabilityApprover};
pub use challenge::{BasicChallenge, BearerChallenge, Challenge, Challenges};
pub use header::credentials_from_headers;
pub use resource::{Endpoint, HttpResource};
pub use status::status_for;
