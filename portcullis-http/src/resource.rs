//! the parts of an HTTP request capability checks look at
use http::request::Parts;
use http::Request;

/// a resource addressed by an HTTP method and a path
///
/// implemented for [`http::Request`], [`http::request::Parts`], and the
/// borrowed [`Endpoint`] for callers that do not use the `http` types
pub trait HttpResource {
    fn method(&self) -> &str;

    /// the escaped path of the request URI, without the query
    fn path(&self) -> &str;
}

impl<B> HttpResource for Request<B> {
    fn method(&self) -> &str {
        Request::method(self).as_str()
    }

    fn path(&self) -> &str {
        self.uri().path()
    }
}

impl HttpResource for Parts {
    fn method(&self) -> &str {
        self.method.as_str()
    }

    fn path(&self) -> &str {
        self.uri.path()
    }
}

impl<T: HttpResource + ?Sized> HttpResource for &T {
    fn method(&self) -> &str {
        (**self).method()
    }

    fn path(&self) -> &str {
        (**self).path()
    }
}

/// a method and path pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint<'a> {
    pub method: &'a str,
    pub path: &'a str,
}

impl<'a> Endpoint<'a> {
    pub fn new(method: &'a str, path: &'a str) -> Self {
        Endpoint { method, path }
    }

    /// borrows the method and path of any resource
    pub fn of<R: HttpResource + ?Sized>(resource: &'a R) -> Self {
        Endpoint {
            method: resource.method(),
            path: resource.path(),
        }
    }
}

impl<'a> HttpResource for Endpoint<'a> {
    fn method(&self) -> &str {
        self.method
    }

    fn path(&self) -> &str {
        self.path
    }
}
