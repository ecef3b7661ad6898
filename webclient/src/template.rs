use bytes::Bytes;
use hyper::header::HeaderMap;
use hyper::{Method, Request, Uri};
use std::fmt::Write;

/// The request every worker sends over and over.
///
/// Never mutated once built; workers call [`RequestTemplate::instantiate`] to get
/// a private copy for each attempt.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl RequestTemplate {
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// A fresh request carrying its own header map and its own handle on the body.
    ///
    /// `Bytes` clones share the buffer but not the read position, so concurrent
    /// submissions can never observe each other's progress through the body.
    #[must_use]
    pub fn instantiate(&self) -> Request<Option<Bytes>> {
        let mut request = Request::new(self.body.clone());
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri.clone();
        *request.headers_mut() = self.headers.clone();
        request
    }
}

/// Renders `request` as a one-line curl invocation that reproduces it.
pub fn render_curl<B: AsRef<[u8]>>(request: &Request<Option<B>>) -> String {
    let mut out = format!("curl -X {}", request.method());
    for (name, value) in request.headers() {
        let value = String::from_utf8_lossy(value.as_bytes());
        let _ = write!(out, " -H '{}: {}'", name, shell_single_quoted(&value));
    }
    let _ = write!(out, " {}", request.uri());
    if let Some(body) = request.body() {
        let _ = write!(out, " -d {:?}", String::from_utf8_lossy(body.as_ref()));
    }
    out
}

#[inline]
fn shell_single_quoted(raw: &str) -> String {
    raw.replace('\'', r"'\''")
}
