use crate::error::AttemptError;
use bytes::Bytes;
use http_body_util::Full;
use http_test_util::drain::DrainBodyFuture;
use http_test_util::{byte_body, empty_body};
use hyper::header::{HeaderMap, AUTHORIZATION, CONTENT_LENGTH, COOKIE, LOCATION, WWW_AUTHENTICATE};
use hyper::{Method, Request, StatusCode, Uri};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use rustls::ClientConfig;
use std::error::Error as StdError;
use std::fmt::Write;

/// Requests sent for one attempt before a redirect chain is given up on.
pub const MAX_REDIRECTS: usize = 10;

/// One worker's HTTP client and connection pool. Not meant to be shared.
pub struct HttpClient {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl HttpClient {
    #[must_use]
    pub fn new(tls: &ClientConfig) -> Self {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls.clone())
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(https);
        Self { client }
    }

    /// Sends `request`, following redirects, and reads the final response body to the end.
    pub async fn send_recv(
        &mut self,
        request: Request<Option<Bytes>>,
    ) -> Result<(StatusCode, Vec<u8>), AttemptError> {
        let (parts, mut body) = request.into_parts();
        let mut method = parts.method;
        let mut uri = parts.uri;
        let mut headers = parts.headers;
        let mut redirects = 0;
        loop {
            let mut hop = Request::new(body.clone().map_or_else(empty_body, byte_body));
            *hop.method_mut() = method.clone();
            *hop.uri_mut() = uri.clone();
            *hop.headers_mut() = headers.clone();

            let resp = self
                .client
                .request(hop)
                .await
                .map_err(|e| AttemptError::Transport(describe(&method, &uri, &e)))?;
            let status = resp.status();

            if let Some(next) = redirect_method(status, &method) {
                if let Some(location) = resp.headers().get(LOCATION) {
                    redirects += 1;
                    if redirects == MAX_REDIRECTS {
                        return Err(AttemptError::TooManyRedirects {
                            request: format!("{method} {:?}", uri.to_string()),
                            limit: MAX_REDIRECTS,
                        });
                    }
                    let location = String::from_utf8_lossy(location.as_bytes()).into_owned();
                    let target = resolve_location(&uri, &location)?;
                    if target.host() != uri.host() {
                        strip_credentials(&mut headers);
                    }
                    method = next.method;
                    if !next.keep_body {
                        body = None;
                        headers.remove(CONTENT_LENGTH);
                    }
                    uri = target;
                    continue;
                }
            }

            let content_length: usize = resp
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|hv| hv.to_str().ok())
                .and_then(|hv| hv.parse().ok())
                .unwrap_or(1024);
            let bytes = DrainBodyFuture::new_trusted_length(resp.into_body(), content_length)
                .await
                .map_err(|e| AttemptError::Body(e.to_string()))?;
            return Ok((status, bytes));
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct RedirectMethod {
    method: Method,
    keep_body: bool,
}

/// How to re-issue a request answered with `status`, `None` if it is not followed.
fn redirect_method(status: StatusCode, method: &Method) -> Option<RedirectMethod> {
    match status {
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER => {
            let method = if method == Method::GET || method == Method::HEAD {
                method.clone()
            } else {
                Method::GET
            };
            Some(RedirectMethod {
                method,
                keep_body: false,
            })
        }
        StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT => Some(RedirectMethod {
            method: method.clone(),
            keep_body: true,
        }),
        _ => None,
    }
}

fn resolve_location(current: &Uri, location: &str) -> Result<Uri, AttemptError> {
    let invalid = |reason: String| AttemptError::Redirect {
        location: location.to_string(),
        reason,
    };
    let base = url::Url::parse(&current.to_string()).map_err(|e| invalid(e.to_string()))?;
    let next = base.join(location).map_err(|e| invalid(e.to_string()))?;
    match next.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other}"))),
    }
    next.as_str()
        .parse::<Uri>()
        .map_err(|e| invalid(e.to_string()))
}

fn strip_credentials(headers: &mut HeaderMap) {
    for name in [AUTHORIZATION, WWW_AUTHENTICATE, COOKIE] {
        headers.remove(name);
    }
}

/// `METHOD "uri": error: cause: ...`, the full source chain on one line.
fn describe(method: &Method, uri: &Uri, err: &(dyn StdError + 'static)) -> String {
    let mut msg = format!("{method} {:?}: {err}", uri.to_string());
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(msg, ": {cause}");
        source = cause.source();
    }
    msg
}
