use crate::error::ConfigError;
use crate::template::RequestTemplate;
use bytes::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::{Method, Uri};
use std::time::Duration;

/// Everything a run needs, validated up front.
///
/// Built once from user input and then only read: the controller and every
/// worker receive it (or values derived from it) by shared reference.
#[derive(Debug, Clone)]
pub struct RunSpec {
    target: Uri,
    method: Method,
    headers: HeaderMap,
    body: Option<Bytes>,
    concurrency: usize,
    duration: Duration,
    verbose: bool,
}

impl RunSpec {
    /// A single-worker `GET` of `target` with a zero duration.
    ///
    /// A target without a scheme is taken as `http://`.
    pub fn new(target: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            target: parse_target(target)?,
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            concurrency: 1,
            duration: Duration::ZERO,
            verbose: false,
        })
    }

    pub fn with_method(mut self, method: &str) -> Result<Self, ConfigError> {
        self.method = Method::from_bytes(method.as_bytes())
            .map_err(|_| ConfigError::InvalidMethod(method.to_string()))?;
        Ok(self)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(concurrency));
        }
        self.concurrency = concurrency;
        Ok(self)
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Adds a header given as a `Name: value` line. Repeated names are kept.
    pub fn with_header(mut self, line: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidHeader {
            line: line.to_string(),
            reason,
        };
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| invalid("expected `Name: value`".to_string()))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let value = HeaderValue::from_str(value.trim()).map_err(|e| invalid(e.to_string()))?;
        self.headers.append(name, value);
        Ok(self)
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[inline]
    pub fn target(&self) -> &Uri {
        &self.target
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[inline]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Whether worker `id` prints its curl trace and results.
    ///
    /// Only the first worker does, which keeps the output readable at any
    /// concurrency.
    #[inline]
    pub fn traces_worker(&self, id: usize) -> bool {
        self.verbose && id == 0
    }

    #[must_use]
    pub fn template(&self) -> RequestTemplate {
        let template = RequestTemplate::new(self.method.clone(), self.target.clone())
            .with_headers(self.headers.clone());
        match &self.body {
            Some(body) => template.with_body(body.clone()),
            None => template,
        }
    }
}

fn parse_target(target: &str) -> Result<Uri, ConfigError> {
    let parsed = if target.contains("://") {
        target.parse::<Uri>()
    } else {
        format!("http://{target}").parse::<Uri>()
    };
    let uri = parsed.map_err(|e| ConfigError::InvalidUrl(format!("{target}: {e}")))?;
    match uri.scheme_str() {
        Some("http" | "https") => {}
        other => return Err(ConfigError::UnsupportedScheme(other.unwrap_or_default().to_string())),
    }
    if uri.host().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!("{target}: missing host")));
    }
    Ok(uri)
}
