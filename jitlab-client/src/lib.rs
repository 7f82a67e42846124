use jitlab_common::{BenchError, RequestError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use std::io;
use std::time::Duration;

pub use reqwest::Method;

/// JITLab client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, e.g. `http://localhost:8080`. Request paths are appended to it.
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

/// One request to issue against the target: method, path, headers and body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RequestSpec {
    /// A `POST` carrying `body` serialized as JSON.
    pub fn post_json<T: Serialize>(path: &str, body: &T) -> Result<Self, RequestError> {
        let body = serde_json::to_vec(body).map_err(|e| RequestError::Build(e.to_string()))?;
        Ok(Self {
            method: Method::POST,
            path: path.to_string(),
            headers: vec![(CONTENT_TYPE.as_str().to_string(), "application/json".to_string())],
            body,
        })
    }
}

/// What came back from one request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub status: u16,
    /// Value of the requested aux-metric header, when present and a non-negative integer.
    pub aux_metric: Option<i64>,
    pub body_len: u64,
}

/// Blocking HTTP/1.1 client. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct Client {
    pub config: ClientConfig,
    http_client: reqwest::blocking::Client,
}

impl Client {
    /// Create a new client with the given configuration.
    ///
    /// Must not be called from inside an async runtime; the blocking client owns its own.
    pub fn new(config: ClientConfig) -> Result<Self, BenchError> {
        let http_client = reqwest::blocking::Client::builder()
            .http1_only()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| BenchError::Client(e.to_string()))?;
        Ok(Self { config, http_client })
    }

    /// Join the configured base URL and `path` with exactly one slash between them.
    pub fn build_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if path.is_empty() {
            return base.to_string();
        }
        format!("{}/{}", base, path.trim_start_matches('/'))
    }

    /// Issue `spec` and block until the full response body has been read, or the
    /// request timeout elapses. The body is discarded; only its length is kept.
    pub fn send(&self, spec: &RequestSpec, aux_header: Option<&str>) -> Result<Exchange, RequestError> {
        let url = self.build_url(&spec.path);

        let mut headers = HeaderMap::with_capacity(spec.headers.len());
        for (name, value) in &spec.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RequestError::Build(format!("header {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| RequestError::Build(format!("header value {value:?}: {e}")))?;
            headers.append(name, value);
        }

        let mut response = self
            .http_client
            .request(spec.method.clone(), &url)
            .headers(headers)
            .body(spec.body.clone())
            .send()
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let aux_metric = aux_header.and_then(|name| parse_aux_metric(response.headers(), name));

        let body_len = io::copy(&mut response, &mut io::sink()).map_err(map_io_error)?;

        Ok(Exchange { status, aux_metric, body_len })
    }
}

/// Parse header `name` as a non-negative integer; `None` if absent, unparseable or negative.
pub fn parse_aux_metric(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|v| *v >= 0)
}

fn map_reqwest_error(e: reqwest::Error) -> RequestError {
    if e.is_timeout() {
        RequestError::Timeout
    } else {
        RequestError::Transport(e.to_string())
    }
}

fn map_io_error(e: io::Error) -> RequestError {
    if e.kind() == io::ErrorKind::TimedOut {
        return RequestError::Timeout;
    }
    // Body reads surface reqwest errors wrapped in io::Error.
    match e.get_ref().and_then(|inner| inner.downcast_ref::<reqwest::Error>()) {
        Some(inner) if inner.is_timeout() => RequestError::Timeout,
        _ => RequestError::Transport(e.to_string()),
    }
}
