use std::collections::BTreeMap;

use serde::Serialize;

/// Configures the target, transport passthrough and retry behavior of one
/// logical request.
///
/// A controller wraps the options in an `Arc` at construction and never
/// mutates them afterwards.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RequestOptions {
    /// Protocol including its trailing colon, e.g. `"http:"`.
    pub protocol: String,
    pub host: String,
    pub port: u16,
    /// Request path, starting with `/`.
    pub path: String,
    /// HTTP method name.
    pub method: String,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Optional request body sent as-is.
    pub body: Option<String>,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base retry backoff in milliseconds (exponential strategy, `0` retries immediately).
    pub retry_backoff_ms: u64,
    /// Correlation id attached to log events.
    pub request_id: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            protocol: "http:".to_owned(),
            host: "localhost".to_owned(),
            port: 80,
            path: "/".to_owned(),
            method: "GET".to_owned(),
            headers: BTreeMap::new(),
            body: None,
            timeout_ms: 500,
            max_retries: 0,
            retry_backoff_ms: 0,
            request_id: None,
        }
    }
}

impl RequestOptions {
    /// Builds options for `http://<host>:<port><path>` with defaults elsewhere.
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Adds a header, replacing any previous value for the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_backoff_ms(mut self, retry_backoff_ms: u64) -> Self {
        self.retry_backoff_ms = retry_backoff_ms;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::RequestOptions;

    #[test]
    fn defaults_target_local_http_root() {
        let options = RequestOptions::default();
        assert_eq!(options.protocol, "http:");
        assert_eq!(options.host, "localhost");
        assert_eq!(options.port, 80);
        assert_eq!(options.path, "/");
        assert_eq!(options.method, "GET");
        assert_eq!(options.timeout_ms, 500);
        assert_eq!(options.max_retries, 0);
        assert_eq!(options.retry_backoff_ms, 0);
    }

    #[test]
    fn builder_methods_override_fields() {
        let options = RequestOptions::new("example.com", 8080, "/v1/items")
            .with_protocol("https:")
            .with_method("POST")
            .with_header("x-trace", "abc")
            .with_header("x-trace", "def")
            .with_body("{}")
            .with_max_retries(3)
            .with_request_id("req-1");

        assert_eq!(options.protocol, "https:");
        assert_eq!(options.host, "example.com");
        assert_eq!(options.method, "POST");
        assert_eq!(options.headers.get("x-trace").map(String::as_str), Some("def"));
        assert_eq!(options.body.as_deref(), Some("{}"));
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.request_id.as_deref(), Some("req-1"));
    }
}
