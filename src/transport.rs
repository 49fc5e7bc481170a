use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{redirect, Method};

use crate::{
    Payload, RequestError, RequestOptions, ResponseMeta, Result, Timer, TimerReading, Timings,
};

/// Signals a transport raises while performing one attempt.
///
/// The attempt is complete when the transport future resolves, at which
/// point the controller stops the network timer. While the attempt is in
/// flight the events also expose the controller's timings and meta.
pub struct AttemptEvents<'a> {
    network: &'a mut Timer,
    execution: &'a Timer,
    options: &'a Arc<RequestOptions>,
    retries: usize,
}

impl<'a> AttemptEvents<'a> {
    pub(crate) fn new(
        network: &'a mut Timer,
        execution: &'a Timer,
        options: &'a Arc<RequestOptions>,
        retries: usize,
    ) -> Self {
        Self {
            network,
            execution,
            options,
            retries,
        }
    }

    /// Marks the attempt as on the wire and starts the network timer.
    pub fn started(&mut self) {
        self.network.start();
    }

    /// Current network timer reading of this attempt.
    pub fn network(&self) -> TimerReading {
        self.network.reading()
    }

    /// Execution timer reading, running for the whole logical request.
    pub fn total(&self) -> TimerReading {
        self.execution.reading()
    }

    /// Same snapshot as [`crate::RequestController::response_meta`], taken mid-flight.
    pub fn meta(&self) -> ResponseMeta {
        let time = Timings {
            network: self.network(),
            total: self.total(),
        };
        ResponseMeta::snapshot(time, self.options, self.retries)
    }
}

/// Performs one network attempt for a controller.
pub trait Transport: Send + Sync {
    fn attempt<'a>(
        &'a self,
        options: &'a RequestOptions,
        url: &'a str,
        events: AttemptEvents<'a>,
    ) -> impl Future<Output = Result<Payload>> + Send + 'a;
}

/// Default [`Transport`] backed by `reqwest`.
///
/// Redirects are not followed: every 3xx reaches the status policy.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Creates a transport with redirects disabled.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized, like `reqwest::Client::new`.
    /// Use [`HttpTransport::try_new`] to handle that as an error.
    pub fn new() -> Self {
        match Self::try_new() {
            Ok(transport) => transport,
            Err(err) => panic!("http transport could not be built: {err}"),
        }
    }

    pub fn try_new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(RequestError::transport)?;
        Ok(Self { http })
    }

    /// Uses a preconfigured `reqwest` client (proxies, TLS roots, redirect
    /// following, ...).
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    fn attempt<'a>(
        &'a self,
        options: &'a RequestOptions,
        url: &'a str,
        mut events: AttemptEvents<'a>,
    ) -> impl Future<Output = Result<Payload>> + Send + 'a {
        async move {
            let method = Method::from_bytes(options.method.as_bytes()).map_err(|_| {
                RequestError::InvalidRequest(format!("invalid method '{}'", options.method))
            })?;

            let mut builder = self
                .http
                .request(method, url)
                .timeout(Duration::from_millis(options.timeout_ms));
            for (name, value) in &options.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &options.body {
                builder = builder.body(body.clone());
            }
            let request = builder
                .build()
                .map_err(|err| RequestError::InvalidRequest(err.to_string()))?;

            events.started();
            let response = self
                .http
                .execute(request)
                .await
                .map_err(RequestError::transport)?;

            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.text().await.map_err(RequestError::transport)?;

            Ok(Payload {
                status,
                headers,
                body,
            })
        }
    }
}
