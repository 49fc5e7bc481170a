use reqwest::header::HeaderMap;

use crate::{Phase, ResponseMeta};

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
        /// Snapshot taken at finalization.
        meta: Option<Box<ResponseMeta>>,
    },
    /// Rejected HTTP status code with the headers and raw body of that response.
    #[error("http error {status}: {body}")]
    Http {
        status: u16,
        headers: HeaderMap,
        body: String,
        /// Snapshot taken at finalization.
        meta: Option<Box<ResponseMeta>>,
    },
    /// The options do not describe a sendable request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Response body decoding error.
    #[error("decode error: {0}")]
    Decode(String),
    /// `execute` was called on a controller that already left the idle phase.
    #[error("controller is {0}, expected idle")]
    NotIdle(Phase),
}

impl RequestError {
    pub(crate) fn transport(source: reqwest::Error) -> Self {
        Self::Transport { source, meta: None }
    }

    pub(crate) fn http(status: u16, headers: HeaderMap, body: String) -> Self {
        Self::Http {
            status,
            headers,
            body,
            meta: None,
        }
    }

    /// Whether a failed attempt is worth repeating at the transport level.
    ///
    /// Rejected statuses are classified by the [`crate::StatusPolicy`], so an
    /// `Http` error is always terminal here.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Transport { source, .. } => {
                source.is_timeout()
                    || source.is_connect()
                    || source.is_request()
                    || source.is_body()
            }
            Self::Http { .. }
            | Self::InvalidRequest(_)
            | Self::Decode(_)
            | Self::NotIdle(_) => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }

    /// HTTP status of a rejected response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Headers of a rejected response.
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            Self::Http { headers, .. } => Some(headers),
            _ => None,
        }
    }

    /// Timing and retry snapshot of the finalized request, if any.
    pub fn meta(&self) -> Option<&ResponseMeta> {
        match self {
            Self::Transport { meta, .. } | Self::Http { meta, .. } => meta.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn with_meta(mut self, snapshot: ResponseMeta) -> Self {
        if let Self::Transport { meta, .. } | Self::Http { meta, .. } = &mut self {
            *meta = Some(Box::new(snapshot));
        }
        self
    }
}
