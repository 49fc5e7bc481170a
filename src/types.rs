use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde::{de::DeserializeOwned, Serialize};

use crate::{RequestError, RequestOptions, Result, TimerReading};

/// Network and total timer readings of a controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Timings {
    /// Most recent network attempt only.
    pub network: TimerReading,
    /// Whole logical request, across all attempts and retry delays.
    pub total: TimerReading,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RetryCounters {
    /// Configured `max_retries`.
    pub limit: usize,
    /// Retries performed so far.
    pub used: usize,
}

/// Snapshot of timings, options and retry counters attached to every
/// terminal result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResponseMeta {
    pub time: Timings,
    pub options: Arc<RequestOptions>,
    pub retries: RetryCounters,
}

impl ResponseMeta {
    pub(crate) fn snapshot(time: Timings, options: &Arc<RequestOptions>, used: usize) -> Self {
        Self {
            time,
            options: Arc::clone(options),
            retries: RetryCounters {
                limit: options.max_retries,
                used,
            },
        }
    }
}

/// Data received by one network attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

/// Successful terminal result handed to the completion callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// Last attempt data; `None` when resolved before any attempt completed.
    pub payload: Option<Payload>,
    pub meta: ResponseMeta,
}

impl Response {
    pub fn status(&self) -> Option<u16> {
        self.payload.as_ref().map(|payload| payload.status)
    }

    pub fn body(&self) -> &str {
        self.payload
            .as_ref()
            .map(|payload| payload.body.as_str())
            .unwrap_or_default()
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(self.body()).map_err(|err| {
            RequestError::Decode(format!("invalid JSON body: {err}; body: {}", self.body()))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::header::HeaderMap;

    use super::{Payload, Response, ResponseMeta, RetryCounters, Timings};
    use crate::{RequestError, RequestOptions};

    fn meta() -> ResponseMeta {
        ResponseMeta {
            time: Timings::default(),
            options: Arc::new(RequestOptions::default()),
            retries: RetryCounters { limit: 2, used: 1 },
        }
    }

    #[test]
    fn meta_serializes_with_three_keys() {
        let value = serde_json::to_value(meta()).unwrap();
        let object = value.as_object().expect("meta must serialize to an object");

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["options", "retries", "time"]);
        assert_eq!(value["retries"]["limit"], 2);
        assert_eq!(value["retries"]["used"], 1);
        assert_eq!(value["options"]["host"], "localhost");
    }

    #[test]
    fn json_decodes_body() {
        let response = Response {
            payload: Some(Payload {
                status: 200,
                headers: HeaderMap::new(),
                body: r#"{"answer":42}"#.to_owned(),
            }),
            meta: meta(),
        };

        let value: serde_json::Value = response.json().expect("body must decode");
        assert_eq!(value["answer"], 42);
        assert_eq!(response.status(), Some(200));
    }

    #[test]
    fn json_reports_decode_error() {
        let response = Response {
            payload: None,
            meta: meta(),
        };

        assert_eq!(response.body(), "");
        assert!(matches!(
            response.json::<serde_json::Value>(),
            Err(RequestError::Decode(_))
        ));
    }
}
