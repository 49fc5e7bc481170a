use timed_http::{RequestController, RequestError, RequestOptions, StatusDecision, StatusPolicy};

/// Accepts any 2xx, never retries 4xx, and refuses to retry timeouts.
struct ApiPolicy;

impl StatusPolicy for ApiPolicy {
    fn classify(&self, status: u16) -> StatusDecision {
        match status {
            200..=299 => StatusDecision::accepted(),
            400..=499 => StatusDecision::fail(),
            _ => StatusDecision::retry(),
        }
    }

    fn retry_transport_error(&self, error: &RequestError) -> bool {
        error.is_retriable() && !error.is_timeout()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let host = std::env::var("TIMED_HTTP_HOST").unwrap_or_else(|_| "example.com".to_owned());

    let options = RequestOptions::new(host, 80, "/status")
        .with_max_retries(3)
        .with_retry_backoff_ms(200)
        .with_request_id("demo-1");

    let mut request = RequestController::new(options)
        .with_policy(ApiPolicy)
        .on_complete(|error, response| match error {
            Some(error) => {
                let used = error.meta().map(|meta| meta.retries.used).unwrap_or_default();
                eprintln!("failed after {used} retries: {error}");
            }
            None => {
                if let Some(response) = response {
                    println!(
                        "accepted {:?} after {} retries",
                        response.status(),
                        response.meta.retries.used
                    );
                }
            }
        });

    request.execute().await?;

    Ok(())
}
