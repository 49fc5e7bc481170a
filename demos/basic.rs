use timed_http::{RequestController, RequestOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let host = std::env::var("TIMED_HTTP_HOST").unwrap_or_else(|_| "example.com".to_owned());

    let options = RequestOptions::new(host, 80, "/")
        .with_timeout_ms(2_000)
        .with_max_retries(2);

    let mut request = RequestController::new(options).on_complete(|error, response| {
        match (error, response) {
            (None, Some(response)) => println!(
                "status={:?} bytes={} retries={}/{} timings={}",
                response.status(),
                response.body().len(),
                response.meta.retries.used,
                response.meta.retries.limit,
                serde_json::to_string(&response.meta.time).unwrap_or_default(),
            ),
            (Some(error), _) => eprintln!("request failed: {error}"),
            (None, None) => eprintln!("request finished without a response"),
        }
    });

    println!("GET {}", request.url());
    request.execute().await?;

    Ok(())
}
