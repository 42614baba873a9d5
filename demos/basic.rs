use std::{collections::HashMap, time::Duration};

use resilient_http::{header_map, read_body, read_json_body, HttpClient};
use serde_json::{json, Value};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resilient_http=info".into()),
        )
        .init();

    let base = std::env::var("DEMO_BASE_URL").unwrap_or_else(|_| "https://httpbin.org".to_owned());

    let client = HttpClient::builder()
        .timeout(Duration::from_secs(10))
        .retry(3, Duration::from_millis(500))
        .exponential_backoff(Duration::from_millis(200))
        .default_headers(header_map(&[("User-Agent", "resilient-http-demo")])?)
        .build()?;

    let response = client.get(&format!("{base}/get"), &[("Accept", "text/plain")]).await?;
    println!("{}", read_body(response).await?);

    let response = client
        .post_json(&format!("{base}/post"), &json!({"name": "Kit"}), &[])
        .await?;
    let echoed: HashMap<String, Value> = read_json_body(response).await?;
    println!("{:?}", echoed.get("json"));

    Ok(())
}
