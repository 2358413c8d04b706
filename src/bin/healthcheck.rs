//! Liveness probe for the container image. The runtime image ships no curl,
//! so `HEALTHCHECK` runs this binary instead.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_PORT: &str = "8000";

async fn probe(url: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("cannot reach {}", url))?;

    if !response.status().is_success() {
        bail!("{} returned HTTP {}", url, response.status());
    }

    let body: Value = response.json().await.context("healthcheck body is not JSON")?;
    match body.get("status").and_then(Value::as_str) {
        Some("healthy") => Ok(()),
        other => bail!("unexpected status {:?}", other),
    }
}

#[tokio::main]
async fn main() {
    let port = std::env::var("MCP_PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("http://127.0.0.1:{}/healthcheck", port));

    match probe(&url).await {
        Ok(()) => println!("healthy"),
        Err(e) => {
            eprintln!("unhealthy: {:#}", e);
            std::process::exit(1);
        }
    }
}
