//! CLI Status Command
//!
//! Asks a running server for `/health` and prints what it says.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

pub async fn run(port: u16) -> Result<()> {
    let base_url = format!("http://localhost:{port}");
    match fetch_health(&base_url).await {
        Ok(body) => println!("{}", serde_json::to_string_pretty(&body)?),
        Err(e) => println!("menuscan is not running on port {port} ({e:#})"),
    }
    Ok(())
}

pub async fn fetch_health(base_url: &str) -> Result<Value> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .context("server unreachable")?
        .error_for_status()?;
    Ok(resp.json().await?)
}
