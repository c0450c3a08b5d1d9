//! Typed endpoints over the authenticated request gateway.

pub mod auth;
pub mod events;
pub mod guestbook;

use anyhow::{Context, Result, bail};
use reqwest::Response;
use serde_json::Value;

/// Reads a JSON body, failing with status and body text on non-success.
pub(crate) async fn read_json(response: Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("API request failed (HTTP {status}): {body}");
    }
    response
        .json()
        .await
        .context("failed to parse API response body")
}

/// Fails with status and body text when the response is not a success.
pub(crate) async fn ensure_ok(response: Response, action: &str) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    bail!("{action} failed (HTTP {status}): {body}");
}

/// Unwraps the `{ "data": ... }` envelope the backend wraps payloads in,
/// passing other shapes through unchanged.
pub(crate) fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
