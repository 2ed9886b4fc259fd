//! HTTP Client Factory
//!
//! Builds the reqwest client each provider owns and performs the JSON POST
//! round trip they share.

use std::time::Duration;

use crate::provider::parse_http_error;
use crate::types::{LlmError, LlmResult};

/// Build a `reqwest::Client` with the given request timeout.
pub fn build_http_client(timeout_secs: u64) -> LlmResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| LlmError::Other {
            message: format!("failed to build HTTP client: {}", e),
        })
}

/// POST a JSON body and return the response text of a 200 response.
///
/// Non-200 statuses are mapped through `parse_http_error`.
pub async fn post_json(
    client: &reqwest::Client,
    url: &str,
    headers: &[(&str, String)],
    body: &serde_json::Value,
    provider: &str,
) -> LlmResult<String> {
    let mut request = client
        .post(url)
        .header("content-type", "application/json")
        .json(body);
    for (name, value) in headers {
        request = request.header(*name, value);
    }

    tracing::debug!("{} POST {}", provider, url);

    let response = request.send().await.map_err(|e| LlmError::NetworkError {
        message: e.to_string(),
    })?;

    let status = response.status().as_u16();
    let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
        message: e.to_string(),
    })?;

    if status != 200 {
        tracing::warn!("{} request failed with HTTP {}", provider, status);
        return Err(parse_http_error(status, &body_text, provider));
    }

    Ok(body_text)
}
