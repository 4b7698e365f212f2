//! Jikan (unofficial MyAnimeList API) client.
//!
//! See: <https://docs.api.jikan.moe/>

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::telemetry;
use crate::traits::UpstreamFetcher;
use crate::{GatewayError, Result};

/// Default base URL for the Jikan v4 API
pub const DEFAULT_BASE_URL: &str = "https://api.jikan.moe/v4";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the Jikan REST API.
#[derive(Clone)]
pub struct JikanClient {
    http: Client,
    base_url: String,
}

impl JikanClient {
    /// Create a client against the public API with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a JSON document, mapping transport, HTTP and embedded failures.
    #[instrument(skip(self, params), fields(base_url = %self.base_url))]
    pub async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let start = Instant::now();

        let response = self.http.get(&url).query(params).send().await.map_err(|e| {
            metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL, "status" => "error").increment(1);
            GatewayError::Http(e.to_string())
        })?;

        let status = response.status();
        metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL, "status" => status.as_u16().to_string())
            .increment(1);
        metrics::histogram!(telemetry::UPSTREAM_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        // Error bodies are JSON too; keep them for the message when present.
        let body: Option<Value> = response.json().await.ok();

        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "upstream request failed");
            return Err(status_error(status.as_u16(), retry_after, body.as_ref()));
        }

        let body = body.ok_or_else(|| GatewayError::Json(format!("non-JSON body from {url}")))?;
        if let Some(embedded) = embedded_status(&body) {
            warn!(%url, status = embedded, "upstream embedded a failure status");
            return Err(status_error(embedded, retry_after, Some(&body)));
        }

        info!(%url, status = status.as_u16(), "fetch successful");
        Ok(body)
    }
}

/// A failure `status` field inside a 2xx body, if any.
///
/// Jikan error documents carry `status` as a number or a numeric string.
fn embedded_status(body: &Value) -> Option<u16> {
    let status = body.as_object()?.get("status")?;
    let code = match status {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.parse::<u64>().ok()?,
        _ => return None,
    };
    u16::try_from(code).ok().filter(|code| *code >= 400)
}

fn status_error(status: u16, retry_after: Option<Duration>, body: Option<&Value>) -> GatewayError {
    if status == 429 {
        return GatewayError::RateLimited { retry_after };
    }
    let message = body
        .and_then(|b| b.get("message").or_else(|| b.get("error")))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| format!("Jikan API error: {status}"));
    GatewayError::Upstream { status, message }
}

#[async_trait]
impl UpstreamFetcher for JikanClient {
    async fn fetch(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        self.get(path, params).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn embedded_status_detection() {
        assert_eq!(embedded_status(&json!({"status": 404, "message": "x"})), Some(404));
        assert_eq!(embedded_status(&json!({"status": "500"})), Some(500));
        assert_eq!(embedded_status(&json!({"status": 200})), None);
        assert_eq!(embedded_status(&json!({"data": []})), None);
        assert_eq!(embedded_status(&json!([1, 2])), None);
    }

    #[test]
    fn status_error_prefers_body_message() {
        let err = status_error(404, None, Some(&json!({"message": "Resource does not exist"})));
        assert_eq!(
            err,
            GatewayError::Upstream {
                status: 404,
                message: "Resource does not exist".into()
            }
        );
        assert_eq!(
            status_error(429, Some(Duration::from_secs(2)), None),
            GatewayError::RateLimited {
                retry_after: Some(Duration::from_secs(2))
            }
        );
    }
}
