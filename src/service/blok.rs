//! HTTP gateway for the blok template API

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use uuid::Uuid;

use super::UploadGateway;
use crate::config::SessionConfig;
use crate::error::{BlokError, Result};
use crate::http_logger::{self, HttpRequestLog, HttpResponseLog};
use crate::protocol::Payload;

/// User-Agent header value
const USER_AGENT: &str = concat!("blok-sync/", env!("CARGO_PKG_VERSION"));

/// Sends one PUT per payload with reqwest. Never retries.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
}

impl HttpGateway {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// Use a preconfigured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UploadGateway for HttpGateway {
    async fn send(&self, payload: &Payload, config: &SessionConfig) -> Result<()> {
        let url = config.protocol.endpoint(config);
        let body = serde_json::to_string(payload)?;
        let request_id = Uuid::new_v4().to_string();
        let credential = config.protocol.credential_header(config);

        let mut request = self
            .client
            .put(&url)
            .header("Content-Type", "application/json")
            .header("User-Agent", USER_AGENT)
            .header("x-request-id", &request_id);
        if let Some((name, value)) = credential {
            request = request.header(name, value);
        }

        // Only materialize the log entry when logging is on
        let request_log = http_logger::is_enabled().then(|| {
            let mut headers = vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
                ("x-request-id".to_string(), request_id.clone()),
            ];
            if let Some((name, value)) = credential {
                headers.push((name.to_string(), value.to_string()));
            }
            HttpRequestLog {
                method: "PUT".to_string(),
                url: url.clone(),
                headers,
                body: Some(body.clone()),
            }
        });

        debug!("PUT {} (request id {})", url, request_id);
        let start = Instant::now();
        let result = request.body(body).send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                if let Some(log) = &request_log {
                    http_logger::log_request(log, None, duration_ms, Some(&e.to_string()));
                }
                return Err(BlokError::Http(e));
            }
        };

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if let Some(log) = &request_log {
            let response_log = HttpResponseLog {
                status: status.as_u16(),
                body: Some(text.clone()),
            };
            http_logger::log_request(log, Some(&response_log), duration_ms, None);
        }

        if status.is_success() {
            Ok(())
        } else {
            Err(BlokError::Remote {
                status: status.as_u16(),
                body: text,
            })
        }
    }
}
