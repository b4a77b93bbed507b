//! HTTP Collector for thermolog
//!
//! ## Overview
//!
//! Posts the pending data points to a web endpoint as a single
//! `multipart/form-data` request. The form carries one part, named
//! `payload` by default, whose content type is `application/json` and
//! whose body is the JSON array of `[timestamp, temperature]` pairs:
//!
//! ```text
//! POST /dev/test.php HTTP/1.1
//! Content-Type: multipart/form-data; boundary=thermolog-form-boundary
//!
//! --thermolog-form-boundary
//! Content-Disposition: form-data; name="payload"
//! Content-Type: application/json
//!
//! [[1700000000,21.43],[1700000002,21.45]]
//! --thermolog-form-boundary--
//! ```
//!
//! Only a `200 OK` answer counts as delivered. Any other status, including
//! other 2xx codes, is a failure.
//!
//! ## Implementation Choices
//!
//! The lightweight blocking `ureq` client runs on tokio's blocking pool so
//! the request timeout never stalls the runtime. There are no retries
//! here: the points stay pending and the next delivery tick tries again.
//! The channel is plain HTTP without authentication.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thermolog_core::DataPoint;

use crate::{Collector, DeliveryError};

/// Multipart boundary; JSON number arrays cannot contain it
const FORM_BOUNDARY: &str = "thermolog-form-boundary";

/// HTTP collector configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Full collector URL
    pub endpoint_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Form field carrying the JSON payload
    pub form_field: String,
    /// User agent string
    pub user_agent: String,
}

impl HttpConfig {
    /// Configuration for `endpoint_url` with a 5 s timeout
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            timeout: Duration::from_millis(5000),
            form_field: "payload".to_string(),
            user_agent: format!("thermolog/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set request timeout in milliseconds
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Duration::from_millis(ms);
        self
    }

    /// Set the form field name
    pub fn form_field(mut self, name: impl Into<String>) -> Self {
        self.form_field = name.into();
        self
    }
}

/// Collector reached over HTTP
pub struct HttpCollector {
    config: Arc<HttpConfig>,
    agent: ureq::Agent,
}

impl HttpCollector {
    /// Create a collector, validating the endpoint URL
    pub fn new(config: HttpConfig) -> Result<Self, DeliveryError> {
        if !config.endpoint_url.starts_with("http://") && !config.endpoint_url.starts_with("https://") {
            return Err(DeliveryError::Config(
                "endpoint URL must start with http:// or https://".into(),
            ));
        }
        if config.timeout.is_zero() {
            return Err(DeliveryError::Config("timeout must be non-zero".into()));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirects(0)
            .build();

        Ok(Self {
            config: Arc::new(config),
            agent,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn deliver(&self, points: &[DataPoint]) -> Result<usize, DeliveryError> {
        let json = serde_json::to_string(points)?;
        let body = multipart_body(&self.config.form_field, &json);
        let len = body.len();

        let agent = self.agent.clone();
        let config = Arc::clone(&self.config);
        let status = tokio::task::spawn_blocking(move || post(&agent, &config, &body))
            .await
            .map_err(|e| DeliveryError::Interrupted(e.to_string()))??;

        if status != 200 {
            return Err(DeliveryError::Status { status });
        }
        Ok(len)
    }
}

/// Issue the request and return the status code
fn post(agent: &ureq::Agent, config: &HttpConfig, body: &[u8]) -> Result<u16, DeliveryError> {
    let response = agent
        .post(&config.endpoint_url)
        .set(
            "Content-Type",
            &format!("multipart/form-data; boundary={}", FORM_BOUNDARY),
        )
        .set("Accept", "application/json")
        .send_bytes(body);

    match response {
        Ok(resp) => Ok(resp.status()),
        Err(ureq::Error::Status(code, _)) => Ok(code),
        Err(ureq::Error::Transport(e)) => Err(DeliveryError::Transport(e.to_string())),
    }
}

/// Single-part `multipart/form-data` body with a JSON part
fn multipart_body(field: &str, json: &str) -> Vec<u8> {
    format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"{field}\"\r\n\
         Content-Type: application/json\r\n\
         \r\n\
         {json}\r\n\
         --{b}--\r\n",
        b = FORM_BOUNDARY,
        field = field,
        json = json,
    )
    .into_bytes()
}
