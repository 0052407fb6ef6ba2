use async_trait::async_trait;
use serde_json::Value as Json;
use url::Url;

use crate::config::Config;
use crate::error::DriverError;

/// HTTP method subset used by the IDE's endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// A request against the IDE's embedded server: a path relative to its
/// API root, a method, and an optional JSON body.
#[derive(Debug, Clone)]
pub struct Request {
    pub path: String,
    pub method: Method,
    pub body: Option<Json>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Request {
            path: path.into(),
            method: Method::Get,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Request {
            path: path.into(),
            method: Method::Post,
            body: None,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Request {
            path: path.into(),
            method: Method::Delete,
            body: None,
        }
    }

    pub fn with_body(mut self, body: Json) -> Self {
        self.body = Some(body);
        self
    }
}

/// The session capability this driver consumes: one request/response
/// round trip returning the decoded JSON body. Discovery of the IDE
/// process and retry policy, if any, live behind this seam.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: Request) -> Result<Json, DriverError>;

    /// When set, server-side stack traces from error envelopes are logged
    /// before the error is raised.
    fn noisy(&self) -> bool {
        false
    }
}

/// Transport over a plain HTTP connection to a running IDE instance.
pub struct HttpTransport {
    base_url: Url,
    client: reqwest::Client,
    noisy: bool,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, DriverError> {
        // A trailing slash keeps Url::join from eating the last segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(DriverError::Transport(format!(
                "IDE URL must use http:// or https://, got {}",
                base_url.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DriverError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            noisy: false,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, DriverError> {
        let mut transport = Self::new(&config.ide_url(), config.ide.request_timeout_secs)?;
        transport.noisy = config.ide.noisy;
        Ok(transport)
    }

    pub fn with_noisy(mut self, noisy: bool) -> Self {
        self.noisy = noisy;
        self
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn perform(&self, request: Request) -> Result<Json, DriverError> {
        let url = self.base_url.join(&request.path)?;
        tracing::debug!("{:?} {}", request.method, url);

        let mut builder = match request.method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
            Method::Delete => self.client.delete(url.clone()),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DriverError::Transport(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Json>().await?);
        }

        // Failed statuses may still carry a structured error envelope;
        // hand that to the translator instead of losing the message.
        let text = response.text().await.unwrap_or_default();
        if let Ok(body @ Json::Object(_)) = serde_json::from_str::<Json>(&text) {
            if body.get("error").is_some() {
                return Ok(body);
            }
        }
        Err(DriverError::Transport(format!(
            "IDE replied HTTP {} for {}: {}",
            status, url, text
        )))
    }

    fn noisy(&self) -> bool {
        self.noisy
    }
}
