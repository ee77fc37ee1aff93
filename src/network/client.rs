//! HTTP client for making requests to the hosted providers

use crate::config::OutgoingSettings;
use crate::providers::ProviderError;
use reqwest::Client;
use std::time::Duration;
use tokio::time::timeout;

/// HTTP client wrapper shared by every provider
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> anyhow::Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .pool_max_idle_per_host(settings.pool_maxsize)
            .user_agent(concat!("askweb/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Execute a provider request, bounded by `limit` end to end.
    ///
    /// When the timer fires the in-flight future is dropped, which aborts
    /// the connection.
    pub async fn execute(
        &self,
        request: ProviderRequest,
        limit: Duration,
    ) -> Result<ProviderResponse, ProviderError> {
        let provider = request.provider.clone();
        match timeout(limit, self.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout { provider }),
        }
    }

    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let transport = |source: reqwest::Error| {
            if source.is_timeout() {
                ProviderError::Timeout {
                    provider: request.provider.clone(),
                }
            } else {
                ProviderError::Transport {
                    provider: request.provider.clone(),
                    source,
                }
            }
        };

        let response = self
            .client
            .post(&request.url)
            .bearer_auth(&request.api_key)
            .json(&request.body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport)?;

        Ok(ProviderResponse {
            provider: request.provider,
            status,
            text,
        })
    }
}

/// JSON POST to be made on behalf of a provider
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Provider name, used in errors and logs
    pub provider: String,
    /// URL to request
    pub url: String,
    /// Bearer credential
    pub api_key: String,
    /// JSON body
    pub body: serde_json::Value,
}

/// HTTP response from a provider request
#[derive(Debug)]
pub struct ProviderResponse {
    pub provider: String,
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl ProviderResponse {
    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with the upstream body unless the status is 2xx
    pub fn error_for_status(self) -> Result<Self, ProviderError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ProviderError::Status {
                provider: self.provider,
                status: self.status,
                body: self.text,
            })
        }
    }

    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProviderError> {
        serde_json::from_str(&self.text).map_err(|e| ProviderError::Decode {
            provider: self.provider.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(url: String) -> ProviderRequest {
        ProviderRequest {
            provider: "test".into(),
            url,
            api_key: "secret".into(),
            body: json!({"q": 1}),
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_sends_bearer_and_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let response = client
            .execute(request(format!("{}/echo", server.uri())), Duration::from_secs(5))
            .await
            .unwrap();

        assert!(response.is_success());
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_timer_expiry_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .execute(request(server.uri()), Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_error_for_status_keeps_body() {
        let response = ProviderResponse {
            provider: "test".into(),
            status: 502,
            text: "bad gateway".into(),
        };
        match response.error_for_status() {
            Err(ProviderError::Status { status, body, .. }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
