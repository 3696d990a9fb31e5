use crate::config::toml_config::Credentials;
use crate::domain::model::HttpReply;
use crate::domain::ports::Transport;
use crate::utils::error::{DedupeError, Result};
use reqwest::Client;
use std::time::Duration;

/// `reqwest`-backed transport with optional basic auth.
pub struct ReqwestTransport {
    client: Client,
    credentials: Option<Credentials>,
}

impl ReqwestTransport {
    pub fn new(credentials: Option<Credentials>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials,
        })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpReply> {
        let mut request = self.client.post(url).json(body);

        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.key, Some(&credentials.secret));
        }

        let response = request.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(network_error)?;

        tracing::debug!("API response status: {}", status);
        Ok(HttpReply::new(status, body))
    }
}

fn network_error(e: reqwest::Error) -> DedupeError {
    DedupeError::NetworkError {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn credentials() -> Credentials {
        Credentials {
            key: "key".to_string(),
            secret: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_post_sends_basic_auth_and_json() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v2/events")
                .header("Authorization", "Basic a2V5OnNlY3JldA==")
                .json_body(json!({"mpid": "1"}));
            then.status(202).body("accepted");
        });

        let transport = ReqwestTransport::new(Some(credentials()), Duration::from_secs(5)).unwrap();
        let reply = transport
            .post_json(&server.url("/v2/events"), &json!({"mpid": "1"}))
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(reply, HttpReply::new(202, "accepted"));
    }

    #[tokio::test]
    async fn test_error_statuses_are_replies_not_errors() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/v2/events");
            then.status(503).body("unavailable");
        });

        let transport = ReqwestTransport::new(None, Duration::from_secs(5)).unwrap();
        let reply = transport
            .post_json(&server.url("/v2/events"), &json!({}))
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(reply.status, 503);
        assert!(reply.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let transport = ReqwestTransport::new(None, Duration::from_secs(2)).unwrap();
        let err = transport
            .post_json("http://127.0.0.1:9/events", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, DedupeError::NetworkError { .. }));
    }
}
