//! Telegram Bot API client used to deliver rendered messages.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Failed to reach Telegram API: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Telegram API returned a non-JSON response: {0}")]
    InvalidResponse(#[source] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Shared HTTP client for the `sendMessage` endpoint. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: Client,
    api_base: String,
}

impl TelegramClient {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DeliveryError::Client)?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// Send `text` to `chat_id` as Markdown.
    ///
    /// Returns the API's JSON reply as-is. An `"ok": false` reply is still a
    /// successful delivery from our side; only transport failures and
    /// non-JSON bodies are errors.
    pub async fn send_message(
        &self,
        bot_token: &str,
        chat_id: &str,
        text: &str,
    ) -> Result<Value, DeliveryError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, bot_token);
        debug!("Sending message to chat {}", chat_id);

        let response = self
            .http
            .get(&url)
            .query(&[("chat_id", chat_id), ("parse_mode", "Markdown"), ("text", text)])
            .send()
            .await
            .map_err(DeliveryError::Network)?;

        let body: Value = response
            .json()
            .await
            .map_err(DeliveryError::InvalidResponse)?;

        info!("{}", body);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_query_parameters() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bot123:abc/sendMessage"))
            .and(query_param("chat_id", "-1001"))
            .and(query_param("parse_mode", "Markdown"))
            .and(query_param("text", "*hi* & bye"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"ok":true,"result":{}}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = TelegramClient::new(mock_server.uri(), DEFAULT_TIMEOUT).unwrap();
        let body = client
            .send_message("123:abc", "-1001", "*hi* & bye")
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn api_error_body_is_not_a_delivery_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"ok":false,"description":"chat not found"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = TelegramClient::new(format!("{}/", mock_server.uri()), DEFAULT_TIMEOUT)
            .unwrap();
        let body = client.send_message("t", "c", "x").await.unwrap();
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let client = TelegramClient::new(mock_server.uri(), DEFAULT_TIMEOUT).unwrap();
        let err = client.send_message("t", "c", "x").await.unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn timeout_is_network_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{}")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client = TelegramClient::new(mock_server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.send_message("t", "c", "x").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Network(_)));
    }
}
