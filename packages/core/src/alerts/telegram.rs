//! Telegram Bot API delivery.
//!
//! One `sendMessage` call per order, HTML parse mode, 10 second timeout.
//! No retries happen here; see [`crate::scheduler::RedeliveryPolicy`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::alerts::Notifier;
use crate::config::{Secret, TelegramConfig};

pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct TelegramNotifier {
    http: Client,
    api_url: String,
    bot_token: Secret,
    chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, reqwest::Error> {
        Self::with_timeout(config, SEND_TIMEOUT)
    }

    pub fn with_timeout(
        config: &TelegramConfig,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id,
        })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, self.bot_token.expose())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> bool {
        let form = [
            ("chat_id", self.chat_id.to_string()),
            ("text", message.to_string()),
            ("parse_mode", "HTML".to_string()),
        ];

        let response = match self.http.post(self.send_message_url()).form(&form).send().await {
            Ok(response) => response,
            Err(err) => {
                // The request URL embeds the bot token.
                tracing::error!("Telegram delivery failed: {}", err.without_url());
                return false;
            }
        };

        let status = response.status();
        if status == StatusCode::OK {
            return true;
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = status.as_u16(), "Telegram API rejected message: {}", body);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_string_contains, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn config_for(server: &MockServer) -> TelegramConfig {
        TelegramConfig {
            bot_token: Secret::new("123:abc"),
            chat_id: 4242,
            api_url: server.uri(),
        }
    }

    #[tokio::test]
    async fn returns_true_on_http_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_string_contains("chat_id=4242"))
            .and(body_string_contains("parse_mode=HTML"))
            .and(body_string_contains("text=hello"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(&config_for(&server)).unwrap();
        assert!(notifier.send("hello").await);
    }

    #[tokio::test]
    async fn returns_false_on_non_200_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"ok":false,"description":"chat not found"}"#),
            )
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(&config_for(&server)).unwrap();
        assert!(!notifier.send("hello").await);
    }

    #[tokio::test]
    async fn non_200_success_codes_are_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(&config_for(&server)).unwrap();
        assert!(!notifier.send("hello").await);
    }

    #[tokio::test]
    async fn returns_false_on_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let notifier =
            TelegramNotifier::with_timeout(&config_for(&server), Duration::from_millis(100))
                .unwrap();
        assert!(!notifier.send("hello").await);
    }

    #[tokio::test]
    async fn returns_false_when_endpoint_unreachable() {
        let config = TelegramConfig {
            bot_token: Secret::new("123:abc"),
            chat_id: 1,
            // Port 9 (discard) on loopback is not listening in test environments.
            api_url: "http://127.0.0.1:9".to_string(),
        };

        let notifier = TelegramNotifier::new(&config).unwrap();
        assert!(!notifier.send("hello").await);
    }
}
