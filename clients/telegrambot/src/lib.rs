use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Credentials of the operator alert channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_key: String,
    pub chat_id: String,
    /// Overrides the public Bot API endpoint, e.g. for a local bot server
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Pushes operator alerts to a Telegram chat via the Bot API.
pub struct TelegramNotifier {
    client: Client,
    endpoint: Url,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        Self::with_client(Client::new(), config)
    }

    /// Builds a notifier on a shared HTTP client.
    pub fn with_client(client: Client, config: TelegramConfig) -> Result<Self> {
        let base = config.api_base.as_deref().unwrap_or(TELEGRAM_API_BASE);
        let endpoint = send_message_url(base, &config.bot_key)?;
        Ok(Self {
            client,
            endpoint,
            chat_id: config.chat_id,
        })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Sends a text message to the configured chat.
    pub async fn push_message(&self, text: &str) -> Result<()> {
        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
        };
        debug!(chat_id = %self.chat_id, len = text.len(), "pushing telegram alert");
        self.client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn send_message_url(base: &str, bot_key: &str) -> Result<Url> {
    let base = Url::parse(base).with_context(|| format!("invalid telegram api base {base}"))?;
    // bot keys contain a colon; without "./" the prefix would parse as a scheme
    base.join(&format!("./bot{bot_key}/sendMessage"))
        .context("invalid telegram bot key")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_includes_bot_key() {
        let url = send_message_url(TELEGRAM_API_BASE, "123:abc").unwrap();
        assert_eq!(url.as_str(), "https://api.telegram.org/bot123:abc/sendMessage");
    }

    #[test]
    fn config_api_base_is_optional() {
        let config: TelegramConfig =
            serde_json::from_str(r#"{"bot_key":"k","chat_id":"42"}"#).unwrap();
        assert!(config.api_base.is_none());

        let notifier = TelegramNotifier::new(TelegramConfig {
            api_base: Some("http://localhost:8081".into()),
            ..config
        })
        .unwrap();
        assert_eq!(notifier.endpoint.as_str(), "http://localhost:8081/botk/sendMessage");
        assert_eq!(notifier.chat_id(), "42");
    }

    #[test]
    fn rejects_malformed_base() {
        let config = TelegramConfig {
            bot_key: "k".into(),
            chat_id: "1".into(),
            api_base: Some("not a url".into()),
        };
        assert!(TelegramNotifier::new(config).is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let notifier = TelegramNotifier::new(TelegramConfig {
            bot_key: "k".into(),
            chat_id: "1".into(),
            api_base: Some("http://127.0.0.1:9".into()),
        })
        .unwrap();
        assert!(notifier.push_message("hello").await.is_err());
    }
}
