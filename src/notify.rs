use crate::{error::NotifyError, PostRecord};
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Delivers an already formatted message to a destination.
#[async_trait::async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, destination: &str, message: &str) -> Result<(), NotifyError>;
}

/// Formats post alerts and hands them to a channel.
pub struct Notifier<C> {
    channel: C,
    destination: String,
}

impl<C: NotificationChannel> Notifier<C> {
    pub fn new<S: Into<String>>(channel: C, destination: S) -> Self {
        Notifier {
            channel,
            destination: destination.into(),
        }
    }

    pub async fn notify(&self, post: &PostRecord) -> Result<(), NotifyError> {
        let message = format_message(post, Local::now());
        self.channel.send(&self.destination, &message).await?;
        info!("Notification sent: {} | {}", post.title, post.link);
        Ok(())
    }
}

pub fn format_message(post: &PostRecord, at: DateTime<Local>) -> String {
    format!(
        "🔔 New post found!\n\n📌 Title: {}\n🔗 Link: {}\n⏰ Time: {}",
        escape_html(&post.title),
        escape_html(&post.link),
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[derive(Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

/// Telegram Bot API `sendMessage`.
pub struct TelegramChannel {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramChannel {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self::with_api_base(token, TELEGRAM_API)
    }

    pub fn with_api_base<S: Into<String>, B: Into<String>>(token: S, api_base: B) -> Self {
        TelegramChannel {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

#[async_trait::async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send(&self, destination: &str, message: &str) -> Result<(), NotifyError> {
        let body = SendMessageBody {
            chat_id: destination,
            text: message,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let res = self
            .client
            .post(format!("{}/bot{}/sendMessage", self.api_base, self.token))
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        let json: serde_json::Value = res.json().await?;
        if !json.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
            let description = json
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            return Err(NotifyError::Api(description.to_string()));
        }

        Ok(())
    }
}
