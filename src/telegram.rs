//! Telegram `getUpdates` long polling and replies.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::{
    net,
    payloads::GetUpdatesSetters,
    prelude::Requester,
    types::{ChatId, UpdateKind as TgUpdateKind},
    Bot,
};
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use url::Url;

use crate::{
    bot::Replier,
    error::{HandlerError, SourceError},
    update::{Update, UpdateBatch, UpdateKind, UpdateMessage, UpdateSource},
};

/// Maximum batch size accepted by `getUpdates`.
const MAX_BATCH: u8 = 100;

/// Time the HTTP client waits on top of the long-poll timeout.
const HTTP_MARGIN: Duration = Duration::from_secs(10);

/// Builds a bot whose HTTP client outlives a `getUpdates` long poll of
/// `poll_timeout` seconds. teloxide's default client gives up after 17s.
pub fn polling_bot(
    token: &str,
    poll_timeout: u32,
    api_url: Option<Url>,
) -> Result<Bot, SourceError> {
    let client = net::default_reqwest_settings()
        .timeout(http_timeout(poll_timeout))
        .build()
        .map_err(|e| SourceError::Transport(e.to_string()))?;

    let bot = Bot::with_client(token, client);
    Ok(match api_url {
        Some(url) => bot.set_api_url(url),
        None => bot,
    })
}

fn http_timeout(poll_timeout: u32) -> Duration {
    Duration::from_secs(u64::from(poll_timeout)) + HTTP_MARGIN
}

pub struct TelegramSource {
    bot: Bot,
    timeout: u32,
    offset: Mutex<Option<i32>>,
}

impl TelegramSource {
    /// `timeout` is the long-poll duration in seconds; zero means short polling.
    pub fn new(bot: Bot, timeout: u32) -> Self {
        Self {
            bot,
            timeout,
            offset: Mutex::new(None),
        }
    }
}

#[async_trait]
impl UpdateSource for TelegramSource {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self) -> Result<UpdateBatch, SourceError> {
        let mut offset = self.offset.lock().await;

        let mut request = self.bot.get_updates().timeout(self.timeout).limit(MAX_BATCH);
        if let Some(offset) = *offset {
            request = request.offset(offset);
        }

        let updates = request.await?;

        if let Some(last) = updates.last() {
            *offset = Some(next_offset(last.id.0));
        }
        debug!("Received {} updates", updates.len());

        Ok(updates.into_iter().map(normalize).collect())
    }
}

fn next_offset(update_id: u32) -> i32 {
    i32::try_from(u64::from(update_id) + 1).unwrap_or(i32::MAX)
}

fn normalize(update: teloxide::types::Update) -> Update {
    let id = update.id.0;
    let kind = match update.kind {
        TgUpdateKind::Message(msg) => match (msg.from.as_ref(), msg.text()) {
            (Some(user), Some(text)) => UpdateKind::Message(UpdateMessage {
                id: msg.id.0,
                user_id: user.id.0,
                chat_id: msg.chat.id.0,
                text: text.to_owned(),
            }),
            _ => UpdateKind::Other {
                kind: "non_text_message",
            },
        },
        TgUpdateKind::EditedMessage(_) => UpdateKind::Other {
            kind: "edited_message",
        },
        TgUpdateKind::CallbackQuery(_) => UpdateKind::Other {
            kind: "callback_query",
        },
        _ => UpdateKind::Other { kind: "other" },
    };

    Update { id, kind }
}

#[async_trait]
impl Replier for Bot {
    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), HandlerError> {
        self.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: serde_json::Value) -> teloxide::types::Update {
        // teloxide's `UpdateKind` deserializer needs borrowed keys, which
        // `from_value` cannot provide; parse from text like the real API.
        serde_json::from_str(&json.to_string()).unwrap()
    }

    #[test]
    fn text_message_keeps_sender_chat_and_text() {
        let raw = update(serde_json::json!({
            "update_id": 7,
            "message": {
                "message_id": 15,
                "date": 1700000000,
                "chat": { "id": 42, "type": "private", "first_name": "Ann" },
                "from": { "id": 42, "is_bot": false, "first_name": "Ann" },
                "text": "/themes"
            }
        }));

        assert_eq!(
            normalize(raw),
            Update::message(
                7,
                UpdateMessage {
                    id: 15,
                    user_id: 42,
                    chat_id: 42,
                    text: "/themes".into(),
                }
            )
        );
    }

    #[test]
    fn http_client_outlives_the_long_poll() {
        assert!(http_timeout(25) > Duration::from_secs(25));
        assert!(http_timeout(60) > Duration::from_secs(60));
        assert!(http_timeout(0) > Duration::ZERO);
    }

    #[test]
    fn polling_bot_accepts_long_poll_timeouts() {
        let url = Url::parse("http://localhost:8081").unwrap();

        assert!(polling_bot("123:abc", 25, None).is_ok());
        let bot = polling_bot("123:abc", 50, Some(url.clone())).unwrap();
        assert_eq!(bot.api_url(), url);
    }

    #[test]
    fn offset_points_past_the_last_update() {
        assert_eq!(next_offset(41), 42);
        assert_eq!(next_offset(u32::MAX), i32::MAX);
    }
}
