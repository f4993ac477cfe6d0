//! Bot API sink (teloxide).
//!
//! Used instead of the MTProto session for delivery when a bot token is
//! configured. The bot must be able to post in the destination chat.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ParseMode, Recipient},
};

use tokio::time::sleep;

use tgdigest_core::{
    domain::Destination, errors::Error, formatting::markdown_to_telegram_html,
    messaging::port::DigestSink, Result,
};

#[derive(Clone)]
pub struct BotSink {
    bot: Bot,
}

impl BotSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self::new(Bot::new(token))
    }

    fn recipient(destination: &Destination) -> Recipient {
        match destination {
            Destination::Handle(handle) => Recipient::ChannelUsername(format!("@{handle}")),
            Destination::Id(id) => Recipient::Id(teloxide::types::ChatId(*id)),
        }
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Send(format!("telegram bot error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        tracing::warn!(?d, "bot api flood wait, retrying once");
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl DigestSink for BotSink {
    async fn send_markdown(&self, destination: &Destination, text: &str) -> Result<()> {
        let html = markdown_to_telegram_html(text);
        let recipient = Self::recipient(destination);
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(recipient.clone(), html.clone())
                    .parse_mode(ParseMode::Html)
                    .disable_web_page_preview(true)
            })
            .await?;
        tracing::info!(%destination, message_id = msg.id.0, "Message sent via bot");
        Ok(())
    }
}
