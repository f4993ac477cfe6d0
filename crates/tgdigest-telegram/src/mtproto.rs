//! MTProto user session (grammers).
//!
//! Channel history is only reachable as a user, so the digest reads through a
//! pre-authorized session. The session token is the base64 encoding of a
//! serialized `grammers_session::Session`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use grammers_client::{types::Chat, Client, Config, InitParams, InputMessage};
use grammers_session::Session;
use tokio::sync::Mutex;

use tgdigest_core::{
    domain::{bare_chat_id, Channel, Destination, RawPost},
    errors::Error,
    messaging::port::{ChannelSource, DigestSink, PlatformSession},
    Result,
};

#[derive(Clone)]
pub struct MtprotoConfig {
    pub api_id: i32,
    pub api_hash: String,
    pub session: String,
}

impl std::fmt::Debug for MtprotoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MtprotoConfig")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .field("session", &"<redacted>")
            .finish()
    }
}

pub struct MtprotoClient {
    cfg: MtprotoConfig,
    client: Mutex<Option<Client>>,
}

impl MtprotoClient {
    pub fn new(cfg: MtprotoConfig) -> Self {
        Self {
            cfg,
            client: Mutex::new(None),
        }
    }

    fn load_session(token: &str) -> Result<Session> {
        let bytes = STANDARD
            .decode(token.trim())
            .map_err(|e| Error::Session(format!("session token is not valid base64: {e}")))?;
        Session::load(&bytes)
            .map_err(|e| Error::Session(format!("session token is unreadable: {e}")))
    }

    async fn connected(&self) -> Result<Client> {
        self.client
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::Session("telegram client is not connected".to_string()))
    }

    async fn find_dialog(client: &Client, bare_id: i64) -> Result<Option<Chat>> {
        let mut dialogs = client.iter_dialogs();
        while let Some(dialog) = dialogs
            .next()
            .await
            .map_err(|e| Error::External(format!("dialog scan failed: {e}")))?
        {
            if dialog.chat().id() == bare_id {
                return Ok(Some(dialog.chat().clone()));
            }
        }
        Ok(None)
    }

    async fn resolve_channel(client: &Client, channel: &Channel) -> Result<Chat> {
        let fetch_err = |reason: String| Error::Fetch {
            channel: channel.to_string(),
            reason,
        };

        // Numeric references only resolve through dialogs the account already has.
        let found = match channel.handle().parse::<i64>() {
            Ok(id) => Self::find_dialog(client, bare_chat_id(id))
                .await
                .map_err(|e| fetch_err(e.to_string()))?,
            Err(_) => client
                .resolve_username(channel.handle())
                .await
                .map_err(|e| fetch_err(format!("resolve failed: {e}")))?,
        };
        found.ok_or_else(|| fetch_err("channel not found".to_string()))
    }

    async fn resolve_destination(client: &Client, destination: &Destination) -> Result<Chat> {
        let found = match destination {
            Destination::Handle(handle) => client
                .resolve_username(handle)
                .await
                .map_err(|e| Error::Send(format!("resolve {destination} failed: {e}")))?,
            Destination::Id(id) => Self::find_dialog(client, bare_chat_id(*id))
                .await
                .map_err(|e| Error::Send(e.to_string()))?,
        };
        found.ok_or_else(|| Error::Send(format!("destination {destination} not found")))
    }
}

fn raw_post(msg: &grammers_client::types::Message) -> RawPost {
    let text = msg.text();
    RawPost {
        id: msg.id(),
        timestamp: Some(msg.date().timestamp()),
        body: (!text.is_empty()).then(|| text.to_string()),
        views: msg.view_count().and_then(|v| u64::try_from(v).ok()),
        // Only the total is exposed here, so it is reported as one bucket.
        reactions: msg
            .reaction_count()
            .and_then(|v| u64::try_from(v).ok())
            .map(|n| vec![n]),
    }
}

/// `true` when the post is older than `offset_date` (always, without one).
fn is_before_offset(post: &RawPost, offset_date: Option<i64>) -> bool {
    match (offset_date, post.timestamp) {
        (None, _) => true,
        (Some(offset), Some(ts)) => ts < offset,
        (Some(_), None) => false,
    }
}

#[async_trait]
impl PlatformSession for MtprotoClient {
    async fn connect(&self) -> Result<()> {
        let session = Self::load_session(&self.cfg.session)?;
        let client = Client::connect(Config {
            session,
            api_id: self.cfg.api_id,
            api_hash: self.cfg.api_hash.clone(),
            params: InitParams::default(),
        })
        .await
        .map_err(|e| Error::Session(format!("telegram connect failed: {e}")))?;

        let authorized = client
            .is_authorized()
            .await
            .map_err(|e| Error::Session(format!("authorization check failed: {e}")))?;
        if !authorized {
            return Err(Error::Session(
                "session is not authorized; generate a new TELEGRAM_STRING_SESSION".to_string(),
            ));
        }

        *self.client.lock().await = Some(client);
        tracing::info!("Connected to Telegram");
        Ok(())
    }

    async fn disconnect(&self) {
        // Dropping the last handle closes the connection.
        if self.client.lock().await.take().is_some() {
            tracing::debug!("telegram client released");
        }
    }
}

#[async_trait]
impl ChannelSource for MtprotoClient {
    async fn fetch_history(
        &self,
        channel: &Channel,
        limit: usize,
        offset_date: Option<i64>,
    ) -> Result<Vec<RawPost>> {
        let client = self.connected().await?;
        let chat = Self::resolve_channel(&client, channel).await?;

        // The iterator cannot start at a date, so newer posts are skipped here
        // and the server-side cap only applies without an offset.
        let mut messages = client.iter_messages(chat.pack());
        if offset_date.is_none() {
            messages = messages.limit(limit);
        }

        let mut posts = Vec::with_capacity(limit);
        while posts.len() < limit {
            let next = messages.next().await.map_err(|e| Error::Fetch {
                channel: channel.to_string(),
                reason: format!("history request failed: {e}"),
            })?;
            let Some(msg) = next else {
                break;
            };
            let post = raw_post(&msg);
            if is_before_offset(&post, offset_date) {
                posts.push(post);
            }
        }
        tracing::debug!(%channel, count = posts.len(), "history fetched");
        Ok(posts)
    }
}

#[async_trait]
impl DigestSink for MtprotoClient {
    async fn send_markdown(&self, destination: &Destination, text: &str) -> Result<()> {
        let client = self.connected().await?;
        let chat = Self::resolve_destination(&client, destination).await?;
        let msg = client
            .send_message(chat.pack(), InputMessage::markdown(text))
            .await
            .map_err(|e| Error::Send(format!("send to {destination} failed: {e}")))?;
        tracing::info!(%destination, message_id = msg.id(), "Message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_base64_session() {
        let loaded = MtprotoClient::load_session("not base64 !!");
        assert!(matches!(loaded, Err(Error::Session(ref m)) if m.contains("base64")));
    }

    #[test]
    fn rejects_base64_that_is_not_a_session() {
        let token = STANDARD.encode(b"definitely not a session");
        let loaded = MtprotoClient::load_session(&token);
        assert!(matches!(loaded, Err(Error::Session(ref m)) if m.contains("unreadable")));
    }

    #[test]
    fn offset_keeps_only_strictly_older_posts() {
        let at = |ts| RawPost {
            timestamp: Some(ts),
            ..RawPost::default()
        };
        assert!(is_before_offset(&at(100), None));
        assert!(is_before_offset(&at(99), Some(100)));
        assert!(!is_before_offset(&at(100), Some(100)));
        assert!(!is_before_offset(&RawPost::default(), Some(100)));
        assert!(is_before_offset(&RawPost::default(), None));
    }

    #[test]
    fn accepts_exported_empty_session() {
        let token = STANDARD.encode(Session::new().save());
        assert!(MtprotoClient::load_session(&format!("  {token}\n")).is_ok());
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = MtprotoConfig {
            api_id: 42,
            api_hash: "deadbeef".into(),
            session: "c2VjcmV0".into(),
        };
        let s = format!("{cfg:?}");
        assert!(s.contains("42"));
        assert!(!s.contains("deadbeef"));
        assert!(!s.contains("c2VjcmV0"));
    }

    #[tokio::test]
    async fn fetch_without_connect_is_session_error() {
        let client = MtprotoClient::new(MtprotoConfig {
            api_id: 1,
            api_hash: "h".into(),
            session: String::new(),
        });
        let channel = Channel::new("@alpha").unwrap();
        let err = client.fetch_history(&channel, 10, None).await.unwrap_err();
        assert!(matches!(err, Error::Session(_)));
        // Disconnect without connect is a no-op.
        client.disconnect().await;
    }
}
