//! Discord REST channel — member lookup, message sending, and thread
//! creation via the HTTP API (v10).

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use fetebot_core::config::DiscordConfig;
use fetebot_core::error::{FetebotError, Result};
use fetebot_core::traits::{AnnouncementMessage, ChatPlatform};
use fetebot_core::types::{ChannelId, GuildId, MemberId, MemberProfile, MessageId, ThreadHandle};

/// Embed accent for celebration messages (Discord green).
const EMBED_COLOR: u32 = 0x57F287;
/// Discussion threads auto-archive after a day of inactivity.
const THREAD_AUTO_ARCHIVE_MINUTES: u32 = 1440;

/// Discord REST client implementing the chat-platform capability.
pub struct DiscordChannel {
    config: DiscordConfig,
    client: reqwest::Client,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base, path)
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.config.bot_token)
    }

    /// GET a platform object. Failures here are identity-resolution
    /// problems, not delivery problems.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
        let response = self
            .client
            .get(self.api_url(path))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(|e| FetebotError::Platform(format!("{what} failed: {e}")))?;
        if !response.status().is_success() {
            return Err(FetebotError::Platform(format!(
                "{what} failed: HTTP {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| FetebotError::Platform(format!("Invalid {what} response: {e}")))
    }

    /// POST to a channel-scoped endpoint. 403/404 mean the destination
    /// itself is gone or unreachable; everything else is a delivery
    /// failure.
    async fn channel_post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
        channel: &ChannelId,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(path))
            .header("Authorization", self.auth())
            .json(body)
            .send()
            .await
            .map_err(|e| FetebotError::DeliveryFailed(format!("Discord request failed: {e}")))?;

        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| FetebotError::DeliveryFailed(format!("Invalid Discord response: {e}"))),
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                Err(FetebotError::DestinationUnavailable(format!(
                    "channel {channel} no longer exists or is inaccessible"
                )))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(FetebotError::DeliveryFailed(format!(
                    "Discord API error {status}: {body}"
                )))
            }
        }
    }
}

#[async_trait]
impl ChatPlatform for DiscordChannel {
    async fn current_user(&self) -> Result<MemberProfile> {
        let user: DiscordUser = self.get_json("/users/@me", "getCurrentUser").await?;
        tracing::info!("🤖 Discord bot connected as {}", user.display_name());
        Ok(user.into_profile())
    }

    async fn fetch_member(&self, guild: &GuildId, member: &MemberId) -> Result<MemberProfile> {
        let found: DiscordGuildMember = self
            .get_json(&format!("/guilds/{guild}/members/{member}"), "getGuildMember")
            .await?;
        Ok(found.into_profile())
    }

    async fn send_announcement(
        &self,
        channel: &ChannelId,
        message: &AnnouncementMessage,
    ) -> Result<MessageId> {
        let sent: DiscordMessage = self
            .channel_post(
                &format!("/channels/{channel}/messages"),
                &embed_payload(message),
                channel,
            )
            .await?;
        Ok(MessageId(sent.id))
    }

    async fn create_thread(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        name: &str,
    ) -> Result<ThreadHandle> {
        let thread: DiscordThread = self
            .channel_post(
                &format!("/channels/{channel}/messages/{}/threads", message.0),
                &serde_json::json!({
                    "name": name,
                    "auto_archive_duration": THREAD_AUTO_ARCHIVE_MINUTES,
                }),
                channel,
            )
            .await?;
        Ok(ThreadHandle(thread.id))
    }

    async fn post_in_thread(&self, thread: &ThreadHandle, content: &str) -> Result<()> {
        // A thread is itself a channel on the wire.
        let thread_channel = ChannelId::new(thread.0.clone());
        let _: DiscordMessage = self
            .channel_post(
                &format!("/channels/{}/messages", thread.0),
                &serde_json::json!({ "content": content }),
                &thread_channel,
            )
            .await?;
        Ok(())
    }
}

/// One-embed message body: celebration text plus the GIF.
fn embed_payload(message: &AnnouncementMessage) -> serde_json::Value {
    serde_json::json!({
        "embeds": [{
            "description": message.text,
            "color": EMBED_COLOR,
            "image": { "url": message.image_url },
        }]
    })
}

// --- Discord API Types ---

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

impl DiscordUser {
    fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    fn into_profile(self) -> MemberProfile {
        MemberProfile {
            display_name: self.display_name().to_string(),
            id: MemberId::new(self.id),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordGuildMember {
    pub user: DiscordUser,
    #[serde(default)]
    pub nick: Option<String>,
}

impl DiscordGuildMember {
    /// Guild nickname wins over the account-level name.
    fn into_profile(self) -> MemberProfile {
        match self.nick {
            Some(nick) => MemberProfile {
                id: MemberId::new(self.user.id),
                display_name: nick,
            },
            None => self.user.into_profile(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordMessage {
    pub id: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordThread {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str, global_name: Option<&str>) -> DiscordUser {
        DiscordUser {
            id: "1".into(),
            username: username.into(),
            global_name: global_name.map(String::from),
        }
    }

    #[test]
    fn display_name_prefers_nick_then_global_name() {
        let member = DiscordGuildMember {
            user: user("alice", Some("Alice G")),
            nick: Some("Queen Alice".into()),
        };
        assert_eq!(member.into_profile().display_name, "Queen Alice");

        let member = DiscordGuildMember {
            user: user("alice", Some("Alice G")),
            nick: None,
        };
        assert_eq!(member.into_profile().display_name, "Alice G");

        let member = DiscordGuildMember {
            user: user("alice", None),
            nick: None,
        };
        assert_eq!(member.into_profile().display_name, "alice");
    }

    #[test]
    fn embed_payload_carries_text_and_image() {
        let payload = embed_payload(&AnnouncementMessage {
            text: "Joyeux anniversaire <@1> !".into(),
            image_url: "https://example.com/party.gif".into(),
        });
        assert_eq!(payload["embeds"][0]["description"], "Joyeux anniversaire <@1> !");
        assert_eq!(payload["embeds"][0]["image"]["url"], "https://example.com/party.gif");
    }
}
