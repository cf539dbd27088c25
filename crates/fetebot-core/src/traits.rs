//! Capability seam to the hosting chat platform. Message delivery,
//! identity resolution, and thread creation are opaque to the core;
//! permission checks and command registration stay on the platform side.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChannelId, GuildId, MemberId, MemberProfile, MessageId, ThreadHandle};

/// One announcement: celebration text plus an illustration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementMessage {
    pub text: String,
    pub image_url: String,
}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// The bot's own identity.
    async fn current_user(&self) -> Result<MemberProfile>;

    /// Resolve a member's profile for display.
    async fn fetch_member(&self, guild: &GuildId, member: &MemberId) -> Result<MemberProfile>;

    /// Send an announcement to a channel; returns the created message id.
    async fn send_announcement(
        &self,
        channel: &ChannelId,
        message: &AnnouncementMessage,
    ) -> Result<MessageId>;

    /// Open a discussion thread attached to a sent message.
    async fn create_thread(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        name: &str,
    ) -> Result<ThreadHandle>;

    /// Post a plain message into a thread.
    async fn post_in_thread(&self, thread: &ThreadHandle, content: &str) -> Result<()>;
}
