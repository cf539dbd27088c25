//! Announcement dispatch — composes one celebration and delivers it:
//! embed to the destination channel, then a discussion thread on that
//! message, then the broadcast invitation inside the thread.

use std::sync::Arc;

use fetebot_core::error::Result;
use fetebot_core::traits::{AnnouncementMessage, ChatPlatform};
use fetebot_core::types::{AnnounceTarget, ChannelId, ThreadHandle};

use crate::resources::{ResourcePools, USER_PLACEHOLDER};

/// Label substituted when a placeholder celebration has nobody behind it.
const PLACEHOLDER_LABEL: &str = "quelqu'un de spécial";
const PLACEHOLDER_THREAD_NAME: &str = "Souhaits d'anniversaire";
const THREAD_INVITATION: &str =
    "@everyone Bienvenue dans ce fil de discussion pour souhaiter un joyeux anniversaire !";

pub struct AnnouncementDispatcher {
    platform: Arc<dyn ChatPlatform>,
    pools: ResourcePools,
}

impl AnnouncementDispatcher {
    pub fn new(platform: Arc<dyn ChatPlatform>, pools: ResourcePools) -> Self {
        Self { platform, pools }
    }

    /// Send one celebration to `destination` and open its discussion
    /// thread. Failures are reported to the caller and never retried;
    /// manual re-invocation is the recovery path.
    pub async fn announce(
        &self,
        destination: &ChannelId,
        target: &AnnounceTarget,
    ) -> Result<ThreadHandle> {
        let (mention, thread_name) = self.resolve_target(target).await;
        let message = AnnouncementMessage {
            text: self.pools.pick_message().replace(USER_PLACEHOLDER, &mention),
            image_url: self.pools.pick_gif().to_string(),
        };

        let message_id = self.platform.send_announcement(destination, &message).await?;
        let thread = self
            .platform
            .create_thread(destination, &message_id, &thread_name)
            .await?;
        self.platform.post_in_thread(&thread, THREAD_INVITATION).await?;
        tracing::info!("🎉 Announcement delivered to {destination}, thread {}", thread.0);
        Ok(thread)
    }

    /// Mention text for the message body and a readable thread title.
    async fn resolve_target(&self, target: &AnnounceTarget) -> (String, String) {
        match target {
            AnnounceTarget::Member { guild, member } => {
                let mention = format!("<@{member}>");
                // The announcement must still go out when the lookup
                // fails; the thread title falls back to the mention.
                let name = match self.platform.fetch_member(guild, member).await {
                    Ok(profile) => profile.display_name,
                    Err(e) => {
                        tracing::warn!("⚠️ Member lookup failed for {member}: {e}");
                        mention.clone()
                    }
                };
                (mention, format!("Souhaits pour {name}"))
            }
            AnnounceTarget::Placeholder => (
                PLACEHOLDER_LABEL.to_string(),
                PLACEHOLDER_THREAD_NAME.to_string(),
            ),
        }
    }
}
