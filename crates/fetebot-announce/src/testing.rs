//! Mock implementations of the chat-platform capability, for testing
//! without real network calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use fetebot_core::error::{FetebotError, Result};
use fetebot_core::traits::{AnnouncementMessage, ChatPlatform};
use fetebot_core::types::{ChannelId, GuildId, MemberId, MemberProfile, MessageId, ThreadHandle};

/// Records every capability call; individual channels can be marked dead
/// to exercise the failure paths.
pub struct RecordingPlatform {
    pub sent: Mutex<Vec<(ChannelId, AnnouncementMessage)>>,
    pub threads: Mutex<Vec<(ChannelId, MessageId, String)>>,
    pub thread_posts: Mutex<Vec<(ThreadHandle, String)>>,
    members: HashMap<String, String>,
    dead_channels: HashSet<String>,
    counter: AtomicU64,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            threads: Mutex::new(Vec::new()),
            thread_posts: Mutex::new(Vec::new()),
            members: HashMap::new(),
            dead_channels: HashSet::new(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn with_member(mut self, id: &str, display_name: &str) -> Self {
        self.members.insert(id.into(), display_name.into());
        self
    }

    pub fn with_dead_channel(mut self, id: &str) -> Self {
        self.dead_channels.insert(id.into());
        self
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.counter.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn current_user(&self) -> Result<MemberProfile> {
        Ok(MemberProfile {
            id: MemberId::new("bot"),
            display_name: "Fetebot".into(),
        })
    }

    async fn fetch_member(&self, _guild: &GuildId, member: &MemberId) -> Result<MemberProfile> {
        self.members
            .get(member.as_str())
            .map(|name| MemberProfile {
                id: member.clone(),
                display_name: name.clone(),
            })
            .ok_or_else(|| FetebotError::Platform(format!("unknown member {member}")))
    }

    async fn send_announcement(
        &self,
        channel: &ChannelId,
        message: &AnnouncementMessage,
    ) -> Result<MessageId> {
        if self.dead_channels.contains(channel.as_str()) {
            return Err(FetebotError::DestinationUnavailable(format!(
                "channel {channel} is gone"
            )));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel.clone(), message.clone()));
        Ok(MessageId(self.next_id("msg")))
    }

    async fn create_thread(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        name: &str,
    ) -> Result<ThreadHandle> {
        self.threads
            .lock()
            .unwrap()
            .push((channel.clone(), message.clone(), name.to_string()));
        Ok(ThreadHandle(self.next_id("thread")))
    }

    async fn post_in_thread(&self, thread: &ThreadHandle, content: &str) -> Result<()> {
        self.thread_posts
            .lock()
            .unwrap()
            .push((thread.clone(), content.to_string()));
        Ok(())
    }
}
