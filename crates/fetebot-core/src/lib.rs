//! # Fetebot Core
//! Shared types, configuration, and the chat-platform capability seam.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::FetebotConfig;
pub use error::{FetebotError, Result};
pub use traits::{AnnouncementMessage, ChatPlatform};
pub use types::{
    AnniversaryDate, AnnounceTarget, ChannelId, GuildId, MemberId, MemberProfile, MessageId,
    ThreadHandle,
};
