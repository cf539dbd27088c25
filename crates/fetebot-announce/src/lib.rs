//! # Fetebot Announce
//! Composes and delivers birthday celebrations: one message, one GIF, one
//! discussion thread. Manual announcements go through the confirm/cancel
//! workflow; the daily scheduler calls the dispatcher directly.

pub mod confirm;
pub mod dispatcher;
pub mod resources;
pub mod testing;

pub use confirm::{ConfirmationWorkflow, Decision};
pub use dispatcher::AnnouncementDispatcher;
pub use resources::ResourcePools;
pub use testing::RecordingPlatform;
