//! # Fetebot Store
//! Guild-scoped persistent state: birthday records and the per-guild
//! announcement destination. Both stores share one JSON file persistence
//! primitive and have independent lifecycles — purging one never touches
//! the other.

pub mod birthdays;
pub mod channels;
pub mod persistence;

pub use birthdays::BirthdayStore;
pub use channels::AnnouncementChannelStore;
pub use persistence::JsonStore;
