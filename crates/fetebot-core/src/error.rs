//! Error taxonomy. Every failure stays local to one guild, member, or
//! session; batch paths catch at that granularity and keep going.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetebotError>;

#[derive(Debug, Error)]
pub enum FetebotError {
    /// User input does not match the DD/MM pattern or names an impossible date.
    #[error("invalid date format: {0}")]
    InvalidFormat(String),

    /// An actor other than the session invoker attempted a guarded transition.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Expected absence — the guild has no announcement destination.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Expected absence — a removal targeted a key that was never set.
    #[error("nothing to remove: {0}")]
    NothingToRemove(String),

    /// The announcement destination no longer exists or is unreachable.
    #[error("destination unavailable: {0}")]
    DestinationUnavailable(String),

    /// Any other send or thread-creation failure. Never retried here;
    /// manual re-invocation is the recovery path.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    /// A confirmation session was already confirmed, cancelled, or expired.
    #[error("already resolved: {0}")]
    AlreadyResolved(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetebotError {
    /// Expected-absence conditions are reported as information, not failures.
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::NotConfigured(_) | Self::NothingToRemove(_))
    }
}
