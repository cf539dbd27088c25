//! Confirm/cancel workflow guarding manual announcements.
//!
//! State machine: `Pending -> Confirmed | Cancelled | Expired`. Only the
//! invoker may transition the session; confirm is single-shot; a pending
//! session expires after a fixed timeout and can never announce after
//! that. The surrounding UI (button press, message reply, CLI prompt)
//! reduces to the same two transition calls.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use fetebot_core::error::{FetebotError, Result};
use fetebot_core::types::{AnnounceTarget, GuildId, MemberId, ThreadHandle};
use fetebot_store::AnnouncementChannelStore;

use crate::dispatcher::AnnouncementDispatcher;

/// How long a pending session stays actionable.
pub const CONFIRMATION_TIMEOUT_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Pending,
    Confirmed,
    Cancelled,
    Expired,
}

/// One manual-announcement session. In memory only; destroyed on
/// decision or timeout.
pub struct ConfirmationWorkflow {
    id: String,
    guild: GuildId,
    invoker: MemberId,
    target: AnnounceTarget,
    created_at: DateTime<Utc>,
    timeout: Duration,
    decision: Decision,
    channels: Arc<AnnouncementChannelStore>,
    dispatcher: Arc<AnnouncementDispatcher>,
}

impl std::fmt::Debug for ConfirmationWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationWorkflow")
            .field("id", &self.id)
            .field("decision", &self.decision)
            .finish_non_exhaustive()
    }
}

impl ConfirmationWorkflow {
    pub fn new(
        guild: GuildId,
        invoker: MemberId,
        target: AnnounceTarget,
        channels: Arc<AnnouncementChannelStore>,
        dispatcher: Arc<AnnouncementDispatcher>,
    ) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        tracing::debug!("🔔 Confirmation session {id} opened by {invoker} in {guild}");
        Self {
            id,
            guild,
            invoker,
            target,
            created_at: Utc::now(),
            timeout: Duration::seconds(CONFIRMATION_TIMEOUT_SECS),
            decision: Decision::Pending,
            channels,
            dispatcher,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn target(&self) -> &AnnounceTarget {
        &self.target
    }

    /// Confirm and dispatch. The `Confirmed` transition commits before
    /// the dispatch call, so a repeated confirm can never send twice. A
    /// guild without a destination reports `NotConfigured` and leaves the
    /// session `Confirmed` with no side effect.
    pub async fn confirm(&mut self, actor: &MemberId) -> Result<ThreadHandle> {
        self.take_pending(actor, "confirm")?;
        self.decision = Decision::Confirmed;

        let Some(destination) = self.channels.destination(&self.guild).await else {
            return Err(FetebotError::NotConfigured(format!(
                "no announcement destination for guild {}",
                self.guild
            )));
        };
        self.dispatcher.announce(&destination, &self.target).await
    }

    /// Cancel the session. Terminal; nothing is sent.
    pub async fn cancel(&mut self, actor: &MemberId) -> Result<()> {
        self.take_pending(actor, "cancel")?;
        self.decision = Decision::Cancelled;
        tracing::debug!("🚫 Confirmation session {} cancelled", self.id);
        Ok(())
    }

    /// Expire a still-pending session once its timeout elapses. Returns
    /// whether a transition happened.
    pub fn expire_if_stale(&mut self, now: DateTime<Utc>) -> bool {
        if self.decision == Decision::Pending && self.stale_at(now) {
            self.decision = Decision::Expired;
            tracing::debug!("⌛ Confirmation session {} expired", self.id);
            return true;
        }
        false
    }

    /// Transitions only succeed from `Pending`, and only for the invoker.
    fn take_pending(&mut self, actor: &MemberId, action: &str) -> Result<()> {
        if *actor != self.invoker {
            return Err(FetebotError::Unauthorized(format!(
                "only the invoker may {action} session {}",
                self.id
            )));
        }
        self.expire_if_stale(Utc::now());
        if self.decision != Decision::Pending {
            return Err(FetebotError::AlreadyResolved(format!(
                "session {} is {:?}",
                self.id, self.decision
            )));
        }
        Ok(())
    }

    fn stale_at(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= self.timeout
    }
}
