//! # Fetebot Commands
//! Transport-agnostic handlers for the `/birthday` command group. Slash
//! command registration, permission gating, and the confirm/cancel UI
//! primitive stay on the platform side; every handler here takes the
//! already-resolved context and returns the user-facing reply.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use fetebot_announce::{AnnouncementDispatcher, ConfirmationWorkflow};
use fetebot_core::error::{FetebotError, Result};
use fetebot_core::traits::ChatPlatform;
use fetebot_core::types::{AnniversaryDate, AnnounceTarget, ChannelId, GuildId, MemberId};
use fetebot_store::{AnnouncementChannelStore, BirthdayStore};

/// Prompt shown before a manual announcement goes out.
pub const CONFIRMATION_PROMPT: &str =
    "⚠️ Veuillez confirmer l'envoi de l'annonce d'anniversaire.";
/// Acknowledgement after a cancel.
pub const CANCEL_ACK: &str = "Annulation de l'envoi de l'annonce.";
/// Acknowledgement after a confirmed announcement was delivered.
pub const SEND_SUCCESS: &str = "✅ Message envoyé avec succès.";

/// Everything the handlers need, wired once at startup.
pub struct CommandContext {
    pub platform: Arc<dyn ChatPlatform>,
    pub birthdays: Arc<BirthdayStore>,
    pub channels: Arc<AnnouncementChannelStore>,
    pub dispatcher: Arc<AnnouncementDispatcher>,
}

impl CommandContext {
    /// `/birthday set DD/MM`
    pub async fn set_birthday(
        &self,
        guild: &GuildId,
        member: &MemberId,
        text: &str,
    ) -> Result<String> {
        let date = AnniversaryDate::parse(text)?;
        self.birthdays.set(guild, member, date).await?;
        Ok(format!(
            "🎂 <@{member}>, ton anniversaire a été enregistré pour le {date} !"
        ))
    }

    /// `/birthday show`
    pub async fn show_birthday(&self, guild: &GuildId, member: &MemberId) -> Result<String> {
        Ok(match self.birthdays.get(guild, member).await {
            Some(date) => format!("🎂 Ton anniversaire est enregistré pour le {date}."),
            None => "❌ Aucun anniversaire enregistré pour toi.".into(),
        })
    }

    /// `/birthday all` — every record, soonest first.
    pub async fn list_upcoming(&self, guild: &GuildId) -> Result<String> {
        self.list_upcoming_from(guild, Utc::now().date_naive()).await
    }

    pub async fn list_upcoming_from(&self, guild: &GuildId, today: NaiveDate) -> Result<String> {
        let records = self.birthdays.list_guild(guild).await;
        if records.is_empty() {
            return Ok("Aucun anniversaire n'est enregistré sur ce serveur.".into());
        }

        let mut upcoming: Vec<(i64, AnniversaryDate, MemberId)> = records
            .into_iter()
            .map(|(member, date)| (date.days_until_next(today), date, member))
            .collect();
        upcoming.sort_by_key(|(delta, ..)| *delta);

        let mut lines = vec!["🎉 Anniversaires à venir :".to_string()];
        for (delta, date, member) in upcoming {
            let name = match self.platform.fetch_member(guild, &member).await {
                Ok(profile) => profile.display_name,
                Err(_) => format!("Utilisateur inconnu ({member})"),
            };
            let day_word = if delta == 1 { "jour" } else { "jours" };
            lines.push(format!(
                "**{name}** : le **{date}** (dans **{delta}** {day_word})"
            ));
        }
        Ok(lines.join("\n"))
    }

    /// `/birthday set_channel` (admin)
    pub async fn set_channel(&self, guild: &GuildId, channel: &ChannelId) -> Result<String> {
        self.channels.set_destination(guild, channel).await?;
        Ok(format!(
            "🎉 Ce salon (<#{channel}>) est configuré pour les annonces d'anniversaire."
        ))
    }

    /// `/birthday remove_channel` (admin)
    pub async fn remove_channel(&self, guild: &GuildId) -> Result<String> {
        self.channels.clear_destination(guild).await?;
        Ok("✅ La configuration du salon d'annonces a été supprimée.".into())
    }

    /// `/birthday announce [membre]` (admin) — must be invoked from the
    /// configured destination channel. Returns the pending confirmation
    /// session; the UI drives its confirm/cancel transitions. An absent
    /// member means a placeholder celebration.
    pub async fn begin_announce(
        &self,
        guild: &GuildId,
        invoker: &MemberId,
        invoked_in: &ChannelId,
        member: Option<MemberId>,
    ) -> Result<ConfirmationWorkflow> {
        let destination = self.channels.destination(guild).await.ok_or_else(|| {
            FetebotError::NotConfigured(format!("no announcement destination for guild {guild}"))
        })?;
        if destination != *invoked_in {
            return Err(FetebotError::NotConfigured(format!(
                "announce must be invoked from the configured channel <#{destination}>"
            )));
        }

        tracing::debug!("🔔 Manual announce requested by {invoker} in {guild}");
        let target = match member {
            Some(member) => AnnounceTarget::Member {
                guild: guild.clone(),
                member,
            },
            None => AnnounceTarget::Placeholder,
        };
        Ok(ConfirmationWorkflow::new(
            guild.clone(),
            invoker.clone(),
            target,
            self.channels.clone(),
            self.dispatcher.clone(),
        ))
    }

    /// Platform hook for the bot leaving a guild. Birthday records go;
    /// the channel config has its own lifecycle and stays.
    pub async fn guild_removed(&self, guild: &GuildId) -> Result<()> {
        self.birthdays.purge_guild(guild).await
    }
}

/// `/birthday help`
pub fn help_text(is_admin: bool) -> String {
    let mut lines = vec![
        "🎉 Aide - Fetebot".to_string(),
        "/birthday set <date> — Enregistre ton anniversaire (format : DD/MM) 🎂".to_string(),
        "/birthday show — Affiche ton anniversaire enregistré.".to_string(),
        "/birthday all — Affiche tous les anniversaires enregistrés sur le serveur.".to_string(),
    ];
    if is_admin {
        lines.push(
            "/birthday set_channel — Configure ce salon pour les annonces d'anniversaire. (Admin uniquement)"
                .to_string(),
        );
        lines.push(
            "/birthday remove_channel — Supprime la configuration du salon d'annonces. (Admin uniquement)"
                .to_string(),
        );
        lines.push(
            "/birthday announce [membre] — Envoie une annonce après confirmation. (Admin uniquement)"
                .to_string(),
        );
    }
    lines.push("/birthday help — Affiche ce message d'aide.".to_string());
    lines.join("\n")
}

/// Map the error taxonomy to the user-facing reply.
pub fn render_error(err: &FetebotError) -> String {
    match err {
        FetebotError::InvalidFormat(_) => {
            "❌ Format invalide ! Utilise le format DD/MM (ex : 20/05).".into()
        }
        FetebotError::NotConfigured(_) => {
            "❌ Aucun salon d'annonces configuré. Utilise /birthday set_channel.".into()
        }
        FetebotError::NothingToRemove(_) => {
            "Aucune configuration de salon d'annonces trouvée pour ce serveur.".into()
        }
        FetebotError::Unauthorized(_) => "Tu n'as pas la permission de faire ça.".into(),
        FetebotError::AlreadyResolved(_) => "Cette confirmation a déjà été traitée.".into(),
        FetebotError::DestinationUnavailable(_) => "❌ Salon d'annonces introuvable.".into(),
        other => format!("❌ Erreur lors de l'envoi : {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetebot_announce::testing::RecordingPlatform;
    use fetebot_announce::{Decision, ResourcePools};
    use fetebot_store::JsonStore;

    struct Fixture {
        platform: Arc<RecordingPlatform>,
        ctx: CommandContext,
        _dir: tempfile::TempDir,
    }

    fn fixture(platform: RecordingPlatform) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let platform = Arc::new(platform);
        let birthdays = Arc::new(BirthdayStore::open(JsonStore::new(dir.path())));
        let channels = Arc::new(AnnouncementChannelStore::open(JsonStore::new(dir.path())));
        let dispatcher = Arc::new(AnnouncementDispatcher::new(
            platform.clone(),
            ResourcePools::builtin(),
        ));
        let ctx = CommandContext {
            platform: platform.clone(),
            birthdays,
            channels,
            dispatcher,
        };
        Fixture {
            platform,
            ctx,
            _dir: dir,
        }
    }

    fn ids() -> (GuildId, MemberId, ChannelId) {
        (
            GuildId::new("g1"),
            MemberId::new("m1"),
            ChannelId::new("c1"),
        )
    }

    #[tokio::test]
    async fn set_then_show_round_trips() {
        let fx = fixture(RecordingPlatform::new());
        let (guild, member, _) = ids();

        let reply = fx.ctx.set_birthday(&guild, &member, "20/05").await.unwrap();
        assert!(reply.contains("20/05"));

        let reply = fx.ctx.show_birthday(&guild, &member).await.unwrap();
        assert!(reply.contains("20/05"));
    }

    #[tokio::test]
    async fn invalid_date_is_reported_not_stored() {
        let fx = fixture(RecordingPlatform::new());
        let (guild, member, _) = ids();

        let err = fx.ctx.set_birthday(&guild, &member, "30/02").await.unwrap_err();
        assert!(matches!(err, FetebotError::InvalidFormat(_)));
        assert!(render_error(&err).contains("DD/MM"));
        assert!(fx.ctx.birthdays.get(&guild, &member).await.is_none());
    }

    #[tokio::test]
    async fn show_without_record_says_so() {
        let fx = fixture(RecordingPlatform::new());
        let (guild, member, _) = ids();
        let reply = fx.ctx.show_birthday(&guild, &member).await.unwrap();
        assert!(reply.contains("Aucun anniversaire"));
    }

    #[tokio::test]
    async fn list_orders_by_days_until_next() {
        let fx = fixture(RecordingPlatform::new().with_member("soon", "Bob"));
        let guild = GuildId::new("g1");
        // Seen from 2025-05-20: passed wraps to next year, today sorts first.
        fx.ctx.birthdays.set(&guild, &MemberId::new("passed"), AnniversaryDate::parse("19/05").unwrap()).await.unwrap();
        fx.ctx.birthdays.set(&guild, &MemberId::new("soon"), AnniversaryDate::parse("21/05").unwrap()).await.unwrap();
        fx.ctx.birthdays.set(&guild, &MemberId::new("today"), AnniversaryDate::parse("20/05").unwrap()).await.unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let reply = fx.ctx.list_upcoming_from(&guild, today).await.unwrap();
        let lines: Vec<&str> = reply.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("Utilisateur inconnu (today)"));
        assert!(lines[2].contains("Bob"));
        assert!(lines[2].contains("dans **1** jour"));
        assert!(!lines[2].contains("jours"));
        assert!(lines[3].contains("Utilisateur inconnu (passed)"));
    }

    #[tokio::test]
    async fn list_empty_guild() {
        let fx = fixture(RecordingPlatform::new());
        let reply = fx.ctx.list_upcoming(&GuildId::new("g1")).await.unwrap();
        assert!(reply.contains("Aucun anniversaire"));
    }

    #[tokio::test]
    async fn channel_config_lifecycle() {
        let fx = fixture(RecordingPlatform::new());
        let (guild, _, channel) = ids();

        fx.ctx.set_channel(&guild, &channel).await.unwrap();
        assert_eq!(fx.ctx.channels.destination(&guild).await, Some(channel));

        fx.ctx.remove_channel(&guild).await.unwrap();
        let err = fx.ctx.remove_channel(&guild).await.unwrap_err();
        assert!(matches!(err, FetebotError::NothingToRemove(_)));
        assert!(render_error(&err).contains("Aucune configuration"));
    }

    #[tokio::test]
    async fn announce_requires_the_configured_channel() {
        let fx = fixture(RecordingPlatform::new());
        let (guild, member, channel) = ids();

        // Nothing configured yet.
        let err = fx
            .ctx
            .begin_announce(&guild, &member, &channel, None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetebotError::NotConfigured(_)));

        // Configured, but invoked elsewhere.
        fx.ctx.set_channel(&guild, &channel).await.unwrap();
        let err = fx
            .ctx
            .begin_announce(&guild, &member, &ChannelId::new("other"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetebotError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn announce_confirm_dispatches_to_destination() {
        let fx = fixture(RecordingPlatform::new().with_member("fetard", "Fêtard"));
        let (guild, admin, channel) = ids();
        fx.ctx.set_channel(&guild, &channel).await.unwrap();

        let mut session = fx
            .ctx
            .begin_announce(&guild, &admin, &channel, Some(MemberId::new("fetard")))
            .await
            .unwrap();
        assert_eq!(session.decision(), Decision::Pending);

        session.confirm(&admin).await.unwrap();
        let sent = fx.platform.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, channel);
        assert!(sent[0].1.text.contains("<@fetard>"));
    }

    #[tokio::test]
    async fn announce_without_member_celebrates_placeholder() {
        let fx = fixture(RecordingPlatform::new());
        let (guild, admin, channel) = ids();
        fx.ctx.set_channel(&guild, &channel).await.unwrap();

        let session = fx
            .ctx
            .begin_announce(&guild, &admin, &channel, None)
            .await
            .unwrap();
        assert_eq!(*session.target(), AnnounceTarget::Placeholder);
    }

    #[tokio::test]
    async fn guild_removed_purges_birthdays_only() {
        let fx = fixture(RecordingPlatform::new());
        let (guild, member, channel) = ids();
        fx.ctx.set_birthday(&guild, &member, "20/05").await.unwrap();
        fx.ctx.set_channel(&guild, &channel).await.unwrap();

        fx.ctx.guild_removed(&guild).await.unwrap();
        assert!(fx.ctx.birthdays.list_guild(&guild).await.is_empty());
        assert_eq!(fx.ctx.channels.destination(&guild).await, Some(channel));
    }

    #[test]
    fn help_hides_admin_commands_from_members() {
        let member_help = help_text(false);
        let admin_help = help_text(true);
        assert!(!member_help.contains("set_channel"));
        assert!(admin_help.contains("set_channel"));
        assert!(admin_help.contains("announce"));
    }
}
