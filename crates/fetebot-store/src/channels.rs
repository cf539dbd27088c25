//! Per-guild announcement destination — guild -> designated channel.
//!
//! Persisted layout: `config[guild_id]["birthday_channel"] = channel_id`.
//! Lives in its own document so birthday data and channel config can be
//! created and removed independently.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use fetebot_core::error::{FetebotError, Result};
use fetebot_core::types::{ChannelId, GuildId};

use crate::persistence::JsonStore;

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GuildEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    birthday_channel: Option<ChannelId>,
}

type ConfigDoc = IndexMap<String, GuildEntry>;

/// At most one announcement destination per guild.
pub struct AnnouncementChannelStore {
    store: JsonStore,
    entries: Mutex<ConfigDoc>,
}

impl AnnouncementChannelStore {
    pub fn open(store: JsonStore) -> Self {
        let entries: ConfigDoc = store.load(CONFIG_FILE);
        let configured = entries
            .values()
            .filter(|e| e.birthday_channel.is_some())
            .count();
        tracing::info!("📣 Loaded announcement destinations for {configured} guilds");
        Self {
            store,
            entries: Mutex::new(entries),
        }
    }

    /// Upsert the guild's destination.
    pub async fn set_destination(&self, guild: &GuildId, channel: &ChannelId) -> Result<()> {
        let snapshot = {
            let mut entries = self.entries.lock().await;
            entries.entry(guild.0.clone()).or_default().birthday_channel = Some(channel.clone());
            entries.clone()
        };
        self.store.save(CONFIG_FILE, &snapshot)
    }

    pub async fn destination(&self, guild: &GuildId) -> Option<ChannelId> {
        self.entries
            .lock()
            .await
            .get(&guild.0)
            .and_then(|e| e.birthday_channel.clone())
    }

    /// Every guild that currently has a destination, in insertion order.
    /// The daily scan iterates this, not the birthday store, so guilds
    /// without configuration are skipped up front.
    pub async fn configured_guilds(&self) -> Vec<(GuildId, ChannelId)> {
        self.entries
            .lock()
            .await
            .iter()
            .filter_map(|(guild, entry)| {
                entry
                    .birthday_channel
                    .clone()
                    .map(|channel| (GuildId::new(guild.clone()), channel))
            })
            .collect()
    }

    /// Remove only the destination key. Reports `NothingToRemove` — an
    /// informational condition, not a failure — when the guild never had
    /// one.
    pub async fn clear_destination(&self, guild: &GuildId) -> Result<()> {
        let snapshot = {
            let mut entries = self.entries.lock().await;
            let cleared = entries
                .get_mut(&guild.0)
                .and_then(|e| e.birthday_channel.take());
            if cleared.is_none() {
                return Err(FetebotError::NothingToRemove(format!(
                    "no announcement destination for guild {guild}"
                )));
            }
            entries.clone()
        };
        self.store.save(CONFIG_FILE, &snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_in(dir: &std::path::Path) -> AnnouncementChannelStore {
        AnnouncementChannelStore::open(JsonStore::new(dir))
    }

    #[tokio::test]
    async fn set_then_get_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(dir.path());
        let guild = GuildId::new("g1");
        let channel = ChannelId::new("c1");

        assert_eq!(store.destination(&guild).await, None);
        store.set_destination(&guild, &channel).await.unwrap();
        assert_eq!(store.destination(&guild).await, Some(channel));

        store.clear_destination(&guild).await.unwrap();
        assert_eq!(store.destination(&guild).await, None);
    }

    #[tokio::test]
    async fn clear_without_config_reports_nothing_to_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(dir.path());
        let err = store
            .clear_destination(&GuildId::new("g1"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetebotError::NothingToRemove(_)));
        assert!(err.is_informational());
    }

    #[tokio::test]
    async fn configured_guilds_skips_cleared_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(dir.path());
        store
            .set_destination(&GuildId::new("g1"), &ChannelId::new("c1"))
            .await
            .unwrap();
        store
            .set_destination(&GuildId::new("g2"), &ChannelId::new("c2"))
            .await
            .unwrap();
        store.clear_destination(&GuildId::new("g1")).await.unwrap();

        let configured = store.configured_guilds().await;
        assert_eq!(
            configured,
            vec![(GuildId::new("g2"), ChannelId::new("c2"))]
        );
    }

    #[tokio::test]
    async fn destinations_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let guild = GuildId::new("g1");
        {
            let store = open_in(dir.path());
            store
                .set_destination(&guild, &ChannelId::new("c9"))
                .await
                .unwrap();
        }
        let store = open_in(dir.path());
        assert_eq!(store.destination(&guild).await, Some(ChannelId::new("c9")));
    }
}
