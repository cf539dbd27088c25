//! Birthday records — guild -> member -> anniversary date.
//!
//! Persisted layout: `birthdays[guild_id][member_id] = "DD/MM"`. Records
//! are insertion-ordered per guild and an overwrite keeps the original
//! position. Every mutation flushes the whole document; write volume is
//! low and per-guild documents are small.

use indexmap::IndexMap;
use tokio::sync::Mutex;

use fetebot_core::error::Result;
use fetebot_core::types::{AnniversaryDate, GuildId, MemberId};

use crate::persistence::JsonStore;

const BIRTHDAYS_FILE: &str = "birthdays.json";

type BirthdayDoc = IndexMap<String, IndexMap<String, AnniversaryDate>>;

/// Guild-partitioned birthday store.
pub struct BirthdayStore {
    store: JsonStore,
    records: Mutex<BirthdayDoc>,
}

impl BirthdayStore {
    /// Open the store, loading whatever document is on disk. Unparseable
    /// documents read as empty (the persistence layer warns).
    pub fn open(store: JsonStore) -> Self {
        let records: BirthdayDoc = store.load(BIRTHDAYS_FILE);
        let guilds = records.len();
        let entries: usize = records.values().map(IndexMap::len).sum();
        tracing::info!("🎂 Loaded {entries} birthdays across {guilds} guilds");
        Self {
            store,
            records: Mutex::new(records),
        }
    }

    /// Upsert one member's date — last write wins, no history kept. The
    /// flush completes before success returns, so a crash right after a
    /// successful reply never loses the write.
    pub async fn set(&self, guild: &GuildId, member: &MemberId, date: AnniversaryDate) -> Result<()> {
        let snapshot = {
            let mut records = self.records.lock().await;
            records
                .entry(guild.0.clone())
                .or_default()
                .insert(member.0.clone(), date);
            records.clone()
        };
        self.store.save(BIRTHDAYS_FILE, &snapshot)
    }

    pub async fn get(&self, guild: &GuildId, member: &MemberId) -> Option<AnniversaryDate> {
        self.records
            .lock()
            .await
            .get(&guild.0)
            .and_then(|g| g.get(&member.0))
            .copied()
    }

    /// All records for a guild, in insertion order. Empty for an unknown
    /// guild; a member never appears twice.
    pub async fn list_guild(&self, guild: &GuildId) -> Vec<(MemberId, AnniversaryDate)> {
        self.records
            .lock()
            .await
            .get(&guild.0)
            .map(|g| {
                g.iter()
                    .map(|(member, date)| (MemberId::new(member.clone()), *date))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every guild holding at least one record, in insertion order.
    pub async fn guilds(&self) -> Vec<GuildId> {
        self.records
            .lock()
            .await
            .keys()
            .map(|guild| GuildId::new(guild.clone()))
            .collect()
    }

    /// Remove every record for a guild. The announcement config is a
    /// separate document and is left untouched. A guild with no records
    /// is a no-op success, not an error.
    pub async fn purge_guild(&self, guild: &GuildId) -> Result<()> {
        let snapshot = {
            let mut records = self.records.lock().await;
            if records.shift_remove(&guild.0).is_none() {
                return Ok(());
            }
            records.clone()
        };
        tracing::info!("🧹 Purged birthday records for guild {guild}");
        self.store.save(BIRTHDAYS_FILE, &snapshot)
    }
}
