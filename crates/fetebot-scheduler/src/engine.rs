//! The scan engine — `Idle -> Scanning -> Idle`, once per day at the
//! configured UTC reference time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, NaiveTime, Utc};

use fetebot_announce::AnnouncementDispatcher;
use fetebot_core::types::{AnniversaryDate, AnnounceTarget};
use fetebot_store::{AnnouncementChannelStore, BirthdayStore};

/// Counters from one scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub guilds_scanned: usize,
    pub announced: usize,
    pub failed: usize,
}

pub struct DailyScheduler {
    birthdays: Arc<BirthdayStore>,
    channels: Arc<AnnouncementChannelStore>,
    dispatcher: Arc<AnnouncementDispatcher>,
    // In-flight flag: a tick arriving while the previous scan still runs
    // is skipped, never queued.
    scanning: AtomicBool,
    fire_at: NaiveTime,
}

impl DailyScheduler {
    pub fn new(
        birthdays: Arc<BirthdayStore>,
        channels: Arc<AnnouncementChannelStore>,
        dispatcher: Arc<AnnouncementDispatcher>,
        hour: u32,
        minute: u32,
    ) -> Self {
        let fire_at = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_else(|| {
            tracing::warn!("⚠️ Invalid schedule time {hour:02}:{minute:02}, using 00:00 UTC");
            NaiveTime::MIN
        });
        Self {
            birthdays,
            channels,
            dispatcher,
            scanning: AtomicBool::new(false),
            fire_at,
        }
    }

    /// Scan against today's UTC date. Returns `None` when a previous scan
    /// is still in flight.
    pub async fn run_scan(&self) -> Option<ScanReport> {
        self.run_scan_for(AnniversaryDate::today_utc()).await
    }

    /// Scan against an explicit date.
    pub async fn run_scan_for(&self, today: AnniversaryDate) -> Option<ScanReport> {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("⏳ Previous scan still running, skipping this tick");
            return None;
        }
        let report = self.scan(today).await;
        self.scanning.store(false, Ordering::SeqCst);
        Some(report)
    }

    async fn scan(&self, today: AnniversaryDate) -> ScanReport {
        let mut report = ScanReport::default();
        let configured = self.channels.configured_guilds().await;
        tracing::info!(
            "🔍 Daily scan for {today}: {} guilds configured",
            configured.len()
        );

        // Absence of configuration is expected steady state, noted and
        // moved past.
        for guild in self.birthdays.guilds().await {
            if !configured.iter().any(|(g, _)| *g == guild) {
                tracing::debug!("💤 Guild {guild} has birthdays but no destination");
            }
        }

        for (guild, destination) in configured {
            report.guilds_scanned += 1;
            for (member, date) in self.birthdays.list_guild(&guild).await {
                if date != today {
                    continue;
                }
                let target = AnnounceTarget::Member {
                    guild: guild.clone(),
                    member: member.clone(),
                };
                match self.dispatcher.announce(&destination, &target).await {
                    Ok(_) => report.announced += 1,
                    Err(e) => {
                        // One failed delivery never aborts the rest of
                        // the scan.
                        report.failed += 1;
                        tracing::warn!("⚠️ Announcement failed for {member} in {guild}: {e}");
                    }
                }
            }
        }

        tracing::info!(
            "✅ Scan finished: {} announced, {} failed across {} guilds",
            report.announced,
            report.failed,
            report.guilds_scanned
        );
        report
    }

    /// Span to sleep until the next reference-time firing after `now`.
    pub fn until_next_tick(&self, now: DateTime<Utc>) -> std::time::Duration {
        let today_run = now.date_naive().and_time(self.fire_at).and_utc();
        let next = if today_run > now {
            today_run
        } else {
            today_run + Duration::days(1)
        };
        (next - now).to_std().unwrap_or_default()
    }

    pub fn fire_at(&self) -> NaiveTime {
        self.fire_at
    }
}

/// Spawn the scan loop as a background tokio task; runs until process
/// shutdown.
pub fn spawn_daily(scheduler: Arc<DailyScheduler>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            "⏰ Daily scheduler started (fires at {} UTC)",
            scheduler.fire_at().format("%H:%M")
        );
        loop {
            let wait = scheduler.until_next_tick(Utc::now());
            tokio::time::sleep(wait).await;
            scheduler.run_scan().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use fetebot_announce::ResourcePools;
    use fetebot_announce::testing::RecordingPlatform;
    use fetebot_core::types::{ChannelId, GuildId, MemberId};
    use fetebot_store::JsonStore;

    struct Fixture {
        platform: Arc<RecordingPlatform>,
        birthdays: Arc<BirthdayStore>,
        channels: Arc<AnnouncementChannelStore>,
        scheduler: DailyScheduler,
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
        let scheduler = DailyScheduler::new(
            birthdays.clone(),
            channels.clone(),
            dispatcher,
            0,
            0,
        );
        Fixture {
            platform,
            birthdays,
            channels,
            scheduler,
            _dir: dir,
        }
    }

    fn date(text: &str) -> AnniversaryDate {
        AnniversaryDate::parse(text).unwrap()
    }

    #[tokio::test]
    async fn scan_announces_exactly_the_matching_member() {
        let fx = fixture(RecordingPlatform::new().with_member("m1", "Alice"));
        let guild = GuildId::new("g1");
        fx.channels
            .set_destination(&guild, &ChannelId::new("c1"))
            .await
            .unwrap();
        fx.birthdays.set(&guild, &MemberId::new("m1"), date("20/05")).await.unwrap();
        fx.birthdays.set(&guild, &MemberId::new("m2"), date("21/05")).await.unwrap();
        fx.birthdays.set(&guild, &MemberId::new("m3"), date("20/06")).await.unwrap();

        let report = fx.scheduler.run_scan_for(date("20/05")).await.unwrap();
        assert_eq!(report.announced, 1);
        assert_eq!(report.failed, 0);

        let sent = fx.platform.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChannelId::new("c1"));
        assert!(sent[0].1.text.contains("<@m1>"));
    }

    #[tokio::test]
    async fn unconfigured_guilds_are_skipped() {
        let fx = fixture(RecordingPlatform::new());
        let guild = GuildId::new("g1");
        fx.birthdays.set(&guild, &MemberId::new("m1"), date("20/05")).await.unwrap();

        let report = fx.scheduler.run_scan_for(date("20/05")).await.unwrap();
        assert_eq!(report.guilds_scanned, 0);
        assert_eq!(report.announced, 0);
        assert!(fx.platform.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_dead_guild_does_not_abort_the_scan() {
        let fx = fixture(RecordingPlatform::new().with_dead_channel("dead"));
        let today = date("20/05");
        for (guild, channel) in [("g1", "dead"), ("g2", "c2")] {
            let guild = GuildId::new(guild);
            fx.channels
                .set_destination(&guild, &ChannelId::new(channel))
                .await
                .unwrap();
            fx.birthdays.set(&guild, &MemberId::new("m1"), today).await.unwrap();
        }

        let report = fx.scheduler.run_scan_for(today).await.unwrap();
        assert_eq!(report.guilds_scanned, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.announced, 1);

        let sent = fx.platform.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChannelId::new("c2"));
    }

    #[tokio::test]
    async fn in_flight_guard_skips_overlapping_tick() {
        let fx = fixture(RecordingPlatform::new());
        fx.scheduler.scanning.store(true, Ordering::SeqCst);
        assert!(fx.scheduler.run_scan_for(date("20/05")).await.is_none());

        fx.scheduler.scanning.store(false, Ordering::SeqCst);
        assert!(fx.scheduler.run_scan_for(date("20/05")).await.is_some());
    }

    #[test]
    fn until_next_tick_wraps_to_tomorrow() {
        let dir = tempfile::tempdir().unwrap();
        let platform = Arc::new(RecordingPlatform::new());
        let scheduler = DailyScheduler::new(
            Arc::new(BirthdayStore::open(JsonStore::new(dir.path()))),
            Arc::new(AnnouncementChannelStore::open(JsonStore::new(dir.path()))),
            Arc::new(AnnouncementDispatcher::new(platform, ResourcePools::builtin())),
            6,
            30,
        );

        let before = Utc.with_ymd_and_hms(2025, 5, 20, 5, 0, 0).unwrap();
        assert_eq!(
            scheduler.until_next_tick(before),
            std::time::Duration::from_secs(90 * 60)
        );

        let after = Utc.with_ymd_and_hms(2025, 5, 20, 7, 0, 0).unwrap();
        assert_eq!(
            scheduler.until_next_tick(after),
            std::time::Duration::from_secs(23 * 3600 + 30 * 60)
        );

        // An exact hit schedules the following day.
        let exact = Utc.with_ymd_and_hms(2025, 5, 20, 6, 30, 0).unwrap();
        assert_eq!(
            scheduler.until_next_tick(exact),
            std::time::Duration::from_secs(24 * 3600)
        );
    }
}
