//! # Fetebot — guild birthday announcements for Discord
//!
//! Usage:
//!   fetebot run                          # start the daily scheduler
//!   fetebot scan-now                     # run one scan and exit
//!   fetebot set-channel <guild> <channel>
//!   fetebot remove-channel <guild>
//!   fetebot list <guild>
//!   fetebot announce <guild> <channel> [member]
//!   fetebot purge-guild <guild>

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fetebot_announce::{AnnouncementDispatcher, ResourcePools};
use fetebot_channels::DiscordChannel;
use fetebot_commands::CommandContext;
use fetebot_core::FetebotConfig;
use fetebot_core::traits::ChatPlatform;
use fetebot_core::types::{ChannelId, GuildId, MemberId};
use fetebot_scheduler::{DailyScheduler, spawn_daily};
use fetebot_store::{AnnouncementChannelStore, BirthdayStore, JsonStore};

#[derive(Parser)]
#[command(
    name = "fetebot",
    version,
    about = "🎂 Fetebot — birthday announcements for Discord guilds"
)]
struct Cli {
    /// Path to config.toml (default: ~/.fetebot/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Data directory override
    #[arg(long)]
    data_dir: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the bot (daily announcement scheduler)
    Run,
    /// Run one birthday scan immediately and exit
    ScanNow,
    /// Configure a guild's announcement channel
    SetChannel { guild: String, channel: String },
    /// Remove a guild's announcement channel
    RemoveChannel { guild: String },
    /// Show a guild's upcoming birthdays
    List { guild: String },
    /// Manually announce a birthday, with a confirm/cancel prompt
    Announce {
        guild: String,
        channel: String,
        /// Member to celebrate; omit for a placeholder celebration
        member: Option<String>,
    },
    /// Delete every birthday record for a guild (channel config stays)
    PurgeGuild { guild: String },
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => FetebotConfig::load_from(Path::new(&expand_path(path)))?,
        None => FetebotConfig::load()?,
    };
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.clone();
    }
    if config.discord.bot_token.is_empty() {
        anyhow::bail!(
            "No bot token configured (set discord.bot_token in config.toml or DISCORD_BOT_TOKEN)"
        );
    }

    let data_dir = expand_path(&config.storage.data_dir);
    let resources_dir = expand_path(&config.storage.resources_dir);

    let platform: Arc<dyn ChatPlatform> = Arc::new(DiscordChannel::new(config.discord.clone()));
    let birthdays = Arc::new(BirthdayStore::open(JsonStore::new(Path::new(&data_dir))));
    let channels = Arc::new(AnnouncementChannelStore::open(JsonStore::new(Path::new(
        &data_dir,
    ))));
    let dispatcher = Arc::new(AnnouncementDispatcher::new(
        platform.clone(),
        ResourcePools::load(Path::new(&resources_dir)),
    ));
    let ctx = CommandContext {
        platform: platform.clone(),
        birthdays: birthdays.clone(),
        channels: channels.clone(),
        dispatcher: dispatcher.clone(),
    };
    let scheduler = Arc::new(DailyScheduler::new(
        birthdays,
        channels,
        dispatcher,
        config.schedule.hour,
        config.schedule.minute,
    ));

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let me = platform.current_user().await?;
            tracing::info!("Connected as {}", me.display_name);
            let loop_handle = spawn_daily(scheduler);
            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutting down");
            loop_handle.abort();
        }
        Command::ScanNow => match scheduler.run_scan().await {
            Some(report) => tracing::info!(
                "Scan finished: {} announced, {} failed",
                report.announced,
                report.failed
            ),
            None => tracing::warn!("A scan was already running"),
        },
        Command::SetChannel { guild, channel } => {
            let reply = ctx
                .set_channel(&GuildId::new(guild), &ChannelId::new(channel))
                .await?;
            println!("{reply}");
        }
        Command::RemoveChannel { guild } => match ctx.remove_channel(&GuildId::new(guild)).await {
            Ok(reply) => println!("{reply}"),
            Err(e) if e.is_informational() => println!("{}", fetebot_commands::render_error(&e)),
            Err(e) => return Err(e.into()),
        },
        Command::List { guild } => {
            println!("{}", ctx.list_upcoming(&GuildId::new(guild)).await?);
        }
        Command::Announce {
            guild,
            channel,
            member,
        } => {
            announce_interactive(&ctx, guild, channel, member).await?;
        }
        Command::PurgeGuild { guild } => {
            ctx.guild_removed(&GuildId::new(guild)).await?;
            println!("Anniversaires supprimés pour ce serveur.");
        }
    }

    Ok(())
}

/// Terminal rendition of the confirm/cancel primitive — the same two
/// transitions a button press would drive.
async fn announce_interactive(
    ctx: &CommandContext,
    guild: String,
    channel: String,
    member: Option<String>,
) -> Result<()> {
    let invoker = ctx.platform.current_user().await?.id;
    let mut session = match ctx
        .begin_announce(
            &GuildId::new(guild),
            &invoker,
            &ChannelId::new(channel),
            member.map(MemberId::new),
        )
        .await
    {
        Ok(session) => session,
        Err(e) => {
            println!("{}", fetebot_commands::render_error(&e));
            return Ok(());
        }
    };

    println!("{}", fetebot_commands::CONFIRMATION_PROMPT);
    print!("Confirmer ? [o/N] ");
    use std::io::Write as _;
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;

    if matches!(
        answer.trim().to_lowercase().as_str(),
        "o" | "oui" | "y" | "yes"
    ) {
        match session.confirm(&invoker).await {
            Ok(_) => println!("{}", fetebot_commands::SEND_SUCCESS),
            Err(e) => println!("{}", fetebot_commands::render_error(&e)),
        }
    } else {
        session.cancel(&invoker).await.ok();
        println!("{}", fetebot_commands::CANCEL_ACK);
    }
    Ok(())
}
