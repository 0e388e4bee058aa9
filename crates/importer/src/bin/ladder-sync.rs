use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use importer::{
    ChessComSource, DiscordMemberDirectory, LoggingMemberDirectory, MemberDirectory,
    RetryPolicy, SyncConfig, SyncScheduler, TierRoles, sources::chesscom::DEFAULT_USER_AGENT,
};
use storage::Database;
use storage::models::IdentityId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ladder-sync")]
#[command(about = "Chess.com rating sweeps and tier role reconciliation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, env = "CHESSCOM_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    #[arg(long, env = "DISCORD_TOKEN")]
    discord_token: Option<String>,

    #[arg(long, env = "DISCORD_GUILD_ID")]
    discord_guild_id: Option<String>,

    #[arg(long, env = "TIER_ROLE_TOP5", default_value = "Top 5")]
    top5_role: String,

    #[arg(long, env = "TIER_ROLE_TOP10", default_value = "Top 10")]
    top10_role: String,

    #[arg(long, env = "TIER_ROLE_TOP25", default_value = "Top 25")]
    top25_role: String,

    #[arg(long, env = "SYNC_REQUEST_DELAY_SECS", default_value_t = 2)]
    request_delay_secs: u64,

    #[arg(
        long,
        env = "SYNC_MAX_ATTEMPTS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_attempts: u32,

    #[arg(long, env = "SYNC_MAX_BACKOFF_SECS", default_value_t = 300)]
    max_backoff_secs: u64,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh every registered identity, then reconcile tier roles
    Sweep,
    /// Fetch and print ratings for a Chess.com account without storing them
    Fetch { username: String },
    /// Refresh a single registered identity
    Refresh { identity_id: IdentityId },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ladder_sync={},importer={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let source = Arc::new(ChessComSource::new(&cli.user_agent)?);

    match &cli.command {
        Commands::Fetch { username } => {
            let values =
                importer::fetch_with_retry(source.as_ref(), username, retry_policy(&cli)).await?;
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        Commands::Sweep => {
            let scheduler = build_scheduler(&cli, source).await?;
            let report = scheduler.run_sweep().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Refresh { identity_id } => {
            let scheduler = build_scheduler(&cli, source).await?;
            let snapshot = scheduler.refresh_identity(*identity_id).await?;
            tracing::info!("Refreshed identity {}", identity_id);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}

async fn build_scheduler(
    cli: &Cli,
    source: Arc<ChessComSource>,
) -> Result<SyncScheduler, Box<dyn std::error::Error>> {
    tracing::info!("Connecting to database...");
    let db = Database::new(&cli.database_url).await?;
    db.run_migrations().await?;

    let directory: Arc<dyn MemberDirectory> = match (&cli.discord_token, &cli.discord_guild_id) {
        (Some(token), Some(guild)) => Arc::new(DiscordMemberDirectory::new(token, guild)?),
        _ => {
            tracing::info!("Discord not configured, role changes will only be logged");
            Arc::new(LoggingMemberDirectory)
        }
    };

    let config = SyncConfig {
        request_delay: Duration::from_secs(cli.request_delay_secs),
        retry: retry_policy(cli),
        roles: TierRoles {
            top5: cli.top5_role.clone(),
            top10: cli.top10_role.clone(),
            top25: cli.top25_role.clone(),
        },
        ..Default::default()
    };

    Ok(SyncScheduler::new(Arc::new(db), source, directory, config))
}

fn retry_policy(cli: &Cli) -> RetryPolicy {
    RetryPolicy {
        max_attempts: cli.max_attempts,
        max_total_backoff: Duration::from_secs(cli.max_backoff_secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(max_attempts: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from([
            "ladder-sync",
            "--database-url",
            "postgres://localhost/ladder",
            "--max-attempts",
            max_attempts,
            "sweep",
        ])
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_max_attempts_must_allow_one_fetch() {
        assert!(parse("0").is_err());

        let cli = parse("3").unwrap();
        assert_eq!(retry_policy(&cli).max_attempts, 3);
    }
}
