use std::time::Duration;

use anyhow::{Context, Result, bail};
use importer::{RetryPolicy, SyncConfig, TierRoles};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub guild_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub api_keys: String,
    pub discord: Option<DiscordConfig>,
    pub sync: SyncConfig,
    pub idle_timeout: Duration,
    pub user_agent: String,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

/// Period between scheduled sweeps. Zero would leave the sweep loop without
/// a tick, so it is rejected along with values that overflow.
fn sync_interval(hours: u64) -> Result<Duration> {
    if hours == 0 {
        bail!("SYNC_INTERVAL_HOURS must be at least 1");
    }
    let secs = hours
        .checked_mul(60 * 60)
        .with_context(|| format!("SYNC_INTERVAL_HOURS is too large: {}", hours))?;
    Ok(Duration::from_secs(secs))
}

fn max_attempts(attempts: u32) -> Result<u32> {
    if attempts == 0 {
        bail!("SYNC_MAX_ATTEMPTS must be at least 1");
    }
    Ok(attempts)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let storage_backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => bail!("STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'", other),
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            bail!("Cannot load DATABASE_URL env variable");
        }

        let discord = match (std::env::var("DISCORD_TOKEN"), std::env::var("DISCORD_GUILD_ID")) {
            (Ok(token), Ok(guild_id)) => Some(DiscordConfig { token, guild_id }),
            _ => None,
        };

        let defaults = TierRoles::default();
        let sync = SyncConfig {
            interval: sync_interval(var_or("SYNC_INTERVAL_HOURS", 24u64)?)?,
            request_delay: Duration::from_secs(var_or("SYNC_REQUEST_DELAY_SECS", 2u64)?),
            retry: RetryPolicy {
                max_attempts: max_attempts(var_or("SYNC_MAX_ATTEMPTS", 5u32)?)?,
                max_total_backoff: Duration::from_secs(var_or("SYNC_MAX_BACKOFF_SECS", 300u64)?),
            },
            roles: TierRoles {
                top5: std::env::var("TIER_ROLE_TOP5").unwrap_or(defaults.top5),
                top10: std::env::var("TIER_ROLE_TOP10").unwrap_or(defaults.top10),
                top25: std::env::var("TIER_ROLE_TOP25").unwrap_or(defaults.top25),
            },
        };

        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            storage_backend,
            database_url,
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            discord,
            sync,
            idle_timeout: Duration::from_secs(var_or("PAGINATION_IDLE_TIMEOUT_SECS", 100u64)?),
            user_agent: std::env::var("CHESSCOM_USER_AGENT")
                .unwrap_or_else(|_| importer::sources::chesscom::DEFAULT_USER_AGENT.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_interval_in_hours() {
        assert_eq!(sync_interval(24).unwrap(), Duration::from_secs(86_400));
        assert_eq!(sync_interval(1).unwrap(), Duration::from_secs(3_600));
    }

    #[test]
    fn test_zero_sync_interval_is_rejected() {
        let err = sync_interval(0).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_overflowing_sync_interval_is_rejected() {
        assert!(sync_interval(u64::MAX).is_err());
        assert!(sync_interval(u64::MAX / 3_600 + 1).is_err());
        assert!(sync_interval(u64::MAX / 3_600).is_ok());
    }

    #[test]
    fn test_zero_max_attempts_is_rejected() {
        assert!(max_attempts(0).is_err());
        assert_eq!(max_attempts(5).unwrap(), 5);
    }
}
