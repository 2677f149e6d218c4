use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use config::{Config, File};
use serde::Deserialize;
use url::Url;

const DEFAULT_CONFIG_PATH: &str = "settings.yml";
const DATABASE_URL_ENV: &str = "DATABASE_URL";
const REDIS_URL_ENV: &str = "REDIS_URL";
const QUEUE_NAME_ENV: &str = "MAINTENANCE_QUEUE";
const TICK_INTERVAL_ENV: &str = "MAINTENANCE_TICK_SECONDS";

pub const DEFAULT_QUEUE_NAME: &str = "backup_tasks";
pub const DEFAULT_PURGE_SCHEDULE: &str = "@daily";

/// Where maintenance tasks and backups are read from
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    Memory,
    Postgres(Url),
}

/// Where purge work items go
#[derive(Debug, Clone, PartialEq)]
pub enum Queue {
    /// In-process channel drained by the service itself
    Channel,
    Redis { url: Url, name: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub storage: Storage,
    pub queue: Queue,
    pub tick_interval: Duration,
    pub shutdown_timeout: Duration,
    pub purge_schedule: String,
}

#[derive(Deserialize)]
struct DefaultConfig {
    tick_interval_s: u64,
    shutdown_timeout_s: u64,
    queue_name: String,
    purge_schedule: String,
    redis_url: Option<String>,
    db_name: Option<String>,
    db_host: Option<String>,
    db_port: Option<u16>,
    db_user: Option<String>,
    db_pass: Option<String>,
}

impl DefaultConfig {
    /// Postgres url assembled from the `db_*` keys, if all of them are set
    fn database_url(&self) -> Result<Option<Url>> {
        let (Some(user), Some(pass), Some(host), Some(port), Some(name)) = (
            &self.db_user,
            &self.db_pass,
            &self.db_host,
            self.db_port,
            &self.db_name,
        ) else {
            return Ok(None);
        };

        let url_str = format!("postgres://{user}:{pass}@{host}:{port}/{name}");
        Ok(Some(Url::parse(&url_str)?))
    }
}

fn load_default_config(path: &str) -> Result<DefaultConfig> {
    let settings = Config::builder()
        .set_default("tick_interval_s", 60)?
        .set_default("shutdown_timeout_s", 10)?
        .set_default("queue_name", DEFAULT_QUEUE_NAME)?
        .set_default("purge_schedule", DEFAULT_PURGE_SCHEDULE)?
        .add_source(File::with_name(path).required(false))
        .build()
        .map_err(|_| anyhow!("Failed to read config file"))?;

    settings
        .try_deserialize::<DefaultConfig>()
        .map_err(|e| anyhow!("Failed to deserialize config file: {e}"))
}

/// Try to parse env variable. If it's not set, return None. If it's invalid, treat it as an error.
fn try_from_env<T, F>(env_var: &str, f: F) -> Result<Option<T>>
where
    F: FnOnce(String) -> Result<T>,
{
    match std::env::var(env_var) {
        Ok(raw) => {
            let val = f(raw).map_err(|_| anyhow!("Failed to parse {}", env_var))?;
            Ok(Some(val))
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(_) => bail!("Could not read {env_var} from env"),
    }
}

fn parse_url(raw: String) -> Result<Url> {
    Url::parse(&raw).map_err(|e| e.into())
}

/// Load configuration from env with fallback to the config file, then to built-in defaults
pub fn load() -> Result<Settings> {
    load_from(DEFAULT_CONFIG_PATH)
}

pub fn load_from(path: &str) -> Result<Settings> {
    let config = load_default_config(path)?;

    let database_url_opt = try_from_env(DATABASE_URL_ENV, parse_url)?;
    let redis_url_opt = try_from_env(REDIS_URL_ENV, parse_url)?;
    let queue_name_opt = try_from_env(QUEUE_NAME_ENV, |raw| {
        if raw.trim().is_empty() {
            bail!("empty queue name");
        }
        Ok(raw)
    })?;
    let tick_interval_opt = try_from_env(TICK_INTERVAL_ENV, |raw| {
        raw.parse::<u64>().map_err(|e| e.into())
    })?;

    let storage = match database_url_opt {
        Some(url) => Storage::Postgres(url),
        None => match config.database_url()? {
            Some(url) => {
                tracing::warn!("{DATABASE_URL_ENV} is not set, using value from {path}");
                Storage::Postgres(url)
            }
            None => {
                tracing::warn!("No database configured, using in-memory storage");
                Storage::Memory
            }
        },
    };

    let redis_url = match redis_url_opt {
        Some(url) => Some(url),
        None => config
            .redis_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .context("Invalid redis_url in config file")?,
    };
    let queue = match redis_url {
        Some(url) => Queue::Redis {
            url,
            name: queue_name_opt.unwrap_or(config.queue_name),
        },
        None => {
            tracing::warn!("No redis configured, purge tasks stay in-process");
            Queue::Channel
        }
    };

    let tick_interval_s = tick_interval_opt.unwrap_or(config.tick_interval_s);
    if tick_interval_s == 0 {
        bail!("Tick interval must be at least one second");
    }

    Ok(Settings {
        storage,
        queue,
        tick_interval: Duration::from_secs(tick_interval_s),
        shutdown_timeout: Duration::from_secs(config.shutdown_timeout_s),
        purge_schedule: config.purge_schedule,
    })
}
