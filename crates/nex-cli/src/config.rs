//! Server configuration.
//!
//! Precedence: command-line flag, then environment, then TOML file, then
//! built-in default. The file is optional; every table and key in it is too.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use nex_store::{QueryConfig, StoreConfig, SweeperConfig};
use serde::Deserialize;
use tracing::info;

pub const DEFAULT_PORT: u16 = 3000;

/// Shape of the optional TOML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub store: StoreConfig,
    pub sweeper: SweeperConfig,
    pub query: QueryConfig,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub port: u16,
    pub store: StoreConfig,
    pub sweeper: SweeperConfig,
    pub query: QueryConfig,
}

impl ServeConfig {
    /// Resolve from flags, `PORT` / `NEXHUB_CONFIG` and the config file.
    pub fn load(port_flag: Option<u16>, config_flag: Option<&Path>) -> Result<Self> {
        let path = config_flag
            .map(Path::to_path_buf)
            .or_else(|| env::var("NEXHUB_CONFIG").ok().map(PathBuf::from));

        let file = match path {
            Some(path) => {
                info!("loading config from {}", path.display());
                FileConfig::read(&path)?
            }
            None => FileConfig::default(),
        };

        Self::from_parts(port_flag, env::var("PORT").ok().as_deref(), file)
    }

    pub fn from_parts(port_flag: Option<u16>, env_port: Option<&str>, file: FileConfig) -> Result<Self> {
        let env_port = env_port
            .map(|raw| {
                raw.trim()
                    .parse::<u16>()
                    .with_context(|| format!("invalid PORT value `{raw}`"))
            })
            .transpose()?;

        let port = port_flag.or(env_port).or(file.port).unwrap_or_else(|| {
            info!("no port configured, using default: {DEFAULT_PORT}");
            DEFAULT_PORT
        });

        let config = Self {
            port,
            store: file.store,
            sweeper: file.sweeper,
            query: file.query,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.store.tier_capacity == 0 {
            bail!("store.tier_capacity must be at least 1");
        }
        if self.store.login_capacity == 0 {
            bail!("store.login_capacity must be at least 1");
        }
        if self.sweeper.interval_secs == 0 {
            bail!("sweeper.interval_secs must be at least 1");
        }
        if self.sweeper.retention_secs == 0 {
            bail!("sweeper.retention_secs must be at least 1");
        }
        Ok(())
    }
}
