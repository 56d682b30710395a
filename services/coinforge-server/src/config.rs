//! Server configuration
//!
//! Environment-driven: a `.env` file is loaded when present, then
//! `COINFORGE_HOST`, `COINFORGE_PORT` and `COINFORGE_SEED_USERS`
//! override the defaults. The seed roster mirrors the three users the
//! system has always shipped with.

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// One user to provision at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub rating: u64,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Roster provisioned into the store at startup
    #[serde(default = "default_seed_users")]
    pub seed_users: Vec<SeedUser>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            seed_users: default_seed_users(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment
    ///
    /// `COINFORGE_SEED_USERS` takes `name:rating` pairs separated by
    /// commas, e.g. `boris:5000,maria:1000`.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        if let Ok(host) = std::env::var("COINFORGE_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("COINFORGE_PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("invalid COINFORGE_PORT '{port}'"))?;
        }
        if let Ok(spec) = std::env::var("COINFORGE_SEED_USERS") {
            config.seed_users = parse_seed_users(&spec)
                .context("invalid COINFORGE_SEED_USERS")?;
        }

        Ok(config)
    }

    /// The address to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_seed_users(spec: &str) -> anyhow::Result<Vec<SeedUser>> {
    spec.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, rating) = entry
                .split_once(':')
                .with_context(|| format!("seed entry '{entry}' is not name:rating"))?;
            Ok(SeedUser {
                name: name.trim().to_string(),
                rating: rating
                    .trim()
                    .parse()
                    .with_context(|| format!("seed entry '{entry}' has a non-numeric rating"))?,
            })
        })
        .collect()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_seed_users() -> Vec<SeedUser> {
    [("boris", 5000), ("maria", 1000), ("oleg", 800)]
        .into_iter()
        .map(|(name, rating)| SeedUser {
            name: name.to_string(),
            rating,
        })
        .collect()
}
