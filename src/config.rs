use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{anyhow, Context};

pub const SESSION_COOKIE: &str = "session_token";
pub const SESSION_COOKIE_MAX_AGE: u32 = 60 * 60 * 24;
pub const DASHBOARD_EXAM_LIMIT: i64 = 100;
pub const STUDENT_LIST_LIMIT: i64 = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub api_prefix: String,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub max_connections: u32,
    pub cors_origins: CorsOrigins,
    pub password_hash_rounds: u32,
    pub seed_database: bool,
    pub seed_admin_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl FromStr for CorsOrigins {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let origins: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
        if origins.is_empty() {
            return Err(anyhow!("no origins given"));
        }
        if origins.iter().any(|origin| origin == "*") {
            return Ok(CorsOrigins::Any);
        }
        Ok(CorsOrigins::List(origins))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            api_prefix: "/api".to_string(),
            database_url: None,
            database_name: None,
            max_connections: 5,
            cors_origins: CorsOrigins::Any,
            password_hash_rounds: 10_000,
            seed_database: true,
            seed_admin_password: "admin123".to_string(),
        }
    }
}

impl Config {
    /// Reads the configuration from the environment. A `.env` file in the
    /// working directory is honoured when present.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            log::info!("Loaded environment from {}", path.display());
        }
        let defaults = Config::default();
        Ok(Self {
            bind_addr: try_load("BIND_ADDR", defaults.bind_addr)?,
            api_prefix: try_load("API_PREFIX", defaults.api_prefix)?,
            database_url: optional("DATABASE_URL"),
            database_name: optional("DB_NAME"),
            max_connections: try_load("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            cors_origins: try_load("CORS_ORIGINS", defaults.cors_origins)?,
            password_hash_rounds: try_load("PASSWORD_HASH_ROUNDS", defaults.password_hash_rounds)?,
            seed_database: try_load("SEED_DATABASE", defaults.seed_database)?,
            seed_admin_password: optional("SEED_ADMIN_PASSWORD")
                .unwrap_or(defaults.seed_admin_password),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    match optional(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("Invalid {} value", key)),
        None => {
            log::info!("{} not set, using default: {:?}", key, default);
            Ok(default)
        }
    }
}
