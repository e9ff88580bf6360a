use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "db.json";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON document holding every collection
    pub db_path: PathBuf,
    pub port: u16,
    /// Base URL the client layer talks to
    pub api_url: String,
    /// Where the client keeps the signed-in user, if anywhere
    pub session_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            port: DEFAULT_PORT,
            api_url: DEFAULT_API_URL.to_string(),
            session_path: None,
        }
    }
}

impl Config {
    /// Reads `TASKBOARD_DB_PATH`, `PORT`, `TASKBOARD_API_URL` and
    /// `TASKBOARD_SESSION_PATH`, falling back to defaults for unset values.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            None => defaults.port,
        };
        Ok(Config {
            db_path: get("TASKBOARD_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            port,
            api_url: get("TASKBOARD_API_URL").unwrap_or(defaults.api_url),
            session_path: get("TASKBOARD_SESSION_PATH").map(PathBuf::from),
        })
    }
}
