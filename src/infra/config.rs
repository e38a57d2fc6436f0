use log::debug;
use serde::Deserialize;
use thiserror::Error;

const PREFIX: &str = "RECIPES_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid RECIPES_* environment: {0}")]
    Env(#[from] envy::Error),
}

/// Read from `RECIPES_*` variables, after loading `.env` if there is one.
/// Rocket keeps its own `ROCKET_*` settings for the listener.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_mongo_uri")]
    pub mongo_uri: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Header carrying the authenticated user, set by the auth proxy.
    #[serde(default = "default_session_header")]
    pub session_header: String,
}

fn default_mongo_uri() -> String {
    "mongodb://localhost:27017/".to_string()
}

fn default_database() -> String {
    "recipes".to_string()
}

fn default_session_header() -> String {
    "X-Session-User".to_string()
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(PREFIX).from_iter(vars)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mongo_uri: default_mongo_uri(),
            database: default_database(),
            session_header: default_session_header(),
        }
    }
}
