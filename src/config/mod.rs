use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {0} has invalid value {1:?}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Configuration {
    pub sync_interval: Duration,
    pub tmdb: TmdbConfig,
    pub radarr: RadarrConfig,
}

#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub access_token: String,
    pub api_key: String,
    pub list_id: String,
}

#[derive(Debug, Clone)]
pub struct RadarrConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub root_folder_path: String,
    pub quality_profile_id: u64,
}

impl Configuration {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary lookup so tests can feed
    /// a map instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
            value.parse().map_err(|_| ConfigError::Invalid(key, value))
        }

        let interval_secs: u64 = parse("SYNC_INTERVAL", require("SYNC_INTERVAL")?)?;

        Ok(Self {
            sync_interval: Duration::from_secs(interval_secs),
            tmdb: TmdbConfig {
                access_token: require("TMDB_ACCESS_TOKEN")?,
                api_key: require("TMDB_API_KEY")?,
                list_id: require("TMDB_LIST_ID")?,
            },
            radarr: RadarrConfig {
                host: require("RADARR_IP")?,
                port: parse("RADARR_PORT", require("RADARR_PORT")?)?,
                api_key: require("RADARR_API_KEY")?,
                root_folder_path: require("ROOT_FOLDER_PATH")?,
                quality_profile_id: parse("QUALITY_PROFILE_ID", require("QUALITY_PROFILE_ID")?)?,
            },
        })
    }
}
