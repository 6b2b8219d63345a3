use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

pub const DEFAULT_VOTE_PATH: &str = "votes/total";
pub const DEFAULT_VISITOR_PATH: &str = "visitors/total";
pub const VOTED_KEY: &str = "onekh_voted";
pub const VISITED_KEY: &str = "onekh_visited";

/// What a widget instance counts and where it keeps its local flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub track_visitors: bool,
    pub vote_path: String,
    pub visitor_path: String,
    pub voted_key: String,
    pub visited_key: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            track_visitors: true,
            vote_path: DEFAULT_VOTE_PATH.to_string(),
            visitor_path: DEFAULT_VISITOR_PATH.to_string(),
            voted_key: VOTED_KEY.to_string(),
            visited_key: VISITED_KEY.to_string(),
        }
    }
}

impl WidgetConfig {
    pub fn votes_only() -> Self {
        Self {
            track_visitors: false,
            ..Self::default()
        }
    }
}

/// Connection parameters for the shared counter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    /// How long one live-update poll may wait on the server for a change.
    pub watch_wait: Duration,
    pub retry_delay: Duration,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(10),
            watch_wait: Duration::from_secs(25),
            retry_delay: Duration::from_secs(1),
        }
    }

    /// The widget's script resources, in load order: app module, then database module.
    pub fn resources(&self) -> Vec<String> {
        vec![
            format!("{}/static/counter-app.js", self.base_url),
            format!("{}/static/counter-database.js", self.base_url),
        ]
    }
}

/// Settings of the `serve` command, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub watch_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: try_load("PORT", 8080),
            data_path: resolve_data_path(),
            watch_timeout: Duration::from_secs(try_load("WATCH_TIMEOUT_SECS", 25)),
        }
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/counters.json")
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Ok(raw) = env::var(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.trim().parse().unwrap_or_else(|err| {
        warn!("invalid {key} value '{raw}': {err}, using default: {default}");
        default
    })
}
