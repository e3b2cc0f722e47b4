use std::path::PathBuf;
use std::time::Duration;

use crate::search::DEFAULT_PROFILE_DOMAIN;

const APP_DIR: &str = "scout_xi";
const DB_FILE: &str = "scout_xi.sqlite";
const LOG_FILE: &str = "scout_xi.log";
const DEFAULT_API_BASE: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub db_path: Option<PathBuf>,
    pub http_timeout: Option<Duration>,
    pub profile_domain: String,
    pub log_path: Option<PathBuf>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            db_path: app_cache_dir().map(|dir| dir.join(DB_FILE)),
            http_timeout: None,
            profile_domain: DEFAULT_PROFILE_DOMAIN.to_string(),
            log_path: app_cache_dir().map(|dir| dir.join(LOG_FILE)),
            email: None,
            password: None,
        }
    }
}

impl Config {
    /// Reads `.env.local` and `.env` (if present) and then the process environment.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: env_non_empty("SCOUT_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            db_path: env_non_empty("SCOUT_DB_PATH")
                .map(PathBuf::from)
                .or(defaults.db_path),
            http_timeout: env_non_empty("SCOUT_HTTP_TIMEOUT_SECS")
                .and_then(|val| val.parse::<u64>().ok())
                .map(|secs| Duration::from_secs(secs.max(1))),
            profile_domain: env_non_empty("SCOUT_PROFILE_DOMAIN")
                .unwrap_or(defaults.profile_domain),
            log_path: env_non_empty("SCOUT_LOG_PATH")
                .map(PathBuf::from)
                .or(defaults.log_path),
            email: env_non_empty("SCOUT_EMAIL"),
            password: env_non_empty("SCOUT_PASSWORD"),
        }
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.email.as_deref()?, self.password.as_deref()?))
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Some(base) = env_non_empty("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = env_non_empty("HOME")?;
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
