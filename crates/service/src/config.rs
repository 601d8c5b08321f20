use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG: &str = "cantus-filter.toml";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_STATIC_DIR: &str = "static/filter";
/// Two weeks, the usual lifetime of a browser session cookie on the server side.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 14 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub static_dir: PathBuf,
    pub session_ttl_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl ServiceConfig {
    /// Reads the optional TOML file named by `CANTUS_FILTER_CONFIG`, then
    /// applies environment overrides.
    pub fn load() -> Self {
        let config_path =
            std::env::var("CANTUS_FILTER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
        Self::from_file(Path::new(&config_path)).with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => toml::from_str::<ServiceConfig>(&contents).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "invalid config, using defaults");
                Self::default()
            }),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable config, using defaults");
                Self::default()
            }
        }
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(dir) = lookup("CANTUS_FILTER_STATIC_DIR") {
            self.static_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("CANTUS_FILTER_SESSION_TTL_SECS") {
            match raw.trim().parse() {
                Ok(secs) => self.session_ttl_secs = secs,
                Err(_) => warn!(value = %raw, "ignoring invalid CANTUS_FILTER_SESSION_TTL_SECS"),
            }
        }
        self
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
