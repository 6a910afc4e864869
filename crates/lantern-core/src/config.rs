//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use lantern_push::PushConfig;

use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    /// Path to the session database file
    pub database_path: PathBuf,
    pub crash_reporting_enabled: bool,
    pub telemetry_enabled: bool,
    /// Foreground autosave period
    pub autosave_interval_secs: u64,
    /// User agent for the shared HTTP client
    pub user_agent: String,
    /// Push is disabled when absent
    pub push: Option<PushConfig>,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("lantern.db"),
            data_dir,
            crash_reporting_enabled: true,
            telemetry_enabled: true,
            autosave_interval_secs: 30,
            user_agent: format!("Mozilla/5.0 (Lantern/{})", env!("CARGO_PKG_VERSION")),
            push: None,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Lantern"))
            .unwrap_or_else(|| PathBuf::from(".lantern"))
    }

    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new(PathBuf::from("/tmp/lantern"));

        assert_eq!(config.database_path, PathBuf::from("/tmp/lantern/lantern.db"));
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
        assert!(config.push.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load(Path::new("/nonexistent/lantern/config.json")).unwrap();
        assert_eq!(config.autosave_interval_secs, 30);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "telemetry_enabled": false,
                "push": {"sender_id": "lantern", "service_url": "https://push.example.com"}
            }"#,
        )
        .unwrap();

        assert!(!config.telemetry_enabled);
        assert!(config.crash_reporting_enabled);
        assert_eq!(config.push.unwrap().sender_id, "lantern");
    }

    #[test]
    fn test_zero_interval_clamped() {
        let mut config = Config::new(PathBuf::from("/tmp/lantern"));
        config.autosave_interval_secs = 0;
        assert_eq!(config.autosave_interval(), Duration::from_secs(1));
    }
}
