use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

static DEFAULT_DATABASE_PATH: &str = "~/.local/share/adventures/adventures.db";

/// Server configuration.
///
/// Read from ~/.config/adventures/config.toml (optional), then overridden by
/// `ADVENTURES_*` environment variables, e.g. `ADVENTURES_PORT=8080`.
#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Store operations slower than this many milliseconds are logged
    pub slow_query_ms: u64,
    /// Default tracing filter when RUST_LOG is not set
    pub log_filter: String,
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("adventures");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config: AppConfig = Config::builder()
            .set_default("database_path", DEFAULT_DATABASE_PATH)?
            .set_default("host", "127.0.0.1")?
            .set_default("port", 4097)?
            .set_default("slow_query_ms", 500)?
            .set_default("log_filter", "info")?
            .add_source(File::from(config_path).required(false))
            .add_source(Environment::with_prefix("ADVENTURES"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Database path with `~` expanded.
    pub fn database_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.database_path.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("missing.toml")).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.slow_query_ms, 500);
        assert_eq!(config.log_filter, "info");
        assert!(!config.database_path().to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "database_path = \"/tmp/adventures-test.db\"\nslow_query_ms = 25\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();

        assert_eq!(config.database_path(), PathBuf::from("/tmp/adventures-test.db"));
        assert_eq!(config.slow_threshold(), Duration::from_millis(25));
        assert_eq!(config.bind_address(), format!("127.0.0.1:{}", config.port));
    }
}
