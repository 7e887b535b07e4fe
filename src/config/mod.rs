//! Configuration management
//!
//! Precedence (highest first): `HNC_PORT` / `PORT` overrides, `HNC_*`
//! environment variables (`__` separates sections), `config.{toml,json,yaml}`
//! in the config directory, built-in defaults.

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub demo: DemoConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub polling: PollingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            api: ApiConfig::default(),
            demo: DemoConfig::default(),
            session: SessionConfig::default(),
            polling: PollingConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    8090
}

/// Upstream metering API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Demo fallback behaviour when the API is unreachable
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Render built-in demo datasets (clearly labelled) instead of an error panel
    #[serde(default = "default_true")]
    pub fallback: bool,
    /// Offline login accepted only while the API is unreachable
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            fallback: true,
            username: None,
            password: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_tenant_ttl")]
    pub tenant_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
            tenant_ttl_secs: default_tenant_ttl(),
        }
    }
}

fn default_session_ttl() -> u64 {
    8 * 60 * 60
}

fn default_tenant_ttl() -> u64 {
    60 * 60
}

/// Poll cadences for the live pages (seconds)
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_reader_secs")]
    pub reader_secs: u64,
    #[serde(default = "default_gateway_secs")]
    pub gateway_secs: u64,
    #[serde(default = "default_remote_secs")]
    pub remote_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            reader_secs: default_reader_secs(),
            gateway_secs: default_gateway_secs(),
            remote_secs: default_remote_secs(),
        }
    }
}

impl PollingConfig {
    pub fn reader_interval(&self) -> Duration {
        Duration::from_secs(self.reader_secs.max(1))
    }

    pub fn gateway_interval(&self) -> Duration {
        Duration::from_secs(self.gateway_secs.max(1))
    }

    pub fn remote_interval(&self) -> Duration {
        Duration::from_secs(self.remote_secs.max(1))
    }
}

fn default_reader_secs() -> u64 {
    5
}

fn default_gateway_secs() -> u64 {
    30
}

fn default_remote_secs() -> u64 {
    10
}

/// Get config directory (HNC_CONFIG_DIR or platform default)
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("HNC_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library/Application Support/heatnet-console");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("heatnet-console");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config/heatnet-console");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("heatnet-console");
        }
    }

    PathBuf::from(".")
}

pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir();

    let mut builder = ::config::Config::builder()
        .set_default("port", default_port() as i64)?
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy()).required(false),
        )
        .add_source(
            ::config::Environment::with_prefix("HNC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    // HNC_PORT > PORT > config > default; unparsable values are ignored
    if let Ok(port) = std::env::var("HNC_PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", port_num as i64)?;
        }
    } else if let Ok(port) = std::env::var("PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", port_num as i64)?;
        }
    }

    let config = builder.build()?;

    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env() {
        for key in [
            "HNC_PORT",
            "PORT",
            "HNC_API__BASE_URL",
            "HNC_DEMO__FALLBACK",
            "HNC_POLLING__READER_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_without_file_or_env() {
        clear_env();
        let dir = tempfile::tempdir().expect("create temp dir");
        env::set_var("HNC_CONFIG_DIR", dir.path());

        let config = load_config().expect("config should load");

        env::remove_var("HNC_CONFIG_DIR");

        assert_eq!(config.port, 8090);
        assert_eq!(config.api.base_url, "http://127.0.0.1:8000");
        assert!(config.demo.fallback);
        assert_eq!(config.polling.reader_secs, 5);
        assert_eq!(config.polling.gateway_secs, 30);
    }

    #[test]
    #[serial]
    fn port_env_fallback() {
        clear_env();
        env::set_var("HNC_CONFIG_DIR", "/tmp/hnc-test-nonexistent");
        env::set_var("PORT", "3000");

        let config = load_config().expect("config should load");

        clear_env();
        env::remove_var("HNC_CONFIG_DIR");

        assert_eq!(config.port, 3000);
    }

    #[test]
    #[serial]
    fn hnc_port_takes_precedence_over_port() {
        clear_env();
        env::set_var("HNC_CONFIG_DIR", "/tmp/hnc-test-nonexistent");
        env::set_var("HNC_PORT", "5000");
        env::set_var("PORT", "3000");

        let config = load_config().expect("config should load");

        clear_env();
        env::remove_var("HNC_CONFIG_DIR");

        assert_eq!(config.port, 5000);
    }

    #[test]
    #[serial]
    fn invalid_port_uses_default() {
        clear_env();
        env::set_var("HNC_CONFIG_DIR", "/tmp/hnc-test-nonexistent");
        env::set_var("PORT", "not-a-number");

        let config = load_config().expect("config should load");

        clear_env();
        env::remove_var("HNC_CONFIG_DIR");

        assert_eq!(config.port, 8090);
    }

    #[test]
    #[serial]
    fn nested_sections_from_env() {
        clear_env();
        env::set_var("HNC_CONFIG_DIR", "/tmp/hnc-test-nonexistent");
        env::set_var("HNC_API__BASE_URL", "http://api.example:9000");
        env::set_var("HNC_DEMO__FALLBACK", "false");

        let config = load_config().expect("config should load");

        clear_env();
        env::remove_var("HNC_CONFIG_DIR");

        assert_eq!(config.api.base_url, "http://api.example:9000");
        assert!(!config.demo.fallback);
    }

    #[test]
    #[serial]
    fn config_file_in_config_dir() {
        clear_env();
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(
            dir.path().join("config.toml"),
            "port = 7000\n[polling]\nreader_secs = 2\n[demo]\nusername = \"ops\"\npassword = \"secret\"\n",
        )
        .expect("write config");
        env::set_var("HNC_CONFIG_DIR", dir.path());

        let config = load_config().expect("config should load");

        env::remove_var("HNC_CONFIG_DIR");

        assert_eq!(config.port, 7000);
        assert_eq!(config.polling.reader_secs, 2);
        assert_eq!(config.demo.username.as_deref(), Some("ops"));
        // untouched sections keep defaults
        assert_eq!(config.session.ttl_secs, 8 * 60 * 60);
    }

    #[test]
    fn intervals_never_zero() {
        let polling = PollingConfig {
            reader_secs: 0,
            gateway_secs: 0,
            remote_secs: 0,
        };
        assert_eq!(polling.reader_interval(), Duration::from_secs(1));
        assert_eq!(polling.gateway_interval(), Duration::from_secs(1));
    }
}
