//! # Register Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command-line flags (highest priority)                              │
//! │     --server-url http://10.0.0.5:5000 --store <id>                     │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     TALLY_SERVER_URL, TALLY_STORE_ID                                   │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/tally-register/register.toml (Linux)                     │
//! │     ~/Library/Application Support/com.tally.register/ (macOS)          │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! │     http://localhost:5000, no store                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! server_url = "http://localhost:5000"
//! store_id = "3f6c2a0e-..."
//! session_file = "/home/cashier/.local/share/tally-register/session.json"
//! request_timeout_secs = 10
//! ```

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RegisterError, RegisterResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    /// Base URL of tally-server
    pub server_url: String,

    /// Store to sell for; can also be chosen at the prompt
    pub store_id: Option<String>,

    /// Where the login session is kept between runs
    pub session_file: Option<PathBuf>,

    pub request_timeout_secs: u64,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        RegisterConfig {
            server_url: "http://localhost:5000".to_string(),
            store_id: None,
            session_file: None,
            request_timeout_secs: 10,
        }
    }
}

/// Values given on the command line; `None` leaves the loaded value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub store_id: Option<String>,
    pub session_file: Option<PathBuf>,
}

impl RegisterConfig {
    /// Loads configuration from file, environment and command line.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`register.toml`)
    /// 3. Environment variables
    /// 4. Command-line overrides
    pub fn load(config_path: Option<PathBuf>, cli: &ConfigOverrides) -> RegisterResult<Self> {
        Self::load_with(config_path, |key| std::env::var(key).ok(), cli)
    }

    pub fn load_with(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
        cli: &ConfigOverrides,
    ) -> RegisterResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        if let Some(url) = env("TALLY_SERVER_URL") {
            debug!(url = %url, "Overriding server URL from environment");
            config.server_url = url;
        }
        if let Some(id) = env("TALLY_STORE_ID") {
            config.store_id = Some(id);
        }

        if let Some(url) = &cli.server_url {
            config.server_url = url.clone();
        }
        if let Some(id) = &cli.store_id {
            config.store_id = Some(id.clone());
        }
        if let Some(path) = &cli.session_file {
            config.session_file = Some(path.clone());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RegisterResult<()> {
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(RegisterError::Config(format!(
                "server_url must start with http:// or https://, got: {}",
                self.server_url
            )));
        }

        if matches!(&self.store_id, Some(id) if id.trim().is_empty()) {
            return Err(RegisterError::Config("store_id must not be empty".into()));
        }

        if self.request_timeout_secs == 0 {
            return Err(RegisterError::Config(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// The configured session file, or `session.json` in the data directory.
    pub fn session_path(&self) -> Option<PathBuf> {
        self.session_file.clone().or_else(|| {
            ProjectDirs::from("com", "tally", "register")
                .map(|dirs| dirs.data_dir().join("session.json"))
        })
    }

    fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "tally", "register")
            .map(|dirs| dirs.config_dir().join("register.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_then_env_then_cli() {
        let file = write_config(
            r#"
            server_url = "http://file:5000"
            store_id = "from-file"
            "#,
        );
        let path = Some(file.path().to_path_buf());

        let config =
            RegisterConfig::load_with(path.clone(), no_env, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.server_url, "http://file:5000");
        assert_eq!(config.store_id.as_deref(), Some("from-file"));
        assert_eq!(config.request_timeout_secs, 10);

        let env = |key: &str| (key == "TALLY_STORE_ID").then(|| "from-env".to_string());
        let config =
            RegisterConfig::load_with(path.clone(), env, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.store_id.as_deref(), Some("from-env"));

        let cli = ConfigOverrides {
            store_id: Some("from-cli".to_string()),
            ..Default::default()
        };
        let config = RegisterConfig::load_with(path, env, &cli).unwrap();
        assert_eq!(config.store_id.as_deref(), Some("from-cli"));
        assert_eq!(config.server_url, "http://file:5000");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RegisterConfig::load_with(
            Some(dir.path().join("absent.toml")),
            no_env,
            &ConfigOverrides::default(),
        )
        .unwrap();
        assert_eq!(config, RegisterConfig::default());
    }

    #[test]
    fn test_validation() {
        let mut config = RegisterConfig::default();
        assert!(config.validate().is_ok());

        config.server_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        config.server_url = "https://pos.example.com".to_string();
        config.store_id = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_toml() {
        let file = write_config("server_url = [");
        let err = RegisterConfig::load_with(
            Some(file.path().to_path_buf()),
            no_env,
            &ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RegisterError::Toml(_)));
    }
}
