use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "barky")]
#[command(about = "Runs the barky bookmark service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".barky")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_database")]
    database: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    pub turso_url: Option<String>,
    #[serde(default)]
    pub turso_auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_database() -> String {
    "barky.db".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_sync_interval() -> u64 {
    60
}

impl Default for App {
    fn default() -> Self {
        App {
            database: default_database(),
            port: default_port(),
            turso_url: None,
            turso_auth_token: None,
            sync_interval_seconds: default_sync_interval(),
        }
    }
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    /// Url and token of the remote primary, when both are configured.
    /// Empty strings (an unset `${VAR:-}`) count as absent.
    pub fn replica(&self) -> Option<(&str, &str)> {
        let url = self.turso_url.as_deref().filter(|s| !s.is_empty())?;
        let token = self.turso_auth_token.as_deref().filter(|s| !s.is_empty())?;
        Some((url, token))
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: App,
}

impl Config {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let cfg = Config::load_config(path.as_ref())?;
        Ok(cfg)
    }

    fn load_config(path: &Path) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        let yaml_with_env = Config::substitute_env_vars(&yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find('}') {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!("environment variable '{}' not found", var_name);
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_config_with_defaults() {
        let file = write_config(
            r#"
app:
  database: bookmarks.db
  port: 8081
"#,
        );

        let cfg = Config::new(file.path()).unwrap();
        assert_eq!(cfg.app.get_db(), "bookmarks.db");
        assert_eq!(cfg.app.get_port(), 8081);
        assert_eq!(cfg.app.sync_interval_seconds, 60);
        assert!(cfg.app.replica().is_none());
    }

    #[test]
    fn test_substitutes_default_values() {
        let file = write_config(
            r#"
app:
  database: ${BARKY_TEST_UNSET_DB:-fallback.db}
  turso_url: ${BARKY_TEST_UNSET_URL:-}
  turso_auth_token: secret
"#,
        );

        let cfg = Config::new(file.path()).unwrap();
        assert_eq!(cfg.app.get_db(), "fallback.db");
        assert_eq!(cfg.app.get_port(), 5000);
        assert!(cfg.app.replica().is_none());
    }

    #[test]
    fn test_replica_requires_url_and_token() {
        let app = App {
            turso_url: Some("libsql://example.turso.io".to_string()),
            turso_auth_token: Some("token".to_string()),
            ..App::default()
        };
        assert_eq!(app.replica(), Some(("libsql://example.turso.io", "token")));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Config::new("/definitely/not/here/config.yaml").is_err());
    }
}
