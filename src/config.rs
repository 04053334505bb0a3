use std::env::var_os;
use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use toml::from_str;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub search: SearchMode,
    #[serde(default)]
    pub resync: ResyncPolicy,
}

impl Config {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let val = from_str(
            &read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?,
        )
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(val)
    }

    /// Reads the file named by `PHONEBOOK_CONFIG` or falls back to the defaults.
    pub fn from_env() -> Result<Self> {
        match var_os("PHONEBOOK_CONFIG") {
            Some(path) => Self::read(path),
            None => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            search: SearchMode::default(),
            resync: ResyncPolicy::default(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "phonebook".to_owned()
}

/// Which query the search filter is evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Filter on the query which was just entered.
    #[default]
    Current,
    /// Filter on the query entered before the current one, as the web front-end used to.
    Lagging,
}

/// How the directory is brought up to date after a successful mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResyncPolicy {
    /// Always fetch the whole directory again.
    #[default]
    Pessimistic,
    /// Patch updated and deleted contacts locally, creations still fetch the whole directory.
    Optimistic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = from_str::<Config>("").unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.user_agent, "phonebook");
        assert_eq!(config.search, SearchMode::Current);
        assert_eq!(config.resync, ResyncPolicy::Pessimistic);
    }

    #[test]
    fn parses_all_settings() {
        let config = from_str::<Config>(
            r#"
timeout = 5
user_agent = "phonebook tests"
search = "lagging"
resync = "optimistic"
"#,
        )
        .unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.user_agent, "phonebook tests");
        assert_eq!(config.search, SearchMode::Lagging);
        assert_eq!(config.resync, ResyncPolicy::Optimistic);
    }

    #[test]
    fn rejects_unknown_settings() {
        from_str::<Config>("api_url = \"http://localhost\"").unwrap_err();
        from_str::<Config>("search = \"fuzzy\"").unwrap_err();
    }
}
