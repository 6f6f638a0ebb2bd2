// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Contains the application settings.
//!
//! The application settings are set with a TOML config file. Settings
//! specified in the config file can be overwritten by environment variables.
//! To do so, set an environment variable with the prefix `PALISADE_CTRL_`
//! followed by the field names you want to set. Nested fields are separated
//! by two underscores `__`.
//! ```sh
//! PALISADE_CTRL_<field>__<field-of-field>...
//! ```
//!
//! # Example
//!
//! set the `redis.url` field:
//! ```sh
//! PALISADE_CTRL_REDIS__URL=redis://localhost:6379/
//! ```

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use snafu::Snafu;
use url::Url;

/// Settings handle that can be swapped at runtime
pub type SharedSettings = Arc<ArcSwap<Settings>>;

/// Error produced while loading settings
#[derive(Debug, Snafu)]
pub enum SettingsError {
    /// The configuration sources could not be read or deserialised
    #[snafu(display("failed to load settings: {source}"), context(false))]
    Load {
        /// Underlying configuration error
        source: config::ConfigError,
    },
}

/// The deployment configuration of the Palisade services
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Distributed cache tier; memory-only when absent
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub timeouts: Timeouts,

    #[serde(default)]
    pub token: TokenSettings,
}

impl Settings {
    /// Load the settings from `file_name` with environment overrides applied
    ///
    /// The file may be absent; every section has defaults.
    pub fn load(file_name: &str) -> Result<Settings, SettingsError> {
        let settings = Config::builder()
            .add_source(File::new(file_name, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("PALISADE_CTRL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Wrap the settings for shared, reloadable use
    pub fn into_shared(self) -> SharedSettings {
        Arc::new(ArcSwap::from_pointee(self))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "redis_default_url")]
    pub url: Url,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: redis_default_url(),
        }
    }
}

fn redis_default_url() -> Url {
    Url::parse("redis://localhost:6379/").expect("valid default redis url")
}

/// TTLs for the cache namespaces
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Default time-to-live for durable bindings (users, policies), seconds
    #[serde(default = "default_binding_ttl_secs")]
    pub binding_ttl_secs: u64,
}

impl CacheSettings {
    pub fn binding_ttl(&self) -> Duration {
        Duration::from_secs(self.binding_ttl_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            binding_ttl_secs: default_binding_ttl_secs(),
        }
    }
}

fn default_binding_ttl_secs() -> u64 {
    86400
}

/// Deadlines for calls to external collaborators
#[derive(Debug, Clone, Deserialize)]
pub struct Timeouts {
    #[serde(default = "default_call_timeout_secs")]
    pub user_secs: u64,
    #[serde(default = "default_call_timeout_secs")]
    pub resource_secs: u64,
    #[serde(default = "default_call_timeout_secs")]
    pub policy_secs: u64,
    #[serde(default = "default_call_timeout_secs")]
    pub cache_secs: u64,
}

impl Timeouts {
    pub fn user(&self) -> Duration {
        Duration::from_secs(self.user_secs)
    }

    pub fn resource(&self) -> Duration {
        Duration::from_secs(self.resource_secs)
    }

    pub fn policy(&self) -> Duration {
        Duration::from_secs(self.policy_secs)
    }

    pub fn cache(&self) -> Duration {
        Duration::from_secs(self.cache_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            user_secs: default_call_timeout_secs(),
            resource_secs: default_call_timeout_secs(),
            policy_secs: default_call_timeout_secs(),
            cache_secs: default_call_timeout_secs(),
        }
    }
}

fn default_call_timeout_secs() -> u64 {
    5
}

/// Lifetime of a request token's cached policy map
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSettings {
    #[serde(default = "default_token_ttl_secs")]
    pub ttl_secs: u64,
}

impl TokenSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_token_ttl_secs(),
        }
    }
}

fn default_token_ttl_secs() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();

        assert!(settings.redis.is_none());
        assert_eq!(settings.cache.binding_ttl(), Duration::from_secs(86400));
        assert_eq!(settings.timeouts.user(), Duration::from_secs(5));
        assert_eq!(settings.token.ttl(), Duration::from_secs(600));
    }

    // Tests touching the process environment cannot run in parallel
    #[test]
    #[serial_test::serial]
    fn environment_overrides() {
        std::env::set_var("PALISADE_CTRL_TOKEN__TTL_SECS", "42");

        let settings = Settings::load("does-not-exist.toml").unwrap();

        std::env::remove_var("PALISADE_CTRL_TOKEN__TTL_SECS");

        assert_eq!(settings.token.ttl(), Duration::from_secs(42));
    }

    #[test]
    fn deserialize_toml() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                r#"
                [redis]
                url = "redis://cache.internal:6379/"

                [token]
                ttl_secs = 120
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(
            settings.redis.unwrap().url.as_str(),
            "redis://cache.internal:6379/"
        );
        assert_eq!(settings.token.ttl(), Duration::from_secs(120));
        // untouched sections fall back to their defaults
        assert_eq!(settings.timeouts.policy(), Duration::from_secs(5));
    }
}
