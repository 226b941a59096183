//! Client configuration: defaults, then an optional YAML file, then
//! `ADMIN_`-prefixed environment variables.

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthMode;
use crate::pagination::NextPagePolicy;
use crate::storage::{THEME_STORAGE_KEY, TOKEN_STORAGE_KEY};
use crate::theme::ThemePreference;

pub const ENV_PREFIX: &str = "ADMIN_";

/// Keys read from the environment. Other `ADMIN_*` variables belong to
/// someone else and are ignored.
const ENV_KEYS: &[&str] = &[
    "api_base_url",
    "auth_mode",
    "users_page_size",
    "items_page_size",
    "next_page_policy",
    "default_theme",
    "theme_storage_key",
    "token_storage_key",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
    #[error("{field} must be at least 1")]
    ZeroPageSize { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub auth_mode: AuthMode,
    pub users_page_size: u32,
    pub items_page_size: u32,
    pub next_page_policy: NextPagePolicy,
    pub default_theme: ThemePreference,
    pub theme_storage_key: String,
    pub token_storage_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            auth_mode: AuthMode::Token,
            users_page_size: 10,
            items_page_size: 5,
            next_page_policy: NextPagePolicy::FullPage,
            default_theme: ThemePreference::System,
            theme_storage_key: THEME_STORAGE_KEY.to_string(),
            token_storage_key: TOKEN_STORAGE_KEY.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(ClientConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).only(ENV_KEYS)))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: ClientConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.users_page_size == 0 {
            return Err(ConfigError::ZeroPageSize {
                field: "users_page_size",
            });
        }
        if self.items_page_size == 0 {
            return Err(ConfigError::ZeroPageSize {
                field: "items_page_size",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_yaml(yaml: &str) -> Result<ClientConfig, ConfigError> {
        ClientConfig::from_figment(
            Figment::from(Serialized::defaults(ClientConfig::default())).merge(Yaml::string(yaml)),
        )
    }

    #[test]
    fn yaml_overrides_defaults() {
        let cfg = from_yaml(concat!(
            "api_base_url: https://admin.example.com\n",
            "auth_mode: proxy\n",
            "next_page_policy: exact_count\n",
            "items_page_size: 8\n",
        ))
        .unwrap();
        assert_eq!(cfg.api_base_url, "https://admin.example.com");
        assert_eq!(cfg.auth_mode, AuthMode::Proxy);
        assert_eq!(cfg.next_page_policy, NextPagePolicy::ExactCount);
        assert_eq!(cfg.items_page_size, 8);
        assert_eq!(cfg.users_page_size, 10);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = from_yaml("users_page_size: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroPageSize { field: "users_page_size" }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(from_yaml("colour: blue\n"), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn env_overrides_known_keys_and_ignores_the_rest() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ADMIN_API_BASE_URL", "https://env.example.com");
            jail.set_env("ADMIN_ITEMS_PAGE_SIZE", "20");
            jail.set_env("ADMIN_EMAIL", "someone@example.com");
            let cfg = ClientConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(cfg.api_base_url, "https://env.example.com");
            assert_eq!(cfg.items_page_size, 20);
            Ok(())
        });
    }

    #[test]
    fn env_keys_cover_every_field() {
        let defaults = serde_json::to_value(ClientConfig::default()).unwrap();
        let mut fields: Vec<&str> = defaults
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let mut keys = ENV_KEYS.to_vec();
        keys.sort_unstable();
        fields.sort_unstable();
        assert_eq!(keys, fields);
    }
}
