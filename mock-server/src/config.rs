use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Environment variables with this prefix override the defaults, e.g.
/// `MOCK_PORT=9000`.
pub const ENV_PREFIX: &str = "MOCK_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    pub host: String,
    pub port: u16,
    /// Seeded on startup so there is always someone to log in as.
    pub first_superuser: String,
    pub first_superuser_password: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            first_superuser: "admin@example.com".to_string(),
            first_superuser_password: "changethis".to_string(),
        }
    }
}

impl MockConfig {
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::from_figment(
            Figment::from(Serialized::defaults(MockConfig::default()))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, Box<figment::Error>> {
        figment.extract().map_err(Box::new)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
