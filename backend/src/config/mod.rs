use config::{Config, ConfigError, Environment};
use dotenv::dotenv;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::ops::RangeInclusive;

/// A token lives at least a day and at most ten years.
const TOKEN_TTL_DAYS: RangeInclusive<i64> = 1..=3650;

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub token_ttl_days: i64,
    pub db_pool_size: u32,
    #[serde(deserialize_with = "comma_list")]
    pub admin_tckns: Vec<String>,
}

fn comma_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

impl AppConfig {
    /// Loads `.env` (if present) and then the process environment over the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_env(Environment::default())
    }

    // Values stay strings until serde asks for a number, so a numeric-looking
    // secret is kept verbatim.
    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8000)?
            .set_default("token_ttl_days", 7)?
            .set_default("db_pool_size", 8)?
            .set_default("admin_tckns", "")?
            .add_source(env)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !TOKEN_TTL_DAYS.contains(&self.token_ttl_days) {
            return Err(ConfigError::Message(format!(
                "TOKEN_TTL_DAYS must be between {} and {}, got {}",
                TOKEN_TTL_DAYS.start(),
                TOKEN_TTL_DAYS.end(),
                self.token_ttl_days
            )));
        }
        if self.db_pool_size == 0 {
            return Err(ConfigError::Message(
                "DB_POOL_SIZE must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_admin(&self, tckn: &str) -> bool {
        self.admin_tckns.iter().any(|admin| admin == tckn)
    }
}

// The secret and the connection string carry credentials.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token_ttl_days", &self.token_ttl_days)
            .field("db_pool_size", &self.db_pool_size)
            .field("admin_tckns", &self.admin_tckns)
            .finish()
    }
}
