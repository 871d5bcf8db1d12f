// membership-service/src/config.rs
use derive_more::Display;
use log::warn;
use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:9090";
const DEFAULT_STORAGE_DIR: &str = "./storage";
const DEV_JWT_SECRET: &str = "membership_service_dev_secret";
// bcrypt accepts costs 4..=31
const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;
const TOKEN_TTL_DAYS_RANGE: RangeInclusive<i64> = 1..=3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            other => Err(ConfigError::Invalid {
                key: "STORAGE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Display, PartialEq)]
pub enum ConfigError {
    #[display(fmt = "invalid value {:?} for {}", value, key)]
    Invalid { key: &'static str, value: String },
}

impl std::error::Error for ConfigError {}

/// Token and password hashing settings shared by the request handlers.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_days: 7,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub storage_backend: StorageBackend,
    pub storage_dir: PathBuf,
    pub cors_origin: Option<String>,
    pub auth: AuthSettings,
}

impl AppConfig {
    // Reads .env (if any) and then the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = AuthSettings::default();

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("⚠️ JWT_SECRET not set, using the development secret");
                defaults.jwt_secret
            }
        };

        Ok(Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            storage_backend: match lookup("STORAGE_BACKEND") {
                Some(value) => value.parse()?,
                None => StorageBackend::File,
            },
            storage_dir: lookup("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
            cors_origin: lookup("CORS_ORIGIN").filter(|origin| !origin.is_empty()),
            auth: AuthSettings {
                jwt_secret,
                token_ttl_days: parse_in_range(
                    "TOKEN_TTL_DAYS",
                    &lookup,
                    defaults.token_ttl_days,
                    TOKEN_TTL_DAYS_RANGE,
                )?,
                bcrypt_cost: parse_in_range(
                    "BCRYPT_COST",
                    &lookup,
                    defaults.bcrypt_cost,
                    BCRYPT_COST_RANGE,
                )?,
            },
        })
    }
}

fn parse_in_range<T, F>(
    key: &'static str,
    lookup: &F,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd,
    F: Fn(&'static str) -> Option<String>,
{
    let value = match lookup(key) {
        Some(value) => value,
        None => return Ok(default),
    };

    match value.trim().parse::<T>() {
        Ok(parsed) if range.contains(&parsed) => Ok(parsed),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}
