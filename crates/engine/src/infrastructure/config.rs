//! Engine configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `SERVER_HOST` | `0.0.0.0` |
//! | `SERVER_PORT` / `PORT` | `3001` |
//! | `JWT_SECRET` | `supersecret` |
//! | `SPACE_API_URL` | - |
//! | `SPACE_API_TOKEN` | - |
//! | `SPACES_FILE` | - (required when `SPACE_API_URL` is unset) |
//! | `OUTBOUND_BUFFER` | `256` |
//! | `MAX_STEP` | unset (no step limit) |
//! | `EMPTY_SPACE_POLICY` | `evict` (`evict` or `retain`) |
//! | `EMPTY_SPACE_TTL_SECS` | `300` |
//! | `CORS_ALLOWED_ORIGINS` | unset (no CORS layer) |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use metaverse_domain::MovementRules;

use crate::stores::EmptySpacePolicy;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_JWT_SECRET: &str = "supersecret";
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;
pub const DEFAULT_EMPTY_SPACE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("Either SPACE_API_URL or SPACES_FILE must be set")]
    NoSpaceSource,
}

/// Where space layouts come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpaceSource {
    Api { url: String, token: Option<String> },
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub space_source: SpaceSource,
    pub outbound_buffer: usize,
    pub movement: MovementRules,
    pub empty_space_policy: EmptySpacePolicy,
    pub cors_allowed_origins: Option<String>,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match get("SERVER_PORT").or_else(|| get("PORT")) {
            Some(raw) => parse("SERVER_PORT", raw)?,
            None => DEFAULT_PORT,
        };
        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.into());

        let space_source = match (get("SPACE_API_URL"), get("SPACES_FILE")) {
            (Some(url), _) => SpaceSource::Api {
                url,
                token: get("SPACE_API_TOKEN"),
            },
            (None, Some(path)) => SpaceSource::File(PathBuf::from(path)),
            (None, None) => return Err(ConfigError::NoSpaceSource),
        };

        let outbound_buffer = match get("OUTBOUND_BUFFER") {
            Some(raw) => {
                let size: usize = parse("OUTBOUND_BUFFER", raw.clone())?;
                if size == 0 {
                    return Err(invalid("OUTBOUND_BUFFER", raw, "must be at least 1"));
                }
                size
            }
            None => DEFAULT_OUTBOUND_BUFFER,
        };

        let max_step = get("MAX_STEP")
            .map(|raw| parse::<u32>("MAX_STEP", raw))
            .transpose()?;

        let ttl = match get("EMPTY_SPACE_TTL_SECS") {
            Some(raw) => Duration::from_secs(parse("EMPTY_SPACE_TTL_SECS", raw)?),
            None => DEFAULT_EMPTY_SPACE_TTL,
        };
        let empty_space_policy = match get("EMPTY_SPACE_POLICY").as_deref() {
            None | Some("evict") => EmptySpacePolicy::Evict,
            Some("retain") => EmptySpacePolicy::Retain { ttl },
            Some(other) => {
                return Err(invalid(
                    "EMPTY_SPACE_POLICY",
                    other.to_string(),
                    "expected 'evict' or 'retain'",
                ))
            }
        };

        Ok(Self {
            host,
            port,
            jwt_secret,
            space_source,
            outbound_buffer,
            movement: MovementRules { max_step },
            empty_space_policy,
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(key: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        let reason = e.to_string();
        invalid(key, raw, reason)
    })
}

fn invalid(key: &'static str, value: String, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value,
        reason: reason.into(),
    }
}
