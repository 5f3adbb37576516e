use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, bail};
use jsonwebtoken::Algorithm;

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub token_ttl_minutes: i64,
    /// Whether the `user` mutation rejects a missing `fullname`.
    pub fullname_required: bool,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://blog.db?mode=rwc".into(),
            database_max_connections: 5,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            jwt_secret: "development-secret-change-me".into(),
            jwt_algorithm: Algorithm::HS256,
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            fullname_required: true,
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source, falling back to
    /// defaults for anything unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);
        let database_max_connections = parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")?
            .unwrap_or(defaults.database_max_connections);
        let bind_addr = parse_var(&lookup, "BIND_ADDR")?.unwrap_or(defaults.bind_addr);
        let jwt_secret = lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret);
        let jwt_algorithm = match lookup("JWT_ALGORITHM") {
            Some(raw) => parse_algorithm(&raw)?,
            None => defaults.jwt_algorithm,
        };
        let token_ttl_minutes = parse_var(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES")?
            .unwrap_or(defaults.token_ttl_minutes);
        let fullname_required =
            parse_var(&lookup, "FULLNAME_REQUIRED")?.unwrap_or(defaults.fullname_required);
        let log_json = matches!(lookup("LOG_FORMAT").as_deref(), Some("json"));

        if jwt_secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if database_max_connections == 0 {
            bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }
        if token_ttl_minutes <= 0 {
            bail!("ACCESS_TOKEN_EXPIRE_MINUTES must be positive");
        }
        if token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            bail!("ACCESS_TOKEN_EXPIRE_MINUTES must be at most {MAX_TOKEN_TTL_MINUTES}");
        }

        Ok(Self {
            database_url,
            database_max_connections,
            bind_addr,
            jwt_secret,
            jwt_algorithm,
            token_ttl_minutes,
            fullname_required,
            log_json,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> anyhow::Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {key}: {raw:?}"))
        })
        .transpose()
}

// Only shared-secret algorithms make sense with a single JWT_SECRET.
fn parse_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    let algorithm = Algorithm::from_str(raw.trim())
        .with_context(|| format!("invalid value for JWT_ALGORITHM: {raw:?}"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => bail!("JWT_ALGORITHM {other:?} is not supported, use HS256, HS384 or HS512"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8000");
        assert_eq!(config.token_ttl_minutes, 30);
        assert_eq!(config.jwt_algorithm, Algorithm::HS256);
        assert!(config.fullname_required);
        assert!(!config.log_json);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("BIND_ADDR", "0.0.0.0:9000"),
            ("JWT_ALGORITHM", "HS512"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
            ("FULLNAME_REQUIRED", "false"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.jwt_algorithm, Algorithm::HS512);
        assert_eq!(config.token_ttl_minutes, 5);
        assert!(!config.fullname_required);
        assert!(config.log_json);
    }

    #[test]
    fn test_rejects_asymmetric_algorithm() {
        let err = config_from(&[("JWT_ALGORITHM", "RS256")]).unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(config_from(&[("BIND_ADDR", "nowhere")]).is_err());
        assert!(config_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "0")]).is_err());
        assert!(config_from(&[("FULLNAME_REQUIRED", "maybe")]).is_err());
        assert!(config_from(&[("JWT_SECRET", "")]).is_err());
    }

    #[test]
    fn test_rejects_oversized_ttl() {
        let max = i64::MAX.to_string();
        assert!(config_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", max.as_str())]).is_err());
        assert!(config_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "525601")]).is_err());

        let config = config_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "525600")]).unwrap();
        assert_eq!(config.token_ttl_minutes, MAX_TOKEN_TTL_MINUTES);
    }
}
