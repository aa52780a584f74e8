use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub query_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = var("COURIER_JWT_SECRET", "");
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("COURIER_JWT_SECRET is unset or still a placeholder");
        }

        let port: u16 = var("COURIER_PORT", "4000")
            .parse()
            .context("COURIER_PORT must be a port number")?;
        let ttl_hours: u64 = var("COURIER_TOKEN_TTL_HOURS", "24")
            .parse()
            .context("COURIER_TOKEN_TTL_HOURS must be a whole number of hours")?;
        let timeout_ms: u64 = var("COURIER_QUERY_TIMEOUT_MS", "3000")
            .parse()
            .context("COURIER_QUERY_TIMEOUT_MS must be a whole number of milliseconds")?;

        Ok(Self {
            host: var("COURIER_HOST", "0.0.0.0"),
            port,
            db_path: PathBuf::from(var("COURIER_DB_PATH", "courier.db")),
            jwt_secret,
            token_ttl: Duration::from_secs(ttl_hours * 3600),
            query_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_once_a_secret_is_set() {
        let config = config(&[("COURIER_JWT_SECRET", "s3cr3t-for-tests")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 4000);
        assert_eq!(config.db_path, PathBuf::from("courier.db"));
        assert_eq!(config.token_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(config.query_timeout, Duration::from_secs(3));
    }

    #[test]
    fn missing_or_placeholder_secret_is_refused() {
        assert!(config(&[]).is_err());
        assert!(config(&[("COURIER_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config(&[
            ("COURIER_JWT_SECRET", "s3cr3t-for-tests"),
            ("COURIER_PORT", "8080"),
            ("COURIER_QUERY_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.query_timeout, Duration::from_millis(250));

        assert!(
            super::Config::from_lookup(|key| match key {
                "COURIER_JWT_SECRET" => Some("s3cr3t-for-tests".into()),
                "COURIER_PORT" => Some("not-a-port".into()),
                _ => None,
            })
            .is_err()
        );
    }
}
