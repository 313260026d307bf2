//! Runtime configuration loaded from the environment.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

use onboard_core::validation::is_affirmative;
use onboard_signup::PricingConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    /// Use Postgres for accounts instead of the in-memory repository.
    pub use_persistent_stores: bool,
    pub signup_draft_ttl: chrono::Duration,
    pub session_ttl: chrono::Duration,
    pub sweep_interval: std::time::Duration,
    pub pricing: PricingConfig,
    pub signup_redirect_url: String,
    pub login_redirect_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            use_persistent_stores: false,
            signup_draft_ttl: chrono::Duration::seconds(3600),
            session_ttl: chrono::Duration::seconds(86_400),
            sweep_interval: std::time::Duration::from_secs(60),
            pricing: PricingConfig::default(),
            signup_redirect_url: "/dashboard".to_string(),
            login_redirect_url: "/dashboard".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Unset keys keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = lookup("DATABASE_URL");
        let use_persistent_stores = lookup("USE_PERSISTENT_STORES")
            .map(|v| is_affirmative(&v))
            .unwrap_or(false);
        if use_persistent_stores && database_url.is_none() {
            bail!("USE_PERSISTENT_STORES is set but DATABASE_URL is missing");
        }

        let draft_ttl_secs: i64 = parse_or(&lookup, "SIGNUP_DRAFT_TTL_SECS", 3600)?;
        let session_ttl_secs: i64 = parse_or(&lookup, "SESSION_TTL_SECS", 86_400)?;
        let sweep_secs: u64 = parse_or(&lookup, "SWEEP_INTERVAL_SECS", 60)?;
        if draft_ttl_secs <= 0 || session_ttl_secs <= 0 || sweep_secs == 0 {
            bail!("TTL and sweep interval settings must be positive");
        }

        Ok(Self {
            bind_addr: parse_or(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            database_url,
            use_persistent_stores,
            signup_draft_ttl: chrono::Duration::seconds(draft_ttl_secs),
            session_ttl: chrono::Duration::seconds(session_ttl_secs),
            sweep_interval: std::time::Duration::from_secs(sweep_secs),
            pricing: PricingConfig {
                startup_fee_cents: parse_or(
                    &lookup,
                    "STARTUP_FEE_CENTS",
                    defaults.pricing.startup_fee_cents,
                )?,
                extra_plate_price_cents: parse_or(
                    &lookup,
                    "EXTRA_PLATE_PRICE_CENTS",
                    defaults.pricing.extra_plate_price_cents,
                )?,
                monthly_fee_cents: parse_or(
                    &lookup,
                    "MONTHLY_FEE_CENTS",
                    defaults.pricing.monthly_fee_cents,
                )?,
            },
            signup_redirect_url: lookup("SIGNUP_REDIRECT_URL")
                .unwrap_or(defaults.signup_redirect_url),
            login_redirect_url: lookup("LOGIN_REDIRECT_URL").unwrap_or(defaults.login_redirect_url),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid value, got {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(!config.use_persistent_stores);
        assert_eq!(config.signup_draft_ttl, chrono::Duration::hours(1));
        assert_eq!(config.pricing, PricingConfig::default());
        assert_eq!(config.login_redirect_url, "/dashboard");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = from_pairs(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("SESSION_TTL_SECS", "120"),
            ("EXTRA_PLATE_PRICE_CENTS", "3000"),
            ("SIGNUP_REDIRECT_URL", "/welcome"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.session_ttl, chrono::Duration::minutes(2));
        assert_eq!(config.pricing.extra_plate_price_cents, 3000);
        assert_eq!(config.signup_redirect_url, "/welcome");
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(from_pairs(&[("SESSION_TTL_SECS", "soon")]).is_err());
        assert!(from_pairs(&[("SWEEP_INTERVAL_SECS", "0")]).is_err());
        assert!(from_pairs(&[("USE_PERSISTENT_STORES", "true")]).is_err());
    }

    #[test]
    fn persistent_stores_need_a_database_url() {
        let config = from_pairs(&[
            ("USE_PERSISTENT_STORES", "yes"),
            ("DATABASE_URL", "postgres://localhost/onboard"),
        ])
        .unwrap();
        assert!(config.use_persistent_stores);
    }
}
