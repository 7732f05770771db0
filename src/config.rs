//! Configuration for the gatehouse service

use jsonwebtoken::Algorithm;

use crate::error::{AuthError, Result};

/// Service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Symmetric key for access-token signing
    pub jwt_secret: String,

    /// HMAC algorithm for access tokens (HS256/HS384/HS512)
    pub jwt_algorithm: Algorithm,

    /// Access-token lifetime in minutes
    pub access_ttl_minutes: i64,

    /// Refresh-token lifetime in minutes
    pub refresh_ttl_minutes: i64,

    /// Seconds between janitor sweeps of revoked tokens
    pub sweep_interval_secs: u64,

    /// Bind address for the HTTP server
    pub bind_addr: String,

    /// Webhook URL for out-of-band credential delivery (None disables it)
    pub notify_webhook_url: Option<String>,

    /// Generated password length (clamped to the policy minimum)
    pub generated_password_len: usize,

    /// Roles seeded into the store at boot
    pub seed_roles: Vec<String>,

    /// Named secrets seeded into the store at boot
    pub seed_secrets: Vec<(String, String)>,
}

impl AuthConfig {
    /// Create config with sensible defaults
    ///
    /// The JWT secret and notifier webhook honour their environment
    /// variables even here, so tests and demos never sign with a secret
    /// that production also knows.
    pub fn new() -> Self {
        Self {
            jwt_secret: std::env::var("GATEHOUSE_JWT_SECRET")
                .unwrap_or_else(|_| "gatehouse-default-secret-change-me".to_string()),
            jwt_algorithm: Algorithm::HS256,
            access_ttl_minutes: 30,
            refresh_ttl_minutes: 1440, // 1 day
            sweep_interval_secs: 60,
            bind_addr: "0.0.0.0:8000".to_string(),
            notify_webhook_url: std::env::var("GATEHOUSE_NOTIFY_URL").ok(),
            generated_password_len: 16,
            seed_roles: vec!["Admin".to_string(), "User".to_string()],
            seed_secrets: Vec::new(),
        }
    }

    /// Load configuration from `GATEHOUSE_*` environment variables,
    /// falling back to defaults for anything unset
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::new();
        if let Ok(alg) = std::env::var("GATEHOUSE_JWT_ALGORITHM") {
            cfg.jwt_algorithm = parse_hmac_algorithm(&alg)?;
        }
        if let Some(v) = env_parse("GATEHOUSE_ACCESS_TTL_MINUTES")? {
            cfg.access_ttl_minutes = v;
        }
        if let Some(v) = env_parse("GATEHOUSE_REFRESH_TTL_MINUTES")? {
            cfg.refresh_ttl_minutes = v;
        }
        if let Some(v) = env_parse("GATEHOUSE_SWEEP_INTERVAL_SECS")? {
            cfg.sweep_interval_secs = nonzero_sweep_interval(v)?;
        }
        if let Some(v) = env_parse("GATEHOUSE_PASSWORD_LENGTH")? {
            cfg.generated_password_len = v;
        }
        if let Ok(addr) = std::env::var("GATEHOUSE_BIND_ADDR") {
            cfg.bind_addr = addr;
        }
        if let Ok(roles) = std::env::var("GATEHOUSE_SEED_ROLES") {
            cfg.seed_roles = roles
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
        }
        if let Ok(secrets) = std::env::var("GATEHOUSE_SECRETS") {
            cfg.seed_secrets = parse_secret_pairs(&secrets)?;
        }
        Ok(cfg)
    }

    /// Override JWT secret
    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = secret.into();
        self
    }

    /// Override access-token lifetime
    pub fn with_access_ttl_minutes(mut self, minutes: i64) -> Self {
        self.access_ttl_minutes = minutes;
        self
    }

    /// Override refresh-token lifetime
    pub fn with_refresh_ttl_minutes(mut self, minutes: i64) -> Self {
        self.refresh_ttl_minutes = minutes;
        self
    }

    /// Override the janitor sweep cadence
    pub fn with_sweep_interval_secs(mut self, secs: u64) -> Self {
        self.sweep_interval_secs = secs;
        self
    }

    /// Override the HTTP bind address
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an env var with `FromStr`, treating absence as `None`
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AuthError::Config(format!("invalid value for {key}: {raw}"))),
        Err(_) => Ok(None),
    }
}

/// Parse `name=value` pairs separated by commas
fn parse_secret_pairs(raw: &str) -> Result<Vec<(String, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| {
                    AuthError::Config(format!("secret entry missing '=': {entry}"))
                })
        })
        .collect()
}

/// The janitor ticker cannot run on a zero period
fn nonzero_sweep_interval(secs: u64) -> Result<u64> {
    if secs == 0 {
        return Err(AuthError::Config(
            "GATEHOUSE_SWEEP_INTERVAL_SECS must be at least 1".to_string(),
        ));
    }
    Ok(secs)
}

/// Access tokens are signed with a shared secret, so only the HMAC
/// family is accepted here
fn parse_hmac_algorithm(name: &str) -> Result<Algorithm> {
    match name.trim().to_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(AuthError::Config(format!(
            "unsupported signing algorithm: {other}"
        ))),
    }
}
