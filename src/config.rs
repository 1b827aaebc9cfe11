//! Environment-driven configuration
//! Mission: Parse all deployment knobs once at startup, fail loudly on bad setups

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

/// Deployment environment. Affects rate-limit ceilings, error detail
/// exposure, and whether insecure secret fallbacks are tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Token signing configuration. Access and refresh tokens use separate
/// secrets and lifetimes and are never interchangeable.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Hosted relational store (Supabase PostgREST) credentials.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub jwt: JwtConfig,
    pub supabase: SupabaseConfig,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
}

const DEV_ACCESS_SECRET: &str = "dev-access-secret-change-in-production-minimum-32-chars";
const DEV_REFRESH_SECRET: &str = "dev-refresh-secret-change-in-production-minimum-32-chars";

impl AppConfig {
    /// Build configuration from the process environment.
    ///
    /// Missing Supabase credentials are always fatal. Missing JWT secrets are
    /// fatal in production; development gets a labelled insecure fallback.
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_env();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .context("Invalid PORT")?;

        let access_secret = secret_from_env("JWT_SECRET", DEV_ACCESS_SECRET, environment)?;
        let refresh_secret =
            secret_from_env("JWT_REFRESH_SECRET", DEV_REFRESH_SECRET, environment)?;

        let access_ttl = ttl_from_env("JWT_ACCESS_EXPIRES_IN", "15m")?;
        let refresh_ttl = ttl_from_env("JWT_REFRESH_EXPIRES_IN", "7d")?;

        let supabase_url = env::var("SUPABASE_URL").ok().filter(|v| !v.trim().is_empty());
        let supabase_key = env::var("SUPABASE_ANON_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let (Some(url), Some(anon_key)) = (supabase_url, supabase_key) else {
            bail!("Missing Supabase credentials: set SUPABASE_URL and SUPABASE_ANON_KEY");
        };

        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let openai_model =
            env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());

        Ok(Self {
            environment,
            port,
            jwt: JwtConfig {
                access_secret,
                refresh_secret,
                access_ttl,
                refresh_ttl,
            },
            supabase: SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
            },
            openai_api_key,
            openai_model,
        })
    }
}

fn secret_from_env(var: &str, dev_fallback: &str, environment: Environment) -> Result<String> {
    match env::var(var).ok().filter(|v| !v.trim().is_empty()) {
        Some(secret) => Ok(secret),
        None if environment.is_production() => {
            bail!("{var} must be set in production")
        }
        None => Ok(dev_fallback.to_string()),
    }
}

fn ttl_from_env(var: &str, default: &str) -> Result<Duration> {
    let raw = env::var(var).unwrap_or_else(|_| default.to_string());
    parse_ttl(&raw).with_context(|| format!("Invalid {var}: {raw:?}"))
}

/// Parse a time-to-live string like `30s`, `15m`, `12h`, or `7d`.
pub fn parse_ttl(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let (digits, unit) = raw.split_at(raw.len().saturating_sub(1));
    let value = digits
        .parse::<u64>()
        .with_context(|| format!("Invalid TTL value: {raw:?}"))?;

    let seconds = match unit {
        "s" => value,
        "m" => value * 60,
        "h" => value * 3600,
        "d" => value * 86_400,
        _ => bail!("Invalid TTL unit in {raw:?} (expected s, m, h or d)"),
    };

    Ok(Duration::from_secs(seconds))
}
