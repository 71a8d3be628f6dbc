/*
 * Responsibility
 * - Load settings from the environment (.env via dotenvy)
 * - Validate them up front (missing/invalid -> startup fails)
 * - Hand out one immutable Config; nothing else reads the environment
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::auth::domain_policy::DEFAULT_ALLOWED_DOMAINS;

/// 30 days.
pub const DEFAULT_SESSION_MAX_AGE_SECONDS: u64 = 30 * 24 * 60 * 60;
const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(std::env::var("APP_ENV").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Verbose auth diagnostics outside production.
    pub fn debug_logging(&self) -> bool {
        !self.is_production()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    // None -> in-memory user store
    pub database_url: Option<String>,
    pub cors_allowed_origins: Vec<String>,

    // Identity provider credentials (the OAuth exchange happens upstream)
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,

    // HS256 secret for session tokens
    pub session_secret: String,
    // HS256 secret shared with the provider integration for identity assertions
    pub signin_callback_secret: String,
    pub session_max_age_seconds: u64,
    pub allowed_email_domains: Vec<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets and the database URL (may embed a password) stay out of logs.
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("database_configured", &self.database_url.is_some())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("google_client_id", &self.google_client_id)
            .field("google_client_secret_set", &self.google_client_secret.is_some())
            .field("session_max_age_seconds", &self.session_max_age_seconds)
            .field("allowed_email_domains", &self.allowed_email_domains)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = match non_empty("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        // The in-memory store loses every user on restart; development only.
        let database_url = non_empty("DATABASE_URL");
        if database_url.is_none() && app_env.is_production() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let cors_allowed_origins = split_list(&lookup("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        let google_client_id = non_empty("GOOGLE_CLIENT_ID");
        let google_client_secret = non_empty("GOOGLE_CLIENT_SECRET");

        let session_secret =
            non_empty("SESSION_SECRET").ok_or(ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Invalid("SESSION_SECRET"));
        }

        let signin_callback_secret = non_empty("SIGNIN_CALLBACK_SECRET")
            .ok_or(ConfigError::Missing("SIGNIN_CALLBACK_SECRET"))?;
        if signin_callback_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Invalid("SIGNIN_CALLBACK_SECRET"));
        }

        let session_max_age_seconds = match non_empty("SESSION_MAX_AGE_SECONDS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid("SESSION_MAX_AGE_SECONDS"))?,
            None => DEFAULT_SESSION_MAX_AGE_SECONDS,
        };

        let allowed_email_domains = match non_empty("ALLOWED_EMAIL_DOMAINS") {
            Some(v) => split_list(&v),
            None => DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        };
        if allowed_email_domains.is_empty() {
            return Err(ConfigError::Invalid("ALLOWED_EMAIL_DOMAINS"));
        }

        Ok(Self {
            addr,
            app_env,
            database_url,
            cors_allowed_origins,
            google_client_id,
            google_client_secret,
            session_secret,
            signin_callback_secret,
            session_max_age_seconds,
            allowed_email_domains,
        })
    }

    pub fn identity_provider_configured(&self) -> bool {
        self.google_client_id.is_some() && self.google_client_secret.is_some()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const CALLBACK_SECRET: &str = "fedcba9876543210fedcba9876543210";

    /// `vars` on top of a valid callback secret.
    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let mut env: HashMap<String, String> = HashMap::new();
        env.insert("SIGNIN_CALLBACK_SECRET".to_string(), CALLBACK_SECRET.to_string());
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .fold(env, |mut env, (k, v)| {
                env.insert(k, v);
                env
            });
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("SESSION_SECRET", SECRET)]).unwrap();
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert!(config.database_url.is_none());
        assert_eq!(config.session_max_age_seconds, 2_592_000);
        assert_eq!(
            config.allowed_email_domains,
            vec!["iitkgp.ac.in", "kgpian.iitkgp.ac.in", "gmail.com"]
        );
        assert!(!config.identity_provider_configured());
    }

    #[test]
    fn test_session_secret_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("SESSION_SECRET"));
        assert_eq!(
            load(&[("SESSION_SECRET", "short")]).unwrap_err(),
            ConfigError::Invalid("SESSION_SECRET")
        );
    }

    #[test]
    fn test_signin_callback_secret_is_required() {
        assert_eq!(
            load(&[("SESSION_SECRET", SECRET), ("SIGNIN_CALLBACK_SECRET", "")]).unwrap_err(),
            ConfigError::Missing("SIGNIN_CALLBACK_SECRET")
        );
        assert_eq!(
            load(&[("SESSION_SECRET", SECRET), ("SIGNIN_CALLBACK_SECRET", "short")]).unwrap_err(),
            ConfigError::Invalid("SIGNIN_CALLBACK_SECRET")
        );
    }

    #[test]
    fn test_production_requires_database_url() {
        assert_eq!(
            load(&[("SESSION_SECRET", SECRET), ("APP_ENV", "production")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert!(load(&[("SESSION_SECRET", SECRET), ("APP_ENV", "development")]).is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SESSION_SECRET", SECRET),
            ("PORT", "8080"),
            ("APP_ENV", "PROD"),
            ("DATABASE_URL", "postgres://localhost/auth"),
            ("SESSION_MAX_AGE_SECONDS", "3600"),
            ("ALLOWED_EMAIL_DOMAINS", " example.org , ,example.com"),
            ("CORS_ALLOWED_ORIGINS", "https://app.example.org"),
            ("GOOGLE_CLIENT_ID", "client"),
            ("GOOGLE_CLIENT_SECRET", "shh"),
        ])
        .unwrap();

        assert_eq!(config.addr.port(), 8080);
        assert!(config.app_env.is_production());
        assert!(!config.app_env.debug_logging());
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/auth"));
        assert_eq!(config.session_max_age_seconds, 3600);
        assert_eq!(config.allowed_email_domains, vec!["example.org", "example.com"]);
        assert_eq!(config.cors_allowed_origins, vec!["https://app.example.org"]);
        assert!(config.identity_provider_configured());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert_eq!(
            load(&[("SESSION_SECRET", SECRET), ("PORT", "http")]).unwrap_err(),
            ConfigError::Invalid("PORT")
        );
        assert_eq!(
            load(&[("SESSION_SECRET", SECRET), ("SESSION_MAX_AGE_SECONDS", "0")]).unwrap_err(),
            ConfigError::Invalid("SESSION_MAX_AGE_SECONDS")
        );
        assert_eq!(
            load(&[("SESSION_SECRET", SECRET), ("ALLOWED_EMAIL_DOMAINS", " , ")]).unwrap_err(),
            ConfigError::Invalid("ALLOWED_EMAIL_DOMAINS")
        );
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let config = load(&[
            ("SESSION_SECRET", SECRET),
            ("GOOGLE_CLIENT_SECRET", "super-secret-value"),
            ("DATABASE_URL", "postgres://user:pw@db/auth"),
        ])
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains(SECRET));
        assert!(!rendered.contains(CALLBACK_SECRET));
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("pw@db"));
    }
}
