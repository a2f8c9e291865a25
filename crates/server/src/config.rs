use std::{env, net::SocketAddr, time::Duration};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_ADDRESS: &str = "noreply@portal.local";
const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60;
const DEFAULT_SESSION_CAPACITY: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// SMTP settings; absent when `SMTP_HOST` is unset
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

/// Credentials of the principal account created at startup
#[derive(Debug, Clone)]
pub struct PrincipalBootstrap {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub email: Option<EmailConfig>,
    pub principal: Option<PrincipalBootstrap>,
    /// Upper bound on sending one notification email
    pub mail_timeout: Duration,
    /// Sessions unused for this long are dropped
    pub session_idle_timeout: Duration,
    /// Most sessions kept in memory at once
    pub session_capacity: usize,
}

impl ServerConfig {
    /// Reads the configuration from the environment (after loading `.env`).
    ///
    /// | Variable             | Required | Default                |
    /// |----------------------|----------|------------------------|
    /// | `DATABASE_URL`       | yes      |                        |
    /// | `BIND_ADDR`          | no       | `0.0.0.0:3000`         |
    /// | `SMTP_HOST`          | no       | log-only notifications |
    /// | `SMTP_PORT`          | no       | `587`                  |
    /// | `SMTP_FROM`          | no       | `noreply@portal.local` |
    /// | `SMTP_USER`          | no       |                        |
    /// | `SMTP_PASSWORD`      | no       |                        |
    /// | `PRINCIPAL_EMAIL`    | no       | no bootstrap account   |
    /// | `PRINCIPAL_PASSWORD` | no       |                        |
    /// | `MAIL_TIMEOUT_SECS`  | no       | `5`                    |
    /// | `SESSION_IDLE_SECS`  | no       | `3600`                 |
    /// | `SESSION_CAPACITY`   | no       | `10000`                |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = parse_or("BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?;

        let email = match env::var("SMTP_HOST") {
            Ok(smtp_host) => Some(EmailConfig {
                smtp_host,
                smtp_port: parse_or("SMTP_PORT", Some(DEFAULT_SMTP_PORT))?,
                from_address: env::var("SMTP_FROM")
                    .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
                smtp_user: env::var("SMTP_USER").ok(),
                smtp_password: env::var("SMTP_PASSWORD").ok(),
            }),
            Err(_) => None,
        };

        let principal = match (env::var("PRINCIPAL_EMAIL"), env::var("PRINCIPAL_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(PrincipalBootstrap { email, password }),
            (Ok(_), Err(_)) => return Err(ConfigError::Missing("PRINCIPAL_PASSWORD")),
            _ => None,
        };

        let mail_timeout_secs: u64 = parse_or("MAIL_TIMEOUT_SECS", Some(DEFAULT_MAIL_TIMEOUT_SECS))?;
        let session_idle_secs: u64 = parse_or("SESSION_IDLE_SECS", Some(DEFAULT_SESSION_IDLE_SECS))?;

        Ok(Self {
            database_url,
            bind_addr,
            email,
            principal,
            mail_timeout: Duration::from_secs(mail_timeout_secs),
            session_idle_timeout: Duration::from_secs(session_idle_secs),
            session_capacity: parse_or("SESSION_CAPACITY", Some(DEFAULT_SESSION_CAPACITY))?,
        })
    }
}

/// Parses `name` from the environment, falling back to `default` when unset
fn parse_or<T: std::str::FromStr>(name: &'static str, default: Option<T>) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => default.ok_or(ConfigError::Missing(name)),
    }
}
