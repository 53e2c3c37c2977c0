use std::time::Duration;

/// Longest error message stored on a failed send log row, in characters.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 512;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not valid: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Tunables of the campaign dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Recipients pulled per batch.
    pub batch_size: u32,
    /// Sleep when no campaign is Sending.
    pub idle_poll: Duration,
    /// Sleep between batches while a campaign is draining.
    pub active_poll: Duration,
    /// Sleep after an unexpected loop error.
    pub error_backoff: Duration,
    /// Truncation limit for stored error messages.
    pub error_message_limit: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            idle_poll: Duration::from_secs(30),
            active_poll: Duration::from_secs(1),
            error_backoff: Duration::from_secs(5),
            error_message_limit: MAX_ERROR_MESSAGE_CHARS,
        }
    }
}

/// Active RSA key used to decrypt SMTP passwords sent by the browser.
#[derive(Clone, Default)]
pub struct SmtpKeyConfig {
    pub key_id: String,
    /// PKCS#8 PEM. Empty disables decryption.
    pub private_key_pem: String,
    /// SPKI PEM handed to clients.
    pub public_key_pem: String,
}

impl std::fmt::Debug for SmtpKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpKeyConfig")
            .field("key_id", &self.key_id)
            .field("private_key_pem", &"<redacted>")
            .field("public_key_pem", &self.public_key_pem)
            .finish()
    }
}

/// Centralized environment configuration.
/// All env vars and defaults are defined here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL. Required.
    pub database_url: String,

    /// HTTP listen port.
    /// Default: 3000
    pub port: u16,

    /// Delivery adapter: "smtp" or "console".
    /// Default: smtp
    pub mail_adapter: String,

    pub dispatch: DispatchConfig,

    pub smtp_key: SmtpKeyConfig,
}

impl Config {
    /// Build config from environment variables.
    /// Returns an error if required vars are missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from any variable source. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let port = parse_or(&lookup, "PORT", 3000u16)?;

        let mail_adapter = lookup("MAIL_ADAPTER").unwrap_or_else(|| "smtp".to_string());

        let defaults = DispatchConfig::default();
        let batch_size: u32 = parse_or(&lookup, "DISPATCH_BATCH_SIZE", defaults.batch_size)?;
        if batch_size == 0 {
            return Err(ConfigError::Invalid {
                name: "DISPATCH_BATCH_SIZE",
                value: "0".to_string(),
            });
        }
        let dispatch = DispatchConfig {
            batch_size,
            idle_poll: Duration::from_secs(parse_or(
                &lookup,
                "DISPATCH_IDLE_POLL_SECS",
                defaults.idle_poll.as_secs(),
            )?),
            active_poll: Duration::from_millis(parse_or(
                &lookup,
                "DISPATCH_ACTIVE_POLL_MS",
                defaults.active_poll.as_millis() as u64,
            )?),
            error_backoff: Duration::from_secs(parse_or(
                &lookup,
                "DISPATCH_ERROR_BACKOFF_SECS",
                defaults.error_backoff.as_secs(),
            )?),
            error_message_limit: MAX_ERROR_MESSAGE_CHARS,
        };

        let smtp_key = SmtpKeyConfig {
            key_id: lookup("SMTP_KEY_ID").unwrap_or_default(),
            private_key_pem: pem_from(&lookup, "SMTP_PRIVATE_KEY_PEM", "SMTP_PRIVATE_KEY_PATH")?,
            public_key_pem: pem_from(&lookup, "SMTP_PUBLIC_KEY_PEM", "SMTP_PUBLIC_KEY_PATH")?,
        };

        Ok(Self {
            database_url,
            port,
            mail_adapter,
            dispatch,
            smtp_key,
        })
    }

    /// Config for tests. Uses in-memory database URL and console delivery.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 3000,
            mail_adapter: "console".to_string(),
            dispatch: DispatchConfig::default(),
            smtp_key: SmtpKeyConfig::default(),
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

/// Inline PEM wins over a path to a PEM file.
fn pem_from<F>(lookup: &F, inline: &str, path: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(pem) = lookup(inline).filter(|p| !p.trim().is_empty()) {
        // .env files usually carry PEMs with escaped newlines
        return Ok(pem.replace("\\n", "\n"));
    }
    match lookup(path).filter(|p| !p.trim().is_empty()) {
        Some(p) => std::fs::read_to_string(&p).map_err(|source| ConfigError::Read { path: p, source }),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "sqlite://mailgo.db")])).unwrap();
        assert_eq!(config.database_url, "sqlite://mailgo.db");
        assert_eq!(config.port, 3000);
        assert_eq!(config.mail_adapter, "smtp");
        assert_eq!(config.dispatch, DispatchConfig::default());
        assert_eq!(config.dispatch.batch_size, 20);
        assert_eq!(config.dispatch.idle_poll, Duration::from_secs(30));
        assert_eq!(config.dispatch.active_poll, Duration::from_secs(1));
        assert_eq!(config.dispatch.error_backoff, Duration::from_secs(5));
        assert_eq!(config.dispatch.error_message_limit, 512);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn dispatch_tunables_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("DISPATCH_BATCH_SIZE", "5"),
            ("DISPATCH_IDLE_POLL_SECS", "2"),
            ("DISPATCH_ACTIVE_POLL_MS", "250"),
            ("DISPATCH_ERROR_BACKOFF_SECS", "9"),
        ]))
        .unwrap();
        assert_eq!(config.dispatch.batch_size, 5);
        assert_eq!(config.dispatch.idle_poll, Duration::from_secs(2));
        assert_eq!(config.dispatch.active_poll, Duration::from_millis(250));
        assert_eq!(config.dispatch.error_backoff, Duration::from_secs(9));
    }

    #[test]
    fn zero_batch_size_and_bad_port_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("DISPATCH_BATCH_SIZE", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DISPATCH_BATCH_SIZE", .. }));

        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "sqlite::memory:"), ("PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn inline_pem_unescapes_newlines() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("SMTP_KEY_ID", "smtp-key"),
            ("SMTP_PUBLIC_KEY_PEM", "-----BEGIN PUBLIC KEY-----\\nAAAA\\n-----END PUBLIC KEY-----"),
        ]))
        .unwrap();
        assert_eq!(config.smtp_key.key_id, "smtp-key");
        assert!(config.smtp_key.public_key_pem.contains("\nAAAA\n"));
        assert!(config.smtp_key.private_key_pem.is_empty());
    }
}
