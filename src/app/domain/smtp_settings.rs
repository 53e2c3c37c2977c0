use serde::{Deserialize, Serialize};

/// Transport security for the SMTP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncryptionMode {
    /// Plain TCP, no TLS.
    None,
    /// TLS from the first byte (usually port 465).
    #[serde(rename = "SSL", alias = "Ssl")]
    Ssl,
    /// Upgrade with STARTTLS (usually port 587).
    #[default]
    StartTls,
}

/// Fully resolved SMTP settings. The password here is already plaintext;
/// decryption happens before a session is created.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub encryption: EncryptionMode,
    /// Certificate name to accept when it differs from `host`.
    pub tls_hostname: Option<String>,
    pub allow_self_signed: bool,
    pub override_from_name: Option<String>,
    pub override_from_address: Option<String>,
}

impl SmtpSettings {
    /// Name the TLS handshake validates against.
    pub fn tls_domain(&self) -> &str {
        self.tls_hostname.as_deref().unwrap_or(&self.host)
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("encryption", &self.encryption)
            .field("tls_hostname", &self.tls_hostname)
            .field("allow_self_signed", &self.allow_self_signed)
            .field("override_from_name", &self.override_from_name)
            .field("override_from_address", &self.override_from_address)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: Some("mailer".to_string()),
            password: Some("hunter2".to_string()),
            encryption: EncryptionMode::StartTls,
            tls_hostname: None,
            allow_self_signed: false,
            override_from_name: None,
            override_from_address: None,
        }
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", settings());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("smtp.example.com"));
    }

    #[test]
    fn tls_domain_prefers_override() {
        let mut s = settings();
        assert_eq!(s.tls_domain(), "smtp.example.com");
        s.tls_hostname = Some("mx.internal".to_string());
        assert_eq!(s.tls_domain(), "mx.internal");
    }

    #[test]
    fn encryption_wire_names() {
        let parsed: EncryptionMode = serde_json::from_str("\"SSL\"").unwrap();
        assert_eq!(parsed, EncryptionMode::Ssl);
        let parsed: EncryptionMode = serde_json::from_str("\"None\"").unwrap();
        assert_eq!(parsed, EncryptionMode::None);
        assert_eq!(EncryptionMode::default(), EncryptionMode::StartTls);
    }
}
