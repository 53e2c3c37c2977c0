use std::sync::Arc;

use crate::app::db::{Campaign, Recipient};
use crate::app::domain::SmtpSettings;

/// Who a campaign message is from and to, after applying session overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addressing {
    pub from_name: String,
    pub from_address: String,
    pub to: String,
}

impl Addressing {
    /// Session overrides beat the campaign's sender; `override_to` (test
    /// sends) beats the recipient's address. Blank overrides are ignored.
    pub fn resolve(
        campaign: &Campaign,
        recipient: &Recipient,
        settings: &SmtpSettings,
        override_to: Option<&str>,
    ) -> Self {
        fn non_blank(value: Option<&str>) -> Option<&str> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            from_name: non_blank(settings.override_from_name.as_deref())
                .unwrap_or(&campaign.from_name)
                .to_string(),
            from_address: non_blank(settings.override_from_address.as_deref())
                .unwrap_or(&campaign.from_email)
                .to_string(),
            to: non_blank(override_to).unwrap_or(&recipient.email).to_string(),
        }
    }
}

/// Sends one campaign message to one recipient. Swappable per environment.
#[async_trait::async_trait]
pub trait DeliveryAdapter: Send + Sync {
    async fn send(
        &self,
        campaign: &Campaign,
        recipient: &Recipient,
        settings: &SmtpSettings,
        override_to: Option<&str>,
    ) -> Result<(), DeliveryError>;
}

/// Errors that can occur during delivery.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid address: {0}")]
    Address(String),
    #[error("Failed to build message: {0}")]
    Message(String),
    #[error("SMTP error: {0}")]
    Smtp(String),
}

// Re-export implementations
pub use console::ConsoleDelivery;
pub use smtp::SmtpDelivery;

mod console;
mod smtp;

/// Build the delivery adapter from config.
pub fn from_config(config: &crate::app::config::Config) -> Result<Arc<dyn DeliveryAdapter>, DeliveryError> {
    match config.mail_adapter.as_str() {
        "smtp" => Ok(Arc::new(SmtpDelivery)),
        "console" => Ok(Arc::new(ConsoleDelivery)),
        _ => Err(DeliveryError::Config(format!(
            "Unknown MAIL_ADAPTER: {}",
            config.mail_adapter
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::{CampaignStatus, EncryptionMode};

    pub(crate) fn campaign() -> Campaign {
        Campaign {
            id: "01JCAMPAIGN000000000000000".to_string(),
            name: "Launch".to_string(),
            subject: "We are live".to_string(),
            from_name: "Mailgo".to_string(),
            from_email: "news@mailgo.test".to_string(),
            html_body: "<p>Hello</p>".to_string(),
            text_body: Some("Hello".to_string()),
            status: CampaignStatus::Sending,
            target_recipient_count: 1,
            created_at: 0,
            last_updated_at: 0,
        }
    }

    pub(crate) fn recipient() -> Recipient {
        Recipient {
            id: "01JRECIPIENT00000000000000".to_string(),
            email: "reader@example.com".to_string(),
            first_name: None,
            last_name: None,
            created_at: 0,
        }
    }

    pub(crate) fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: None,
            password: None,
            encryption: EncryptionMode::StartTls,
            tls_hostname: None,
            allow_self_signed: false,
            override_from_name: None,
            override_from_address: None,
        }
    }

    #[test]
    fn campaign_sender_used_without_overrides() {
        let a = Addressing::resolve(&campaign(), &recipient(), &settings(), None);
        assert_eq!(a.from_name, "Mailgo");
        assert_eq!(a.from_address, "news@mailgo.test");
        assert_eq!(a.to, "reader@example.com");
    }

    #[test]
    fn session_overrides_and_test_address_win() {
        let mut s = settings();
        s.override_from_name = Some("Ops".to_string());
        s.override_from_address = Some("ops@mailgo.test".to_string());
        let a = Addressing::resolve(&campaign(), &recipient(), &s, Some("qa@example.com"));
        assert_eq!(a.from_name, "Ops");
        assert_eq!(a.from_address, "ops@mailgo.test");
        assert_eq!(a.to, "qa@example.com");
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut s = settings();
        s.override_from_name = Some("  ".to_string());
        let a = Addressing::resolve(&campaign(), &recipient(), &s, Some(""));
        assert_eq!(a.from_name, "Mailgo");
        assert_eq!(a.to, "reader@example.com");
    }

    #[test]
    fn unknown_adapter_is_rejected() {
        let mut config = crate::app::config::Config::for_tests();
        config.mail_adapter = "pigeon".to_string();
        assert!(matches!(from_config(&config), Err(DeliveryError::Config(_))));
    }
}
