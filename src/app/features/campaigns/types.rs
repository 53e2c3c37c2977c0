use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::{
    credentials::{resolve_password, PasswordDecryptor},
    db::{self, CampaignContent, SendCounts},
    domain::{CampaignStatus, EncryptionMode, SendStatus, SmtpSettings},
    error::AppError,
};

/// Request body for creating or editing a campaign.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CampaignUpsertRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(min = 1, max = 512))]
    pub subject: String,
    #[validate(length(min = 1, max = 256))]
    pub from_name: String,
    #[validate(length(min = 1, max = 256), email)]
    pub from_email: String,
    #[validate(length(min = 1))]
    pub html_body: String,
    pub text_body: Option<String>,
}

impl CampaignUpsertRequest {
    /// Validate, then trim the header fields.
    pub fn into_content(self) -> Result<CampaignContent, AppError> {
        self.validate()
            .map_err(|_| AppError::Validation("Invalid input".to_string()))?;

        let content = CampaignContent {
            name: self.name.trim().to_string(),
            subject: self.subject.trim().to_string(),
            from_name: self.from_name.trim().to_string(),
            from_email: self.from_email.trim().to_string(),
            html_body: self.html_body,
            text_body: self.text_body.filter(|t| !t.trim().is_empty()),
        };

        if content.name.is_empty() || content.subject.is_empty() || content.from_name.is_empty() {
            return Err(AppError::Validation("Invalid input".to_string()));
        }

        Ok(content)
    }
}

fn default_port() -> u32 {
    587
}

/// SMTP settings as sent by the client. The password is either plaintext or
/// encrypted with the key published at /api/keys/smtp.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SmtpSettingsRequest {
    #[validate(length(min = 1, max = 255))]
    pub smtp_host: String,
    #[serde(default = "default_port")]
    #[validate(range(min = 1, max = 65535))]
    pub smtp_port: u32,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_password_encrypted: Option<String>,
    pub smtp_password_key_id: Option<String>,
    #[serde(default)]
    pub encryption: EncryptionMode,
    pub encryption_hostname: Option<String>,
    #[serde(default)]
    pub allow_self_signed: bool,
    #[validate(length(max = 256))]
    pub override_from_name: Option<String>,
    #[validate(length(max = 256), email)]
    pub override_from_address: Option<String>,
}

/// Blank strings count as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl SmtpSettingsRequest {
    /// Validate and resolve into settings with a plaintext password.
    pub fn into_settings(self, decryptor: &dyn PasswordDecryptor) -> Result<SmtpSettings, AppError> {
        self.validate()
            .map_err(|_| AppError::Validation("Invalid SMTP settings".to_string()))?;

        let host = self.smtp_host.trim().to_string();
        if host.is_empty() {
            return Err(AppError::Validation("Invalid SMTP settings".to_string()));
        }
        let port = u16::try_from(self.smtp_port)
            .map_err(|_| AppError::Validation("Invalid SMTP settings".to_string()))?;

        let password = resolve_password(
            decryptor,
            self.smtp_password.as_deref(),
            self.smtp_password_encrypted.as_deref(),
            self.smtp_password_key_id.as_deref(),
        )?;

        Ok(SmtpSettings {
            host,
            port,
            username: present(self.smtp_username),
            password,
            encryption: self.encryption,
            tls_hostname: present(self.encryption_hostname),
            allow_self_signed: self.allow_self_signed,
            override_from_name: present(self.override_from_name),
            override_from_address: present(self.override_from_address),
        })
    }
}

/// Request body for a send-now trigger.
pub type SendNowRequest = SmtpSettingsRequest;

/// Request body for a one-off test send.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendTestRequest {
    #[validate(length(min = 1, max = 256), email)]
    pub test_email: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub smtp: SmtpSettingsRequest,
}

/// Campaign list entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummaryResponse {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub from_name: String,
    pub from_email: String,
    pub status: CampaignStatus,
    pub total_recipients: i64,
    pub sent_count: i64,
    pub failed_count: i64,
    pub created_at: i64,
    pub last_updated_at: i64,
}

impl CampaignSummaryResponse {
    pub fn new(campaign: db::Campaign, total_recipients: i64, counts: SendCounts) -> Self {
        Self {
            id: campaign.id,
            name: campaign.name,
            subject: campaign.subject,
            from_name: campaign.from_name,
            from_email: campaign.from_email,
            status: campaign.status,
            total_recipients,
            sent_count: counts.sent,
            failed_count: counts.failed,
            created_at: campaign.created_at,
            last_updated_at: campaign.last_updated_at,
        }
    }
}

/// Full campaign including bodies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDetailResponse {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub from_name: String,
    pub from_email: String,
    pub html_body: String,
    pub text_body: Option<String>,
    pub status: CampaignStatus,
    pub total_recipients: i64,
    pub sent_count: i64,
    pub failed_count: i64,
    pub created_at: i64,
    pub last_updated_at: i64,
}

impl CampaignDetailResponse {
    pub fn new(campaign: db::Campaign, total_recipients: i64, counts: SendCounts) -> Self {
        Self {
            id: campaign.id,
            name: campaign.name,
            subject: campaign.subject,
            from_name: campaign.from_name,
            from_email: campaign.from_email,
            html_body: campaign.html_body,
            text_body: campaign.text_body,
            status: campaign.status,
            total_recipients,
            sent_count: counts.sent,
            failed_count: counts.failed,
            created_at: campaign.created_at,
            last_updated_at: campaign.last_updated_at,
        }
    }
}

/// One row of the send log view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLogResponse {
    pub id: String,
    pub campaign_id: String,
    pub recipient_id: String,
    pub recipient_email: String,
    pub status: SendStatus,
    pub error_message: Option<String>,
    pub sent_at: Option<i64>,
}

impl From<db::SendLogView> for SendLogResponse {
    fn from(log: db::SendLogView) -> Self {
        Self {
            id: log.id,
            campaign_id: log.campaign_id,
            recipient_id: log.recipient_id,
            recipient_email: log.recipient_email,
            status: log.status,
            error_message: log.error_message,
            sent_at: log.sent_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::credentials::CredentialError;

    struct NoKey;

    impl PasswordDecryptor for NoKey {
        fn key_id(&self) -> &str {
            "k1"
        }

        fn public_key_pem(&self) -> &str {
            ""
        }

        fn decrypt(&self, _payload: &str, key_id: Option<&str>) -> Result<Option<String>, CredentialError> {
            if key_id != Some("k1") {
                return Err(CredentialError::KeyMismatch);
            }
            Ok(Some("decrypted".to_string()))
        }
    }

    fn request(json: serde_json::Value) -> SmtpSettingsRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn defaults_and_blank_normalisation() {
        let settings = request(serde_json::json!({
            "smtpHost": "smtp.example.com",
            "smtpUsername": "  ",
            "encryptionHostname": "",
            "overrideFromName": " "
        }))
        .into_settings(&NoKey)
        .unwrap();

        assert_eq!(settings.port, 587);
        assert_eq!(settings.encryption, EncryptionMode::StartTls);
        assert!(settings.username.is_none());
        assert!(settings.password.is_none());
        assert!(settings.tls_hostname.is_none());
        assert!(settings.override_from_name.is_none());
        assert!(!settings.allow_self_signed);
    }

    #[test]
    fn encrypted_password_is_resolved() {
        let settings = request(serde_json::json!({
            "smtpHost": "smtp.example.com",
            "smtpPort": 465,
            "encryption": "SSL",
            "smtpPasswordEncrypted": "AQAB",
            "smtpPasswordKeyId": "k1"
        }))
        .into_settings(&NoKey)
        .unwrap();

        assert_eq!(settings.port, 465);
        assert_eq!(settings.encryption, EncryptionMode::Ssl);
        assert_eq!(settings.password.as_deref(), Some("decrypted"));
    }

    #[test]
    fn key_mismatch_becomes_validation_error() {
        let err = request(serde_json::json!({
            "smtpHost": "smtp.example.com",
            "smtpPasswordEncrypted": "AQAB",
            "smtpPasswordKeyId": "old"
        }))
        .into_settings(&NoKey)
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "Invalid SMTP password payload."));
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        let err = request(serde_json::json!({ "smtpHost": "smtp.example.com", "smtpPort": 70000 }))
            .into_settings(&NoKey)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn upsert_request_trims_and_validates() {
        let req: CampaignUpsertRequest = serde_json::from_value(serde_json::json!({
            "name": "  Launch ",
            "subject": "Hello",
            "fromName": "Mailgo",
            "fromEmail": "news@mailgo.test",
            "htmlBody": "<p>Hi</p>",
            "textBody": "   "
        }))
        .unwrap();
        let content = req.into_content().unwrap();
        assert_eq!(content.name, "Launch");
        assert!(content.text_body.is_none());

        let bad: CampaignUpsertRequest = serde_json::from_value(serde_json::json!({
            "name": "Launch",
            "subject": "Hello",
            "fromName": "Mailgo",
            "fromEmail": "not-an-email",
            "htmlBody": "<p>Hi</p>"
        }))
        .unwrap();
        assert!(bad.into_content().is_err());
    }
}
