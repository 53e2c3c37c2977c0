#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use http_body_util::BodyExt;
use mailgo::app::{
    self,
    config::Config,
    credentials::{CredentialError, PasswordDecryptor},
    db::{self, Campaign, CampaignContent, NewRecipient, Recipient},
    domain::{CampaignId, EncryptionMode, SmtpSettings},
    mail::{DeliveryAdapter, DeliveryError},
    sessions::{SendSession, SendSessionRegistry},
    AppState,
};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::ServiceExt;

/// In-memory database with migrations applied. A single connection that
/// never expires, since every connection to `:memory:` is its own database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

/// Delivery adapter that records every send and fails for chosen addresses.
#[derive(Default)]
pub struct FakeDelivery {
    sent: Mutex<Vec<SentMessage>>,
    failing: Mutex<HashSet<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub campaign_id: String,
    pub to: String,
    pub recipient_id: String,
}

impl FakeDelivery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every send to `email` fails with a long SMTP error.
    pub fn fail_for(&self, email: &str) {
        self.failing.lock().unwrap().insert(email.to_string());
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.to).collect()
    }
}

#[async_trait::async_trait]
impl DeliveryAdapter for FakeDelivery {
    async fn send(
        &self,
        campaign: &Campaign,
        recipient: &Recipient,
        _settings: &SmtpSettings,
        override_to: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let to = override_to.unwrap_or(&recipient.email).to_string();
        if self.failing.lock().unwrap().contains(&to) {
            return Err(DeliveryError::Smtp(format!("550 mailbox unavailable {}", "x".repeat(600))));
        }
        self.sent.lock().unwrap().push(SentMessage {
            campaign_id: campaign.id.clone(),
            to,
            recipient_id: recipient.id.clone(),
        });
        Ok(())
    }
}

/// Decryptor that accepts key id "test-key" and returns the payload reversed.
pub struct FakeDecryptor;

impl PasswordDecryptor for FakeDecryptor {
    fn key_id(&self) -> &str {
        "test-key"
    }

    fn public_key_pem(&self) -> &str {
        "-----BEGIN PUBLIC KEY-----\ntest\n-----END PUBLIC KEY-----\n"
    }

    fn decrypt(&self, payload: &str, key_id: Option<&str>) -> Result<Option<String>, CredentialError> {
        if key_id != Some("test-key") {
            return Err(CredentialError::KeyMismatch);
        }
        if payload == "garbage" {
            return Err(CredentialError::MalformedPayload);
        }
        Ok(Some(payload.chars().rev().collect()))
    }
}

pub fn test_state(pool: SqlitePool, delivery: Arc<FakeDelivery>) -> AppState {
    AppState {
        db: pool,
        delivery,
        sessions: SendSessionRegistry::new(),
        decryptor: Arc::new(FakeDecryptor),
        config: Config::for_tests(),
    }
}

pub fn test_router(state: AppState) -> axum::Router {
    mailgo::create_router(state)
}

pub fn smtp_settings() -> SmtpSettings {
    SmtpSettings {
        host: "smtp.example.com".to_string(),
        port: 587,
        username: Some("mailer".to_string()),
        password: Some("secret".to_string()),
        encryption: EncryptionMode::StartTls,
        tls_hostname: None,
        allow_self_signed: false,
        override_from_name: None,
        override_from_address: None,
    }
}

/// Insert a recipient with an explicit creation time. Returns its id.
pub async fn insert_recipient(pool: &SqlitePool, email: &str, created_at: i64) -> String {
    let mut recipient = NewRecipient::new(app::domain::Email::new(email).unwrap(), None, None);
    recipient.created_at = Some(created_at);
    assert!(db::recipients::insert(pool, &recipient).await.unwrap());
    recipient.id
}

pub fn campaign_content(name: &str) -> CampaignContent {
    CampaignContent {
        name: name.to_string(),
        subject: "Launch day".to_string(),
        from_name: "Mailgo".to_string(),
        from_email: "news@mailgo.test".to_string(),
        html_body: "<p>Hello</p>".to_string(),
        text_body: Some("Hello".to_string()),
    }
}

/// Insert a Draft campaign. Returns its id.
pub async fn insert_campaign(pool: &SqlitePool, name: &str) -> String {
    let id = CampaignId::new().as_str();
    db::campaigns::insert(pool, &id, &campaign_content(name)).await.unwrap();
    id
}

/// Move a Draft campaign to Sending, without a session. The target is the
/// current ledger size, which must be non-zero.
pub async fn force_sending(pool: &SqlitePool, campaign_id: &str) {
    assert!(db::campaigns::mark_sending(pool, campaign_id).await.unwrap());
}

/// Move a Draft campaign to Sending and register its session.
pub async fn start(pool: &SqlitePool, sessions: &SendSessionRegistry, campaign_id: &str) {
    force_sending(pool, campaign_id).await;
    sessions.upsert(SendSession::new(campaign_id, smtp_settings()));
}

pub async fn campaign(pool: &SqlitePool, campaign_id: &str) -> Campaign {
    db::campaigns::find_by_id(pool, campaign_id).await.unwrap().unwrap()
}

pub async fn send_log_count(pool: &SqlitePool, campaign_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM campaign_send_logs WHERE campaign_id = ?")
        .bind(campaign_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Send a JSON request through the router; returns status and parsed body
/// (`Value::Null` for empty bodies).
pub async fn send_json(
    router: axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (http::StatusCode, serde_json::Value) {
    let mut builder = http::Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}
