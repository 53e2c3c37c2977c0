use sqlx::{SqliteConnection, SqlitePool};

use crate::app::{
    db::{self, Campaign, Recipient},
    domain::{CampaignStatus, Email, SmtpSettings},
    error::AppError,
    mail::{DeliveryAdapter, DeliveryError},
    sessions::{SendSession, SendSessionRegistry},
};

pub const ONLY_DRAFT_SENDABLE: &str = "Only draft campaigns can be sent.";
pub const NO_RECIPIENTS: &str = "Upload recipients before sending.";

/// Outcome of moving a campaign from Draft to Sending.
#[derive(Debug)]
pub enum SendNowPreparation {
    Ready { campaign: Campaign, recipient_count: i64 },
    Invalid(&'static str),
    NotFound,
}

/// A campaign that entered Sending with a registered session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedSending {
    pub campaign_id: String,
    pub recipient_count: i64,
}

/// Move a Draft campaign to Sending and snapshot the recipient count.
/// Only valid while Draft with a non-empty recipient ledger. Run inside the
/// caller's transaction. Writes before it reads, so a deferred transaction
/// never has to upgrade its lock.
pub async fn prepare_send_now(conn: &mut SqliteConnection, campaign_id: &str) -> Result<SendNowPreparation, sqlx::Error> {
    let started = db::campaigns::mark_sending(&mut *conn, campaign_id).await?;

    let Some(campaign) = db::campaigns::find_by_id(&mut *conn, campaign_id).await? else {
        return Ok(SendNowPreparation::NotFound);
    };

    if !started {
        let reason = if campaign.status != CampaignStatus::Draft {
            ONLY_DRAFT_SENDABLE
        } else {
            NO_RECIPIENTS
        };
        return Ok(SendNowPreparation::Invalid(reason));
    }

    Ok(SendNowPreparation::Ready {
        recipient_count: campaign.target_recipient_count,
        campaign,
    })
}

/// Start the dispatch engine for a campaign. On success the campaign is
/// Sending and its session is registered.
pub async fn start_sending(
    pool: &SqlitePool,
    sessions: &SendSessionRegistry,
    campaign_id: &str,
    settings: SmtpSettings,
) -> Result<StartedSending, AppError> {
    let mut tx = pool.begin().await?;

    let (campaign, recipient_count) = match prepare_send_now(&mut tx, campaign_id).await? {
        SendNowPreparation::Ready {
            campaign,
            recipient_count,
        } => (campaign, recipient_count),
        SendNowPreparation::Invalid(reason) => return Err(AppError::Validation(reason.to_string())),
        SendNowPreparation::NotFound => return Err(AppError::NotFound("Campaign not found".to_string())),
    };

    // The session must exist before the Sending row becomes visible.
    sessions.upsert(SendSession::new(campaign.id.clone(), settings));

    if let Err(err) = tx.commit().await {
        sessions.remove(&campaign.id);
        return Err(err.into());
    }

    tracing::info!(campaign_id = %campaign.id, recipient_count, "campaign queued for sending");

    Ok(StartedSending {
        campaign_id: campaign.id,
        recipient_count,
    })
}

/// One-off delivery to `test_email`. Bypasses the dispatch loop and the
/// send log.
pub async fn send_test_message(
    delivery: &dyn DeliveryAdapter,
    campaign: &Campaign,
    test_email: &Email,
    settings: &SmtpSettings,
) -> Result<(), DeliveryError> {
    let recipient = Recipient {
        id: ulid::Ulid::new().to_string(),
        email: test_email.as_str().to_string(),
        first_name: Some("Test".to_string()),
        last_name: Some("Recipient".to_string()),
        created_at: time::OffsetDateTime::now_utc().unix_timestamp(),
    };

    delivery
        .send(campaign, &recipient, settings, Some(test_email.as_str()))
        .await
}
