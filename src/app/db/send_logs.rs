use std::collections::HashMap;

use sqlx::{FromRow, SqliteExecutor};

use crate::app::domain::SendStatus;

/// Send log row joined with the recipient's email, for the log view.
#[derive(Debug, Clone, FromRow)]
pub struct SendLogView {
    pub id: String,
    pub campaign_id: String,
    pub recipient_id: String,
    pub recipient_email: String,
    pub status: SendStatus,
    pub error_message: Option<String>,
    pub sent_at: Option<i64>,
}

/// One outcome to append for a campaign.
#[derive(Debug, Clone)]
pub struct NewSendLog {
    pub id: String,
    pub recipient_id: String,
    pub status: SendStatus,
    pub error_message: Option<String>,
    pub sent_at: Option<i64>,
}

/// Sent/failed row counts of one campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendCounts {
    pub sent: i64,
    pub failed: i64,
}

impl SendCounts {
    pub fn total(&self) -> i64 {
        self.sent + self.failed
    }
}

/// Insert one log row. The (campaign_id, recipient_id) unique index rejects duplicates.
pub async fn insert<'e, E>(executor: E, campaign_id: &str, log: &NewSendLog) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO campaign_send_logs (id, campaign_id, recipient_id, status, error_message, sent_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&log.id)
    .bind(campaign_id)
    .bind(&log.recipient_id)
    .bind(log.status)
    .bind(&log.error_message)
    .bind(log.sent_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Sent/failed counts for one campaign.
pub async fn counts<'e, E>(executor: E, campaign_id: &str) -> Result<SendCounts, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let (sent, failed): (i64, i64) = sqlx::query_as(
        r#"SELECT
               COALESCE(SUM(CASE WHEN status = ? THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN status = ? THEN 1 ELSE 0 END), 0)
           FROM campaign_send_logs WHERE campaign_id = ?"#,
    )
    .bind(SendStatus::Sent)
    .bind(SendStatus::Failed)
    .bind(campaign_id)
    .fetch_one(executor)
    .await?;
    Ok(SendCounts { sent, failed })
}

/// Sent/failed counts for every campaign that has log rows.
pub async fn counts_by_campaign<'e, E>(executor: E) -> Result<HashMap<String, SendCounts>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let rows: Vec<(String, i64, i64)> = sqlx::query_as(
        r#"SELECT campaign_id,
               SUM(CASE WHEN status = ? THEN 1 ELSE 0 END),
               SUM(CASE WHEN status = ? THEN 1 ELSE 0 END)
           FROM campaign_send_logs GROUP BY campaign_id"#,
    )
    .bind(SendStatus::Sent)
    .bind(SendStatus::Failed)
    .fetch_all(executor)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, sent, failed)| (id, SendCounts { sent, failed }))
        .collect())
}

/// Log rows of a campaign, most recent `sent_at` first.
pub async fn list_for_campaign<'e, E>(executor: E, campaign_id: &str) -> Result<Vec<SendLogView>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, SendLogView>(
        r#"SELECT l.id, l.campaign_id, l.recipient_id, r.email AS recipient_email, l.status, l.error_message, l.sent_at
           FROM campaign_send_logs l
           JOIN recipients r ON r.id = l.recipient_id
           WHERE l.campaign_id = ?
           ORDER BY COALESCE(l.sent_at, 0) DESC, l.rowid DESC"#,
    )
    .bind(campaign_id)
    .fetch_all(executor)
    .await
}
