use sqlx::{FromRow, SqliteExecutor};
use time::OffsetDateTime;

use crate::app::domain::CampaignStatus;

/// Database row for campaigns table.
#[derive(Debug, Clone, FromRow)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub from_name: String,
    pub from_email: String,
    pub html_body: String,
    pub text_body: Option<String>,
    pub status: CampaignStatus,
    /// Recipients in the ledger when sending started. Zero until captured.
    pub target_recipient_count: i64,
    pub created_at: i64,
    pub last_updated_at: i64,
}

/// Editable content of a campaign.
#[derive(Debug, Clone)]
pub struct CampaignContent {
    pub name: String,
    pub subject: String,
    pub from_name: String,
    pub from_email: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

const COLUMNS: &str = "id, name, subject, from_name, from_email, html_body, text_body, status, target_recipient_count, created_at, last_updated_at";

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Insert a new Draft campaign with the given id.
pub async fn insert<'e, E>(executor: E, id: &str, content: &CampaignContent) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = now();
    sqlx::query(
        r#"INSERT INTO campaigns (id, name, subject, from_name, from_email, html_body, text_body, status, target_recipient_count, created_at, last_updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)"#,
    )
    .bind(id)
    .bind(&content.name)
    .bind(&content.subject)
    .bind(&content.from_name)
    .bind(&content.from_email)
    .bind(&content.html_body)
    .bind(&content.text_body)
    .bind(CampaignStatus::Draft)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Find a campaign by ID.
pub async fn find_by_id<'e, E>(executor: E, id: &str) -> Result<Option<Campaign>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Campaign>(&format!("SELECT {COLUMNS} FROM campaigns WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// All campaigns, newest first.
pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Campaign>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Campaign>(&format!(
        "SELECT {COLUMNS} FROM campaigns ORDER BY created_at DESC, rowid DESC"
    ))
    .fetch_all(executor)
    .await
}

/// Replace the content of a Draft campaign. Returns false when the campaign
/// is missing or no longer Draft.
pub async fn update_content<'e, E>(executor: E, id: &str, content: &CampaignContent) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"UPDATE campaigns
           SET name = ?, subject = ?, from_name = ?, from_email = ?, html_body = ?, text_body = ?, last_updated_at = ?
           WHERE id = ? AND status = ?"#,
    )
    .bind(&content.name)
    .bind(&content.subject)
    .bind(&content.from_name)
    .bind(&content.from_email)
    .bind(&content.html_body)
    .bind(&content.text_body)
    .bind(now())
    .bind(id)
    .bind(CampaignStatus::Draft)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Oldest-created campaign currently Sending.
pub async fn next_sending<'e, E>(executor: E) -> Result<Option<Campaign>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Campaign>(&format!(
        "SELECT {COLUMNS} FROM campaigns WHERE status = ? ORDER BY created_at, rowid LIMIT 1"
    ))
    .bind(CampaignStatus::Sending)
    .fetch_optional(executor)
    .await
}

/// Draft -> Sending, snapshotting the recipient ledger size as the target.
/// One statement: returns false (and changes nothing) if the campaign is
/// missing, not Draft, or the ledger is empty.
pub async fn mark_sending<'e, E>(executor: E, id: &str) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"UPDATE campaigns
           SET status = ?, target_recipient_count = (SELECT COUNT(*) FROM recipients), last_updated_at = ?
           WHERE id = ? AND status = ? AND EXISTS (SELECT 1 FROM recipients)"#,
    )
    .bind(CampaignStatus::Sending)
    .bind(now())
    .bind(id)
    .bind(CampaignStatus::Draft)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Force a campaign to Failed. Idempotent.
pub async fn mark_failed<'e, E>(executor: E, id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE campaigns SET status = ?, last_updated_at = ? WHERE id = ?")
        .bind(CampaignStatus::Failed)
        .bind(now())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Move a Sending campaign to a terminal status. Campaigns in any other
/// status are left untouched; returns whether a row changed.
pub async fn finish_sending<'e, E>(executor: E, id: &str, status: CampaignStatus) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE campaigns SET status = ?, last_updated_at = ? WHERE id = ? AND status = ?")
        .bind(status)
        .bind(now())
        .bind(id)
        .bind(CampaignStatus::Sending)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Bump `last_updated_at`.
pub async fn touch<'e, E>(executor: E, id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE campaigns SET last_updated_at = ? WHERE id = ?")
        .bind(now())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
