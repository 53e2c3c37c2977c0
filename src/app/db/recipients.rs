use sqlx::{FromRow, SqliteExecutor};
use time::OffsetDateTime;

use crate::app::domain::Email;

/// Database row for recipients table.
#[derive(Debug, Clone, FromRow)]
pub struct Recipient {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: i64,
}

/// Data structure for inserting a new recipient.
pub struct NewRecipient {
    pub id: String,
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Unix seconds. `None` uses the current time.
    pub created_at: Option<i64>,
}

impl NewRecipient {
    pub fn new(email: Email, first_name: Option<String>, last_name: Option<String>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            email,
            first_name,
            last_name,
            created_at: None,
        }
    }
}

/// Insert a recipient unless its email is already in the ledger. Returns
/// whether a row was added.
pub async fn insert<'e, E>(executor: E, recipient: &NewRecipient) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let created_at = recipient
        .created_at
        .unwrap_or_else(|| OffsetDateTime::now_utc().unix_timestamp());

    let result = sqlx::query(
        "INSERT INTO recipients (id, email, first_name, last_name, created_at) VALUES (?, ?, ?, ?, ?) ON CONFLICT (email) DO NOTHING",
    )
    .bind(&recipient.id)
    .bind(recipient.email.as_str())
    .bind(&recipient.first_name)
    .bind(&recipient.last_name)
    .bind(created_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Count every recipient in the ledger.
pub async fn count<'e, E>(executor: E) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar("SELECT COUNT(*) FROM recipients")
        .fetch_one(executor)
        .await
}

/// One page of recipients, newest first. `page` is 1-based.
pub async fn list_page<'e, E>(executor: E, page: u32, page_size: u32) -> Result<Vec<Recipient>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
    sqlx::query_as::<_, Recipient>(
        "SELECT id, email, first_name, last_name, created_at FROM recipients ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
    )
    .bind(i64::from(page_size))
    .bind(offset)
    .fetch_all(executor)
    .await
}

/// Recipients with no send log row for the campaign, oldest first, capped at `limit`.
/// Ties on `created_at` fall back to insertion order.
pub async fn list_undelivered<'e, E>(
    executor: E,
    campaign_id: &str,
    limit: i64,
) -> Result<Vec<Recipient>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Recipient>(
        r#"SELECT r.id, r.email, r.first_name, r.last_name, r.created_at
           FROM recipients r
           WHERE NOT EXISTS (
               SELECT 1 FROM campaign_send_logs l
               WHERE l.campaign_id = ? AND l.recipient_id = r.id
           )
           ORDER BY r.created_at, r.rowid
           LIMIT ?"#,
    )
    .bind(campaign_id)
    .bind(limit)
    .fetch_all(executor)
    .await
}
