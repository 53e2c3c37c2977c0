//! The narrow persistence surface the dispatch loop depends on.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::app::db::{self, Campaign, NewSendLog, Recipient, SendCounts};
use crate::app::domain::CampaignStatus;

/// Result of finalizing a drained campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finalized {
    pub status: CampaignStatus,
    pub counts: SendCounts,
    /// False when the campaign had already left Sending.
    pub changed: bool,
}

/// Campaign and send log operations used by the dispatcher.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Oldest-created campaign in Sending, if any.
    async fn next_sending_campaign(&self) -> Result<Option<Campaign>, sqlx::Error>;

    /// Force the campaign to Failed. Idempotent.
    async fn mark_failed(&self, campaign_id: &str) -> Result<(), sqlx::Error>;

    /// Up to `limit` recipients without a log row for this campaign, oldest
    /// first. Never returns more than the campaign's remaining target.
    async fn pending_recipients(&self, campaign_id: &str, limit: u32) -> Result<Vec<Recipient>, sqlx::Error>;

    /// Persist a batch of outcomes and bump `last_updated_at`, all or nothing.
    async fn append_send_logs(&self, campaign_id: &str, logs: &[NewSendLog]) -> Result<(), sqlx::Error>;

    /// Recompute counts and move a Sending campaign to Completed or Failed.
    async fn finalize(&self, campaign_id: &str) -> Result<Finalized, sqlx::Error>;
}

/// SQLite-backed store.
#[derive(Debug, Clone)]
pub struct SqliteCampaignStore {
    pool: SqlitePool,
}

impl SqliteCampaignStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignStore for SqliteCampaignStore {
    async fn next_sending_campaign(&self) -> Result<Option<Campaign>, sqlx::Error> {
        db::campaigns::next_sending(&self.pool).await
    }

    async fn mark_failed(&self, campaign_id: &str) -> Result<(), sqlx::Error> {
        db::campaigns::mark_failed(&self.pool, campaign_id).await
    }

    async fn pending_recipients(&self, campaign_id: &str, limit: u32) -> Result<Vec<Recipient>, sqlx::Error> {
        let mut limit = i64::from(limit);

        // Recipients imported after sending started must not push the log
        // count past the snapshot.
        if let Some(campaign) = db::campaigns::find_by_id(&self.pool, campaign_id).await? {
            if campaign.target_recipient_count > 0 {
                let logged = db::send_logs::counts(&self.pool, campaign_id).await?.total();
                limit = limit.min((campaign.target_recipient_count - logged).max(0));
            }
        }

        if limit == 0 {
            return Ok(Vec::new());
        }

        db::recipients::list_undelivered(&self.pool, campaign_id, limit).await
    }

    async fn append_send_logs(&self, campaign_id: &str, logs: &[NewSendLog]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for log in logs {
            db::send_logs::insert(&mut *tx, campaign_id, log).await?;
        }
        db::campaigns::touch(&mut *tx, campaign_id).await?;
        tx.commit().await
    }

    async fn finalize(&self, campaign_id: &str) -> Result<Finalized, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let counts = db::send_logs::counts(&mut *tx, campaign_id).await?;
        let target = CampaignStatus::from_failed_count(counts.failed);
        let changed = db::campaigns::finish_sending(&mut *tx, campaign_id, target).await?;

        let status = if changed {
            target
        } else {
            db::campaigns::find_by_id(&mut *tx, campaign_id)
                .await?
                .map(|c| c.status)
                .ok_or(sqlx::Error::RowNotFound)?
        };

        tx.commit().await?;

        Ok(Finalized {
            status,
            counts,
            changed,
        })
    }
}
