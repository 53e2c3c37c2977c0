use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::store::CampaignStore;
use crate::app::config::DispatchConfig;
use crate::app::db::{Campaign, NewSendLog, Recipient, SendCounts};
use crate::app::domain::{CampaignStatus, SendStatus};
use crate::app::mail::{DeliveryAdapter, DeliveryError};
use crate::app::sessions::{SendSession, SendSessionRegistry};

/// Errors escaping one dispatch step. The loop logs them and backs off.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// What one pass of the loop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// No campaign is Sending.
    Idle,
    /// A Sending campaign had no session and was failed.
    SessionMissing { campaign_id: String },
    /// A batch was attempted and its outcomes persisted.
    Progressed {
        campaign_id: String,
        sent: usize,
        failed: usize,
    },
    /// Every recipient had a log row; the campaign reached a terminal status.
    Completed {
        campaign_id: String,
        status: CampaignStatus,
        counts: SendCounts,
    },
}

/// Drives Sending campaigns to a terminal state, one batch at a time.
pub struct Dispatcher {
    store: Arc<dyn CampaignStore>,
    sessions: SendSessionRegistry,
    delivery: Arc<dyn DeliveryAdapter>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        sessions: SendSessionRegistry,
        delivery: Arc<dyn DeliveryAdapter>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            sessions,
            delivery,
            config,
        }
    }

    /// Run the loop on its own task until `shutdown` flips to true (or its
    /// sender is dropped).
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(batch_size = self.config.batch_size, "campaign dispatcher started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let pause = match self.step(&shutdown).await {
                Ok(Step::Idle) => Some(self.config.idle_poll),
                Ok(Step::Progressed { .. }) => Some(self.config.active_poll),
                Ok(Step::SessionMissing { .. }) | Ok(Step::Completed { .. }) => None,
                Err(err) => {
                    tracing::error!(%err, "unexpected error in campaign dispatch loop");
                    Some(self.config.error_backoff)
                }
            };

            if let Some(duration) = pause {
                if !sleep_unless_shutdown(duration, &mut shutdown).await {
                    break;
                }
            }
        }

        tracing::info!("campaign dispatcher stopped");
    }

    /// One loop iteration: pick the oldest Sending campaign and move it forward.
    pub async fn step(&self, shutdown: &watch::Receiver<bool>) -> Result<Step, DispatchError> {
        let Some(campaign) = self.store.next_sending_campaign().await? else {
            return Ok(Step::Idle);
        };

        let Some(session) = self.sessions.get(&campaign.id) else {
            tracing::warn!(campaign_id = %campaign.id, "missing SMTP session for sending campaign, marking as failed");
            self.store.mark_failed(&campaign.id).await?;
            return Ok(Step::SessionMissing {
                campaign_id: campaign.id,
            });
        };

        self.process_batch(&campaign, &session, shutdown).await
    }

    async fn process_batch(
        &self,
        campaign: &Campaign,
        session: &SendSession,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<Step, DispatchError> {
        let recipients = self
            .store
            .pending_recipients(&campaign.id, self.config.batch_size)
            .await?;

        if recipients.is_empty() {
            let finalized = self.store.finalize(&campaign.id).await?;
            let session_age_secs = self
                .sessions
                .remove(&campaign.id)
                .map(|s| s.age_secs(OffsetDateTime::now_utc()))
                .unwrap_or_default();
            tracing::info!(
                campaign_id = %campaign.id,
                status = ?finalized.status,
                sent = finalized.counts.sent,
                failed = finalized.counts.failed,
                session_age_secs,
                "campaign finished sending"
            );
            return Ok(Step::Completed {
                campaign_id: campaign.id.clone(),
                status: finalized.status,
                counts: finalized.counts,
            });
        }

        let mut logs = Vec::with_capacity(recipients.len());
        for recipient in &recipients {
            // Stop between sends, never during one
            if *shutdown.borrow() {
                tracing::info!(campaign_id = %campaign.id, attempted = logs.len(), "shutdown requested mid-batch");
                break;
            }

            let outcome = self
                .delivery
                .send(campaign, recipient, &session.settings, None)
                .await;
            if let Err(err) = &outcome {
                tracing::warn!(campaign_id = %campaign.id, recipient = %recipient.email, %err, "failed to send campaign message");
            }
            logs.push(send_log(recipient, outcome, self.config.error_message_limit));
        }

        if !logs.is_empty() {
            self.store.append_send_logs(&campaign.id, &logs).await?;
        }

        let failed = logs.iter().filter(|l| l.status == SendStatus::Failed).count();
        let sent = logs.len() - failed;
        tracing::debug!(campaign_id = %campaign.id, sent, failed, "batch persisted");

        Ok(Step::Progressed {
            campaign_id: campaign.id.clone(),
            sent,
            failed,
        })
    }
}

/// Log row for one attempt. Failures are timestamped too so the log view
/// keeps send order.
fn send_log(recipient: &Recipient, outcome: Result<(), DeliveryError>, limit: usize) -> NewSendLog {
    let (status, error_message) = match outcome {
        Ok(()) => (SendStatus::Sent, None),
        Err(err) => (SendStatus::Failed, Some(truncate_error(&err.to_string(), limit))),
    };

    NewSendLog {
        id: ulid::Ulid::new().to_string(),
        recipient_id: recipient.id.clone(),
        status,
        error_message,
        sent_at: Some(OffsetDateTime::now_utc().unix_timestamp()),
    }
}

/// Hard-truncate to at most `limit` characters.
pub fn truncate_error(message: &str, limit: usize) -> String {
    match message.char_indices().nth(limit) {
        Some((byte_idx, _)) => message[..byte_idx].to_string(),
        None => message.to_string(),
    }
}

/// Sleep for `duration`. Returns false if shutdown was requested first.
async fn sleep_unless_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => !*shutdown.borrow(),
        // A dropped sender can never signal again; treat it as shutdown.
        changed = shutdown.changed() => changed.is_ok() && !*shutdown.borrow(),
    }
}
