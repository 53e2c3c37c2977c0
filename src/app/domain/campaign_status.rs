use serde::{Deserialize, Serialize};

/// Campaign lifecycle status.
///
/// Draft -> Sending -> (Completed | Failed). Only the dispatch pipeline moves a
/// campaign out of Sending; only Draft campaigns accept content edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")] // Stored as lowercase text
pub enum CampaignStatus {
    Draft,
    Sending,
    Completed,
    Failed,
}

impl CampaignStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Failed)
    }

    /// Terminal status for a fully drained campaign.
    pub fn from_failed_count(failed: i64) -> Self {
        if failed > 0 {
            CampaignStatus::Failed
        } else {
            CampaignStatus::Completed
        }
    }
}
