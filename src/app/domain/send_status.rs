use serde::{Deserialize, Serialize};

/// Outcome of one delivery attempt recorded in the send log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
pub enum SendStatus {
    Sent,
    Failed,
}
