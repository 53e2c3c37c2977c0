use std::collections::HashSet;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::app::{
    db::{self, NewRecipient},
    domain::Email,
    error::AppError,
    AppState,
};

const MAX_NAME_LEN: usize = 128;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub recipients: Vec<ImportRow>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub total_rows: usize,
    pub inserted: usize,
    pub skipped_invalid: usize,
    pub skipped_duplicate: usize,
}

fn clean_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().chars().take(MAX_NAME_LEN).collect::<String>())
        .filter(|n| !n.is_empty())
}

/// Split rows into insertable recipients, skipping invalid emails and
/// repeats within the upload. `inserted` is left for the caller, since the
/// ledger may still reject some rows as duplicates.
pub fn plan_import(rows: Vec<ImportRow>) -> (Vec<NewRecipient>, ImportResult) {
    let mut seen = HashSet::new();
    let mut result = ImportResult {
        total_rows: rows.len(),
        ..ImportResult::default()
    };
    let mut accepted = Vec::new();

    for row in rows {
        let Ok(email) = Email::new(&row.email) else {
            result.skipped_invalid += 1;
            continue;
        };

        if !seen.insert(email.as_str().to_string()) {
            result.skipped_duplicate += 1;
            continue;
        }

        accepted.push(NewRecipient::new(email, clean_name(row.first_name), clean_name(row.last_name)));
    }

    (accepted, result)
}

/// POST /api/recipients/import — append recipients to the ledger.
async fn import_recipients(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResult>, AppError> {
    let (accepted, mut result) = plan_import(request.recipients);

    let mut tx = state.db.begin().await?;
    for recipient in &accepted {
        if db::recipients::insert(&mut *tx, recipient).await? {
            result.inserted += 1;
        } else {
            result.skipped_duplicate += 1;
        }
    }

    tx.commit().await?;

    tracing::info!(
        total_rows = result.total_rows,
        inserted = result.inserted,
        skipped_invalid = result.skipped_invalid,
        skipped_duplicate = result.skipped_duplicate,
        "recipients imported"
    );

    Ok(Json(result))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/recipients/import", post(import_recipients))
}
