use axum::{extract::State, routing::get, Json, Router};

use super::{stats::resolve_total_recipients, types::CampaignSummaryResponse};
use crate::app::{db, error::AppError, AppState};

/// GET /api/campaigns — all campaigns, newest first, with send statistics.
async fn list_campaigns(State(state): State<AppState>) -> Result<Json<Vec<CampaignSummaryResponse>>, AppError> {
    let campaigns = db::campaigns::list_all(&state.db).await?;
    let counts = db::send_logs::counts_by_campaign(&state.db).await?;
    let ledger_count = db::recipients::count(&state.db).await?;

    let summaries = campaigns
        .into_iter()
        .map(|campaign| {
            let c = counts.get(&campaign.id).copied().unwrap_or_default();
            let total = resolve_total_recipients(campaign.target_recipient_count, c, ledger_count);
            CampaignSummaryResponse::new(campaign, total, c)
        })
        .collect();

    Ok(Json(summaries))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/campaigns", get(list_campaigns))
}
