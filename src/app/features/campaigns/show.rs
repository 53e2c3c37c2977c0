use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use super::{stats::resolve_total_recipients, types::CampaignDetailResponse};
use crate::app::{db, error::AppError, AppState};

/// Load a campaign or fail with 404.
pub(super) async fn find_campaign(state: &AppState, id: &str) -> Result<db::Campaign, AppError> {
    db::campaigns::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))
}

/// Detail view with statistics.
pub(super) async fn detail(state: &AppState, campaign: db::Campaign) -> Result<CampaignDetailResponse, AppError> {
    let counts = db::send_logs::counts(&state.db, &campaign.id).await?;
    let ledger_count = if campaign.target_recipient_count > 0 || counts.total() > 0 {
        0
    } else {
        db::recipients::count(&state.db).await?
    };
    let total = resolve_total_recipients(campaign.target_recipient_count, counts, ledger_count);
    Ok(CampaignDetailResponse::new(campaign, total, counts))
}

/// GET /api/campaigns/:id
async fn show_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CampaignDetailResponse>, AppError> {
    let campaign = find_campaign(&state, &id).await?;
    Ok(Json(detail(&state, campaign).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/campaigns/:id", get(show_campaign))
}
