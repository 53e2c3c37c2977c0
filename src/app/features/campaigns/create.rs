use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use super::{
    show::detail,
    types::{CampaignDetailResponse, CampaignUpsertRequest},
};
use crate::app::{db, domain::CampaignId, error::AppError, AppState};

/// POST /api/campaigns — create a Draft campaign.
async fn create_campaign(
    State(state): State<AppState>,
    Json(request): Json<CampaignUpsertRequest>,
) -> Result<(StatusCode, Json<CampaignDetailResponse>), AppError> {
    let content = request.into_content()?;
    let id = CampaignId::new();

    db::campaigns::insert(&state.db, &id.as_str(), &content).await?;

    let campaign = db::campaigns::find_by_id(&state.db, &id.as_str())
        .await?
        .ok_or(AppError::Internal)?;

    tracing::info!(campaign_id = %id, "campaign created");

    Ok((StatusCode::CREATED, Json(detail(&state, campaign).await?)))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/campaigns", post(create_campaign))
}
