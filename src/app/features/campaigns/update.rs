use axum::{
    extract::{Path, State},
    routing::put,
    Json, Router,
};

use super::{
    show::{detail, find_campaign},
    types::{CampaignDetailResponse, CampaignUpsertRequest},
};
use crate::app::{db, domain::CampaignStatus, error::AppError, AppState};

const ONLY_DRAFT_EDITABLE: &str = "Only draft campaigns can be edited.";

/// PUT /api/campaigns/:id — replace a Draft campaign's content.
async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CampaignUpsertRequest>,
) -> Result<Json<CampaignDetailResponse>, AppError> {
    let campaign = find_campaign(&state, &id).await?;
    if campaign.status != CampaignStatus::Draft {
        return Err(AppError::Validation(ONLY_DRAFT_EDITABLE.to_string()));
    }

    let content = request.into_content()?;

    // Guarded on status, so a concurrent send-now wins.
    if !db::campaigns::update_content(&state.db, &id, &content).await? {
        return Err(AppError::Validation(ONLY_DRAFT_EDITABLE.to_string()));
    }

    let campaign = find_campaign(&state, &id).await?;
    Ok(Json(detail(&state, campaign).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/campaigns/:id", put(update_campaign))
}
