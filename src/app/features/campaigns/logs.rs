use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use super::{show::find_campaign, types::SendLogResponse};
use crate::app::{db, error::AppError, AppState};

/// GET /api/campaigns/:id/logs — newest outcome first.
async fn list_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SendLogResponse>>, AppError> {
    let campaign = find_campaign(&state, &id).await?;
    let logs = db::send_logs::list_for_campaign(&state.db, &campaign.id).await?;
    Ok(Json(logs.into_iter().map(SendLogResponse::from).collect()))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/campaigns/:id/logs", get(list_logs))
}
