use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use super::{service, types::SendNowRequest};
use crate::app::{error::AppError, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNowResponse {
    pub campaign_id: String,
    pub recipient_count: i64,
}

/// POST /api/campaigns/:id/send-now — queue the campaign for the dispatcher.
async fn send_now(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SendNowRequest>,
) -> Result<(StatusCode, Json<SendNowResponse>), AppError> {
    let settings = request.into_settings(state.decryptor.as_ref())?;
    let started = service::start_sending(&state.db, &state.sessions, &id, settings).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SendNowResponse {
            campaign_id: started.campaign_id,
            recipient_count: started.recipient_count,
        }),
    ))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/campaigns/:id/send-now", post(send_now))
}
