use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use validator::Validate;

use super::{service, show::find_campaign, types::SendTestRequest};
use crate::app::{domain::Email, error::AppError, AppState};

/// POST /api/campaigns/:id/send-test — deliver one copy to a test address.
async fn send_test(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SendTestRequest>,
) -> Result<StatusCode, AppError> {
    let campaign = find_campaign(&state, &id).await?;

    request
        .validate()
        .map_err(|_| AppError::Validation("Invalid input".to_string()))?;
    let test_email =
        Email::new(&request.test_email).map_err(|_| AppError::Validation("Invalid test email".to_string()))?;
    let settings = request.smtp.into_settings(state.decryptor.as_ref())?;

    if let Err(err) = service::send_test_message(state.delivery.as_ref(), &campaign, &test_email, &settings).await {
        tracing::error!(%err, campaign_id = %campaign.id, "test send failed");
        return Err(AppError::Delivery(
            "SMTP send failed. Check credentials and try again.".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/campaigns/:id/send-test", post(send_test))
}
