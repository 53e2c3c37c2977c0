use axum::{extract::State, routing::get, Router};

use crate::app::{error::AppError, AppState};

/// GET /healthz
async fn healthz(State(state): State<AppState>) -> Result<&'static str, AppError> {
    sqlx::query("SELECT 1").execute(&state.db).await?;
    Ok("ok")
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}
