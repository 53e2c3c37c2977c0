use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpKeyResponse {
    pub key_id: String,
    pub public_key_pem: String,
}

/// GET /api/keys/smtp — public key browsers use to encrypt SMTP passwords.
async fn smtp_key(State(state): State<AppState>) -> Json<SmtpKeyResponse> {
    Json(SmtpKeyResponse {
        key_id: state.decryptor.key_id().to_string(),
        public_key_pem: state.decryptor.public_key_pem().to_string(),
    })
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/keys/smtp", get(smtp_key))
}
