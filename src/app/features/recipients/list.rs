use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::app::{db, error::AppError, AppState};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 500;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageQuery {
    /// 1-based page and a page size clamped to 1..=500.
    pub fn normalise(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientResponse {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: i64,
}

impl From<db::Recipient> for RecipientResponse {
    fn from(r: db::Recipient) -> Self {
        Self {
            id: r.id,
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientPage {
    pub items: Vec<RecipientResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: i64,
}

/// GET /api/recipients?page&pageSize — newest first.
async fn list_recipients(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<RecipientPage>, AppError> {
    let (page, page_size) = query.normalise();

    let total_items = db::recipients::count(&state.db).await?;
    let items = db::recipients::list_page(&state.db, page, page_size).await?;
    let total_pages = (total_items + i64::from(page_size) - 1) / i64::from(page_size);

    Ok(Json(RecipientPage {
        items: items.into_iter().map(RecipientResponse::from).collect(),
        page,
        page_size,
        total_items,
        total_pages,
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/recipients", get(list_recipients))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(PageQuery::default().normalise(), (1, 50));
    }

    #[test]
    fn clamps_page_size_and_page() {
        let q = PageQuery {
            page: Some(0),
            page_size: Some(10_000),
        };
        assert_eq!(q.normalise(), (1, 500));

        let q = PageQuery {
            page: Some(3),
            page_size: Some(0),
        };
        assert_eq!(q.normalise(), (3, 1));
    }
}
