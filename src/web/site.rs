use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::PageSection;
use crate::error::AppResult;
use crate::site::{self, PartnerRequest, SubscribeRequest, DEFAULT_PAGE};
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct SectionParams {
    page: Option<String>,
}

/// GET /api/sections?page=home
pub async fn sections(
    State(state): State<AppState>,
    Query(params): Query<SectionParams>,
) -> AppResult<Json<Vec<PageSection>>> {
    let page = params.page.as_deref().unwrap_or(DEFAULT_PAGE);
    Ok(Json(site::page_sections(state.db.pool(), page).await?))
}

/// POST /api/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<SubscribeRequest>,
) -> AppResult<Json<Value>> {
    site::subscribe(state.db.pool(), &body).await?;
    Ok(Json(json!({ "ok": true })))
}

/// POST /api/partner
pub async fn partner(
    State(state): State<AppState>,
    Json(body): Json<PartnerRequest>,
) -> AppResult<Json<Value>> {
    let id = site::partner_interest(state.db.pool(), &body).await?;
    Ok(Json(json!({ "ok": true, "id": id })))
}
