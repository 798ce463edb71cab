//! Dashboard statistics route

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::DashboardService;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use fitpro_shared::types::DashboardStats;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}

/// GET /api/v1/dashboard/stats
///
/// The payload shape depends on the caller's role and is tagged with it.
async fn stats(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<DashboardStats>> {
    let stats = DashboardService::stats(state.db(), &auth.actor).await?;
    Ok(Json(stats))
}
