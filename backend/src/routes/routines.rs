//! Workout routine routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::RoutineService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use fitpro_shared::types::{
    CreateRoutineRequest, MessageResponse, PaginatedResponse, PlanListQuery, RoutineResponse,
    UpdateRoutineRequest,
};
use uuid::Uuid;

pub fn routine_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_routines).post(create_routine))
        .route(
            "/:id",
            get(get_routine).put(update_routine).delete(delete_routine),
        )
}

/// GET /api/v1/routines
///
/// Clients only see routines they created or are assigned.
async fn list_routines(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PlanListQuery>,
) -> ApiResult<Json<PaginatedResponse<RoutineResponse>>> {
    let routines = RoutineService::list(state.db(), &auth.actor, query).await?;
    Ok(Json(routines))
}

async fn get_routine(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RoutineResponse>> {
    let routine = RoutineService::get(state.db(), &auth.actor, id).await?;
    Ok(Json(routine))
}

async fn create_routine(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateRoutineRequest>,
) -> ApiResult<(StatusCode, Json<RoutineResponse>)> {
    let routine = RoutineService::create(state.db(), &auth.actor, req).await?;
    Ok((StatusCode::CREATED, Json(routine)))
}

async fn update_routine(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoutineRequest>,
) -> ApiResult<Json<RoutineResponse>> {
    let routine = RoutineService::update(state.db(), &auth.actor, id, req).await?;
    Ok(Json(routine))
}

/// DELETE /api/v1/routines/:id - soft delete
async fn delete_routine(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    RoutineService::delete(state.db(), &auth.actor, id).await?;
    Ok(Json(MessageResponse::new("Routine deleted")))
}
