//! Trainer-to-client assignment routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::AssignmentService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use fitpro_shared::types::{
    AssignmentListQuery, AssignmentResponse, CreateAssignmentRequest, LogProgressRequest,
    MessageResponse, PaginatedResponse, SetAssignmentStatusRequest, UpdateAssignmentRequest,
};
use uuid::Uuid;

pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assignments).post(create_assignment))
        .route(
            "/:id",
            get(get_assignment)
                .put(update_assignment)
                .delete(delete_assignment),
        )
        .route("/:id/status", patch(set_status))
        .route("/:id/progress", post(log_progress))
}

/// GET /api/v1/assignments - filter by status, client_id
async fn list_assignments(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AssignmentListQuery>,
) -> ApiResult<Json<PaginatedResponse<AssignmentResponse>>> {
    let assignments = AssignmentService::list(state.db(), &auth.actor, query).await?;
    Ok(Json(assignments))
}

async fn get_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AssignmentResponse>> {
    let assignment = AssignmentService::get(state.db(), &auth.actor, id).await?;
    Ok(Json(assignment))
}

/// POST /api/v1/assignments
///
/// Needs a routine or a meal plan; trainers default to themselves.
async fn create_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<AssignmentResponse>)> {
    let assignment = AssignmentService::create(state.db(), &auth.actor, req).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

async fn update_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAssignmentRequest>,
) -> ApiResult<Json<AssignmentResponse>> {
    let assignment = AssignmentService::update(state.db(), &auth.actor, id, req).await?;
    Ok(Json(assignment))
}

async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetAssignmentStatusRequest>,
) -> ApiResult<Json<AssignmentResponse>> {
    let assignment =
        AssignmentService::set_status(state.db(), &auth.actor, id, &req.status).await?;
    Ok(Json(assignment))
}

/// POST /api/v1/assignments/:id/progress
async fn log_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<LogProgressRequest>,
) -> ApiResult<(StatusCode, Json<AssignmentResponse>)> {
    let assignment = AssignmentService::log_progress(state.db(), &auth.actor, id, req).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

async fn delete_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    AssignmentService::delete(state.db(), &auth.actor, id).await?;
    Ok(Json(MessageResponse::new("Assignment deleted")))
}
