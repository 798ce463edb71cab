//! User directory and own-profile routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use fitpro_shared::types::{
    PaginatedResponse, SetUserStatusRequest, UpdateProfileRequest, UserListQuery, UserResponse,
};
use uuid::Uuid;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/:id", get(get_user))
        .route("/:id/status", patch(set_status))
}

/// GET /api/v1/users
///
/// Admins see everyone, trainers see themselves and their clients.
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<PaginatedResponse<UserResponse>>> {
    let users = UserService::list(state.db(), &auth.actor, query).await?;
    Ok(Json(users))
}

async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let user = UserService::get(state.db(), &auth.actor, id).await?;
    Ok(Json(user))
}

async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<UserResponse>> {
    let user = UserService::get_profile(state.db(), &auth.actor).await?;
    Ok(Json(user))
}

/// PUT /api/v1/users/profile
///
/// Absent fields keep their stored values.
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = UserService::update_profile(state.db(), &auth.actor, req).await?;
    Ok(Json(user))
}

/// PATCH /api/v1/users/:id/status
async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetUserStatusRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = UserService::set_status(state.db(), &auth.actor, id, req.is_active).await?;
    Ok(Json(user))
}
