//! Exercise catalog routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::ExerciseService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use fitpro_shared::types::{
    CreateExerciseRequest, ExerciseListQuery, ExerciseResponse, PaginatedResponse,
};
use uuid::Uuid;

pub fn exercise_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_exercises).post(create_exercise))
        .route("/:id", get(get_exercise))
}

/// GET /api/v1/exercises - filter by search, muscle_group, difficulty
async fn list_exercises(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ExerciseListQuery>,
) -> ApiResult<Json<PaginatedResponse<ExerciseResponse>>> {
    let exercises = ExerciseService::list(state.db(), &auth.actor, query).await?;
    Ok(Json(exercises))
}

async fn get_exercise(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ExerciseResponse>> {
    let exercise = ExerciseService::get(state.db(), &auth.actor, id).await?;
    Ok(Json(exercise))
}

/// POST /api/v1/exercises - trainers and admins
async fn create_exercise(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateExerciseRequest>,
) -> ApiResult<(StatusCode, Json<ExerciseResponse>)> {
    let exercise = ExerciseService::create(state.db(), &auth.actor, req).await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}
