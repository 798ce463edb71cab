//! Meal plan routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::MealPlanService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use fitpro_shared::types::{
    CreateMealPlanRequest, MealPlanResponse, MessageResponse, PaginatedResponse, PlanListQuery,
    UpdateMealPlanRequest,
};
use uuid::Uuid;

pub fn meal_plan_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_meal_plans).post(create_meal_plan))
        .route(
            "/:id",
            get(get_meal_plan)
                .put(update_meal_plan)
                .delete(delete_meal_plan),
        )
}

async fn list_meal_plans(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PlanListQuery>,
) -> ApiResult<Json<PaginatedResponse<MealPlanResponse>>> {
    let plans = MealPlanService::list(state.db(), &auth.actor, query).await?;
    Ok(Json(plans))
}

async fn get_meal_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MealPlanResponse>> {
    let plan = MealPlanService::get(state.db(), &auth.actor, id).await?;
    Ok(Json(plan))
}

async fn create_meal_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateMealPlanRequest>,
) -> ApiResult<(StatusCode, Json<MealPlanResponse>)> {
    let plan = MealPlanService::create(state.db(), &auth.actor, req).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn update_meal_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMealPlanRequest>,
) -> ApiResult<Json<MealPlanResponse>> {
    let plan = MealPlanService::update(state.db(), &auth.actor, id, req).await?;
    Ok(Json(plan))
}

async fn delete_meal_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    MealPlanService::delete(state.db(), &auth.actor, id).await?;
    Ok(Json(MessageResponse::new("Meal plan deleted")))
}
