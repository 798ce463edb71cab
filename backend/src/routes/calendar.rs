//! Calendar event routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::CalendarService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use fitpro_shared::types::{
    CalendarEventResponse, CreateEventRequest, EventListQuery, MessageResponse,
    PaginatedResponse, SetEventCompletedRequest, UpdateEventRequest,
};
use uuid::Uuid;

pub fn calendar_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route(
            "/:id",
            get(get_event)
                .put(update_event)
                .patch(set_completed)
                .delete(delete_event),
        )
}

/// GET /api/v1/calendar - filter by start_date, end_date, type, completed
async fn list_events(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<EventListQuery>,
) -> ApiResult<Json<PaginatedResponse<CalendarEventResponse>>> {
    let events = CalendarService::list(state.db(), &auth.actor, query).await?;
    Ok(Json(events))
}

async fn get_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CalendarEventResponse>> {
    let event = CalendarService::get(state.db(), &auth.actor, id).await?;
    Ok(Json(event))
}

async fn create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<CalendarEventResponse>)> {
    let event = CalendarService::create(state.db(), &auth.actor, req).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> ApiResult<Json<CalendarEventResponse>> {
    let event = CalendarService::update(state.db(), &auth.actor, id, req).await?;
    Ok(Json(event))
}

/// PATCH /api/v1/calendar/:id - mark completed or not
async fn set_completed(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SetEventCompletedRequest>,
) -> ApiResult<Json<CalendarEventResponse>> {
    let event = CalendarService::set_completed(state.db(), &auth.actor, id, req.completed).await?;
    Ok(Json(event))
}

async fn delete_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    CalendarService::delete(state.db(), &auth.actor, id).await?;
    Ok(Json(MessageResponse::new("Event deleted")))
}
