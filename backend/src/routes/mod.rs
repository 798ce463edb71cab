//! Route definitions for the FitPro API
//!
//! Every resource router is nested under `/api/v1`; health probes stay at
//! the root so orchestrators can reach them without the API prefix.

use crate::state::AppState;
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod assignments;
mod auth;
mod calendar;
mod dashboard;
mod exercises;
mod health;
mod meal_plans;
mod routines;
mod users;


pub use assignments::assignment_routes;
pub use auth::auth_routes;
pub use calendar::calendar_routes;
pub use dashboard::dashboard_routes;
pub use exercises::exercise_routes;
pub use meal_plans::meal_plan_routes;
pub use routines::routine_routes;
pub use users::user_routes;

/// Create the application router with all middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .nest("/api/v1", api_routes())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE]),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "FitPro API v1" }))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/exercises", exercise_routes())
        .nest("/routines", routine_routes())
        .nest("/meal-plans", meal_plan_routes())
        .nest("/assignments", assignment_routes())
        .nest("/calendar", calendar_routes())
        .nest("/dashboard", dashboard_routes())
}
