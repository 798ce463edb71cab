//! Authentication routes
//!
//! Register and login return the token in the body and also set it as an
//! HTTP-only session cookie, so browser and API clients share one flow.

use crate::auth::cookie::{clear_cookie, session_cookie, set_cookie_headers};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::{AuthService, SeedService};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use fitpro_shared::types::{
    AuthResponse, CreateAdminRequest, LoginRequest, MessageResponse, RegisterRequest,
    SeedResponse, UserResponse,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/create-admin", post(create_admin))
        .route("/seed", post(seed))
}

fn session_headers(state: &AppState, auth: &AuthResponse) -> HeaderMap {
    let cookie = session_cookie(
        &state.config().auth.cookie_name,
        &auth.token,
        auth.expires_in,
        state.secure_cookies(),
    );
    set_cookie_headers(&cookie)
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, HeaderMap, Json<AuthResponse>)> {
    let auth = AuthService::register(state.db(), state.jwt(), req).await?;
    let headers = session_headers(&state, &auth);
    Ok((StatusCode::CREATED, headers, Json(auth)))
}

/// POST /api/v1/auth/login
///
/// Deactivated accounts are refused with 403 even when the password matches.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(HeaderMap, Json<AuthResponse>)> {
    let auth = AuthService::login(state.db(), state.jwt(), req).await?;
    let headers = session_headers(&state, &auth);
    Ok((headers, Json(auth)))
}

/// POST /api/v1/auth/logout
///
/// Tokens are stateless, so this only expires the cookie.
async fn logout(State(state): State<AppState>) -> (HeaderMap, Json<MessageResponse>) {
    let cookie = clear_cookie(&state.config().auth.cookie_name, state.secure_cookies());
    (
        set_cookie_headers(&cookie),
        Json(MessageResponse::new("Logged out")),
    )
}

/// GET /api/v1/auth/me
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<UserResponse>> {
    let user = AuthService::current_user(state.db(), &auth.actor).await?;
    Ok(Json(user))
}

/// POST /api/v1/auth/create-admin
///
/// One-time bootstrap guarded by the configured setup secret.
async fn create_admin(
    State(state): State<AppState>,
    Json(req): Json<CreateAdminRequest>,
) -> ApiResult<(StatusCode, HeaderMap, Json<AuthResponse>)> {
    let secret = state.config().auth.admin_setup_secret.as_deref();
    let auth = AuthService::create_admin(state.db(), state.jwt(), secret, req).await?;
    let headers = session_headers(&state, &auth);
    Ok((StatusCode::CREATED, headers, Json(auth)))
}

/// POST /api/v1/auth/seed (development only)
async fn seed(State(state): State<AppState>) -> ApiResult<Json<SeedResponse>> {
    let seeded = SeedService::run(state.db()).await?;
    Ok(Json(seeded))
}
