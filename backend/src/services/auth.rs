//! Authentication service: registration, login and administrator bootstrap
//!
//! # Performance
//!
//! - Password hashing/verification runs on the blocking thread pool
//! - JWT service is passed by reference (pre-computed keys)

use crate::auth::{JwtService, PasswordService};
use crate::error::ApiError;
use crate::policy::{Actor, Resource};
use crate::repositories::{NewUser, UserRecord, UserRepository};
use crate::services::not_found;
use crate::services::user::validate_profile;
use fitpro_shared::errors::{AuthError, ValidationErrors};
use fitpro_shared::models::Role;
use fitpro_shared::types::{
    AuthResponse, CreateAdminRequest, GymProfile, LoginRequest, RegisterRequest, UserResponse,
};
use fitpro_shared::validation::{self, MAX_NAME_LEN};
use sqlx::PgPool;
use tracing::{info, warn};
use validator::ValidateEmail;

/// Role a self-registration produces
///
/// `admin` is refused outright; anything unrecognised falls back to client.
pub fn resolve_registration_role(requested: Option<&str>) -> Result<Role, ApiError> {
    match requested.map(str::parse::<Role>) {
        Some(Ok(Role::Admin)) => Err(ApiError::Forbidden(
            "Administrator accounts cannot be self-registered".to_string(),
        )),
        Some(Ok(role)) if role.is_self_registrable() => Ok(role),
        _ => Ok(Role::Client),
    }
}

/// Compare secrets without short-circuiting on the first differing byte
fn secrets_match(expected: &str, provided: &str) -> bool {
    let (a, b) = (expected.as_bytes(), provided.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Validate the fields every account carries
fn validate_credentials(
    errors: &mut ValidationErrors,
    name: &str,
    email: &str,
    password: &str,
) {
    errors.check("name", validation::validate_required_text(name, MAX_NAME_LEN));
    // Shape check from the shared crate, then the stricter address rules
    let email_check = validation::validate_email(email).and_then(|()| {
        if email.validate_email() {
            Ok(())
        } else {
            Err("Invalid email format".to_string())
        }
    });
    errors.check("email", email_check);
    errors.check("password", validation::validate_password(password));
}

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Register a trainer or client account
    pub async fn register(
        pool: &PgPool,
        jwt: &JwtService,
        request: RegisterRequest,
    ) -> Result<AuthResponse, ApiError> {
        let role = resolve_registration_role(request.role.as_deref())?;

        let name = request.name.trim().to_string();
        let email = validation::normalize_email(&request.email);

        let mut errors = ValidationErrors::new();
        validate_credentials(&mut errors, &name, &email, &request.password);
        let (profile, trainer_id) = if role == Role::Client {
            (validate_profile(&request.profile, &mut errors), request.trainer_id)
        } else {
            (GymProfile::default(), None)
        };
        errors.into_result()?;

        if UserRepository::email_exists(pool, &email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::AlreadyExists("Email already registered".to_string()));
        }

        if let Some(trainer_id) = trainer_id {
            let is_trainer = UserRepository::find_by_id(pool, trainer_id)
                .await
                .map_err(ApiError::Internal)?
                .is_some_and(|t| t.role() == Role::Trainer && t.is_active);
            if !is_trainer {
                return Err(ApiError::invalid(
                    "trainer_id",
                    "Trainer not found or inactive",
                ));
            }
        }

        let password_hash = PasswordService::hash_async(request.password)
            .await
            .map_err(ApiError::Internal)?;

        let user = UserRepository::create(
            pool,
            &NewUser {
                name,
                email,
                password_hash,
                role,
                trainer_id,
                profile,
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        info!(user_id = %user.id, role = %role, "User registered");
        Self::session(jwt, &user, "User registered successfully")
    }

    /// Exchange credentials for a session token
    pub async fn login(
        pool: &PgPool,
        jwt: &JwtService,
        request: LoginRequest,
    ) -> Result<AuthResponse, ApiError> {
        let email = validation::normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            let mut errors = ValidationErrors::new();
            if email.is_empty() {
                errors.add("email", "Email is required");
            }
            if request.password.is_empty() {
                errors.add("password", "Password is required");
            }
            return Err(errors.into());
        }

        let user = UserRepository::find_by_email(pool, &email)
            .await
            .map_err(ApiError::Internal)?
            .ok_or(AuthError::InvalidCredentials)?;

        let valid = PasswordService::verify_async(request.password, user.password_hash.clone())
            .await
            .map_err(ApiError::Internal)?;
        if !valid {
            warn!(user_id = %user.id, "Failed login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }

        if !user.is_active {
            return Err(ApiError::Forbidden(AuthError::InactiveAccount.to_string()));
        }

        info!(user_id = %user.id, "User logged in");
        Self::session(jwt, &user, "Login successful")
    }

    /// Currently authenticated account
    pub async fn current_user(pool: &PgPool, actor: &Actor) -> Result<UserResponse, ApiError> {
        UserRepository::find_by_id(pool, actor.id)
            .await
            .map_err(ApiError::Internal)?
            .map(|user| user.to_response())
            .ok_or_else(|| not_found(Resource::User))
    }

    /// Create the first administrator
    ///
    /// Disabled unless a setup secret is configured. Concurrent calls are
    /// serialised by an advisory lock held for the transaction.
    pub async fn create_admin(
        pool: &PgPool,
        jwt: &JwtService,
        setup_secret: Option<&str>,
        request: CreateAdminRequest,
    ) -> Result<AuthResponse, ApiError> {
        let Some(expected) = setup_secret.filter(|s| !s.is_empty()) else {
            return Err(ApiError::Forbidden(
                "Administrator bootstrap is disabled".to_string(),
            ));
        };
        if !secrets_match(expected, &request.secret) {
            warn!("Administrator bootstrap attempted with an invalid secret");
            return Err(ApiError::Forbidden("Invalid setup secret".to_string()));
        }

        let name = request.name.trim().to_string();
        let email = validation::normalize_email(&request.email);
        let mut errors = ValidationErrors::new();
        validate_credentials(&mut errors, &name, &email, &request.password);
        errors.into_result()?;

        let password_hash = PasswordService::hash_async(request.password)
            .await
            .map_err(ApiError::Internal)?;

        let mut tx = pool.begin().await?;
        UserRepository::lock_admin_bootstrap(&mut *tx)
            .await
            .map_err(ApiError::Internal)?;

        if UserRepository::email_exists(&mut *tx, &email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::AlreadyExists("Email already registered".to_string()));
        }
        if UserRepository::admin_exists(&mut *tx)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::AlreadyExists(
                "An administrator already exists".to_string(),
            ));
        }

        let user = UserRepository::create(
            &mut *tx,
            &NewUser {
                name,
                email,
                password_hash,
                role: Role::Admin,
                trainer_id: None,
                profile: GymProfile::default(),
            },
        )
        .await
        .map_err(ApiError::Internal)?;
        tx.commit().await?;

        info!(user_id = %user.id, "Administrator created");
        Self::session(jwt, &user, "Administrator created successfully")
    }

    fn session(jwt: &JwtService, user: &UserRecord, message: &str) -> Result<AuthResponse, ApiError> {
        let token = jwt
            .generate_token(user.id, &user.email, user.role())
            .map_err(ApiError::Internal)?;

        Ok(AuthResponse {
            message: message.to_string(),
            user: user.to_response(),
            token,
            expires_in: jwt.token_expiry_secs(),
        })
    }
}
