//! User directory and profile management

use crate::error::ApiError;
use crate::policy::{Action, Actor, Policy, Resource};
use crate::repositories::{Page, UserFilter, UserRepository};
use crate::services::{not_found, parse_field, unmatched_write};
use fitpro_shared::errors::ValidationErrors;
use fitpro_shared::models::Role;
use fitpro_shared::types::{
    GymProfile, GymProfileInput, PaginatedResponse, UpdateProfileRequest, UserListQuery,
    UserResponse,
};
use fitpro_shared::validation::{self, MAX_MEDICAL_CONDITIONS_LEN, MAX_NAME_LEN};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Validate submitted gym profile fields into their stored form
///
/// Failures are recorded in `errors`; the returned profile only carries the
/// fields that passed.
pub fn validate_profile(input: &GymProfileInput, errors: &mut ValidationErrors) -> GymProfile {
    let mut profile = GymProfile::default();

    if let Some(age) = input.age {
        match validation::validate_age(age) {
            Ok(()) => profile.age = Some(age),
            Err(e) => errors.add("age", e),
        }
    }
    if let Some(weight) = input.weight {
        match validation::validate_weight_kg(weight) {
            Ok(()) => profile.weight = Some(weight),
            Err(e) => errors.add("weight", e),
        }
    }
    if let Some(height) = input.height {
        match validation::validate_height_cm(height) {
            Ok(()) => profile.height = Some(height),
            Err(e) => errors.add("height", e),
        }
    }
    if let Some(phone) = input.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        match validation::validate_phone(phone) {
            Ok(()) => profile.phone = Some(phone.to_string()),
            Err(e) => errors.add("phone", e),
        }
    }
    if let Some(conditions) = input.medical_conditions.as_deref().map(str::trim) {
        match validation::validate_max_len(conditions, MAX_MEDICAL_CONDITIONS_LEN) {
            Ok(()) if !conditions.is_empty() => {
                profile.medical_conditions = Some(conditions.to_string())
            }
            Ok(()) => {}
            Err(e) => errors.add("medical_conditions", e),
        }
    }
    profile.gender = parse_field(errors, "gender", input.gender.as_deref());
    profile.goal = parse_field(errors, "goal", input.goal.as_deref());
    profile.activity_level = parse_field(errors, "activity_level", input.activity_level.as_deref());

    profile
}

/// User service
pub struct UserService;

impl UserService {
    /// List the users visible to the actor
    pub async fn list(
        pool: &PgPool,
        actor: &Actor,
        query: UserListQuery,
    ) -> Result<PaginatedResponse<UserResponse>, ApiError> {
        let scope = Policy::scope(actor, Resource::User, Action::List)?;
        let page = Page::from_query(query.page, query.limit)?;

        let mut errors = ValidationErrors::new();
        let role: Option<Role> = parse_field(&mut errors, "role", query.role.as_deref());
        errors.into_result()?;

        let filter = UserFilter {
            role,
            search: query.search,
            is_active: query.is_active,
        };
        let (users, total) = UserRepository::list(pool, scope, &filter, page)
            .await
            .map_err(ApiError::Internal)?;

        Ok(PaginatedResponse {
            data: users.iter().map(|u| u.to_response()).collect(),
            pagination: page.info(total),
        })
    }

    /// Get one user the actor may see
    pub async fn get(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<UserResponse, ApiError> {
        let user = UserRepository::find_by_id(pool, id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| not_found(Resource::User))?;

        Policy::authorize(actor, Resource::User, Action::Read, &user.subject())?;
        Ok(user.to_response())
    }

    /// The actor's own account
    pub async fn get_profile(pool: &PgPool, actor: &Actor) -> Result<UserResponse, ApiError> {
        let user = UserRepository::find_by_id(pool, actor.id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| not_found(Resource::User))?;

        Ok(user.to_response())
    }

    /// Update the actor's own name and, for clients, gym profile
    ///
    /// Gym fields sent by trainers or admins are ignored.
    pub async fn update_profile(
        pool: &PgPool,
        actor: &Actor,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, ApiError> {
        Policy::scope(actor, Resource::User, Action::Update)?;

        let mut errors = ValidationErrors::new();
        let name = request.name.as_deref().map(str::trim);
        if let Some(name) = name {
            errors.check("name", validation::validate_required_text(name, MAX_NAME_LEN));
        }
        let profile = if actor.is_client() {
            validate_profile(&request.profile, &mut errors)
        } else {
            GymProfile::default()
        };
        errors.into_result()?;

        let user = UserRepository::update_profile(pool, actor.id, name, &profile)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| not_found(Resource::User))?;

        info!(user_id = %actor.id, "Profile updated");
        Ok(user.to_response())
    }

    /// Activate or deactivate another account
    pub async fn set_status(
        pool: &PgPool,
        actor: &Actor,
        id: Uuid,
        is_active: bool,
    ) -> Result<UserResponse, ApiError> {
        let scope = Policy::scope(actor, Resource::User, Action::SetStatus)?;

        match UserRepository::set_active(pool, id, is_active, scope)
            .await
            .map_err(ApiError::Internal)?
        {
            Some(user) => {
                info!(user_id = %id, is_active, by = %actor.id, "User status changed");
                Ok(user.to_response())
            }
            None => Err(unmatched_write(pool, Resource::User, id).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitpro_shared::models::{ActivityLevel, FitnessGoal, Gender};

    #[test]
    fn test_validate_profile_accepts_valid_fields() {
        let input = GymProfileInput {
            age: Some(25),
            weight: Some(70.0),
            height: Some(175.0),
            gender: Some("female".to_string()),
            phone: Some("+34 600-123-456".to_string()),
            goal: Some("tone".to_string()),
            activity_level: Some("intermediate".to_string()),
            medical_conditions: Some("  ".to_string()),
        };
        let mut errors = ValidationErrors::new();
        let profile = validate_profile(&input, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(profile.age, Some(25));
        assert_eq!(profile.gender, Some(Gender::Female));
        assert_eq!(profile.goal, Some(FitnessGoal::Tone));
        assert_eq!(profile.activity_level, Some(ActivityLevel::Intermediate));
        assert_eq!(profile.medical_conditions, None);
    }

    #[test]
    fn test_validate_profile_reports_each_bad_field() {
        let input = GymProfileInput {
            age: Some(0),
            weight: Some(900.0),
            height: Some(20.0),
            gender: Some("robot".to_string()),
            phone: Some("call me".to_string()),
            ..Default::default()
        };
        let mut errors = ValidationErrors::new();
        let profile = validate_profile(&input, &mut errors);

        for field in ["age", "weight", "height", "gender", "phone"] {
            assert!(errors.has_field(field), "missing error for {field}");
        }
        assert_eq!(profile, GymProfile::default());
    }
}
