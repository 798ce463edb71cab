//! Business logic services
//!
//! Services validate input, consult [`Policy`](crate::policy::Policy) and
//! coordinate between repositories.

pub mod assignment;
pub mod auth;
pub mod calendar;
pub mod dashboard;
pub mod exercise;
pub mod meal_plan;
pub mod routine;
pub mod seed;
pub mod user;

pub use assignment::AssignmentService;
pub use auth::AuthService;
pub use calendar::CalendarService;
pub use dashboard::DashboardService;
pub use exercise::ExerciseService;
pub use meal_plan::MealPlanService;
pub use routine::RoutineService;
pub use seed::SeedService;
pub use user::UserService;

use crate::error::ApiError;
use crate::policy::{PolicyError, Resource};
use crate::repositories::filter;
use fitpro_shared::errors::ValidationErrors;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

/// Explain why a guarded write matched no row
///
/// The id either does not resolve (not found) or names a record outside the
/// caller's scope (forbidden).
pub(crate) async fn unmatched_write(pool: &PgPool, resource: Resource, id: Uuid) -> ApiError {
    match filter::exists(pool, resource, id).await {
        Ok(true) => PolicyError::Forbidden(resource).into(),
        Ok(false) => not_found(resource),
        Err(err) => ApiError::Internal(err),
    }
}

pub(crate) fn not_found(resource: Resource) -> ApiError {
    PolicyError::TargetNotFound(resource).into()
}

/// Parse an optional enumerated field, recording a failure against `field`
pub(crate) fn parse_field<T>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
) -> Option<T>
where
    T: FromStr<Err = String>,
{
    match value.map(str::parse::<T>) {
        Some(Ok(parsed)) => Some(parsed),
        Some(Err(message)) => {
            errors.add(field, message);
            None
        }
        None => None,
    }
}

/// Trim a text field and drop it when blank
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitpro_shared::models::Difficulty;

    #[test]
    fn test_parse_field_records_error() {
        let mut errors = ValidationErrors::new();
        let parsed: Option<Difficulty> = parse_field(&mut errors, "difficulty", Some("extreme"));
        assert!(parsed.is_none());
        assert!(errors.has_field("difficulty"));

        let parsed: Option<Difficulty> = parse_field(&mut errors, "difficulty", Some("Advanced"));
        assert_eq!(parsed, Some(Difficulty::Advanced));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  hola ".to_string())), Some("hola".to_string()));
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }
}
