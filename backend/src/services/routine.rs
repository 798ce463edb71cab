//! Routine service

use crate::error::ApiError;
use crate::policy::{Action, Actor, Policy, Resource};
use crate::repositories::{
    filter, AssignmentRepository, ExerciseRepository, NewRoutine, Page, RoutineChanges,
    RoutineFilter, RoutineRecord, RoutineRepository, UserRepository,
};
use crate::services::{not_found, parse_field, unmatched_write};
use fitpro_shared::errors::ValidationErrors;
use fitpro_shared::types::{
    CreateRoutineRequest, PaginatedResponse, PlanListQuery, RoutineExercise,
    RoutineExerciseDetail, RoutineResponse, UpdateRoutineRequest,
};
use fitpro_shared::validation::{self, MAX_DESCRIPTION_LEN, MAX_NAME_LEN};
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

/// Longest free-text duration, e.g. "60 min"
const MAX_DURATION_LEN: usize = 50;

/// Validate routine slots; referenced exercises are checked separately
fn validate_slots(errors: &mut ValidationErrors, slots: &[RoutineExercise]) {
    errors.check("exercises", validation::validate_non_empty(slots, "exercise"));
    for (i, slot) in slots.iter().enumerate() {
        if let Err(e) = validation::validate_positive(slot.sets) {
            errors.add(&format!("exercises[{i}].sets"), e);
        }
        if slot.reps.trim().is_empty() {
            errors.add(&format!("exercises[{i}].reps"), "This field is required");
        }
        if slot.rest.trim().is_empty() {
            errors.add(&format!("exercises[{i}].rest"), "This field is required");
        }
    }
}

pub(crate) fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

pub struct RoutineService;

impl RoutineService {
    pub async fn list(
        pool: &PgPool,
        actor: &Actor,
        query: PlanListQuery,
    ) -> Result<PaginatedResponse<RoutineResponse>, ApiError> {
        let scope = Policy::scope(actor, Resource::Routine, Action::List)?;
        let page = Page::from_query(query.page, query.limit)?;

        let mut errors = ValidationErrors::new();
        let difficulty = parse_field(&mut errors, "difficulty", query.difficulty.as_deref());
        errors.into_result()?;

        let filter = RoutineFilter {
            search: query.search,
            difficulty,
        };
        let (routines, total) = RoutineRepository::list(pool, scope, &filter, page)
            .await
            .map_err(ApiError::Internal)?;

        Ok(PaginatedResponse {
            data: Self::responses(pool, &routines).await?,
            pagination: page.info(total),
        })
    }

    pub async fn get(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<RoutineResponse, ApiError> {
        let routine = RoutineRepository::find_active(pool, id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| not_found(Resource::Routine))?;

        let assignees = if actor.is_client() {
            AssignmentRepository::plan_assignees(pool, Resource::Routine, id)
                .await
                .map_err(ApiError::Internal)?
        } else {
            Vec::new()
        };
        Policy::authorize(
            actor,
            Resource::Routine,
            Action::Read,
            &routine.subject(assignees),
        )?;

        Self::response(pool, routine).await
    }

    pub async fn create(
        pool: &PgPool,
        actor: &Actor,
        request: CreateRoutineRequest,
    ) -> Result<RoutineResponse, ApiError> {
        Policy::scope(actor, Resource::Routine, Action::Create)?;

        let name = request.name.trim().to_string();
        let description = request.description.trim().to_string();
        let duration = request.duration.trim().to_string();

        let mut errors = ValidationErrors::new();
        errors.check("name", validation::validate_required_text(&name, MAX_NAME_LEN));
        errors.check(
            "description",
            validation::validate_required_text(&description, MAX_DESCRIPTION_LEN),
        );
        errors.check(
            "duration",
            validation::validate_required_text(&duration, MAX_DURATION_LEN),
        );
        let difficulty = parse_field(&mut errors, "difficulty", request.difficulty.as_deref());
        validate_slots(&mut errors, &request.exercises);
        errors.into_result()?;
        Self::ensure_exercises_exist(pool, &request.exercises).await?;

        let routine = RoutineRepository::create(
            pool,
            &NewRoutine {
                name,
                description,
                duration,
                difficulty: difficulty.unwrap_or_default(),
                exercises: request.exercises,
                tags: clean_tags(request.tags),
                created_by: actor.id,
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        info!(routine_id = %routine.id, by = %actor.id, "Routine created");
        Self::response(pool, routine).await
    }

    pub async fn update(
        pool: &PgPool,
        actor: &Actor,
        id: Uuid,
        request: UpdateRoutineRequest,
    ) -> Result<RoutineResponse, ApiError> {
        let scope = Policy::scope(actor, Resource::Routine, Action::Update)?;

        let mut errors = ValidationErrors::new();
        let name = request.name.map(|n| n.trim().to_string());
        let description = request.description.map(|d| d.trim().to_string());
        let duration = request.duration.map(|d| d.trim().to_string());
        if let Some(name) = &name {
            errors.check("name", validation::validate_required_text(name, MAX_NAME_LEN));
        }
        if let Some(description) = &description {
            errors.check(
                "description",
                validation::validate_required_text(description, MAX_DESCRIPTION_LEN),
            );
        }
        if let Some(duration) = &duration {
            errors.check(
                "duration",
                validation::validate_required_text(duration, MAX_DURATION_LEN),
            );
        }
        let difficulty = parse_field(&mut errors, "difficulty", request.difficulty.as_deref());
        if let Some(slots) = &request.exercises {
            validate_slots(&mut errors, slots);
        }
        errors.into_result()?;
        if let Some(slots) = &request.exercises {
            Self::ensure_exercises_exist(pool, slots).await?;
        }

        let changes = RoutineChanges {
            name,
            description,
            duration,
            difficulty,
            exercises: request.exercises,
            tags: request.tags.map(clean_tags),
        };
        match RoutineRepository::update(pool, id, &changes, scope)
            .await
            .map_err(ApiError::Internal)?
        {
            Some(routine) => {
                info!(routine_id = %id, by = %actor.id, "Routine updated");
                Self::response(pool, routine).await
            }
            None => Err(unmatched_write(pool, Resource::Routine, id).await),
        }
    }

    /// Deactivate a routine
    pub async fn delete(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let scope = Policy::scope(actor, Resource::Routine, Action::Delete)?;

        if filter::delete_scoped(pool, Resource::Routine, id, scope)
            .await
            .map_err(ApiError::Internal)?
        {
            info!(routine_id = %id, by = %actor.id, "Routine deactivated");
            Ok(())
        } else {
            Err(unmatched_write(pool, Resource::Routine, id).await)
        }
    }

    async fn ensure_exercises_exist(pool: &PgPool, slots: &[RoutineExercise]) -> Result<(), ApiError> {
        let ids: Vec<Uuid> = slots.iter().map(|s| s.exercise_id).collect();
        let missing = ExerciseRepository::missing_ids(pool, &ids)
            .await
            .map_err(ApiError::Internal)?;

        if missing.is_empty() {
            Ok(())
        } else {
            let ids: Vec<String> = missing.iter().map(Uuid::to_string).collect();
            Err(ApiError::invalid(
                "exercises",
                format!("Unknown exercise ids: {}", ids.join(", ")),
            ))
        }
    }

    async fn response(pool: &PgPool, routine: RoutineRecord) -> Result<RoutineResponse, ApiError> {
        let mut responses = Self::responses(pool, std::slice::from_ref(&routine)).await?;
        responses
            .pop()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("routine response not built")))
    }

    /// Resolve creators and exercise slots
    async fn responses(
        pool: &PgPool,
        routines: &[RoutineRecord],
    ) -> Result<Vec<RoutineResponse>, ApiError> {
        let creator_ids: Vec<Uuid> = routines.iter().map(|r| r.created_by).collect();
        let exercise_ids: Vec<Uuid> = routines
            .iter()
            .flat_map(|r| r.exercises.0.iter().map(|s| s.exercise_id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let (creators, exercises) = tokio::try_join!(
            UserRepository::summaries(pool, &creator_ids),
            ExerciseRepository::summaries(pool, &exercise_ids),
        )
        .map_err(ApiError::Internal)?;

        Ok(routines
            .iter()
            .map(|r| RoutineResponse {
                id: r.id,
                name: r.name.clone(),
                description: r.description.clone(),
                duration: r.duration.clone(),
                difficulty: r.difficulty(),
                exercises: r
                    .ordered_exercises()
                    .into_iter()
                    .map(|slot| RoutineExerciseDetail {
                        exercise: exercises.get(&slot.exercise_id).cloned(),
                        exercise_id: slot.exercise_id,
                        sets: slot.sets,
                        reps: slot.reps,
                        rest: slot.rest,
                        order: slot.order,
                    })
                    .collect(),
                tags: r.tags.clone(),
                created_by: creators.get(&r.created_by).cloned(),
                is_active: r.is_active,
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(sets: i32, reps: &str) -> RoutineExercise {
        RoutineExercise {
            exercise_id: Uuid::new_v4(),
            sets,
            reps: reps.to_string(),
            rest: "60s".to_string(),
            order: 1,
        }
    }

    #[test]
    fn test_empty_routine_rejected() {
        let mut errors = ValidationErrors::new();
        validate_slots(&mut errors, &[]);
        assert!(errors.has_field("exercises"));
    }

    #[test]
    fn test_slot_errors_are_indexed() {
        let mut errors = ValidationErrors::new();
        validate_slots(&mut errors, &[slot(3, "10"), slot(0, " ")]);
        assert!(errors.has_field("exercises[1].sets"));
        assert!(errors.has_field("exercises[1].reps"));
        assert!(!errors.has_field("exercises[0].sets"));
    }

    #[test]
    fn test_clean_tags_dedupes() {
        let tags = vec!["Fuerza".into(), " fuerza ".into(), "".into(), "hiit".into()];
        assert_eq!(clean_tags(tags), vec!["fuerza", "hiit"]);
    }
}
