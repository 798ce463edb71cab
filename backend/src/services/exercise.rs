//! Exercise catalog service

use crate::error::ApiError;
use crate::policy::{Action, Actor, Policy, Resource};
use crate::repositories::{
    ExerciseFilter, ExerciseRecord, ExerciseRepository, NewExercise, Page, UserRepository,
};
use crate::services::{non_blank, not_found, parse_field};
use fitpro_shared::errors::ValidationErrors;
use fitpro_shared::types::{
    CreateExerciseRequest, ExerciseListQuery, ExerciseResponse, PaginatedResponse,
};
use fitpro_shared::validation::{self, MAX_DESCRIPTION_LEN, MAX_NAME_LEN};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Trim entries and drop blanks
fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

pub struct ExerciseService;

impl ExerciseService {
    pub async fn list(
        pool: &PgPool,
        actor: &Actor,
        query: ExerciseListQuery,
    ) -> Result<PaginatedResponse<ExerciseResponse>, ApiError> {
        let scope = Policy::scope(actor, Resource::Exercise, Action::List)?;
        let page = Page::from_query(query.page, query.limit)?;

        let mut errors = ValidationErrors::new();
        let difficulty = parse_field(&mut errors, "difficulty", query.difficulty.as_deref());
        errors.into_result()?;

        let filter = ExerciseFilter {
            search: query.search,
            muscle_group: query.muscle_group,
            difficulty,
        };
        let (exercises, total) = ExerciseRepository::list(pool, scope, &filter, page)
            .await
            .map_err(ApiError::Internal)?;

        Ok(PaginatedResponse {
            data: Self::responses(pool, &exercises).await?,
            pagination: page.info(total),
        })
    }

    pub async fn get(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<ExerciseResponse, ApiError> {
        Policy::scope(actor, Resource::Exercise, Action::Read)?;

        let exercise = ExerciseRepository::find_by_id(pool, id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| not_found(Resource::Exercise))?;

        Self::response(pool, &exercise).await
    }

    pub async fn create(
        pool: &PgPool,
        actor: &Actor,
        request: CreateExerciseRequest,
    ) -> Result<ExerciseResponse, ApiError> {
        Policy::scope(actor, Resource::Exercise, Action::Create)?;

        let name = request.name.trim().to_string();
        let muscle_groups = clean_list(request.muscle_groups);

        let mut errors = ValidationErrors::new();
        errors.check("name", validation::validate_required_text(&name, MAX_NAME_LEN));
        errors.check("sets", validation::validate_positive(request.sets));
        errors.check("reps", validation::validate_required_text(&request.reps, 50));
        errors.check("rest", validation::validate_required_text(&request.rest, 50));
        errors.check(
            "muscle_groups",
            validation::validate_non_empty(&muscle_groups, "muscle group"),
        );
        if let Some(instructions) = request.instructions.as_deref() {
            errors.check(
                "instructions",
                validation::validate_max_len(instructions, MAX_DESCRIPTION_LEN),
            );
        }
        let difficulty = parse_field(&mut errors, "difficulty", request.difficulty.as_deref());
        errors.into_result()?;

        let exercise = ExerciseRepository::create(
            pool,
            &NewExercise {
                name,
                sets: request.sets,
                reps: request.reps.trim().to_string(),
                rest: request.rest.trim().to_string(),
                image: non_blank(request.image),
                instructions: non_blank(request.instructions),
                muscle_groups,
                equipment: clean_list(request.equipment),
                difficulty: difficulty.unwrap_or_default(),
                created_by: actor.id,
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        info!(exercise_id = %exercise.id, by = %actor.id, "Exercise created");
        Self::response(pool, &exercise).await
    }

    async fn response(pool: &PgPool, exercise: &ExerciseRecord) -> Result<ExerciseResponse, ApiError> {
        let creator = match exercise.created_by {
            Some(id) => UserRepository::summaries(pool, &[id])
                .await
                .map_err(ApiError::Internal)?
                .remove(&id),
            None => None,
        };
        Ok(exercise.to_response(creator))
    }

    /// Attach creator summaries
    async fn responses(
        pool: &PgPool,
        exercises: &[ExerciseRecord],
    ) -> Result<Vec<ExerciseResponse>, ApiError> {
        let creator_ids: Vec<Uuid> = exercises.iter().filter_map(|e| e.created_by).collect();
        let creators = UserRepository::summaries(pool, &creator_ids)
            .await
            .map_err(ApiError::Internal)?;

        Ok(exercises
            .iter()
            .map(|e| e.to_response(e.created_by.and_then(|id| creators.get(&id).cloned())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_list() {
        let items = vec![" legs ".to_string(), "".to_string(), "glutes".to_string()];
        assert_eq!(clean_list(items), vec!["legs", "glutes"]);
    }
}
