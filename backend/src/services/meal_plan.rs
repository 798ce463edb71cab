//! Meal plan service

use crate::error::ApiError;
use crate::policy::{Action, Actor, Policy, Resource};
use crate::repositories::{
    filter, AssignmentRepository, MealPlanChanges, MealPlanRecord, MealPlanRepository,
    NewMealPlan, Page, UserRepository,
};
use crate::services::routine::clean_tags;
use crate::services::{not_found, unmatched_write};
use fitpro_shared::errors::ValidationErrors;
use fitpro_shared::types::{
    CreateMealPlanRequest, Meal, MealPlanResponse, PaginatedResponse, PlanListQuery,
    UpdateMealPlanRequest,
};
use fitpro_shared::validation::{self, MAX_DESCRIPTION_LEN, MAX_NAME_LEN};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

fn validate_meals(errors: &mut ValidationErrors, meals: &[Meal]) {
    errors.check("meals", validation::validate_non_empty(meals, "meal"));
    for (i, meal) in meals.iter().enumerate() {
        if let Err(e) = validation::validate_required_text(&meal.name, MAX_NAME_LEN) {
            errors.add(&format!("meals[{i}].name"), e);
        }
        if meal.time.trim().is_empty() {
            errors.add(&format!("meals[{i}].time"), "This field is required");
        }
        if let Err(e) = validation::validate_positive(meal.calories) {
            errors.add(&format!("meals[{i}].calories"), e);
        }
    }
}

pub struct MealPlanService;

impl MealPlanService {
    pub async fn list(
        pool: &PgPool,
        actor: &Actor,
        query: PlanListQuery,
    ) -> Result<PaginatedResponse<MealPlanResponse>, ApiError> {
        let scope = Policy::scope(actor, Resource::MealPlan, Action::List)?;
        let page = Page::from_query(query.page, query.limit)?;

        let (plans, total) = MealPlanRepository::list(pool, scope, query.search.as_deref(), page)
            .await
            .map_err(ApiError::Internal)?;

        Ok(PaginatedResponse {
            data: Self::responses(pool, &plans).await?,
            pagination: page.info(total),
        })
    }

    pub async fn get(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<MealPlanResponse, ApiError> {
        let plan = MealPlanRepository::find_active(pool, id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| not_found(Resource::MealPlan))?;

        let assignees = if actor.is_client() {
            AssignmentRepository::plan_assignees(pool, Resource::MealPlan, id)
                .await
                .map_err(ApiError::Internal)?
        } else {
            Vec::new()
        };
        Policy::authorize(
            actor,
            Resource::MealPlan,
            Action::Read,
            &plan.subject(assignees),
        )?;

        Self::response(pool, &plan).await
    }

    pub async fn create(
        pool: &PgPool,
        actor: &Actor,
        request: CreateMealPlanRequest,
    ) -> Result<MealPlanResponse, ApiError> {
        Policy::scope(actor, Resource::MealPlan, Action::Create)?;

        let name = request.name.trim().to_string();
        let description = request.description.trim().to_string();

        let mut errors = ValidationErrors::new();
        errors.check("name", validation::validate_required_text(&name, MAX_NAME_LEN));
        errors.check(
            "description",
            validation::validate_required_text(&description, MAX_DESCRIPTION_LEN),
        );
        errors.check("calories", validation::validate_positive(request.calories));
        errors.check("duration", validation::validate_positive(request.duration));
        validate_meals(&mut errors, &request.meals);
        errors.into_result()?;

        let plan = MealPlanRepository::create(
            pool,
            &NewMealPlan {
                name,
                description,
                calories: request.calories,
                duration: request.duration,
                meals: request.meals,
                tags: clean_tags(request.tags),
                created_by: actor.id,
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        info!(meal_plan_id = %plan.id, by = %actor.id, "Meal plan created");
        Self::response(pool, &plan).await
    }

    pub async fn update(
        pool: &PgPool,
        actor: &Actor,
        id: Uuid,
        request: UpdateMealPlanRequest,
    ) -> Result<MealPlanResponse, ApiError> {
        let scope = Policy::scope(actor, Resource::MealPlan, Action::Update)?;

        let name = request.name.map(|n| n.trim().to_string());
        let description = request.description.map(|d| d.trim().to_string());

        let mut errors = ValidationErrors::new();
        if let Some(name) = &name {
            errors.check("name", validation::validate_required_text(name, MAX_NAME_LEN));
        }
        if let Some(description) = &description {
            errors.check(
                "description",
                validation::validate_required_text(description, MAX_DESCRIPTION_LEN),
            );
        }
        if let Some(calories) = request.calories {
            errors.check("calories", validation::validate_positive(calories));
        }
        if let Some(duration) = request.duration {
            errors.check("duration", validation::validate_positive(duration));
        }
        if let Some(meals) = &request.meals {
            validate_meals(&mut errors, meals);
        }
        errors.into_result()?;

        let changes = MealPlanChanges {
            name,
            description,
            calories: request.calories,
            duration: request.duration,
            meals: request.meals,
            tags: request.tags.map(clean_tags),
        };
        match MealPlanRepository::update(pool, id, &changes, scope)
            .await
            .map_err(ApiError::Internal)?
        {
            Some(plan) => {
                info!(meal_plan_id = %id, by = %actor.id, "Meal plan updated");
                Self::response(pool, &plan).await
            }
            None => Err(unmatched_write(pool, Resource::MealPlan, id).await),
        }
    }

    /// Deactivate a meal plan
    pub async fn delete(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let scope = Policy::scope(actor, Resource::MealPlan, Action::Delete)?;

        if filter::delete_scoped(pool, Resource::MealPlan, id, scope)
            .await
            .map_err(ApiError::Internal)?
        {
            info!(meal_plan_id = %id, by = %actor.id, "Meal plan deactivated");
            Ok(())
        } else {
            Err(unmatched_write(pool, Resource::MealPlan, id).await)
        }
    }

    async fn response(pool: &PgPool, plan: &MealPlanRecord) -> Result<MealPlanResponse, ApiError> {
        let creator = UserRepository::summaries(pool, &[plan.created_by])
            .await
            .map_err(ApiError::Internal)?
            .remove(&plan.created_by);
        Ok(plan.to_response(creator))
    }

    async fn responses(
        pool: &PgPool,
        plans: &[MealPlanRecord],
    ) -> Result<Vec<MealPlanResponse>, ApiError> {
        let creator_ids: Vec<Uuid> = plans.iter().map(|p| p.created_by).collect();
        let creators = UserRepository::summaries(pool, &creator_ids)
            .await
            .map_err(ApiError::Internal)?;

        Ok(plans
            .iter()
            .map(|p| p.to_response(creators.get(&p.created_by).cloned()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal(name: &str, calories: i32) -> Meal {
        Meal {
            name: name.to_string(),
            time: "08:00".to_string(),
            foods: vec!["Avena 50g".to_string()],
            calories,
        }
    }

    #[test]
    fn test_meals_required() {
        let mut errors = ValidationErrors::new();
        validate_meals(&mut errors, &[]);
        assert!(errors.has_field("meals"));
    }

    #[test]
    fn test_meal_errors_are_indexed() {
        let mut errors = ValidationErrors::new();
        validate_meals(&mut errors, &[meal("Desayuno", 400), meal("", 0)]);
        assert!(errors.has_field("meals[1].name"));
        assert!(errors.has_field("meals[1].calories"));
        assert_eq!(errors.len(), 2);
    }
}
