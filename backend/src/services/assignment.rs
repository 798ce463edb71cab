//! Assignment service
//!
//! Assignments link a client and a trainer to a routine, a meal plan or
//! both, and collect the client's progress log.

use crate::error::ApiError;
use crate::policy::{Action, Actor, Policy, Resource, Scope, Subject};
use crate::repositories::{
    filter, AssignmentChanges, AssignmentFilter, AssignmentRecord, AssignmentRepository,
    MealPlanRepository, NewAssignment, Page, RoutineRepository, UserRepository,
};
use crate::services::{non_blank, not_found, parse_field, unmatched_write};
use chrono::Utc;
use fitpro_shared::errors::ValidationErrors;
use fitpro_shared::models::{AssignmentStatus, Role};
use fitpro_shared::types::{
    AssignmentListQuery, AssignmentResponse, CreateAssignmentRequest, LogProgressRequest,
    PaginatedResponse, ProgressEntry, UpdateAssignmentRequest,
};
use fitpro_shared::validation::{self, MAX_NOTES_LEN, MAX_PROGRESS_NOTES_LEN};
use sqlx::PgPool;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

/// Distinct ids in first-seen order
fn distinct(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Resolve client, trainer and plan summaries for a batch of assignments
pub(crate) async fn assignment_responses(
    pool: &PgPool,
    assignments: &[AssignmentRecord],
) -> Result<Vec<AssignmentResponse>, ApiError> {
    let user_ids = distinct(
        assignments
            .iter()
            .flat_map(|a| [a.client_id, a.trainer_id]),
    );
    let routine_ids = distinct(assignments.iter().filter_map(|a| a.routine_id));
    let meal_plan_ids = distinct(assignments.iter().filter_map(|a| a.meal_plan_id));

    let (users, routines, meal_plans) = tokio::try_join!(
        UserRepository::summaries(pool, &user_ids),
        RoutineRepository::summaries(pool, &routine_ids),
        MealPlanRepository::summaries(pool, &meal_plan_ids),
    )
    .map_err(ApiError::Internal)?;

    Ok(assignments
        .iter()
        .map(|a| AssignmentResponse {
            id: a.id,
            client_id: a.client_id,
            trainer_id: a.trainer_id,
            routine_id: a.routine_id,
            meal_plan_id: a.meal_plan_id,
            client: users.get(&a.client_id).cloned(),
            trainer: users.get(&a.trainer_id).cloned(),
            routine: a.routine_id.and_then(|id| routines.get(&id).cloned()),
            meal_plan: a.meal_plan_id.and_then(|id| meal_plans.get(&id).cloned()),
            start_date: a.start_date,
            end_date: a.end_date,
            status: a.status(),
            notes: a.notes.clone(),
            progress: a.progress.0.clone(),
            created_at: a.created_at,
            updated_at: a.updated_at,
        })
        .collect())
}

pub struct AssignmentService;

impl AssignmentService {
    pub async fn list(
        pool: &PgPool,
        actor: &Actor,
        query: AssignmentListQuery,
    ) -> Result<PaginatedResponse<AssignmentResponse>, ApiError> {
        let scope = Policy::scope(actor, Resource::Assignment, Action::List)?;
        let page = Page::from_query(query.page, query.limit)?;

        let mut errors = ValidationErrors::new();
        let status = parse_field(&mut errors, "status", query.status.as_deref());
        errors.into_result()?;

        let filter = AssignmentFilter {
            status,
            client_id: query.client_id,
        };
        let (assignments, total) = AssignmentRepository::list(pool, scope, &filter, page)
            .await
            .map_err(ApiError::Internal)?;

        Ok(PaginatedResponse {
            data: assignment_responses(pool, &assignments).await?,
            pagination: page.info(total),
        })
    }

    pub async fn get(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<AssignmentResponse, ApiError> {
        let assignment = Self::find(pool, id).await?;
        Policy::authorize(actor, Resource::Assignment, Action::Read, &assignment.subject())?;
        Self::response(pool, assignment).await
    }

    pub async fn create(
        pool: &PgPool,
        actor: &Actor,
        request: CreateAssignmentRequest,
    ) -> Result<AssignmentResponse, ApiError> {
        Policy::scope(actor, Resource::Assignment, Action::Create)?;

        let trainer_id = match (request.trainer_id, actor.role) {
            (Some(id), _) => Some(id),
            (None, Role::Trainer) => Some(actor.id),
            (None, _) => None,
        };
        let start_date = request.start_date.unwrap_or_else(Utc::now);
        let notes = non_blank(request.notes);

        let mut errors = ValidationErrors::new();
        if trainer_id.is_none() {
            errors.add("trainer_id", "A trainer is required");
        }
        if request.routine_id.is_none() && request.meal_plan_id.is_none() {
            errors.add("routine_id", "A routine or a meal plan is required");
        }
        errors.check(
            "end_date",
            validation::validate_date_order(start_date, request.end_date),
        );
        if let Some(notes) = &notes {
            errors.check("notes", validation::validate_max_len(notes, MAX_NOTES_LEN));
        }
        let status: Option<AssignmentStatus> =
            parse_field(&mut errors, "status", request.status.as_deref());
        errors.into_result()?;
        let Some(trainer_id) = trainer_id else {
            return Err(ApiError::invalid("trainer_id", "A trainer is required"));
        };

        let client = UserRepository::find_by_id(pool, request.client_id)
            .await
            .map_err(ApiError::Internal)?
            .filter(|u| u.role() == Role::Client && u.is_active)
            .ok_or_else(|| ApiError::invalid("client_id", "Client not found"))?;
        let trainer_exists = UserRepository::find_by_id(pool, trainer_id)
            .await
            .map_err(ApiError::Internal)?
            .is_some_and(|u| u.role() == Role::Trainer && u.is_active);
        if !trainer_exists {
            return Err(ApiError::invalid("trainer_id", "Trainer not found"));
        }

        Policy::authorize(
            actor,
            Resource::Assignment,
            Action::Create,
            &Subject::NewAssignment {
                trainer_id,
                client_trainer_id: client.trainer_id,
            },
        )?;
        Self::ensure_plans_usable(pool, actor, request.routine_id, request.meal_plan_id).await?;

        let assignment = AssignmentRepository::create(
            pool,
            &NewAssignment {
                client_id: client.id,
                trainer_id,
                routine_id: request.routine_id,
                meal_plan_id: request.meal_plan_id,
                start_date,
                end_date: request.end_date,
                status: status.unwrap_or_default(),
                notes,
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        info!(
            assignment_id = %assignment.id,
            client_id = %assignment.client_id,
            trainer_id = %assignment.trainer_id,
            "Assignment created"
        );
        Self::response(pool, assignment).await
    }

    pub async fn update(
        pool: &PgPool,
        actor: &Actor,
        id: Uuid,
        request: UpdateAssignmentRequest,
    ) -> Result<AssignmentResponse, ApiError> {
        let scope = Policy::scope(actor, Resource::Assignment, Action::Update)?;
        let existing = Self::find(pool, id).await?;
        Policy::authorize(actor, Resource::Assignment, Action::Update, &existing.subject())?;

        let notes = request.notes.map(|n| n.trim().to_string());
        let mut errors = ValidationErrors::new();
        errors.check(
            "end_date",
            validation::validate_date_order(
                request.start_date.unwrap_or(existing.start_date),
                request.end_date.or(existing.end_date),
            ),
        );
        if let Some(notes) = &notes {
            errors.check("notes", validation::validate_max_len(notes, MAX_NOTES_LEN));
        }
        let status = parse_field(&mut errors, "status", request.status.as_deref());
        errors.into_result()?;
        Self::ensure_plans_usable(pool, actor, request.routine_id, request.meal_plan_id).await?;

        let changes = AssignmentChanges {
            routine_id: request.routine_id,
            meal_plan_id: request.meal_plan_id,
            start_date: request.start_date,
            end_date: request.end_date,
            status,
            notes,
        };
        Self::apply(pool, actor, id, &changes, scope).await
    }

    pub async fn set_status(
        pool: &PgPool,
        actor: &Actor,
        id: Uuid,
        status: &str,
    ) -> Result<AssignmentResponse, ApiError> {
        let scope = Policy::scope(actor, Resource::Assignment, Action::SetStatus)?;

        let mut errors = ValidationErrors::new();
        let status = parse_field(&mut errors, "status", Some(status));
        errors.into_result()?;

        let changes = AssignmentChanges {
            status,
            ..Default::default()
        };
        Self::apply(pool, actor, id, &changes, scope).await
    }

    /// Append a progress entry
    pub async fn log_progress(
        pool: &PgPool,
        actor: &Actor,
        id: Uuid,
        request: LogProgressRequest,
    ) -> Result<AssignmentResponse, ApiError> {
        let scope = Policy::scope(actor, Resource::Assignment, Action::LogProgress)?;

        let notes = non_blank(request.notes);
        let mut errors = ValidationErrors::new();
        errors.check("completion", validation::validate_completion(request.completion));
        if let Some(notes) = &notes {
            errors.check(
                "notes",
                validation::validate_max_len(notes, MAX_PROGRESS_NOTES_LEN),
            );
        }
        errors.into_result()?;

        let entry = ProgressEntry {
            date: request.date.unwrap_or_else(Utc::now),
            completion: request.completion,
            notes,
        };
        match AssignmentRepository::append_progress(pool, id, &entry, scope)
            .await
            .map_err(ApiError::Internal)?
        {
            Some(assignment) => {
                info!(assignment_id = %id, completion = entry.completion, "Progress logged");
                Self::response(pool, assignment).await
            }
            None => Err(unmatched_write(pool, Resource::Assignment, id).await),
        }
    }

    pub async fn delete(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let scope = Policy::scope(actor, Resource::Assignment, Action::Delete)?;

        if filter::delete_scoped(pool, Resource::Assignment, id, scope)
            .await
            .map_err(ApiError::Internal)?
        {
            info!(assignment_id = %id, by = %actor.id, "Assignment deleted");
            Ok(())
        } else {
            Err(unmatched_write(pool, Resource::Assignment, id).await)
        }
    }

    async fn apply(
        pool: &PgPool,
        actor: &Actor,
        id: Uuid,
        changes: &AssignmentChanges,
        scope: Scope,
    ) -> Result<AssignmentResponse, ApiError> {
        match AssignmentRepository::update(pool, id, changes, scope)
            .await
            .map_err(ApiError::Internal)?
        {
            Some(assignment) => {
                info!(assignment_id = %id, by = %actor.id, "Assignment updated");
                Self::response(pool, assignment).await
            }
            None => Err(unmatched_write(pool, Resource::Assignment, id).await),
        }
    }

    async fn find(pool: &PgPool, id: Uuid) -> Result<AssignmentRecord, ApiError> {
        AssignmentRepository::find_by_id(pool, id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| not_found(Resource::Assignment))
    }

    /// Referenced plans must exist, be active and be readable by the actor
    async fn ensure_plans_usable(
        pool: &PgPool,
        actor: &Actor,
        routine_id: Option<Uuid>,
        meal_plan_id: Option<Uuid>,
    ) -> Result<(), ApiError> {
        let (routine, meal_plan) = tokio::try_join!(
            async {
                match routine_id {
                    Some(id) => RoutineRepository::find_active(pool, id).await.map(Some),
                    None => Ok(None),
                }
            },
            async {
                match meal_plan_id {
                    Some(id) => MealPlanRepository::find_active(pool, id).await.map(Some),
                    None => Ok(None),
                }
            },
        )
        .map_err(ApiError::Internal)?;

        let mut errors = ValidationErrors::new();
        if matches!(routine, Some(None)) {
            errors.add("routine_id", "Routine not found or inactive");
        }
        if matches!(meal_plan, Some(None)) {
            errors.add("meal_plan_id", "Meal plan not found or inactive");
        }
        errors.into_result()?;

        // Assigning a plan exposes it to the client, so the actor must see it first
        if let Some(Some(routine)) = &routine {
            Policy::authorize(actor, Resource::Routine, Action::Read, &routine.subject(vec![]))?;
        }
        if let Some(Some(plan)) = &meal_plan {
            Policy::authorize(actor, Resource::MealPlan, Action::Read, &plan.subject(vec![]))?;
        }
        Ok(())
    }

    async fn response(
        pool: &PgPool,
        assignment: AssignmentRecord,
    ) -> Result<AssignmentResponse, ApiError> {
        assignment_responses(pool, std::slice::from_ref(&assignment))
            .await?
            .pop()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("assignment response not built")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_keeps_first_occurrence() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(distinct([a, b, a, b, a]), vec![a, b]);
    }
}
