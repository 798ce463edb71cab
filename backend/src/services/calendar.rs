//! Calendar event service

use crate::error::ApiError;
use crate::policy::{Action, Actor, Policy, PolicyError, Resource, Subject};
use crate::repositories::{
    filter, CalendarRepository, EventChanges, EventFilter, EventRecord, MealPlanRepository,
    NewEvent, Page, RoutineRepository, UserRepository,
};
use crate::services::{non_blank, not_found, parse_field, unmatched_write};
use fitpro_shared::errors::ValidationErrors;
use fitpro_shared::models::{EventType, Role};
use fitpro_shared::types::{
    CalendarEventResponse, CreateEventRequest, EventListQuery, PaginatedResponse,
    ReminderSettings, UpdateEventRequest,
};
use fitpro_shared::validation::{self, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Checks shared by create and update
fn validate_details(
    errors: &mut ValidationErrors,
    title: Option<&str>,
    description: Option<&str>,
    duration: Option<i32>,
    reminder: Option<&ReminderSettings>,
) {
    if let Some(title) = title {
        errors.check("title", validation::validate_required_text(title, MAX_TITLE_LEN));
    }
    if let Some(description) = description {
        errors.check(
            "description",
            validation::validate_max_len(description, MAX_DESCRIPTION_LEN),
        );
    }
    if let Some(duration) = duration {
        errors.check("duration", validation::validate_event_duration(duration));
    }
    if let Some(reminder) = reminder {
        errors.check(
            "reminder.minutes",
            validation::validate_reminder_minutes(reminder.minutes),
        );
    }
}

pub(crate) async fn event_responses(
    pool: &PgPool,
    events: &[EventRecord],
) -> Result<Vec<CalendarEventResponse>, ApiError> {
    let user_ids: Vec<Uuid> = events
        .iter()
        .flat_map(|e| std::iter::once(e.user_id).chain(e.trainer_id))
        .collect();
    let routine_ids: Vec<Uuid> = events.iter().filter_map(|e| e.routine_id).collect();
    let meal_plan_ids: Vec<Uuid> = events.iter().filter_map(|e| e.meal_plan_id).collect();

    let (users, routines, meal_plans) = tokio::try_join!(
        UserRepository::summaries(pool, &user_ids),
        RoutineRepository::summaries(pool, &routine_ids),
        MealPlanRepository::summaries(pool, &meal_plan_ids),
    )
    .map_err(ApiError::Internal)?;

    Ok(events
        .iter()
        .map(|e| CalendarEventResponse {
            id: e.id,
            title: e.title.clone(),
            description: e.description.clone(),
            date: e.date,
            event_type: e.event_type(),
            completed: e.completed,
            user_id: e.user_id,
            trainer_id: e.trainer_id,
            routine_id: e.routine_id,
            meal_plan_id: e.meal_plan_id,
            assignment_id: e.assignment_id,
            user: users.get(&e.user_id).cloned(),
            trainer: e.trainer_id.and_then(|id| users.get(&id).cloned()),
            routine: e.routine_id.and_then(|id| routines.get(&id).cloned()),
            meal_plan: e.meal_plan_id.and_then(|id| meal_plans.get(&id).cloned()),
            duration: e.duration,
            reminder: e.reminder(),
            created_at: e.created_at,
            updated_at: e.updated_at,
        })
        .collect())
}

pub struct CalendarService;

impl CalendarService {
    pub async fn list(
        pool: &PgPool,
        actor: &Actor,
        query: EventListQuery,
    ) -> Result<PaginatedResponse<CalendarEventResponse>, ApiError> {
        let scope = Policy::scope(actor, Resource::CalendarEvent, Action::List)?;
        let page = Page::from_query(query.page, query.limit)?;

        let mut errors = ValidationErrors::new();
        let event_type = parse_field(&mut errors, "type", query.event_type.as_deref());
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            if end < start {
                errors.add("end_date", "End date must not be before the start date");
            }
        }
        errors.into_result()?;

        let filter = EventFilter {
            start_date: query.start_date,
            end_date: query.end_date,
            event_type,
            completed: query.completed,
        };
        let (events, total) = CalendarRepository::list(pool, scope, &filter, page)
            .await
            .map_err(ApiError::Internal)?;

        Ok(PaginatedResponse {
            data: event_responses(pool, &events).await?,
            pagination: page.info(total),
        })
    }

    pub async fn get(
        pool: &PgPool,
        actor: &Actor,
        id: Uuid,
    ) -> Result<CalendarEventResponse, ApiError> {
        let event = CalendarRepository::find_by_id(pool, id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| not_found(Resource::CalendarEvent))?;

        Policy::authorize(actor, Resource::CalendarEvent, Action::Read, &event.subject())?;
        Self::response(pool, event).await
    }

    /// Create an event for the caller or, for trainers and admins, another user
    ///
    /// A trainer's events default to naming them as trainer.
    pub async fn create(
        pool: &PgPool,
        actor: &Actor,
        request: CreateEventRequest,
    ) -> Result<CalendarEventResponse, ApiError> {
        Policy::scope(actor, Resource::CalendarEvent, Action::Create)?;

        let title = request.title.trim().to_string();
        let description = non_blank(request.description);
        let reminder = request.reminder.unwrap_or_default();

        let mut errors = ValidationErrors::new();
        validate_details(
            &mut errors,
            Some(&title),
            description.as_deref(),
            request.duration,
            Some(&reminder),
        );
        let event_type: Option<EventType> =
            parse_field(&mut errors, "type", Some(request.event_type.as_str()));
        errors.into_result()?;
        let Some(event_type) = event_type else {
            return Err(ApiError::invalid("type", "Event type is required"));
        };

        let user_id = request.user_id.unwrap_or(actor.id);
        let trainer_id = request
            .trainer_id
            .or((actor.role == Role::Trainer).then_some(actor.id));
        Policy::authorize(
            actor,
            Resource::CalendarEvent,
            Action::Create,
            &Subject::Event {
                user_id,
                trainer_id,
            },
        )?;

        if user_id != actor.id {
            let target_exists = UserRepository::find_by_id(pool, user_id)
                .await
                .map_err(ApiError::Internal)?
                .is_some();
            if !target_exists {
                return Err(PolicyError::TargetNotFound(Resource::User).into());
            }
        }
        if let Some(trainer_id) = request.trainer_id {
            let is_trainer = UserRepository::find_by_id(pool, trainer_id)
                .await
                .map_err(ApiError::Internal)?
                .is_some_and(|u| u.role() == Role::Trainer);
            if !is_trainer {
                return Err(ApiError::invalid("trainer_id", "Trainer not found"));
            }
        }

        let event = CalendarRepository::create(
            pool,
            &NewEvent {
                title,
                description,
                date: request.date,
                event_type,
                completed: request.completed.unwrap_or(false),
                user_id,
                trainer_id,
                routine_id: request.routine_id,
                meal_plan_id: request.meal_plan_id,
                assignment_id: request.assignment_id,
                duration: request.duration,
                reminder,
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        info!(event_id = %event.id, user_id = %user_id, by = %actor.id, "Calendar event created");
        Self::response(pool, event).await
    }

    pub async fn update(
        pool: &PgPool,
        actor: &Actor,
        id: Uuid,
        request: UpdateEventRequest,
    ) -> Result<CalendarEventResponse, ApiError> {
        let scope = Policy::scope(actor, Resource::CalendarEvent, Action::Update)?;

        let title = request.title.map(|t| t.trim().to_string());
        let description = request.description.map(|d| d.trim().to_string());

        let mut errors = ValidationErrors::new();
        validate_details(
            &mut errors,
            title.as_deref(),
            description.as_deref(),
            request.duration,
            request.reminder.as_ref(),
        );
        let event_type = parse_field(&mut errors, "type", request.event_type.as_deref());
        errors.into_result()?;

        let changes = EventChanges {
            title,
            description,
            date: request.date,
            event_type,
            routine_id: request.routine_id,
            meal_plan_id: request.meal_plan_id,
            assignment_id: request.assignment_id,
            duration: request.duration,
            reminder: request.reminder,
            completed: request.completed,
        };
        match CalendarRepository::update(pool, id, &changes, scope)
            .await
            .map_err(ApiError::Internal)?
        {
            Some(event) => {
                info!(event_id = %id, by = %actor.id, "Calendar event updated");
                Self::response(pool, event).await
            }
            None => Err(unmatched_write(pool, Resource::CalendarEvent, id).await),
        }
    }

    /// Mark an event completed or not completed
    pub async fn set_completed(
        pool: &PgPool,
        actor: &Actor,
        id: Uuid,
        completed: bool,
    ) -> Result<CalendarEventResponse, ApiError> {
        let scope = Policy::scope(actor, Resource::CalendarEvent, Action::SetStatus)?;

        match CalendarRepository::set_completed(pool, id, completed, scope)
            .await
            .map_err(ApiError::Internal)?
        {
            Some(event) => {
                info!(event_id = %id, completed, "Calendar event status changed");
                Self::response(pool, event).await
            }
            None => Err(unmatched_write(pool, Resource::CalendarEvent, id).await),
        }
    }

    pub async fn delete(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let scope = Policy::scope(actor, Resource::CalendarEvent, Action::Delete)?;

        if filter::delete_scoped(pool, Resource::CalendarEvent, id, scope)
            .await
            .map_err(ApiError::Internal)?
        {
            info!(event_id = %id, by = %actor.id, "Calendar event deleted");
            Ok(())
        } else {
            Err(unmatched_write(pool, Resource::CalendarEvent, id).await)
        }
    }

    async fn response(pool: &PgPool, event: EventRecord) -> Result<CalendarEventResponse, ApiError> {
        event_responses(pool, std::slice::from_ref(&event))
            .await?
            .pop()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("event response not built")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_details() {
        let mut errors = ValidationErrors::new();
        validate_details(
            &mut errors,
            Some("  "),
            Some(&"x".repeat(MAX_DESCRIPTION_LEN + 1)),
            Some(481),
            Some(&ReminderSettings {
                enabled: true,
                minutes: 0,
            }),
        );
        for field in ["title", "description", "duration", "reminder.minutes"] {
            assert!(errors.has_field(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_validate_details_skips_absent_fields() {
        let mut errors = ValidationErrors::new();
        validate_details(&mut errors, None, None, None, None);
        assert!(errors.is_empty());
    }
}
