//! Calendar event repository

use crate::policy::{Resource, Scope, Subject};
use crate::repositories::filter::{push_scope, Page};
use anyhow::Result;
use chrono::{DateTime, Utc};
use fitpro_shared::models::EventType;
use fitpro_shared::types::ReminderSettings;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const EVENT_COLUMNS: &str = "calendar_events.id, calendar_events.title, \
    calendar_events.description, calendar_events.date, calendar_events.event_type, \
    calendar_events.completed, calendar_events.user_id, calendar_events.trainer_id, \
    calendar_events.routine_id, calendar_events.meal_plan_id, calendar_events.assignment_id, \
    calendar_events.duration, calendar_events.reminder_enabled, calendar_events.reminder_minutes, \
    calendar_events.created_at, calendar_events.updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub event_type: String,
    pub completed: bool,
    pub user_id: Uuid,
    pub trainer_id: Option<Uuid>,
    pub routine_id: Option<Uuid>,
    pub meal_plan_id: Option<Uuid>,
    pub assignment_id: Option<Uuid>,
    /// Minutes
    pub duration: Option<i32>,
    pub reminder_enabled: bool,
    pub reminder_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn event_type(&self) -> EventType {
        self.event_type.parse().unwrap_or(EventType::Reminder)
    }

    pub fn reminder(&self) -> ReminderSettings {
        ReminderSettings {
            enabled: self.reminder_enabled,
            minutes: self.reminder_minutes,
        }
    }

    pub fn subject(&self) -> Subject {
        Subject::Event {
            user_id: self.user_id,
            trainer_id: self.trainer_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub event_type: EventType,
    pub completed: bool,
    pub user_id: Uuid,
    pub trainer_id: Option<Uuid>,
    pub routine_id: Option<Uuid>,
    pub meal_plan_id: Option<Uuid>,
    pub assignment_id: Option<Uuid>,
    pub duration: Option<i32>,
    pub reminder: ReminderSettings,
}

#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub event_type: Option<EventType>,
    pub routine_id: Option<Uuid>,
    pub meal_plan_id: Option<Uuid>,
    pub assignment_id: Option<Uuid>,
    pub duration: Option<i32>,
    pub reminder: Option<ReminderSettings>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub event_type: Option<EventType>,
    pub completed: Option<bool>,
}

pub struct CalendarRepository;

impl CalendarRepository {
    pub async fn create<'e, E: PgExecutor<'e>>(executor: E, event: &NewEvent) -> Result<EventRecord> {
        let record = sqlx::query_as::<_, EventRecord>(&format!(
            r#"
            INSERT INTO calendar_events (title, description, date, event_type, completed,
                                         user_id, trainer_id, routine_id, meal_plan_id,
                                         assignment_id, duration, reminder_enabled,
                                         reminder_minutes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.event_type.as_str())
        .bind(event.completed)
        .bind(event.user_id)
        .bind(event.trainer_id)
        .bind(event.routine_id)
        .bind(event.meal_plan_id)
        .bind(event.assignment_id)
        .bind(event.duration)
        .bind(event.reminder.enabled)
        .bind(event.reminder.minutes)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<EventRecord>> {
        let event = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {EVENT_COLUMNS} FROM calendar_events WHERE calendar_events.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(event)
    }

    /// List events inside `scope` in chronological order
    pub async fn list(
        pool: &PgPool,
        scope: Scope,
        filter: &EventFilter,
        page: Page,
    ) -> Result<(Vec<EventRecord>, i64)> {
        let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
            push_scope(qb, Resource::CalendarEvent, scope);
            if let Some(start) = filter.start_date {
                qb.push(" AND calendar_events.date >= ").push_bind(start);
            }
            if let Some(end) = filter.end_date {
                qb.push(" AND calendar_events.date <= ").push_bind(end);
            }
            if let Some(event_type) = filter.event_type {
                qb.push(" AND calendar_events.event_type = ")
                    .push_bind(event_type.as_str());
            }
            if let Some(completed) = filter.completed {
                qb.push(" AND calendar_events.completed = ")
                    .push_bind(completed);
            }
        };

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM calendar_events WHERE TRUE");
        push_filters(&mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        let mut query = QueryBuilder::new(format!(
            "SELECT {EVENT_COLUMNS} FROM calendar_events WHERE TRUE"
        ));
        push_filters(&mut query);
        query.push(" ORDER BY calendar_events.date ASC, calendar_events.id");
        page.push_limit(&mut query);
        let events = query
            .build_query_as::<EventRecord>()
            .fetch_all(pool)
            .await?;

        Ok((events, total))
    }

    /// Apply `changes` inside `scope`; `None` when no row matched
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: &EventChanges,
        scope: Scope,
    ) -> Result<Option<EventRecord>> {
        let reminder = changes.reminder;
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE calendar_events SET title = COALESCE(");
        qb.push_bind(changes.title.clone())
            .push(", title), description = COALESCE(")
            .push_bind(changes.description.clone())
            .push(", description), date = COALESCE(")
            .push_bind(changes.date)
            .push(", date), event_type = COALESCE(")
            .push_bind(changes.event_type.map(|t| t.as_str()))
            .push(", event_type), routine_id = COALESCE(")
            .push_bind(changes.routine_id)
            .push(", routine_id), meal_plan_id = COALESCE(")
            .push_bind(changes.meal_plan_id)
            .push(", meal_plan_id), assignment_id = COALESCE(")
            .push_bind(changes.assignment_id)
            .push(", assignment_id), duration = COALESCE(")
            .push_bind(changes.duration)
            .push(", duration), reminder_enabled = COALESCE(")
            .push_bind(reminder.map(|r| r.enabled))
            .push(", reminder_enabled), reminder_minutes = COALESCE(")
            .push_bind(reminder.map(|r| r.minutes))
            .push(", reminder_minutes), completed = COALESCE(")
            .push_bind(changes.completed)
            .push(", completed), updated_at = NOW() WHERE calendar_events.id = ")
            .push_bind(id);
        push_scope(&mut qb, Resource::CalendarEvent, scope);
        qb.push(format!(" RETURNING {EVENT_COLUMNS}"));

        let event = qb.build_query_as::<EventRecord>().fetch_optional(pool).await?;
        Ok(event)
    }

    /// Set the completion flag inside `scope`
    pub async fn set_completed(
        pool: &PgPool,
        id: Uuid,
        completed: bool,
        scope: Scope,
    ) -> Result<Option<EventRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE calendar_events SET completed = ");
        qb.push_bind(completed)
            .push(", updated_at = NOW() WHERE calendar_events.id = ")
            .push_bind(id);
        push_scope(&mut qb, Resource::CalendarEvent, scope);
        qb.push(format!(" RETURNING {EVENT_COLUMNS}"));

        let event = qb.build_query_as::<EventRecord>().fetch_optional(pool).await?;
        Ok(event)
    }
}
