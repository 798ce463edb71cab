//! Aggregate queries behind the dashboards
//!
//! Each function is a single round trip so the dashboard service can run
//! them concurrently.

use anyhow::Result;
use chrono::{DateTime, Utc};
use fitpro_shared::models::Role;
use fitpro_shared::types::ProgressEntry;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentUserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventBriefRow {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub event_type: String,
    pub completed: bool,
    pub user_id: Uuid,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientProgressRow {
    pub assignment_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub progress_count: i64,
    pub last_progress: Option<Json<ProgressEntry>>,
}

/// Event totals of one client over a trailing window
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct EventWindowCounts {
    pub workout: i64,
    pub meal: i64,
    pub completed: i64,
    pub total: i64,
}

pub struct StatsRepository;

impl StatsRepository {
    /// Active users, optionally of one role
    pub async fn count_active_users(pool: &PgPool, role: Option<Role>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE is_active AND ($1::text IS NULL OR role = $1)",
        )
        .bind(role.map(|r| r.as_str()))
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Active users created in `[from, to)`
    pub async fn count_users_created_between(
        pool: &PgPool,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM users
            WHERE is_active AND created_at >= $1 AND ($2::timestamptz IS NULL OR created_at < $2)
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    pub async fn recent_users(pool: &PgPool, limit: i64) -> Result<Vec<RecentUserRow>> {
        let users = sqlx::query_as::<_, RecentUserRow>(
            r#"
            SELECT id, name, email, role, created_at FROM users
            WHERE is_active
            ORDER BY created_at DESC, id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Active routines, optionally restricted to one creator
    pub async fn count_active_routines(pool: &PgPool, created_by: Option<Uuid>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM routines WHERE is_active AND ($1::uuid IS NULL OR created_by = $1)",
        )
        .bind(created_by)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    pub async fn count_active_meal_plans(pool: &PgPool, created_by: Option<Uuid>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM meal_plans WHERE is_active AND ($1::uuid IS NULL OR created_by = $1)",
        )
        .bind(created_by)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Assignments in `active` status, optionally for one trainer
    pub async fn count_active_assignments(pool: &PgPool, trainer_id: Option<Uuid>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM assignments
            WHERE status = 'active' AND ($1::uuid IS NULL OR trainer_id = $1)
            "#,
        )
        .bind(trainer_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    pub async fn assignments_by_status(pool: &PgPool) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM assignments GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_active_clients_of(pool: &PgPool, trainer_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE is_active AND trainer_id = $1",
        )
        .bind(trainer_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    pub async fn recent_clients_of(
        pool: &PgPool,
        trainer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<RecentUserRow>> {
        let clients = sqlx::query_as::<_, RecentUserRow>(
            r#"
            SELECT id, name, email, role, created_at FROM users
            WHERE is_active AND trainer_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2
            "#,
        )
        .bind(trainer_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(clients)
    }

    /// Latest events a user owns or is the trainer of, newest first
    pub async fn recent_events_for_participant(
        pool: &PgPool,
        participant: Uuid,
        limit: i64,
    ) -> Result<Vec<EventBriefRow>> {
        let events = sqlx::query_as::<_, EventBriefRow>(
            r#"
            SELECT e.id, e.title, e.date, e.event_type, e.completed, e.user_id,
                   u.name AS user_name
            FROM calendar_events e
            LEFT JOIN users u ON u.id = e.user_id
            WHERE e.user_id = $1 OR e.trainer_id = $1
            ORDER BY e.date DESC, e.id
            LIMIT $2
            "#,
        )
        .bind(participant)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(events)
    }

    /// Progress summary of a trainer's active assignments
    pub async fn client_progress(pool: &PgPool, trainer_id: Uuid) -> Result<Vec<ClientProgressRow>> {
        let rows = sqlx::query_as::<_, ClientProgressRow>(
            r#"
            SELECT a.id AS assignment_id,
                   u.name AS client_name,
                   u.email AS client_email,
                   jsonb_array_length(a.progress)::bigint AS progress_count,
                   a.progress -> -1 AS last_progress
            FROM assignments a
            JOIN users u ON u.id = a.client_id
            WHERE a.trainer_id = $1 AND a.status = 'active'
            ORDER BY a.created_at DESC, a.id
            "#,
        )
        .bind(trainer_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_events(pool: &PgPool, user_id: Uuid) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM calendar_events WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    pub async fn count_completed_events_since(
        pool: &PgPool,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM calendar_events
            WHERE user_id = $1 AND completed AND date >= $2
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Incomplete events from `now` onwards, soonest first
    pub async fn upcoming_events(
        pool: &PgPool,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<EventBriefRow>> {
        let events = sqlx::query_as::<_, EventBriefRow>(
            r#"
            SELECT e.id, e.title, e.date, e.event_type, e.completed, e.user_id,
                   u.name AS user_name
            FROM calendar_events e
            LEFT JOIN users u ON u.id = e.user_id
            WHERE e.user_id = $1 AND NOT e.completed AND e.date >= $2
            ORDER BY e.date ASC, e.id
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(events)
    }

    /// Event counts grouped by weekday (1 = Sunday) and completion
    pub async fn weekday_counts_since(
        pool: &PgPool,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<(i32, bool, i64)>> {
        let rows = sqlx::query_as::<_, (i32, bool, i64)>(
            r#"
            SELECT (EXTRACT(DOW FROM date AT TIME ZONE 'UTC')::int + 1) AS day, completed, COUNT(*)
            FROM calendar_events
            WHERE user_id = $1 AND date >= $2
            GROUP BY 1, 2
            ORDER BY 1, 2
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn event_window_counts(
        pool: &PgPool,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<EventWindowCounts> {
        let counts = sqlx::query_as::<_, EventWindowCounts>(
            r#"
            SELECT COUNT(*) FILTER (WHERE event_type = 'workout') AS workout,
                   COUNT(*) FILTER (WHERE event_type = 'meal') AS meal,
                   COUNT(*) FILTER (WHERE completed) AS completed,
                   COUNT(*) AS total
            FROM calendar_events
            WHERE user_id = $1 AND date >= $2
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(pool)
        .await?;

        Ok(counts)
    }
}
