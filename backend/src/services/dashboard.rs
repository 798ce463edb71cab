//! Role-specific dashboard statistics
//!
//! Every dashboard is a fan-out of independent aggregate queries joined with
//! `tokio::try_join!`, then shaped into the shared response types.

use crate::error::ApiError;
use crate::policy::Actor;
use crate::repositories::stats::{ClientProgressRow, EventBriefRow, RecentUserRow};
use crate::repositories::{AssignmentRepository, StatsRepository, UserRepository};
use crate::services::assignment::assignment_responses;
use chrono::Utc;
use fitpro_shared::models::{AssignmentStatus, EventType, Role};
use fitpro_shared::stats::{
    completion_rate, growth_rate, start_of_month, start_of_previous_month, trailing_window_start,
    MONTH_WINDOW_DAYS, WEEK_WINDOW_DAYS,
};
use fitpro_shared::types::{
    AdminStats, ClientBrief, ClientProgress, ClientStats, DashboardStats, EventBrief,
    MonthlyStats, RecentUser, StatusCount, TrainerStats, UserGrowth, WeekdayCount,
};
use sqlx::PgPool;
use tracing::debug;

const RECENT_USERS: i64 = 5;
const RECENT_EVENTS: i64 = 5;
const RECENT_CLIENTS: i64 = 10;
const UPCOMING_EVENTS: i64 = 5;

fn recent_user(row: RecentUserRow) -> RecentUser {
    RecentUser {
        id: row.id,
        name: row.name,
        email: row.email,
        role: row.role.parse().unwrap_or(Role::Client),
        created_at: row.created_at,
    }
}

fn event_brief(row: EventBriefRow) -> EventBrief {
    EventBrief {
        id: row.id,
        title: row.title,
        date: row.date,
        event_type: row.event_type.parse().unwrap_or(EventType::Reminder),
        completed: row.completed,
        user_id: row.user_id,
        user_name: row.user_name,
    }
}

fn client_progress(row: ClientProgressRow) -> ClientProgress {
    ClientProgress {
        assignment_id: row.assignment_id,
        client_name: row.client_name,
        client_email: row.client_email,
        progress_count: row.progress_count,
        last_progress: row.last_progress.map(|entry| entry.0),
    }
}

/// Drop rows with a status the application no longer knows about
fn status_counts(rows: Vec<(String, i64)>) -> Vec<StatusCount> {
    rows.into_iter()
        .filter_map(|(status, count)| {
            status
                .parse::<AssignmentStatus>()
                .ok()
                .map(|status| StatusCount { status, count })
        })
        .collect()
}

pub struct DashboardService;

impl DashboardService {
    pub async fn stats(pool: &PgPool, actor: &Actor) -> Result<DashboardStats, ApiError> {
        debug!(user_id = %actor.id, role = %actor.role, "Building dashboard");

        match actor.role {
            Role::Admin => Self::admin(pool).await.map(DashboardStats::Admin),
            Role::Trainer => Self::trainer(pool, actor).await.map(DashboardStats::Trainer),
            Role::Client => Self::client(pool, actor).await.map(DashboardStats::Client),
        }
    }

    async fn admin(pool: &PgPool) -> Result<AdminStats, ApiError> {
        let now = Utc::now();
        let this_month_start = start_of_month(now);
        let last_month_start = start_of_previous_month(now);

        let (
            total_users,
            total_trainers,
            total_clients,
            total_routines,
            total_meal_plans,
            total_assignments,
            recent_users,
            this_month,
            last_month,
            by_status,
        ) = tokio::try_join!(
            StatsRepository::count_active_users(pool, None),
            StatsRepository::count_active_users(pool, Some(Role::Trainer)),
            StatsRepository::count_active_users(pool, Some(Role::Client)),
            StatsRepository::count_active_routines(pool, None),
            StatsRepository::count_active_meal_plans(pool, None),
            StatsRepository::count_active_assignments(pool, None),
            StatsRepository::recent_users(pool, RECENT_USERS),
            StatsRepository::count_users_created_between(pool, this_month_start, None),
            StatsRepository::count_users_created_between(
                pool,
                last_month_start,
                Some(this_month_start)
            ),
            StatsRepository::assignments_by_status(pool),
        )
        .map_err(ApiError::Internal)?;

        Ok(AdminStats {
            total_users,
            total_trainers,
            total_clients,
            total_routines,
            total_meal_plans,
            total_assignments,
            recent_users: recent_users.into_iter().map(recent_user).collect(),
            user_growth: UserGrowth {
                last_month,
                this_month,
                growth: growth_rate(this_month, last_month),
            },
            assignments_by_status: status_counts(by_status),
        })
    }

    async fn trainer(pool: &PgPool, actor: &Actor) -> Result<TrainerStats, ApiError> {
        let (
            my_clients,
            my_routines,
            my_meal_plans,
            my_assignments,
            recent_events,
            clients,
            progress,
        ) = tokio::try_join!(
            StatsRepository::count_active_clients_of(pool, actor.id),
            StatsRepository::count_active_routines(pool, Some(actor.id)),
            StatsRepository::count_active_meal_plans(pool, Some(actor.id)),
            StatsRepository::count_active_assignments(pool, Some(actor.id)),
            StatsRepository::recent_events_for_participant(pool, actor.id, RECENT_EVENTS),
            StatsRepository::recent_clients_of(pool, actor.id, RECENT_CLIENTS),
            StatsRepository::client_progress(pool, actor.id),
        )
        .map_err(ApiError::Internal)?;

        Ok(TrainerStats {
            my_clients,
            my_routines,
            my_meal_plans,
            my_assignments,
            recent_events: recent_events.into_iter().map(event_brief).collect(),
            clients_list: clients
                .into_iter()
                .map(|c| ClientBrief {
                    id: c.id,
                    name: c.name,
                    email: c.email,
                    created_at: c.created_at,
                })
                .collect(),
            client_progress: progress.into_iter().map(client_progress).collect(),
        })
    }

    async fn client(pool: &PgPool, actor: &Actor) -> Result<ClientStats, ApiError> {
        let now = Utc::now();
        let month_start = trailing_window_start(now, MONTH_WINDOW_DAYS);
        let week_start = trailing_window_start(now, WEEK_WINDOW_DAYS);

        let (me, assignments, completed_events, upcoming, total_events, weekly, window) = tokio::try_join!(
            UserRepository::find_by_id(pool, actor.id),
            AssignmentRepository::list_for_client(pool, actor.id),
            StatsRepository::count_completed_events_since(pool, actor.id, month_start),
            StatsRepository::upcoming_events(pool, actor.id, now, UPCOMING_EVENTS),
            StatsRepository::count_events(pool, actor.id),
            StatsRepository::weekday_counts_since(pool, actor.id, week_start),
            StatsRepository::event_window_counts(pool, actor.id, month_start),
        )
        .map_err(ApiError::Internal)?;

        let trainer = match me.and_then(|u| u.trainer_id) {
            Some(trainer_id) => UserRepository::summaries(pool, &[trainer_id])
                .await
                .map_err(ApiError::Internal)?
                .remove(&trainer_id),
            None => None,
        };

        Ok(ClientStats {
            my_assignments: assignment_responses(pool, &assignments).await?,
            completed_events,
            upcoming_events: upcoming.into_iter().map(event_brief).collect(),
            total_events,
            trainer,
            weekly_progress: weekly
                .into_iter()
                .map(|(day, completed, count)| WeekdayCount {
                    day,
                    completed,
                    count,
                })
                .collect(),
            monthly_stats: MonthlyStats {
                workout_events: window.workout,
                meal_events: window.meal,
                completion_rate: completion_rate(window.completed, window.total),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_counts_skip_unknown() {
        let rows = vec![
            ("active".to_string(), 3),
            ("archived".to_string(), 1),
            ("completed".to_string(), 2),
        ];
        let counts = status_counts(rows);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].status, AssignmentStatus::Active);
        assert_eq!(counts[1].count, 2);
    }

    #[test]
    fn test_unknown_role_reads_as_client() {
        let row = RecentUserRow {
            id: uuid::Uuid::new_v4(),
            name: "Ana García".to_string(),
            email: "ana@cliente.com".to_string(),
            role: "owner".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(recent_user(row).role, Role::Client);
    }
}
