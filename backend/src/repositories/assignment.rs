//! Assignment repository
//!
//! Progress entries are an append-only JSONB array on the assignment row.

use crate::policy::{Resource, Scope, Subject};
use crate::repositories::filter::{push_scope, Page};
use anyhow::Result;
use chrono::{DateTime, Utc};
use fitpro_shared::models::AssignmentStatus;
use fitpro_shared::types::ProgressEntry;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const ASSIGNMENT_COLUMNS: &str = "assignments.id, assignments.client_id, assignments.trainer_id, \
    assignments.routine_id, assignments.meal_plan_id, assignments.start_date, \
    assignments.end_date, assignments.status, assignments.notes, assignments.progress, \
    assignments.created_at, assignments.updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssignmentRecord {
    pub id: Uuid,
    pub client_id: Uuid,
    pub trainer_id: Uuid,
    pub routine_id: Option<Uuid>,
    pub meal_plan_id: Option<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: String,
    pub notes: Option<String>,
    pub progress: Json<Vec<ProgressEntry>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssignmentRecord {
    pub fn status(&self) -> AssignmentStatus {
        self.status.parse().unwrap_or_default()
    }

    pub fn subject(&self) -> Subject {
        Subject::Assignment {
            trainer_id: self.trainer_id,
            client_id: self.client_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub client_id: Uuid,
    pub trainer_id: Uuid,
    pub routine_id: Option<Uuid>,
    pub meal_plan_id: Option<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
    pub notes: Option<String>,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct AssignmentChanges {
    pub routine_id: Option<Uuid>,
    pub meal_plan_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<AssignmentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub status: Option<AssignmentStatus>,
    pub client_id: Option<Uuid>,
}

pub struct AssignmentRepository;

impl AssignmentRepository {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        assignment: &NewAssignment,
    ) -> Result<AssignmentRecord> {
        let record = sqlx::query_as::<_, AssignmentRecord>(&format!(
            r#"
            INSERT INTO assignments (client_id, trainer_id, routine_id, meal_plan_id,
                                     start_date, end_date, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        ))
        .bind(assignment.client_id)
        .bind(assignment.trainer_id)
        .bind(assignment.routine_id)
        .bind(assignment.meal_plan_id)
        .bind(assignment.start_date)
        .bind(assignment.end_date)
        .bind(assignment.status.as_str())
        .bind(&assignment.notes)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<AssignmentRecord>> {
        let assignment = sqlx::query_as::<_, AssignmentRecord>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE assignments.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(assignment)
    }

    pub async fn list(
        pool: &PgPool,
        scope: Scope,
        filter: &AssignmentFilter,
        page: Page,
    ) -> Result<(Vec<AssignmentRecord>, i64)> {
        let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
            push_scope(qb, Resource::Assignment, scope);
            if let Some(status) = filter.status {
                qb.push(" AND assignments.status = ")
                    .push_bind(status.as_str());
            }
            if let Some(client_id) = filter.client_id {
                qb.push(" AND assignments.client_id = ").push_bind(client_id);
            }
        };

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM assignments WHERE TRUE");
        push_filters(&mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        let mut query = QueryBuilder::new(format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE TRUE"
        ));
        push_filters(&mut query);
        query.push(" ORDER BY assignments.created_at DESC, assignments.id");
        page.push_limit(&mut query);
        let assignments = query
            .build_query_as::<AssignmentRecord>()
            .fetch_all(pool)
            .await?;

        Ok((assignments, total))
    }

    /// Every assignment of a client, newest first
    pub async fn list_for_client(pool: &PgPool, client_id: Uuid) -> Result<Vec<AssignmentRecord>> {
        let assignments = sqlx::query_as::<_, AssignmentRecord>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments \
             WHERE assignments.client_id = $1 \
             ORDER BY assignments.created_at DESC, assignments.id"
        ))
        .bind(client_id)
        .fetch_all(pool)
        .await?;

        Ok(assignments)
    }

    /// Apply `changes` inside `scope`; `None` when no row matched
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: &AssignmentChanges,
        scope: Scope,
    ) -> Result<Option<AssignmentRecord>> {
        let mut qb =
            QueryBuilder::<Postgres>::new("UPDATE assignments SET routine_id = COALESCE(");
        qb.push_bind(changes.routine_id)
            .push(", routine_id), meal_plan_id = COALESCE(")
            .push_bind(changes.meal_plan_id)
            .push(", meal_plan_id), start_date = COALESCE(")
            .push_bind(changes.start_date)
            .push(", start_date), end_date = COALESCE(")
            .push_bind(changes.end_date)
            .push(", end_date), status = COALESCE(")
            .push_bind(changes.status.map(|s| s.as_str()))
            .push(", status), notes = COALESCE(")
            .push_bind(changes.notes.clone())
            .push(", notes), updated_at = NOW() WHERE assignments.id = ")
            .push_bind(id);
        push_scope(&mut qb, Resource::Assignment, scope);
        qb.push(format!(" RETURNING {ASSIGNMENT_COLUMNS}"));

        let assignment = qb
            .build_query_as::<AssignmentRecord>()
            .fetch_optional(pool)
            .await?;
        Ok(assignment)
    }

    /// Append a progress entry inside `scope`
    pub async fn append_progress(
        pool: &PgPool,
        id: Uuid,
        entry: &ProgressEntry,
        scope: Scope,
    ) -> Result<Option<AssignmentRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "UPDATE assignments SET progress = assignments.progress || jsonb_build_array(",
        );
        qb.push_bind(Json(entry.clone()))
            .push("::jsonb), updated_at = NOW() WHERE assignments.id = ")
            .push_bind(id);
        push_scope(&mut qb, Resource::Assignment, scope);
        qb.push(format!(" RETURNING {ASSIGNMENT_COLUMNS}"));

        let assignment = qb
            .build_query_as::<AssignmentRecord>()
            .fetch_optional(pool)
            .await?;
        Ok(assignment)
    }

    /// Clients holding a non-cancelled assignment to a routine or meal plan
    pub async fn plan_assignees(pool: &PgPool, plan: Resource, plan_id: Uuid) -> Result<Vec<Uuid>> {
        let column = match plan {
            Resource::Routine => "routine_id",
            Resource::MealPlan => "meal_plan_id",
            other => anyhow::bail!("{} is not a plan", other),
        };

        let clients = sqlx::query_scalar::<_, Uuid>(&format!(
            "SELECT DISTINCT client_id FROM assignments \
             WHERE {column} = $1 AND status <> 'cancelled'"
        ))
        .bind(plan_id)
        .fetch_all(pool)
        .await?;

        Ok(clients)
    }
}
